use crate::{
    domain::{ChannelId, UserId},
    messaging::types::InboundMessage,
};

/// Decides which inbound events reach the command parser.
#[derive(Clone, Copy, Debug)]
pub struct InboundFilter {
    pub bot_user_id: UserId,
    pub channel_id: ChannelId,
}

impl InboundFilter {
    pub fn new(bot_user_id: UserId, channel_id: ChannelId) -> Self {
        Self {
            bot_user_id,
            channel_id,
        }
    }

    /// Drops the bot's own messages and anything outside the served channel.
    pub fn accepts(&self, msg: &InboundMessage) -> bool {
        msg.author_id != self.bot_user_id && msg.channel_id == self.channel_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;

    fn message(author: u64, channel: u64) -> InboundMessage {
        InboundMessage {
            author_id: UserId(author),
            channel_id: ChannelId(channel),
            guild_id: None,
            message_id: MessageId(1),
            content: "!comandos".to_string(),
            mentioned_user_ids: Vec::new(),
        }
    }

    #[test]
    fn accepts_other_users_in_served_channel() {
        let filter = InboundFilter::new(UserId(1), ChannelId(10));
        assert!(filter.accepts(&message(2, 10)));
    }

    #[test]
    fn drops_self_authored_and_off_channel_messages() {
        let filter = InboundFilter::new(UserId(1), ChannelId(10));
        assert!(!filter.accepts(&message(1, 10)));
        assert!(!filter.accepts(&message(2, 11)));
    }
}
