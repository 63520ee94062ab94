use crate::domain::{ChannelId, GuildId, MessageId, MessageRef, UserId};

/// One inbound chat message, as delivered by the gateway adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub author_id: UserId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub message_id: MessageId,
    pub content: String,
    /// Users mentioned in the message, in the order the platform reports them.
    pub mentioned_user_ids: Vec<UserId>,
}

impl InboundMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id,
            message_id: self.message_id,
            guild_id: self.guild_id,
        }
    }
}

/// Where a reply goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Plain channel post, prefixed with a mention when `mention` is set.
    Channel {
        channel_id: ChannelId,
        mention: Option<UserId>,
    },
    /// Direct message to a user; the adapter resolves the DM channel.
    Direct(UserId),
    /// Reply referencing the triggering message, prefixed with a mention.
    Thread { reply_to: MessageRef, mention: UserId },
}

/// The single reply produced by one dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundReply {
    pub destination: Destination,
    pub text: String,
    /// Plain, unprefixed hint posted to the triggering channel before the reply.
    pub notice: Option<(ChannelId, String)>,
}

impl OutboundReply {
    pub fn channel(channel_id: ChannelId, mention: UserId, text: impl Into<String>) -> Self {
        Self {
            destination: Destination::Channel {
                channel_id,
                mention: Some(mention),
            },
            text: text.into(),
            notice: None,
        }
    }

    pub fn thread(msg: &InboundMessage, text: impl Into<String>) -> Self {
        Self {
            destination: Destination::Thread {
                reply_to: msg.message_ref(),
                mention: msg.author_id,
            },
            text: text.into(),
            notice: None,
        }
    }

    pub fn direct(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            destination: Destination::Direct(user_id),
            text: text.into(),
            notice: None,
        }
    }

    pub fn with_notice(mut self, channel_id: ChannelId, notice: impl Into<String>) -> Self {
        self.notice = Some((channel_id, notice.into()));
        self
    }
}

/// Capabilities / limits of a gateway implementation.
#[derive(Clone, Copy, Debug)]
pub struct GatewayCapabilities {
    pub max_message_len: usize,
}
