use async_trait::async_trait;

use crate::{
    domain::{ChannelId, MessageRef, UserId},
    formatting,
    messaging::types::{Destination, GatewayCapabilities, OutboundReply},
    Result,
};

/// Outbound half of the chat gateway.
///
/// Discord is the only implementation; tests use recording fakes.
#[async_trait]
pub trait GatewayPort: Send + Sync {
    fn capabilities(&self) -> GatewayCapabilities;

    async fn send_to_channel(&self, channel_id: ChannelId, text: &str) -> Result<()>;

    /// Resolve (creating if needed) the DM channel for `user_id`.
    async fn open_direct_channel(&self, user_id: UserId) -> Result<ChannelId>;

    async fn send_direct(&self, user_id: UserId, text: &str) -> Result<()> {
        let channel_id = self.open_direct_channel(user_id).await?;
        self.send_to_channel(channel_id, text).await
    }

    async fn send_threaded_reply(&self, reply_to: MessageRef, text: &str) -> Result<()>;
}

/// Send a reply through the matching gateway primitive.
///
/// Empty bodies are suppressed (no message at all); the notice, when present, goes
/// out first and is subject to the same rule.
pub async fn deliver(gateway: &dyn GatewayPort, reply: &OutboundReply) -> Result<()> {
    let max_len = gateway.capabilities().max_message_len;

    if let Some((channel_id, notice)) = &reply.notice {
        if !notice.is_empty() {
            gateway
                .send_to_channel(*channel_id, &formatting::truncate(notice, max_len))
                .await?;
        }
    }

    if reply.text.is_empty() {
        return Ok(());
    }

    let text = formatting::truncate(&formatting::render(reply), max_len);
    match &reply.destination {
        Destination::Channel { channel_id, .. } => gateway.send_to_channel(*channel_id, &text).await,
        Destination::Direct(user_id) => gateway.send_direct(*user_id, &text).await,
        Destination::Thread { reply_to, .. } => gateway.send_threaded_reply(*reply_to, &text).await,
    }
}
