//! Discord adapter (serenity).
//!
//! This crate implements the `dgb-core` GatewayPort over the Discord HTTP API and
//! drives the gateway event loop in [`router`].

use std::{num::NonZeroU64, sync::Arc};

use async_trait::async_trait;
use serenity::{
    builder::CreateMessage,
    http::Http,
    model::{
        channel::MessageReference,
        id::{
            ChannelId as DiscordChannelId, GuildId as DiscordGuildId,
            MessageId as DiscordMessageId, UserId as DiscordUserId,
        },
    },
};

pub mod router;

use dgb_core::{
    domain::{ChannelId, MessageRef, UserId},
    errors::Error,
    messaging::{port::GatewayPort, types::GatewayCapabilities},
    Result,
};

/// Discord rejects message content longer than this.
pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Clone)]
pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::Gateway(format!("discord error: {e}"))
    }
}

fn snowflake(raw: u64) -> Result<NonZeroU64> {
    NonZeroU64::new(raw).ok_or_else(|| Error::Gateway("discord ids cannot be zero".to_string()))
}

fn discord_channel(channel_id: ChannelId) -> Result<DiscordChannelId> {
    snowflake(channel_id.0).map(DiscordChannelId::from)
}

fn discord_user(user_id: UserId) -> Result<DiscordUserId> {
    snowflake(user_id.0).map(DiscordUserId::from)
}

fn message_reference(reply_to: MessageRef) -> Result<MessageReference> {
    let channel = discord_channel(reply_to.channel_id)?;
    let message = DiscordMessageId::from(snowflake(reply_to.message_id.0)?);
    let mut reference = MessageReference::from((channel, message));
    reference.guild_id = reply_to
        .guild_id
        .map(|g| snowflake(g.0).map(DiscordGuildId::from))
        .transpose()?;
    Ok(reference)
}

#[async_trait]
impl GatewayPort for DiscordMessenger {
    fn capabilities(&self) -> GatewayCapabilities {
        GatewayCapabilities {
            max_message_len: MAX_MESSAGE_LEN,
        }
    }

    async fn send_to_channel(&self, channel_id: ChannelId, text: &str) -> Result<()> {
        discord_channel(channel_id)?
            .say(&self.http, text)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn open_direct_channel(&self, user_id: UserId) -> Result<ChannelId> {
        let dm = discord_user(user_id)?
            .create_dm_channel(&self.http)
            .await
            .map_err(Self::map_err)?;
        Ok(ChannelId(dm.id.get()))
    }

    async fn send_threaded_reply(&self, reply_to: MessageRef, text: &str) -> Result<()> {
        let channel = discord_channel(reply_to.channel_id)?;
        let builder = CreateMessage::new()
            .content(text)
            .reference_message(message_reference(reply_to)?);
        channel
            .send_message(&self.http, builder)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
