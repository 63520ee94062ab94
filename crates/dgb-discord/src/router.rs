use std::sync::Arc;

use anyhow::Context as _;
use serenity::{
    async_trait,
    client::{Client, Context, EventHandler},
    http::Http,
    model::{channel::Message, gateway::GatewayIntents, gateway::Ready},
};

use dgb_core::{
    code_host::CodeHostPort,
    config::Config,
    dispatcher::Dispatcher,
    domain::{ChannelId, GuildId, MessageId, UserId},
    messaging::{filter::InboundFilter, types::InboundMessage},
};

use crate::DiscordMessenger;

/// Gateway event handler. Holds only immutable state, so concurrent events are safe.
pub struct Handler {
    filter: InboundFilter,
    dispatcher: Dispatcher,
}

impl Handler {
    pub fn new(filter: InboundFilter, dispatcher: Dispatcher) -> Self {
        Self { filter, dispatcher }
    }
}

pub fn to_inbound(msg: &Message) -> InboundMessage {
    InboundMessage {
        author_id: UserId(msg.author.id.get()),
        channel_id: ChannelId(msg.channel_id.get()),
        guild_id: msg.guild_id.map(|g| GuildId(g.get())),
        message_id: MessageId(msg.id.get()),
        content: msg.content.clone(),
        mentioned_user_ids: msg.mentions.iter().map(|u| UserId(u.id.get())).collect(),
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            channel = %self.filter.channel_id,
            "connected to Discord gateway"
        );
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let inbound = to_inbound(&msg);
        if !self.filter.accepts(&inbound) {
            return;
        }

        if let Err(e) = self.dispatcher.handle(&inbound).await {
            tracing::warn!(
                message = %msg.id,
                author = %inbound.author_id,
                error = %e,
                "failed to deliver reply"
            );
        }
    }
}

/// Connect to the gateway and serve the configured channel until a shutdown signal.
pub async fn run(cfg: Arc<Config>, code_host: Arc<dyn CodeHostPort>) -> anyhow::Result<()> {
    let http = Arc::new(Http::new(&cfg.discord_token));
    let me = http
        .get_current_user()
        .await
        .context("failed to resolve bot user (check DISCORD_TOKEN)")?;
    tracing::info!(bot = %me.name, id = %me.id, "authenticated with Discord");

    let messenger = Arc::new(DiscordMessenger::new(http));
    let dispatcher = Dispatcher::new(code_host, messenger);
    let filter = InboundFilter::new(UserId(me.id.get()), cfg.channel_id);

    // DM events never pass the channel filter.
    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&cfg.discord_token, intents)
        .event_handler(Handler::new(filter, dispatcher))
        .await
        .context("failed to build Discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, closing gateway connection");
        shard_manager.shutdown_all().await;
    });

    client
        .start()
        .await
        .context("Discord gateway connection failed")?;

    tracing::info!("gateway connection closed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
