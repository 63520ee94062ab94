/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type. The dispatcher treats
/// `Transport` and `Decode` identically: both become a "failed to fetch" reply.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("gateway error: {0}")]
    Gateway(String),
}

impl Error {
    /// True for failures talking to the code-hosting API.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
