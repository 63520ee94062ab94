//! Command parser: raw message text to a keyword plus positional arguments.
//!
//! Tokens are split on single spaces with no quoting, so an argument containing a
//! space cannot be expressed. Consecutive spaces produce empty tokens, which count
//! toward arity.

use crate::domain::UserId;

/// The closed set of commands the bot understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    SendDm,
    WhoAmI,
    BuildStatus,
    Branches,
    Issues,
    PullRequests,
    Commits,
    ListCommands,
    Unknown,
}

impl Command {
    /// Every recognized command, in the order they are advertised.
    pub const KNOWN: [Command; 8] = [
        Command::BuildStatus,
        Command::Branches,
        Command::Issues,
        Command::PullRequests,
        Command::Commits,
        Command::WhoAmI,
        Command::SendDm,
        Command::ListCommands,
    ];

    /// Exact, case-sensitive keyword match.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "!msg" => Command::SendDm,
            "!whoami" => Command::WhoAmI,
            "!buildstatus" => Command::BuildStatus,
            "!branches" => Command::Branches,
            "!issues" => Command::Issues,
            "!pullrequests" => Command::PullRequests,
            "!commits" => Command::Commits,
            "!comandos" => Command::ListCommands,
            _ => Command::Unknown,
        }
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Command::SendDm => Some("!msg"),
            Command::WhoAmI => Some("!whoami"),
            Command::BuildStatus => Some("!buildstatus"),
            Command::Branches => Some("!branches"),
            Command::Issues => Some("!issues"),
            Command::PullRequests => Some("!pullrequests"),
            Command::Commits => Some("!commits"),
            Command::ListCommands => Some("!comandos"),
            Command::Unknown => None,
        }
    }

    /// Exact token count (keyword included) for commands backed by the API.
    pub fn required_arity(self) -> Option<usize> {
        match self {
            Command::BuildStatus | Command::Branches | Command::Issues | Command::PullRequests => {
                Some(3)
            }
            Command::Commits => Some(4),
            _ => None,
        }
    }
}

/// A message split into its command and raw tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: Command,
    pub tokens: Vec<String>,
}

impl ParsedCommand {
    /// Total token count, keyword included.
    pub fn arity(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens following the keyword.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }
}

pub fn parse(content: &str) -> ParsedCommand {
    let tokens: Vec<String> = content.split(' ').map(str::to_string).collect();
    let command = tokens
        .first()
        .map(|keyword| Command::from_keyword(keyword))
        .unwrap_or(Command::Unknown);
    ParsedCommand { command, tokens }
}

/// Parse Discord user-mention markup (`<@id>` or `<@!id>`).
pub fn parse_user_mention(token: &str) -> Option<UserId> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let digits = inner.strip_prefix('!').unwrap_or(inner);
    digits.parse::<u64>().ok().map(UserId)
}

pub fn user_mention(user_id: UserId) -> String {
    format!("<@{user_id}>")
}
