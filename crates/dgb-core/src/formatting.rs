//! Reply text construction.
//!
//! Every function here is pure: the same input always yields byte-identical text.

use crate::{
    code_host::{Branch, BuildStatus, Issue, PullRequest, RepositoryCommit, ResourceKind},
    command::{user_mention, Command},
    domain::{ChannelId, UserId},
    messaging::types::{Destination, OutboundReply},
};

const COMMIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TRUNCATION_MARKER: char = '…';

pub fn build_status(status: &BuildStatus) -> String {
    format!("Build status: {}", status.label())
}

pub fn branches(branches: &[Branch]) -> String {
    let names: Vec<&str> = branches.iter().map(|b| b.name.as_str()).collect();
    format!("Branches: {}", names.join("\n "))
}

pub fn issues(issues: &[Issue]) -> String {
    let titles: Vec<&str> = issues.iter().map(|i| i.title.as_str()).collect();
    format!("Issues: {}", titles.join(", "))
}

pub fn pull_requests(pulls: &[PullRequest]) -> String {
    let titles: Vec<&str> = pulls.iter().map(|p| p.title.as_str()).collect();
    format!("Pull Requests: {}", titles.join(", "))
}

pub fn commits(commits: &[RepositoryCommit]) -> String {
    let blocks: Vec<String> = commits.iter().map(commit_block).collect();
    format!("Commits: {}", blocks.join("\n "))
}

fn commit_block(commit: &RepositoryCommit) -> String {
    let (author, date) = match &commit.commit.author {
        Some(a) => (
            a.name.as_str(),
            a.date
                .map(|d| d.format(COMMIT_DATE_FORMAT).to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
        None => ("", "unknown".to_string()),
    };
    format!(
        " \n Author: {author}\nDate: {date} \n Message: {} \n ",
        commit.commit.message
    )
}

pub fn usage(command: Command) -> Option<&'static str> {
    match command {
        Command::SendDm => Some("Usage: !msg <your message> <@userMention>"),
        Command::BuildStatus => Some("Usage: !buildstatus <username> <repo>"),
        Command::Branches => Some("Usage: !branches <username> <repo>"),
        Command::Issues => Some("Usage: !issues <username> <repo>"),
        Command::PullRequests => Some("Usage: !pullrequests <username> <repo>"),
        Command::Commits => Some("Usage: !commits <username> <repo> <branch>"),
        Command::WhoAmI | Command::ListCommands | Command::Unknown => None,
    }
}

pub fn mention_required() -> &'static str {
    "Please mention a user to send the message to."
}

pub fn unknown_command() -> &'static str {
    "Unknown command. Type !comandos to see the available commands..."
}

pub fn command_list() -> String {
    let keywords: Vec<&str> = Command::KNOWN
        .iter()
        .filter(|c| **c != Command::ListCommands)
        .filter_map(|c| c.keyword())
        .collect();
    format!("Available commands: {}", keywords.join(", "))
}

pub fn fetch_failed(resource: ResourceKind) -> String {
    format!("Failed to fetch {resource}.")
}

pub fn whoami(user_id: UserId, dm_channel: ChannelId) -> String {
    format!("userID: {user_id}\nchannelId: {dm_channel}")
}

/// Final text for a reply, with the mention prefix its destination calls for.
pub fn render(reply: &OutboundReply) -> String {
    match &reply.destination {
        Destination::Channel {
            mention: Some(user),
            ..
        } => format!("{}\n{}", user_mention(*user), reply.text),
        Destination::Channel { mention: None, .. } | Destination::Direct(_) => reply.text.clone(),
        Destination::Thread { mention, .. } => {
            format!("{}\n {}", user_mention(*mention), reply.text)
        }
    }
}

/// Clamp `text` to `max_chars` characters, marking the cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push(TRUNCATION_MARKER);
    out
}
