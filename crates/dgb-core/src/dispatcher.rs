//! Command dispatcher: one inbound message in, at most one reply out.
//!
//! Arity is always checked before the code-host port is touched, so a malformed
//! command never costs a network round-trip.

use std::sync::Arc;

use crate::{
    code_host::{CodeHostPort, ResourceKind},
    command::{self, parse_user_mention, Command, ParsedCommand},
    domain::{RepoCoordinate, UserId},
    formatting,
    messaging::{
        port::{deliver, GatewayPort},
        types::{Destination, InboundMessage, OutboundReply},
    },
    Result,
};

#[derive(Clone)]
pub struct Dispatcher {
    code_host: Arc<dyn CodeHostPort>,
    gateway: Arc<dyn GatewayPort>,
}

impl Dispatcher {
    pub fn new(code_host: Arc<dyn CodeHostPort>, gateway: Arc<dyn GatewayPort>) -> Self {
        Self { code_host, gateway }
    }

    /// Dispatch and deliver the reply, if any.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<()> {
        match self.plan(msg).await {
            Some(reply) => deliver(self.gateway.as_ref(), &reply).await,
            None => Ok(()),
        }
    }

    /// Resolve the command and build its reply without sending it.
    pub async fn plan(&self, msg: &InboundMessage) -> Option<OutboundReply> {
        let parsed = command::parse(&msg.content);
        tracing::info!(
            command = ?parsed.command,
            author = %msg.author_id,
            arity = parsed.arity(),
            "dispatching"
        );

        match parsed.command {
            Command::SendDm => self.send_dm(msg, &parsed),
            Command::WhoAmI => self.whoami(msg).await,
            Command::ListCommands => Some(OutboundReply::channel(
                msg.channel_id,
                msg.author_id,
                formatting::command_list(),
            )),
            Command::Unknown => Some(OutboundReply::channel(
                msg.channel_id,
                msg.author_id,
                formatting::unknown_command(),
            )),
            Command::BuildStatus => Some(self.fetch(msg, &parsed, ResourceKind::BuildRuns).await),
            Command::Branches => Some(self.fetch(msg, &parsed, ResourceKind::Branches).await),
            Command::Issues => Some(self.fetch(msg, &parsed, ResourceKind::Issues).await),
            Command::PullRequests => {
                Some(self.fetch(msg, &parsed, ResourceKind::PullRequests).await)
            }
            Command::Commits => Some(self.fetch(msg, &parsed, ResourceKind::Commits).await),
        }
    }

    fn send_dm(&self, msg: &InboundMessage, parsed: &ParsedCommand) -> Option<OutboundReply> {
        let usage = formatting::usage(Command::SendDm)?;

        let Some(&target) = msg.mentioned_user_ids.first() else {
            return Some(
                OutboundReply::channel(msg.channel_id, msg.author_id, usage)
                    .with_notice(msg.channel_id, formatting::mention_required()),
            );
        };

        if parsed.arity() < 3 {
            return Some(OutboundReply::channel(msg.channel_id, msg.author_id, usage));
        }

        Some(OutboundReply::direct(target, dm_body(parsed.args(), target)))
    }

    async fn whoami(&self, msg: &InboundMessage) -> Option<OutboundReply> {
        match self.gateway.open_direct_channel(msg.author_id).await {
            Ok(dm_channel) => Some(OutboundReply {
                destination: Destination::Channel {
                    channel_id: dm_channel,
                    mention: None,
                },
                text: formatting::whoami(msg.author_id, dm_channel),
                notice: None,
            }),
            Err(e) => {
                tracing::warn!(author = %msg.author_id, error = %e, "failed to open DM channel");
                None
            }
        }
    }

    async fn fetch(
        &self,
        msg: &InboundMessage,
        parsed: &ParsedCommand,
        resource: ResourceKind,
    ) -> OutboundReply {
        let command = parsed.command;
        let usage = formatting::usage(command).unwrap_or_default();
        if command.required_arity() != Some(parsed.arity()) {
            return OutboundReply::channel(msg.channel_id, msg.author_id, usage);
        }

        let args = parsed.args();
        let repo = RepoCoordinate::new(args[0].as_str(), args[1].as_str());
        let outcome = match resource {
            ResourceKind::BuildRuns => self
                .code_host
                .latest_build_status(&repo)
                .await
                .map(|status| formatting::build_status(&status)),
            ResourceKind::Branches => self
                .code_host
                .branches(&repo)
                .await
                .map(|list| formatting::branches(&list)),
            ResourceKind::Issues => self
                .code_host
                .issues(&repo)
                .await
                .map(|list| formatting::issues(&list)),
            ResourceKind::PullRequests => self
                .code_host
                .pull_requests(&repo)
                .await
                .map(|list| formatting::pull_requests(&list)),
            ResourceKind::Commits => self
                .code_host
                .commits(&repo, &args[2])
                .await
                .map(|list| formatting::commits(&list)),
        };

        match outcome {
            Ok(text) => OutboundReply::thread(msg, text),
            Err(e) => {
                tracing::warn!(%repo, resource = %resource, error = %e, "fetch failed");
                OutboundReply::thread(msg, formatting::fetch_failed(resource))
            }
        }
    }
}

/// Message body for `!msg`: the arguments minus the target's mention.
///
/// When no argument is the target's mention markup, the last argument is dropped,
/// matching the documented `!msg <text> <@user>` form.
fn dm_body(args: &[String], target: UserId) -> String {
    let is_target = |token: &String| parse_user_mention(token) == Some(target);
    let words: Vec<&str> = if args.iter().any(is_target) {
        args.iter()
            .filter(|token| !is_target(*token))
            .map(String::as_str)
            .collect()
    } else {
        args[..args.len().saturating_sub(1)]
            .iter()
            .map(String::as_str)
            .collect()
    };
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_host::{
        Branch, BuildStatus, CommitAuthor, CommitDetail, Issue, PullRequest, RepositoryCommit,
    };
    use crate::domain::{ChannelId, GuildId, MessageId, MessageRef};
    use crate::messaging::types::GatewayCapabilities;
    use crate::Error;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const CHANNEL: ChannelId = ChannelId(500);
    const AUTHOR: UserId = UserId(7);

    #[derive(Default)]
    struct FakeCodeHost {
        calls: AtomicUsize,
        fail: bool,
        empty_runs: bool,
        branch_args: Mutex<Vec<String>>,
    }

    impl FakeCodeHost {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CodeHostPort for FakeCodeHost {
        async fn latest_build_status(&self, _repo: &RepoCoordinate) -> Result<BuildStatus> {
            self.hit()?;
            if self.empty_runs {
                Ok(BuildStatus::Unavailable)
            } else {
                Ok(BuildStatus::Conclusion("success".to_string()))
            }
        }

        async fn branches(&self, repo: &RepoCoordinate) -> Result<Vec<Branch>> {
            self.hit()?;
            self.branch_args.lock().unwrap().push(repo.to_string());
            Ok(vec![
                Branch {
                    name: "main".to_string(),
                },
                Branch {
                    name: "dev".to_string(),
                },
            ])
        }

        async fn issues(&self, _repo: &RepoCoordinate) -> Result<Vec<Issue>> {
            self.hit()?;
            Ok(vec![
                Issue {
                    title: "crash".to_string(),
                },
                Issue {
                    title: "typo".to_string(),
                },
            ])
        }

        async fn pull_requests(&self, _repo: &RepoCoordinate) -> Result<Vec<PullRequest>> {
            self.hit()?;
            Ok(vec![PullRequest {
                title: "Add CI".to_string(),
            }])
        }

        async fn commits(
            &self,
            _repo: &RepoCoordinate,
            branch: &str,
        ) -> Result<Vec<RepositoryCommit>> {
            self.hit()?;
            assert_eq!(branch, "main");
            Ok(vec![RepositoryCommit {
                commit: CommitDetail {
                    author: Some(CommitAuthor {
                        name: "Ana".to_string(),
                        date: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
                    }),
                    message: "fix bug".to_string(),
                },
            }])
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Sent {
        Channel(ChannelId, String),
        Thread(MessageRef, String),
    }

    #[derive(Default)]
    struct FakeGateway {
        sent: Mutex<Vec<Sent>>,
        dm_fails: bool,
    }

    impl FakeGateway {
        fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }
    }

    fn dm_channel_for(user: UserId) -> ChannelId {
        ChannelId(9_000 + user.0)
    }

    #[async_trait]
    impl GatewayPort for FakeGateway {
        fn capabilities(&self) -> GatewayCapabilities {
            GatewayCapabilities {
                max_message_len: 2000,
            }
        }

        async fn send_to_channel(&self, channel_id: ChannelId, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Channel(channel_id, text.to_string()));
            Ok(())
        }

        async fn open_direct_channel(&self, user_id: UserId) -> Result<ChannelId> {
            if self.dm_fails {
                return Err(Error::Gateway("cannot DM this user".to_string()));
            }
            Ok(dm_channel_for(user_id))
        }

        async fn send_threaded_reply(&self, reply_to: MessageRef, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Thread(reply_to, text.to_string()));
            Ok(())
        }
    }

    fn inbound(content: &str, mentions: &[u64]) -> InboundMessage {
        InboundMessage {
            author_id: AUTHOR,
            channel_id: CHANNEL,
            guild_id: Some(GuildId(1)),
            message_id: MessageId(77),
            content: content.to_string(),
            mentioned_user_ids: mentions.iter().copied().map(UserId).collect(),
        }
    }

    fn setup(code_host: FakeCodeHost) -> (Dispatcher, Arc<FakeCodeHost>, Arc<FakeGateway>) {
        let code_host = Arc::new(code_host);
        let gateway = Arc::new(FakeGateway::default());
        let dispatcher = Dispatcher::new(code_host.clone(), gateway.clone());
        (dispatcher, code_host, gateway)
    }

    fn thread_ref() -> MessageRef {
        MessageRef {
            channel_id: CHANNEL,
            message_id: MessageId(77),
            guild_id: Some(GuildId(1)),
        }
    }

    #[tokio::test]
    async fn unknown_text_gets_hint_without_api_calls() {
        let (dispatcher, code_host, gateway) = setup(FakeCodeHost::default());

        for text in ["hello", "", "!unknown a b", "!BRANCHES a b"] {
            dispatcher.handle(&inbound(text, &[])).await.unwrap();
        }

        assert_eq!(code_host.call_count(), 0);
        let sent = gateway.sent();
        assert_eq!(sent.len(), 4);
        for s in sent {
            assert_eq!(
                s,
                Sent::Channel(
                    CHANNEL,
                    "<@7>\nUnknown command. Type !comandos to see the available commands..."
                        .to_string()
                )
            );
        }
    }

    #[tokio::test]
    async fn wrong_arity_yields_usage_and_no_fetch() {
        let (dispatcher, code_host, gateway) = setup(FakeCodeHost::default());

        let cases = [
            ("!buildstatus octo", "Usage: !buildstatus <username> <repo>"),
            ("!branches octo repo extra", "Usage: !branches <username> <repo>"),
            ("!issues", "Usage: !issues <username> <repo>"),
            ("!pullrequests a", "Usage: !pullrequests <username> <repo>"),
            ("!commits octo repo", "Usage: !commits <username> <repo> <branch>"),
        ];
        for (text, _) in cases {
            dispatcher.handle(&inbound(text, &[])).await.unwrap();
        }

        assert_eq!(code_host.call_count(), 0);
        let expected: Vec<Sent> = cases
            .iter()
            .map(|(_, usage)| Sent::Channel(CHANNEL, format!("<@7>\n{usage}")))
            .collect();
        assert_eq!(gateway.sent(), expected);
    }

    #[tokio::test]
    async fn branches_reply_is_threaded_with_exact_separator() {
        let (dispatcher, code_host, gateway) = setup(FakeCodeHost::default());

        let reply = dispatcher
            .plan(&inbound("!branches user repo", &[]))
            .await
            .unwrap();
        assert_eq!(reply.text, "Branches: main\n dev");

        dispatcher
            .handle(&inbound("!branches user repo", &[]))
            .await
            .unwrap();
        assert_eq!(
            gateway.sent(),
            vec![Sent::Thread(thread_ref(), "<@7>\n Branches: main\n dev".to_string())]
        );
        assert_eq!(
            *code_host.branch_args.lock().unwrap(),
            vec!["user/repo".to_string(), "user/repo".to_string()]
        );
    }

    #[tokio::test]
    async fn list_replies_use_their_join_policy() {
        let (dispatcher, _, _) = setup(FakeCodeHost::default());

        let issues = dispatcher.plan(&inbound("!issues o r", &[])).await.unwrap();
        assert_eq!(issues.text, "Issues: crash, typo");

        let pulls = dispatcher
            .plan(&inbound("!pullrequests o r", &[]))
            .await
            .unwrap();
        assert_eq!(pulls.text, "Pull Requests: Add CI");

        let status = dispatcher
            .plan(&inbound("!buildstatus o r", &[]))
            .await
            .unwrap();
        assert_eq!(status.text, "Build status: success");
    }

    #[tokio::test]
    async fn empty_run_list_replies_with_sentinel() {
        let (dispatcher, _, _) = setup(FakeCodeHost {
            empty_runs: true,
            ..Default::default()
        });

        let reply = dispatcher
            .plan(&inbound("!buildstatus o r", &[]))
            .await
            .unwrap();
        assert_eq!(reply.text, "Build status: no status available");
    }

    #[tokio::test]
    async fn commits_reply_orders_author_date_message() {
        let (dispatcher, _, _) = setup(FakeCodeHost::default());

        let reply = dispatcher
            .plan(&inbound("!commits o r main", &[]))
            .await
            .unwrap();

        let author = reply.text.find("Author: Ana").unwrap();
        let date = reply.text.find("Date: 2024-01-02 03:04:05").unwrap();
        let message = reply.text.find("Message: fix bug").unwrap();
        assert!(author < date && date < message);
        assert!(matches!(reply.destination, Destination::Thread { .. }));
    }

    #[tokio::test]
    async fn fetch_failure_replies_with_resource_specific_message() {
        let (dispatcher, code_host, gateway) = setup(FakeCodeHost::failing());

        dispatcher
            .handle(&inbound("!commits o r main", &[]))
            .await
            .unwrap();
        dispatcher.handle(&inbound("!issues o r", &[])).await.unwrap();

        assert_eq!(code_host.call_count(), 2);
        assert_eq!(
            gateway.sent(),
            vec![
                Sent::Thread(thread_ref(), "<@7>\n Failed to fetch commits.".to_string()),
                Sent::Thread(thread_ref(), "<@7>\n Failed to fetch issues.".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn msg_sends_text_to_mentioned_users_dm() {
        let (dispatcher, _, gateway) = setup(FakeCodeHost::default());

        dispatcher
            .handle(&inbound("!msg <@42> hello there", &[42]))
            .await
            .unwrap();
        dispatcher
            .handle(&inbound("!msg see you soon <@!42>", &[42]))
            .await
            .unwrap();

        assert_eq!(
            gateway.sent(),
            vec![
                Sent::Channel(dm_channel_for(UserId(42)), "hello there".to_string()),
                Sent::Channel(dm_channel_for(UserId(42)), "see you soon".to_string()),
            ]
        );
    }

    #[test]
    fn dm_body_drops_last_token_when_target_markup_is_absent() {
        let args: Vec<String> = ["ship", "it", "@ana"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dm_body(&args, UserId(42)), "ship it");

        let other: Vec<String> = ["ping", "<@43>", "now"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dm_body(&other, UserId(42)), "ping <@43>");
    }

    #[tokio::test]
    async fn msg_with_unrecognised_mention_token_drops_last_word() {
        let (dispatcher, _, gateway) = setup(FakeCodeHost::default());

        dispatcher
            .handle(&inbound("!msg deploy finished @ana", &[42]))
            .await
            .unwrap();

        assert_eq!(
            gateway.sent(),
            vec![Sent::Channel(
                dm_channel_for(UserId(42)),
                "deploy finished".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn msg_without_mention_sends_plain_hint_then_usage() {
        let (dispatcher, _, gateway) = setup(FakeCodeHost::default());

        dispatcher
            .handle(&inbound("!msg hello there", &[]))
            .await
            .unwrap();

        assert_eq!(
            gateway.sent(),
            vec![
                Sent::Channel(
                    CHANNEL,
                    "Please mention a user to send the message to.".to_string()
                ),
                Sent::Channel(
                    CHANNEL,
                    "<@7>\nUsage: !msg <your message> <@userMention>".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn msg_with_mention_but_no_text_gets_usage() {
        let (dispatcher, _, gateway) = setup(FakeCodeHost::default());

        dispatcher
            .handle(&inbound("!msg <@42>", &[42]))
            .await
            .unwrap();

        assert_eq!(
            gateway.sent(),
            vec![Sent::Channel(
                CHANNEL,
                "<@7>\nUsage: !msg <your message> <@userMention>".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn empty_dm_body_is_suppressed() {
        let (dispatcher, _, gateway) = setup(FakeCodeHost::default());

        dispatcher
            .handle(&inbound("!msg  <@42>", &[42]))
            .await
            .unwrap();

        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn whoami_replies_in_authors_dm_channel() {
        let (dispatcher, _, gateway) = setup(FakeCodeHost::default());

        dispatcher
            .handle(&inbound("!whoami anything here", &[]))
            .await
            .unwrap();

        let dm = dm_channel_for(AUTHOR);
        assert_eq!(
            gateway.sent(),
            vec![Sent::Channel(dm, format!("userID: 7\nchannelId: {dm}"))]
        );
    }

    #[tokio::test]
    async fn whoami_without_dm_channel_sends_nothing() {
        let code_host = Arc::new(FakeCodeHost::default());
        let gateway = Arc::new(FakeGateway {
            dm_fails: true,
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(code_host, gateway.clone());

        assert!(dispatcher.plan(&inbound("!whoami", &[])).await.is_none());
        dispatcher.handle(&inbound("!whoami", &[])).await.unwrap();
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn command_list_goes_to_channel_with_mention() {
        let (dispatcher, _, gateway) = setup(FakeCodeHost::default());

        dispatcher
            .handle(&inbound("!comandos", &[]))
            .await
            .unwrap();

        assert_eq!(
            gateway.sent(),
            vec![Sent::Channel(
                CHANNEL,
                format!("<@7>\n{}", formatting::command_list())
            )]
        );
    }
}
