// router.rs — CommandRouter: maps chat commands onto workflow operations.
//
// The router parses, gates on permission level, calls the workflow, and
// renders the outcome. Recoverable workflow errors become error replies;
// store and chat-platform faults propagate to the embedder as Err.
//
// The position choice is a multi-turn conversation. No handler ever blocks
// waiting for the user's next message: the embedder feeds every plain
// message through `on_message`, and the router consults the store to
// decide whether the sender is mid-position-choice in that channel. The
// awaiting state lives in the record itself, so a restart cannot drop the
// conversation.

use intake_core::{
    AdvanceOutcome, Applicant, ApplicationWorkflow, ChannelId, CloseTarget, WorkflowError,
};

use crate::command::{Command, PermissionLevel};
use crate::reply::{Message, Reply};

/// The acting user and channel, with the middleware-resolved privilege.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub author: Applicant,
    pub channel_id: ChannelId,
    pub level: PermissionLevel,
}

/// Dispatches parsed commands and mid-conversation messages.
pub struct CommandRouter {
    workflow: ApplicationWorkflow,
}

impl CommandRouter {
    pub fn new(workflow: ApplicationWorkflow) -> Self {
        Self { workflow }
    }

    pub fn workflow(&self) -> &ApplicationWorkflow {
        &self.workflow
    }

    /// Handle one command line. `Ok` carries the reply (including rendered
    /// user errors); `Err` carries only collaborator faults.
    pub async fn dispatch(
        &self,
        ctx: &CommandContext,
        input: &str,
    ) -> Result<Reply, WorkflowError> {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(parse_error) => return Ok(Reply::error(parse_error.to_string())),
        };

        if ctx.level < command.required_level() {
            tracing::debug!(
                "{} denied {:?} (level {})",
                ctx.author.id,
                input,
                ctx.level
            );
            return Ok(Reply::error(
                "You do not have permission to use this command.",
            ));
        }

        match command {
            Command::Apply => self.apply(ctx).await,
            Command::ApplicationNext => self.next(ctx).await,
            Command::ApplicationClose { target } => self.close(ctx, target).await,
            Command::ConfigMainCategory { group } => {
                self.workflow.settings().set_main_category(&group).await?;
                Ok(Reply::success(format!(
                    "Changed `main_category` to `{group}`."
                )))
            }
            Command::PositionsQuick {
                name,
                group,
                questions,
            } => match self.workflow.catalog().create(&name, group, questions).await {
                Ok(position) => Ok(Reply::success(format!(
                    "Added new position `{}` with `{}` questions.",
                    position.name,
                    position.questions.len()
                ))),
                Err(error) => self.render_error(error),
            },
            Command::PositionsAll => self.positions_all().await,
            Command::PositionsView { name } => self.positions_view(&name).await,
            Command::PositionsDelete { name } => {
                match self.workflow.catalog().delete(&name).await {
                    Ok(position) => Ok(Reply::success(format!("Deleted `{}`.", position.name))),
                    Err(WorkflowError::PositionNotFound { .. }) => {
                        Ok(Reply::error("No position with that name."))
                    }
                    Err(error) => self.render_error(error),
                }
            }
        }
    }

    /// Handle a plain (non-command) message. Returns `Ok(None)` when the
    /// message is not part of an application conversation.
    pub async fn on_message(
        &self,
        ctx: &CommandContext,
        content: &str,
    ) -> Result<Option<Reply>, WorkflowError> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        if self
            .workflow
            .awaiting_position_choice(&ctx.author.id, &ctx.channel_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        match self
            .workflow
            .choose_position(&ctx.author.id, &ctx.channel_id, content)
            .await
        {
            Ok(chosen) => {
                let question = chosen.first_question;
                Ok(Some(Reply {
                    messages: vec![
                        Message::info("Use `application next` to move to the next question."),
                        Message::info(question.text).titled(format!(
                            "Question {} out of {}",
                            question.number, question.total
                        )),
                    ],
                }))
            }
            Err(WorkflowError::PositionNotFound { input, suggestions }) => Ok(Some(
                Reply::error(position_not_found_body(&input, &suggestions)),
            )),
            // The application was closed between the check and the call.
            Err(WorkflowError::NotInApplication) => Ok(None),
            Err(fault) => Err(fault),
        }
    }

    async fn apply(&self, ctx: &CommandContext) -> Result<Reply, WorkflowError> {
        match self.workflow.start(&ctx.author).await {
            Ok(started) => {
                let list = started
                    .position_names
                    .iter()
                    .map(|name| format!("`{name}`"))
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(Reply {
                    messages: vec![
                        Message::success(format!(
                            "Started application in `{}`.",
                            started.channel_id
                        )),
                        Message::info(list)
                            .titled("Choose a position from this list:")
                            .in_channel(started.channel_id),
                    ],
                })
            }
            Err(error) => self.render_error(error),
        }
    }

    async fn next(&self, ctx: &CommandContext) -> Result<Reply, WorkflowError> {
        match self
            .workflow
            .advance(&ctx.author.id, &ctx.channel_id)
            .await
        {
            Ok(AdvanceOutcome::Question(question)) => Ok(Reply::single(
                Message::info(question.text).titled(format!(
                    "Question {} out of {}",
                    question.number, question.total
                )),
            )),
            Ok(AdvanceOutcome::Complete) => Ok(Reply::single(
                Message::success(
                    "We review the applications every week or so. \
                     Please wait for the Head of Staff to review your application!",
                )
                .titled("Congratulations, you have finished the application!")
                .with_footer("Please be patient and don't ping random staff members."),
            )),
            Err(error) => self.render_error(error),
        }
    }

    async fn close(
        &self,
        ctx: &CommandContext,
        target: Option<intake_core::UserId>,
    ) -> Result<Reply, WorkflowError> {
        match target {
            Some(user) => match self.workflow.close(CloseTarget::User(user.clone())).await {
                Ok(_) => Ok(Reply::success(format!("Closed application of `{user}`."))),
                Err(WorkflowError::RecordNotFound) => {
                    Ok(Reply::error("No active application found for this user."))
                }
                Err(error) => self.render_error(error),
            },
            None => match self
                .workflow
                .close(CloseTarget::Channel(ctx.channel_id.clone()))
                .await
            {
                Ok(record) => Ok(Reply::success(format!(
                    "Closed application of `{}`.",
                    record.user_id
                ))),
                Err(WorkflowError::RecordNotFound) => {
                    Ok(Reply::error("No application found for this channel."))
                }
                Err(error) => self.render_error(error),
            },
        }
    }

    async fn positions_all(&self) -> Result<Reply, WorkflowError> {
        let mut positions = self.workflow.catalog().list().await?;
        if positions.is_empty() {
            return Ok(Reply::error("No positions yet."));
        }
        positions.sort_by_key(|p| p.lowered_name.clone());

        let body = positions
            .iter()
            .map(|position| {
                let count = position.questions.len();
                let plural = if count == 1 { "" } else { "s" };
                format!("`{}` - {} question{}", position.name, count, plural)
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Reply::single(Message::info(body).titled("Positions")))
    }

    async fn positions_view(&self, name: &str) -> Result<Reply, WorkflowError> {
        match self.workflow.catalog().find(name).await? {
            Some(position) => {
                let body = position
                    .questions
                    .iter()
                    .map(|(number, text)| format!("{number}. `{text}`"))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(Reply::single(Message::info(body).titled(position.name)))
            }
            None => Ok(Reply::error("No position with that name.")),
        }
    }

    /// Recoverable conditions become error replies; collaborator faults
    /// propagate.
    fn render_error(&self, error: WorkflowError) -> Result<Reply, WorkflowError> {
        let body = match &error {
            WorkflowError::AlreadyInProgress => {
                "You already have an application in progress.".to_string()
            }
            WorkflowError::NoPositionsConfigured => "No positions to apply for.".to_string(),
            WorkflowError::NotConfigured => {
                "The application category has not been configured yet.".to_string()
            }
            WorkflowError::PositionNotFound { input, suggestions } => {
                position_not_found_body(input, suggestions)
            }
            WorkflowError::DuplicateName(_) => "Already a position with this name.".to_string(),
            WorkflowError::EmptyQuestionList => {
                "A position needs at least one question.".to_string()
            }
            WorkflowError::NotInApplication => {
                "You have to be in your application channel to use this command.".to_string()
            }
            WorkflowError::RecordNotFound => "No matching application found.".to_string(),
            WorkflowError::Store(_) | WorkflowError::Channel(_) => return Err(error),
        };
        Ok(Reply::error(body))
    }
}

fn position_not_found_body(input: &str, suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        format!("`{input}` not found.")
    } else {
        let close = suggestions
            .iter()
            .map(|name| format!("`{name}`"))
            .collect::<Vec<_>>()
            .join(" or ");
        format!("`{input}` not found. Did you mean {close}?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::ReplyKind;
    use async_trait::async_trait;
    use intake_core::{ChannelError, ChatHost, GroupId, MemoryStore, UserId};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct StubHost {
        next_id: AtomicU32,
        live: Mutex<Vec<ChannelId>>,
    }

    #[async_trait]
    impl ChatHost for StubHost {
        async fn create_private_channel(
            &self,
            _owner: &UserId,
            _name: &str,
            _group: &GroupId,
        ) -> Result<ChannelId, ChannelError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let channel = ChannelId(format!("chan-{id}"));
            self.live.lock().unwrap().push(channel.clone());
            Ok(channel)
        }

        async fn move_channel(
            &self,
            _channel: &ChannelId,
            _group: &GroupId,
        ) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn delete_channel(&self, channel: &ChannelId) -> Result<(), ChannelError> {
            self.live.lock().unwrap().retain(|c| c != channel);
            Ok(())
        }

        async fn channel_exists(&self, channel: &ChannelId) -> Result<bool, ChannelError> {
            Ok(self.live.lock().unwrap().contains(channel))
        }
    }

    fn router() -> CommandRouter {
        CommandRouter::new(ApplicationWorkflow::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StubHost::default()),
        ))
    }

    fn ctx(user: &str, channel: &str, level: PermissionLevel) -> CommandContext {
        CommandContext {
            author: Applicant::new(user, format!("User {user}"), "0001"),
            channel_id: ChannelId::from(channel),
            level,
        }
    }

    async fn seed(router: &CommandRouter) {
        let admin = ctx("u-admin", "c-admin", PermissionLevel::Admin);
        router
            .dispatch(&admin, "applyconfig maincategory grp-main")
            .await
            .unwrap();
        router
            .dispatch(&admin, "positions quick Moderator grp-mod Why?//How old?")
            .await
            .unwrap();
    }

    /// Start an application and answer the position prompt; returns the
    /// application channel's context.
    async fn start_and_choose(router: &CommandRouter, user: &str) -> CommandContext {
        let lobby = ctx(user, "c-lobby", PermissionLevel::Regular);
        let reply = router.dispatch(&lobby, "apply").await.unwrap();
        let channel = reply.messages[1].channel.clone().unwrap();
        let in_channel = CommandContext {
            channel_id: channel,
            ..lobby
        };
        router
            .on_message(&in_channel, "Moderator")
            .await
            .unwrap()
            .unwrap();
        in_channel
    }

    #[tokio::test]
    async fn apply_announces_and_prompts_in_new_channel() {
        let router = router();
        seed(&router).await;

        let lobby = ctx("u-1", "c-lobby", PermissionLevel::Regular);
        let reply = router.dispatch(&lobby, "apply").await.unwrap();

        assert_eq!(reply.messages.len(), 2);
        assert_eq!(reply.messages[0].kind, ReplyKind::Success);
        assert!(reply.messages[0].body.starts_with("Started application in"));
        assert_eq!(
            reply.messages[1].title.as_deref(),
            Some("Choose a position from this list:")
        );
        assert_eq!(reply.messages[1].body, "`Moderator`");
        assert!(reply.messages[1].channel.is_some());
    }

    #[tokio::test]
    async fn double_apply_is_rejected() {
        let router = router();
        seed(&router).await;

        let lobby = ctx("u-1", "c-lobby", PermissionLevel::Regular);
        router.dispatch(&lobby, "apply").await.unwrap();
        let reply = router.dispatch(&lobby, "apply").await.unwrap();
        assert_eq!(
            reply.messages[0].body,
            "You already have an application in progress."
        );
    }

    #[tokio::test]
    async fn apply_without_positions_is_rejected() {
        let router = router();
        let admin = ctx("u-admin", "c-admin", PermissionLevel::Admin);
        router
            .dispatch(&admin, "applyconfig maincategory grp-main")
            .await
            .unwrap();

        let lobby = ctx("u-1", "c-lobby", PermissionLevel::Regular);
        let reply = router.dispatch(&lobby, "apply").await.unwrap();
        assert_eq!(reply.messages[0].body, "No positions to apply for.");
    }

    #[tokio::test]
    async fn choose_retry_loop_over_messages() {
        let router = router();
        seed(&router).await;

        let lobby = ctx("u-1", "c-lobby", PermissionLevel::Regular);
        let reply = router.dispatch(&lobby, "apply").await.unwrap();
        let in_channel = CommandContext {
            channel_id: reply.messages[1].channel.clone().unwrap(),
            ..lobby
        };

        // Mistype: error with a suggestion, still awaiting.
        let retry = router
            .on_message(&in_channel, "Moderater")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            retry.messages[0].body,
            "`Moderater` not found. Did you mean `Moderator`?"
        );

        // Exact match: hint plus question 1 of 2.
        let chosen = router
            .on_message(&in_channel, "moderator")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chosen.messages.len(), 2);
        assert_eq!(
            chosen.messages[1].title.as_deref(),
            Some("Question 1 out of 2")
        );
        assert_eq!(chosen.messages[1].body, "Why?");

        // Once chosen, plain messages are answers, not protocol turns.
        assert!(router
            .on_message(&in_channel, "some answer text")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn messages_outside_application_channels_are_ignored() {
        let router = router();
        seed(&router).await;

        let elsewhere = ctx("u-1", "c-random", PermissionLevel::Regular);
        assert!(router
            .on_message(&elsewhere, "hello there")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn next_walks_questions_then_congratulates() {
        let router = router();
        seed(&router).await;
        let in_channel = start_and_choose(&router, "u-1").await;

        let second = router
            .dispatch(&in_channel, "application next")
            .await
            .unwrap();
        assert_eq!(
            second.messages[0].title.as_deref(),
            Some("Question 2 out of 2")
        );
        assert_eq!(second.messages[0].body, "How old?");

        for _ in 0..2 {
            let done = router
                .dispatch(&in_channel, "application next")
                .await
                .unwrap();
            assert_eq!(
                done.messages[0].title.as_deref(),
                Some("Congratulations, you have finished the application!")
            );
            assert!(done.messages[0].footer.is_some());
        }
    }

    #[tokio::test]
    async fn next_outside_application_channel_is_rejected() {
        let router = router();
        seed(&router).await;

        let lobby = ctx("u-1", "c-lobby", PermissionLevel::Regular);
        let reply = router.dispatch(&lobby, "application next").await.unwrap();
        assert_eq!(
            reply.messages[0].body,
            "You have to be in your application channel to use this command."
        );
    }

    #[tokio::test]
    async fn close_own_channel_needs_only_regular() {
        let router = router();
        seed(&router).await;
        let in_channel = start_and_choose(&router, "u-1").await;

        let reply = router
            .dispatch(&in_channel, "application close")
            .await
            .unwrap();
        assert_eq!(reply.messages[0].kind, ReplyKind::Success);
        assert_eq!(reply.messages[0].body, "Closed application of `u-1`.");
    }

    #[tokio::test]
    async fn close_other_requires_moderator() {
        let router = router();
        seed(&router).await;
        start_and_choose(&router, "u-target").await;

        let regular = ctx("u-1", "c-lobby", PermissionLevel::Regular);
        let denied = router
            .dispatch(&regular, "application close <@u-target>")
            .await
            .unwrap();
        assert_eq!(
            denied.messages[0].body,
            "You do not have permission to use this command."
        );

        let moderator = ctx("u-mod", "c-staff", PermissionLevel::Moderator);
        let closed = router
            .dispatch(&moderator, "application close <@u-target>")
            .await
            .unwrap();
        assert_eq!(
            closed.messages[0].body,
            "Closed application of `u-target`."
        );

        let again = router
            .dispatch(&moderator, "application close <@u-target>")
            .await
            .unwrap();
        assert_eq!(
            again.messages[0].body,
            "No active application found for this user."
        );
    }

    #[tokio::test]
    async fn close_in_channel_without_application_is_rejected() {
        let router = router();
        seed(&router).await;

        let lobby = ctx("u-1", "c-lobby", PermissionLevel::Regular);
        let reply = router
            .dispatch(&lobby, "application close")
            .await
            .unwrap();
        assert_eq!(
            reply.messages[0].body,
            "No application found for this channel."
        );
    }

    #[tokio::test]
    async fn positions_management_requires_admin() {
        let router = router();
        let moderator = ctx("u-mod", "c-staff", PermissionLevel::Moderator);
        let denied = router
            .dispatch(&moderator, "positions quick Mod grp Why?")
            .await
            .unwrap();
        assert_eq!(
            denied.messages[0].body,
            "You do not have permission to use this command."
        );
    }

    #[tokio::test]
    async fn positions_all_lists_sorted_with_counts() {
        let router = router();
        seed(&router).await;
        let admin = ctx("u-admin", "c-admin", PermissionLevel::Admin);
        router
            .dispatch(&admin, "positions quick Artist grp-art Draw!")
            .await
            .unwrap();

        let reply = router.dispatch(&admin, "positions all").await.unwrap();
        assert_eq!(reply.messages[0].title.as_deref(), Some("Positions"));
        assert_eq!(
            reply.messages[0].body,
            "`Artist` - 1 question\n`Moderator` - 2 questions"
        );
    }

    #[tokio::test]
    async fn positions_view_numbers_the_questions() {
        let router = router();
        seed(&router).await;
        let admin = ctx("u-admin", "c-admin", PermissionLevel::Admin);

        let reply = router
            .dispatch(&admin, "positions view moderator")
            .await
            .unwrap();
        assert_eq!(reply.messages[0].title.as_deref(), Some("Moderator"));
        assert_eq!(reply.messages[0].body, "1. `Why?`\n2. `How old?`");

        let missing = router
            .dispatch(&admin, "positions view ghost")
            .await
            .unwrap();
        assert_eq!(missing.messages[0].body, "No position with that name.");
    }

    #[tokio::test]
    async fn positions_delete_and_duplicate_create() {
        let router = router();
        seed(&router).await;
        let admin = ctx("u-admin", "c-admin", PermissionLevel::Admin);

        let duplicate = router
            .dispatch(&admin, "positions quick moderator grp-x Again?")
            .await
            .unwrap();
        assert_eq!(
            duplicate.messages[0].body,
            "Already a position with this name."
        );

        let deleted = router
            .dispatch(&admin, "positions delete Moderator")
            .await
            .unwrap();
        assert_eq!(deleted.messages[0].body, "Deleted `Moderator`.");

        let empty = router.dispatch(&admin, "positions all").await.unwrap();
        assert_eq!(empty.messages[0].body, "No positions yet.");
    }

    #[tokio::test]
    async fn unknown_and_malformed_commands_render_usage() {
        let router = router();
        let user = ctx("u-1", "c-1", PermissionLevel::Admin);

        let unknown = router.dispatch(&user, "frobnicate").await.unwrap();
        assert_eq!(unknown.messages[0].kind, ReplyKind::Error);

        let usage = router.dispatch(&user, "positions").await.unwrap();
        assert!(usage.messages[0].body.starts_with("usage:"));
    }
}
