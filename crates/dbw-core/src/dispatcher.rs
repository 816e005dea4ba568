//! Command Dispatcher: stateless handling of operator commands.
//!
//! Every reply goes out either as one message or through the chunker.

use std::{sync::Arc, time::Duration};

use crate::{
    chunker::send_chunked,
    cycle::{CheckCycle, Trigger},
    domain::ChatId,
    formatting::escape_html,
    messaging::{port::MessagingPort, types::Command},
    security::is_operator,
    store::{AddOutcome, DomainStore, RemoveOutcome},
};

pub const LIST_CAPTION: &str = "📋 <b>Monitored Domains</b>";
pub const CHECK_ACK_TEXT: &str = "⏳ Checking all domains now. The report will follow shortly.";
pub const UNKNOWN_COMMAND_TEXT: &str =
    "❓ Unknown command. Send /start to see what I can do.";
pub const ONE_DOMAIN_TEXT: &str = "⚠️ Send one domain per command, on a single line.";

pub struct CommandDispatcher {
    operator: ChatId,
    store: Arc<dyn DomainStore>,
    cycle: Arc<CheckCycle>,
    messenger: Arc<dyn MessagingPort>,
    segment_limit: usize,
    check_interval: Duration,
}

impl CommandDispatcher {
    pub fn new(
        operator: ChatId,
        store: Arc<dyn DomainStore>,
        cycle: Arc<CheckCycle>,
        messenger: Arc<dyn MessagingPort>,
        segment_limit: usize,
        check_interval: Duration,
    ) -> Self {
        Self {
            operator,
            store,
            cycle,
            messenger,
            segment_limit,
            check_interval,
        }
    }

    /// Handle one inbound command. Messages from anyone but the operator are
    /// dropped without a reply.
    pub async fn handle(&self, cmd: Command) {
        if !is_operator(Some(cmd.chat_id), self.operator) {
            tracing::debug!(
                chat_id = cmd.chat_id.0,
                username = cmd.username.as_deref().unwrap_or("unknown"),
                "dropping message from non-operator chat"
            );
            return;
        }

        tracing::info!(command = %cmd.name, "operator command");

        match cmd.name.as_str() {
            "start" | "help" => self.reply(&self.help_text()).await,
            "add" => self.add(&cmd.args).await,
            "remove" => self.remove(&cmd.args).await,
            "list" => self.list().await,
            "checknow" => self.check_now().await,
            _ => self.reply(UNKNOWN_COMMAND_TEXT).await,
        }
    }

    fn help_text(&self) -> String {
        let minutes = (self.check_interval.as_secs() / 60).max(1);
        format!(
            "🤖 <b>Domain Watch Bot</b>\n\n\
I check your domains for blocking every {minutes} min and report back here.\n\n\
<b>📋 Commands:</b>\n\
/add &lt;domain&gt; - Start monitoring a domain\n\
/remove &lt;domain&gt; - Stop monitoring a domain\n\
/list - Show monitored domains\n\
/checknow - Run a check immediately\n\
/start - Show this help message"
        )
    }

    async fn add(&self, arg: &str) {
        let text = match self.store.add(arg).await {
            Ok(AddOutcome::Added(d)) => {
                format!("✅ Added <code>{}</code> to the list.", escape_html(&d))
            }
            Ok(AddOutcome::AlreadyPresent(d)) => format!(
                "ℹ️ <code>{}</code> is already in the list.",
                escape_html(&d)
            ),
            Ok(AddOutcome::MissingDomain) => {
                "Usage: /add &lt;domain&gt;\nExample: /add example.com".to_string()
            }
            Ok(AddOutcome::InvalidDomain) => ONE_DOMAIN_TEXT.to_string(),
            Err(e) => self.store_failure(&e),
        };
        self.reply(&text).await;
    }

    async fn remove(&self, arg: &str) {
        let text = match self.store.remove(arg).await {
            Ok(RemoveOutcome::Removed(d)) => {
                format!("🗑️ Removed <code>{}</code> from the list.", escape_html(&d))
            }
            Ok(RemoveOutcome::NotFound(d)) => {
                format!("ℹ️ <code>{}</code> is not in the list.", escape_html(&d))
            }
            Ok(RemoveOutcome::MissingDomain) => {
                "Usage: /remove &lt;domain&gt;\nExample: /remove example.com".to_string()
            }
            Ok(RemoveOutcome::InvalidDomain) => ONE_DOMAIN_TEXT.to_string(),
            Err(e) => self.store_failure(&e),
        };
        self.reply(&text).await;
    }

    async fn list(&self) {
        match self.store.list_all().await {
            Ok(text) => {
                send_chunked(
                    self.messenger.as_ref(),
                    self.operator,
                    LIST_CAPTION,
                    &escape_html(&text),
                    self.segment_limit,
                )
                .await;
            }
            Err(e) => {
                let text = self.store_failure(&e);
                self.reply(&text).await;
            }
        }
    }

    /// Acknowledge, then run the cycle in a detached task so the update loop
    /// keeps consuming messages while the remote calls are in flight.
    async fn check_now(&self) {
        self.reply(CHECK_ACK_TEXT).await;
        let cycle = self.cycle.clone();
        tokio::spawn(async move { cycle.run(Trigger::Manual).await });
    }

    fn store_failure(&self, e: &crate::Error) -> String {
        tracing::error!("domain store operation failed: {e}");
        format!(
            "❌ Domain list is unavailable: {}",
            escape_html(&e.to_string())
        )
    }

    async fn reply(&self, html: &str) {
        if let Err(e) = self.messenger.send_html(self.operator, html).await {
            tracing::warn!(chat_id = self.operator.0, "failed to send reply: {e}");
        }
    }
}
