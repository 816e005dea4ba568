//! Check-and-notify: read the list, run the Batch Checker, deliver the report.
//!
//! Shared by the scheduler and the `/checknow` command. Every failure ends up
//! as operator-visible text or a log line; nothing here returns an error.

use std::sync::Arc;

use chrono::Local;

use crate::{
    checker::{BatchChecker, CheckOutcome, NOTHING_TO_CHECK_TEXT},
    chunker::send_chunked,
    domain::ChatId,
    formatting::escape_html,
    messaging::port::MessagingPort,
    store::DomainStore,
};

pub const REPORT_CAPTION: &str = "📊 <b>Domain Status Report</b>";

/// What triggered a cycle (for logs only).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    Manual,
}

pub struct CheckCycle {
    store: Arc<dyn DomainStore>,
    checker: BatchChecker,
    messenger: Arc<dyn MessagingPort>,
    chat_id: ChatId,
    segment_limit: usize,
}

impl CheckCycle {
    pub fn new(
        store: Arc<dyn DomainStore>,
        checker: BatchChecker,
        messenger: Arc<dyn MessagingPort>,
        chat_id: ChatId,
        segment_limit: usize,
    ) -> Self {
        Self {
            store,
            checker,
            messenger,
            chat_id,
            segment_limit,
        }
    }

    pub async fn run(&self, trigger: Trigger) {
        tracing::info!(?trigger, "check cycle started");

        let domains = match self.store.read_all().await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(?trigger, "check cycle aborted: {e}");
                self.notify(&format!(
                    "❌ Failed to read domain list: {}",
                    escape_html(&e.to_string())
                ))
                .await;
                return;
            }
        };

        match self.checker.check(&domains).await {
            CheckOutcome::NothingToCheck => {
                tracing::info!(?trigger, "check cycle skipped: empty list");
                self.notify(NOTHING_TO_CHECK_TEXT).await;
            }
            CheckOutcome::Report(report) => {
                let caption = format!(
                    "{REPORT_CAPTION} ({})",
                    Local::now().format("%Y-%m-%d %H:%M")
                );
                let sent = send_chunked(
                    self.messenger.as_ref(),
                    self.chat_id,
                    &caption,
                    &report.text(),
                    self.segment_limit,
                )
                .await;
                tracing::info!(
                    ?trigger,
                    domains = domains.len(),
                    batches = report.batches,
                    failed_batches = report.failed_batches,
                    blocked = report.blocked,
                    segments = sent,
                    "check cycle finished"
                );
            }
        }
    }

    async fn notify(&self, html: &str) {
        if let Err(e) = self.messenger.send_html(self.chat_id, html).await {
            tracing::warn!(chat_id = self.chat_id.0, "failed to send notice: {e}");
        }
    }
}
