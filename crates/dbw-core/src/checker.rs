//! Batch Checker: splits the domain list into API-sized batches, queries the
//! remote status API once per batch, and merges the answers into one report.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{domain::DomainStatus, formatting::escape_html, Result};

pub const NOTHING_TO_CHECK_TEXT: &str = "📭 Domain list is empty, nothing to check.";

/// Remote status capability: "given N domain names, return blocked/not-blocked per name".
///
/// Implementations make exactly one attempt per call and enforce their own timeout.
#[async_trait]
pub trait StatusApi: Send + Sync {
    async fn check(&self, domains: &[String]) -> Result<Vec<DomainStatus>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The list was empty; no remote call was made.
    NothingToCheck,
    Report(CheckReport),
}

/// Lines accumulated over one check cycle, in batch order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub lines: Vec<String>,
    pub batches: usize,
    pub failed_batches: usize,
    pub blocked: usize,
}

impl CheckReport {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

pub fn render_status(status: &DomainStatus) -> String {
    let label = if status.blocked {
        "🚫 BLOCKED"
    } else {
        "✅ Not Blocked"
    };
    format!("{}: {label}", escape_html(&status.domain))
}

fn render_missing(domain: &str) -> String {
    format!("{}: ❔ No result", escape_html(domain))
}

fn render_batch_failure(index: usize, total: usize, reason: &str) -> String {
    format!(
        "⚠️ Batch {}/{total} failed: {}",
        index + 1,
        escape_html(reason)
    )
}

pub struct BatchChecker {
    api: Arc<dyn StatusApi>,
    batch_size: usize,
}

impl BatchChecker {
    pub fn new(api: Arc<dyn StatusApi>, batch_size: usize) -> Self {
        Self {
            api,
            batch_size: batch_size.max(1),
        }
    }

    /// Run one check cycle over `domains`.
    ///
    /// A failed batch becomes one inline line and the cycle moves on; the
    /// report is only returned once every batch has been attempted.
    pub async fn check(&self, domains: &[String]) -> CheckOutcome {
        if domains.is_empty() {
            return CheckOutcome::NothingToCheck;
        }

        let batches: Vec<&[String]> = domains.chunks(self.batch_size).collect();
        let total = batches.len();
        let mut report = CheckReport {
            batches: total,
            ..CheckReport::default()
        };

        for (idx, batch) in batches.into_iter().enumerate() {
            tracing::debug!(batch = idx + 1, total, size = batch.len(), "checking batch");
            match self.api.check(batch).await {
                Ok(statuses) => append_batch(&mut report, batch, statuses),
                Err(e) => {
                    tracing::warn!(batch = idx + 1, total, "status batch failed: {e}");
                    report.failed_batches += 1;
                    report
                        .lines
                        .push(render_batch_failure(idx, total, &e.to_string()));
                }
            }
        }

        CheckOutcome::Report(report)
    }
}

/// Results within a batch are sorted by domain name; requested domains the
/// API did not answer for are listed after them in request order.
fn append_batch(report: &mut CheckReport, batch: &[String], mut statuses: Vec<DomainStatus>) {
    statuses.sort_by(|a, b| a.domain.cmp(&b.domain));
    statuses.dedup_by(|a, b| a.domain == b.domain);

    for status in &statuses {
        if status.blocked {
            report.blocked += 1;
        }
        report.lines.push(render_status(status));
    }

    for domain in batch {
        if !statuses.iter().any(|s| &s.domain == domain) {
            report.lines.push(render_missing(domain));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStatusApi {
        calls: Mutex<Vec<Vec<String>>>,
        blocked: HashSet<String>,
        fail_calls: HashSet<usize>,
    }

    impl FakeStatusApi {
        fn blocking(domains: &[&str]) -> Self {
            Self {
                blocked: domains.iter().map(|d| d.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl StatusApi for FakeStatusApi {
        async fn check(&self, domains: &[String]) -> Result<Vec<DomainStatus>> {
            let call_idx = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(domains.to_vec());
                calls.len() - 1
            };
            if self.fail_calls.contains(&call_idx) {
                return Err(Error::RemoteCall("connection reset".to_string()));
            }
            // Answer in reverse order to prove the checker does not rely on it.
            Ok(domains
                .iter()
                .rev()
                .map(|d| DomainStatus::new(d.clone(), self.blocked.contains(d)))
                .collect())
        }
    }

    fn domains(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("d{i:03}.com")).collect()
    }

    #[tokio::test]
    async fn empty_list_makes_no_remote_calls() {
        let api = Arc::new(FakeStatusApi::default());
        let checker = BatchChecker::new(api.clone(), 30);
        assert_eq!(checker.check(&[]).await, CheckOutcome::NothingToCheck);
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forty_five_domains_take_two_calls_of_30_and_15() {
        let api = Arc::new(FakeStatusApi::default());
        let checker = BatchChecker::new(api.clone(), 30);
        let list = domains(45);
        checker.check(&list).await;

        let calls = api.calls.lock().unwrap();
        let sizes: Vec<usize> = calls.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![30, 15]);
    }

    #[tokio::test]
    async fn batches_cover_every_domain_once_in_order() {
        for (n, b) in [(1, 30), (30, 30), (31, 30), (7, 3), (100, 7), (12, 1)] {
            let api = Arc::new(FakeStatusApi::default());
            let checker = BatchChecker::new(api.clone(), b);
            let list = domains(n);
            let CheckOutcome::Report(report) = checker.check(&list).await else {
                panic!("expected a report for {n} domains");
            };

            let calls = api.calls.lock().unwrap();
            assert_eq!(calls.len(), n.div_ceil(b), "n={n} b={b}");
            assert_eq!(report.batches, calls.len());
            assert!(calls.iter().all(|c| !c.is_empty() && c.len() <= b));
            let flat: Vec<String> = calls.iter().flatten().cloned().collect();
            assert_eq!(flat, list);
        }
    }

    #[tokio::test]
    async fn renders_blocked_and_not_blocked_lines() {
        let api = Arc::new(FakeStatusApi::blocking(&["b.com"]));
        let checker = BatchChecker::new(api, 30);
        let CheckOutcome::Report(report) = checker
            .check(&["a.com".to_string(), "b.com".to_string()])
            .await
        else {
            panic!("expected a report");
        };

        let lines: HashSet<&str> = report.lines.iter().map(String::as_str).collect();
        assert_eq!(
            lines,
            HashSet::from(["a.com: ✅ Not Blocked", "b.com: 🚫 BLOCKED"])
        );
        assert_eq!(report.blocked, 1);
    }

    #[tokio::test]
    async fn batch_order_is_preserved_and_sorted_within() {
        let api = Arc::new(FakeStatusApi::default());
        let checker = BatchChecker::new(api, 2);
        let list: Vec<String> = ["z.com", "y.com", "b.com", "a.com"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let CheckOutcome::Report(report) = checker.check(&list).await else {
            panic!("expected a report");
        };
        assert_eq!(
            report.lines,
            vec![
                "y.com: ✅ Not Blocked",
                "z.com: ✅ Not Blocked",
                "a.com: ✅ Not Blocked",
                "b.com: ✅ Not Blocked",
            ]
        );
    }

    #[tokio::test]
    async fn failed_batch_is_reported_inline_and_cycle_continues() {
        let api = Arc::new(FakeStatusApi {
            fail_calls: HashSet::from([0]),
            ..FakeStatusApi::default()
        });
        let checker = BatchChecker::new(api.clone(), 2);
        let list = domains(3);
        let CheckOutcome::Report(report) = checker.check(&list).await else {
            panic!("expected a report");
        };

        assert_eq!(api.calls.lock().unwrap().len(), 2);
        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.lines.len(), 2);
        assert!(report.lines[0].starts_with("⚠️ Batch 1/2 failed:"));
        assert!(report.lines[0].contains("connection reset"));
        assert_eq!(report.lines[1], "d002.com: ✅ Not Blocked");
    }

    struct PartialApi;

    #[async_trait]
    impl StatusApi for PartialApi {
        async fn check(&self, domains: &[String]) -> Result<Vec<DomainStatus>> {
            Ok(domains
                .iter()
                .skip(1)
                .map(|d| DomainStatus::new(d.clone(), true))
                .collect())
        }
    }

    #[tokio::test]
    async fn unanswered_domains_are_listed() {
        let checker = BatchChecker::new(Arc::new(PartialApi), 30);
        let CheckOutcome::Report(report) = checker
            .check(&["a.com".to_string(), "b.com".to_string()])
            .await
        else {
            panic!("expected a report");
        };
        assert_eq!(
            report.lines,
            vec!["b.com: 🚫 BLOCKED", "a.com: ❔ No result"]
        );
    }
}
