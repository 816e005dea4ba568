//! Domain Store: the durable, ordered, duplicate-free list of monitored domains.
//!
//! Every operation holds one exclusive lock for its whole duration. `add` and
//! `remove` check and rewrite under the same acquisition, so concurrent
//! mutations cannot interleave between the membership test and the write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{errors::Error, Result};

pub const EMPTY_LIST_TEXT: &str = "The domain list is empty.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added(String),
    AlreadyPresent(String),
    /// No domain argument was supplied.
    MissingDomain,
    /// The argument spans more than one line.
    InvalidDomain,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(String),
    NotFound(String),
    /// No domain argument was supplied.
    MissingDomain,
    /// The argument spans more than one line.
    InvalidDomain,
}

#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Full list in insertion order. An empty list is `Ok(vec![])`.
    async fn read_all(&self) -> Result<Vec<String>>;

    async fn add(&self, domain: &str) -> Result<AddOutcome>;

    async fn remove(&self, domain: &str) -> Result<RemoveOutcome>;

    /// Newline-joined list, or [`EMPTY_LIST_TEXT`] when there is nothing stored.
    async fn list_all(&self) -> Result<String> {
        let domains = self.read_all().await?;
        Ok(render_list(&domains))
    }
}

pub fn render_list(domains: &[String]) -> String {
    if domains.is_empty() {
        return EMPTY_LIST_TEXT.to_string();
    }
    domains.join("\n")
}

fn parse_list(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        // Tolerate hand-edited files: keep the first occurrence only.
        if !out.iter().any(|d| d == line) {
            out.push(line.to_string());
        }
    }
    out
}

/// A raw command argument, checked before the store is touched.
enum DomainArg<'a> {
    Missing,
    MultiLine,
    Domain(&'a str),
}

impl<'a> DomainArg<'a> {
    fn parse(raw: &'a str) -> Self {
        let domain = raw.trim();
        if domain.is_empty() {
            Self::Missing
        } else if domain.contains(|c: char| c == '\n' || c == '\r') {
            // Would be written out as several list entries.
            Self::MultiLine
        } else {
            Self::Domain(domain)
        }
    }
}

fn apply_add(domains: &mut Vec<String>, domain: &str) -> AddOutcome {
    if domains.iter().any(|d| d == domain) {
        return AddOutcome::AlreadyPresent(domain.to_string());
    }
    domains.push(domain.to_string());
    AddOutcome::Added(domain.to_string())
}

fn apply_remove(domains: &mut Vec<String>, domain: &str) -> RemoveOutcome {
    match domains.iter().position(|d| d == domain) {
        Some(idx) => {
            domains.remove(idx);
            RemoveOutcome::Removed(domain.to_string())
        }
        None => RemoveOutcome::NotFound(domain.to_string()),
    }
}

// ============== File-backed store ==============

/// Newline-separated text file, rewritten in full on every mutation.
///
/// The file must exist before first use; see [`FileDomainStore::ensure_exists`].
pub struct FileDomainStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileDomainStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and an empty list file if missing.
    /// Called once by the process at startup.
    pub async fn ensure_exists(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::store(path, e))?;
        }
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| Error::store(path, e))?
        {
            return Ok(());
        }
        tokio::fs::write(path, "")
            .await
            .map_err(|e| Error::store(path, e))
    }

    async fn load(&self) -> Result<Vec<String>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::store(&self.path, e))?;
        Ok(parse_list(&text))
    }

    async fn persist(&self, domains: &[String]) -> Result<()> {
        let mut text = domains.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| Error::store(&self.path, e))
    }
}

#[async_trait]
impl DomainStore for FileDomainStore {
    async fn read_all(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn add(&self, domain: &str) -> Result<AddOutcome> {
        let domain = match DomainArg::parse(domain) {
            DomainArg::Missing => return Ok(AddOutcome::MissingDomain),
            DomainArg::MultiLine => return Ok(AddOutcome::InvalidDomain),
            DomainArg::Domain(d) => d,
        };

        let _guard = self.lock.lock().await;
        let mut domains = self.load().await?;
        let outcome = apply_add(&mut domains, domain);
        if matches!(outcome, AddOutcome::Added(_)) {
            self.persist(&domains).await?;
        }
        Ok(outcome)
    }

    async fn remove(&self, domain: &str) -> Result<RemoveOutcome> {
        let domain = match DomainArg::parse(domain) {
            DomainArg::Missing => return Ok(RemoveOutcome::MissingDomain),
            DomainArg::MultiLine => return Ok(RemoveOutcome::InvalidDomain),
            DomainArg::Domain(d) => d,
        };

        let _guard = self.lock.lock().await;
        let mut domains = self.load().await?;
        let outcome = apply_remove(&mut domains, domain);
        if matches!(outcome, RemoveOutcome::Removed(_)) {
            self.persist(&domains).await?;
        }
        Ok(outcome)
    }
}

// ============== In-memory store ==============

#[derive(Default)]
pub struct MemoryDomainStore {
    domains: Mutex<Vec<String>>,
}

impl MemoryDomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for d in domains {
            let d: String = d.into();
            if let DomainArg::Domain(d) = DomainArg::parse(&d) {
                apply_add(&mut out, d);
            }
        }
        Self {
            domains: Mutex::new(out),
        }
    }
}

#[async_trait]
impl DomainStore for MemoryDomainStore {
    async fn read_all(&self) -> Result<Vec<String>> {
        Ok(self.domains.lock().await.clone())
    }

    async fn add(&self, domain: &str) -> Result<AddOutcome> {
        Ok(match DomainArg::parse(domain) {
            DomainArg::Missing => AddOutcome::MissingDomain,
            DomainArg::MultiLine => AddOutcome::InvalidDomain,
            DomainArg::Domain(d) => apply_add(&mut *self.domains.lock().await, d),
        })
    }

    async fn remove(&self, domain: &str) -> Result<RemoveOutcome> {
        Ok(match DomainArg::parse(domain) {
            DomainArg::Missing => RemoveOutcome::MissingDomain,
            DomainArg::MultiLine => RemoveOutcome::InvalidDomain,
            DomainArg::Domain(d) => apply_remove(&mut *self.domains.lock().await, d),
        })
    }
}
