use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// One repository discovered directly under the projects root.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    /// Reserved for a future detector; the scanner leaves it unset.
    pub language: Option<String>,
    pub git: GitStatus,
}

/// Snapshot of a repository's git state, taken by one probe.
#[derive(Debug, Clone)]
pub struct GitStatus {
    /// Current branch short name.
    pub branch: String,
    /// Upstream tracking ref; empty if none is configured.
    pub remote: String,
    /// Modified + untracked entries in the working tree.
    pub uncommitted: usize,
    /// Commits on HEAD not reachable from upstream.
    pub unpushed: usize,
    /// Commits on upstream not reachable from HEAD.
    pub unpulled: usize,
    pub last_commit_msg: String,
    pub last_commit_author: String,
    /// None when the history is empty or the query failed.
    pub last_commit_time: Option<DateTime<Utc>>,
    pub status: StatusKind,
}

impl Default for GitStatus {
    fn default() -> Self {
        GitStatus {
            branch: String::new(),
            remote: String::new(),
            uncommitted: 0,
            unpushed: 0,
            unpulled: 0,
            last_commit_msg: String::new(),
            last_commit_author: String::new(),
            last_commit_time: None,
            // Empty remote and nothing uncommitted derives to NoRemote.
            status: StatusKind::NoRemote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Clean,
    Dirty,
    Ahead,
    Behind,
    Diverged,
    NoRemote,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusKind::Clean => "clean",
            StatusKind::Dirty => "dirty",
            StatusKind::Ahead => "ahead",
            StatusKind::Behind => "behind",
            StatusKind::Diverged => "diverged",
            StatusKind::NoRemote => "no-remote",
        };
        f.write_str(s)
    }
}

/// Derive the status kind from the probe counts. First match wins:
/// no upstream trumps everything except dirtiness, dirtiness trumps
/// ahead/behind, and diverged means both directions are non-zero.
pub fn derive_status(
    has_remote: bool,
    uncommitted: usize,
    unpushed: usize,
    unpulled: usize,
) -> StatusKind {
    if !has_remote {
        if uncommitted == 0 {
            return StatusKind::NoRemote;
        }
        return StatusKind::Dirty;
    }
    if uncommitted > 0 {
        return StatusKind::Dirty;
    }
    if unpushed > 0 && unpulled > 0 {
        return StatusKind::Diverged;
    }
    if unpushed > 0 {
        return StatusKind::Ahead;
    }
    if unpulled > 0 {
        return StatusKind::Behind;
    }
    StatusKind::Clean
}
