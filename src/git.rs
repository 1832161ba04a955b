use chrono::{DateTime, TimeZone, Utc};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use wait_timeout::ChildExt;

use crate::project::{derive_status, GitStatus};

#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("git {command}: {stderr}")]
    Failed { command: String, stderr: String },
    #[error("git {command} timed out")]
    Timeout { command: String },
    #[error("unexpected git output: {0}")]
    Parse(String),
}

/// Probes a single repository by shelling out to the git executable.
///
/// The whole probe shares one deadline: queries issued after it has passed
/// fail immediately instead of stacking timeouts.
pub struct GitClient {
    timeout: Duration,
}

impl GitClient {
    pub fn new(timeout: Duration) -> Self {
        let timeout = if timeout.is_zero() {
            Duration::from_secs(5)
        } else {
            timeout
        };
        GitClient { timeout }
    }

    /// Collect the git status for the repository at `path`.
    ///
    /// Only a failed branch query fails the probe; every other query
    /// degrades to its zero value and is logged at debug level.
    pub fn status(&self, path: &Path) -> Result<GitStatus, GitError> {
        let deadline = Instant::now() + self.timeout;
        let mut status = GitStatus::default();

        status.branch = self
            .run(path, &["rev-parse", "--abbrev-ref", "HEAD"], deadline)?
            .trim()
            .to_string();

        // Exits non-zero when no upstream is configured; that's not an error.
        match self.run(path, &["rev-parse", "--abbrev-ref", "@{u}"], deadline) {
            Ok(out) => status.remote = out.trim().to_string(),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "no remote tracking");
            }
        }

        match self.run(path, &["status", "--porcelain"], deadline) {
            Ok(out) => status.uncommitted = count_entries(&out),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "getting uncommitted");
            }
        }

        if !status.remote.is_empty() {
            match self
                .run(path, &["rev-list", "@{u}..HEAD", "--count"], deadline)
                .and_then(parse_count)
            {
                Ok(n) => status.unpushed = n,
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "getting unpushed");
                }
            }

            match self
                .run(path, &["rev-list", "HEAD..@{u}", "--count"], deadline)
                .and_then(parse_count)
            {
                Ok(n) => status.unpulled = n,
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "getting unpulled");
                }
            }
        }

        match self.run(path, &["log", "-1", "--format=%s|%an|%ct"], deadline) {
            Ok(out) => match parse_last_commit(&out) {
                Ok((msg, author, time)) => {
                    status.last_commit_msg = msg;
                    status.last_commit_author = author;
                    status.last_commit_time = time;
                }
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "parsing last commit");
                }
            },
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "getting last commit");
            }
        }

        status.status = derive_status(
            !status.remote.is_empty(),
            status.uncommitted,
            status.unpushed,
            status.unpulled,
        );

        Ok(status)
    }

    /// Run one git invocation with `dir` as working directory, bounded by
    /// whatever is left of the probe deadline. The child is killed on expiry.
    fn run(&self, dir: &Path, args: &[&str], deadline: Instant) -> Result<String, GitError> {
        let command = args.first().copied().unwrap_or("git").to_string();

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(GitError::Timeout { command });
        }

        let mut child = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Drain both pipes on threads so the child can't block on a full pipe
        // while we wait on it.
        let stdout = child.stdout.take();
        let stdout_thread = std::thread::spawn(move || read_all(stdout));
        let stderr = child.stderr.take();
        let stderr_thread = std::thread::spawn(move || read_all(stderr));

        match child.wait_timeout(remaining) {
            Ok(Some(exit)) => {
                let stdout = stdout_thread.join().unwrap_or_default();
                let stderr = stderr_thread.join().unwrap_or_default();
                if exit.success() {
                    Ok(stdout)
                } else {
                    Err(GitError::Failed {
                        command,
                        stderr: stderr.trim().to_string(),
                    })
                }
            }
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(GitError::Timeout { command })
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(GitError::Spawn { command, source })
            }
        }
    }
}

fn read_all<R: Read>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Count porcelain status entries (one per non-blank line).
fn count_entries(porcelain: &str) -> usize {
    porcelain.lines().filter(|l| !l.trim().is_empty()).count()
}

fn parse_count(out: String) -> Result<usize, GitError> {
    let trimmed = out.trim();
    trimmed
        .parse()
        .map_err(|_| GitError::Parse(format!("expected a count, got {trimmed:?}")))
}

/// Parse `subject|author|epochSeconds` from `git log -1`.
fn parse_last_commit(out: &str) -> Result<(String, String, Option<DateTime<Utc>>), GitError> {
    let line = out.trim();
    let mut parts = line.splitn(3, '|');
    let (subject, author, epoch) = match (parts.next(), parts.next(), parts.next()) {
        (Some(s), Some(a), Some(t)) => (s, a, t),
        _ => return Err(GitError::Parse(format!("unexpected log format: {line:?}"))),
    };
    let secs: i64 = epoch
        .trim()
        .parse()
        .map_err(|_| GitError::Parse(format!("bad commit timestamp: {epoch:?}")))?;
    let time = if secs == 0 {
        None
    } else {
        Utc.timestamp_opt(secs, 0).single()
    };
    Ok((subject.to_string(), author.to_string(), time))
}
