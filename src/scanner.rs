use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::git::GitClient;
use crate::project::{GitStatus, Project};

/// Result of one full scan of the projects root.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub projects: Vec<Project>,
    /// Probes that errored; their projects are still included with
    /// zero-valued status.
    pub probe_failures: usize,
}

/// Discovers repositories one level under the projects root and probes
/// them with a bounded pool of worker threads.
pub struct Scanner {
    root: PathBuf,
    concurrency: usize,
    git: GitClient,
}

impl Scanner {
    pub fn new(root: PathBuf, concurrency: usize, git_timeout: Duration) -> Self {
        let concurrency = if concurrency == 0 { 10 } else { concurrency };
        Scanner {
            root,
            concurrency,
            git: GitClient::new(git_timeout),
        }
    }

    /// Scan the root. Only failure to enumerate the root itself is an error;
    /// individual probe failures are logged and counted.
    pub fn scan(&self) -> Result<ScanOutcome> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("reading projects root {}", self.root.display()))?;

        let mut dirs: Vec<PathBuf> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<PathBuf>();
        for dir in dirs {
            // Receiver is alive below; unbounded send can't block.
            let _ = job_tx.send(dir);
        }
        drop(job_tx);

        let failures = AtomicUsize::new(0);
        let mut projects: Vec<Project> = Vec::new();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.concurrency)
                .map(|_| {
                    let job_rx = job_rx.clone();
                    let failures = &failures;
                    scope.spawn(move || {
                        let mut found = Vec::new();
                        for dir in job_rx.iter() {
                            if let Some(project) = self.probe_dir(&dir, failures) {
                                found.push(project);
                            }
                        }
                        found
                    })
                })
                .collect();

            for handle in handles {
                if let Ok(found) = handle.join() {
                    projects.extend(found);
                }
            }
        });

        Ok(ScanOutcome {
            projects,
            probe_failures: failures.load(Ordering::Relaxed),
        })
    }

    /// Probe a single candidate directory. Returns None unless it holds a
    /// `.git` directory (a `.git` file means a worktree or submodule link;
    /// those are not top-level repositories).
    fn probe_dir(&self, dir: &Path, failures: &AtomicUsize) -> Option<Project> {
        if !dir.join(".git").is_dir() {
            return None;
        }

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let git = match self.git.status(dir) {
            Ok(status) => status,
            Err(err) => {
                tracing::debug!(path = %dir.display(), error = %err, "git probe failed");
                failures.fetch_add(1, Ordering::Relaxed);
                GitStatus::default()
            }
        };

        Some(Project {
            name,
            path: dir.to_path_buf(),
            language: None,
            git,
        })
    }
}
