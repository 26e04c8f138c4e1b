//! Boundary data sources.
//!
//! The pipeline itself never talks to an issue tracker or a repository;
//! it consumes [`Issue`] and [`Commit`] records produced once per run by
//! these sources. The git-backed commit source restricts changed files by
//! change type, excluding pure deletions, matching how resolving commits
//! relate to issue patches.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use git2::{Delta, DiffFormat, DiffOptions, Repository};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::errors::{Result, TracelinkError};
use crate::core::types::{Commit, CommitHash, Issue};
use crate::io::diff::patch_paths;

/// Produces the studied issue set.
pub trait IssueSource {
    /// Load every studied issue.
    fn load_issues(&self) -> Result<Vec<Issue>>;
}

/// Produces the studied commit set.
pub trait CommitSource {
    /// Load every studied commit.
    fn load_commits(&self) -> Result<Vec<Commit>>;
}

/// Produces per-commit diff text for NSD extraction.
pub trait DiffSource {
    /// Unified diff of one commit with the given context-line count.
    fn diff_text(&self, hash: &str, context_lines: u32) -> Result<String>;
}

/// Produces per-commit documentation-comment text.
///
/// The text is the concatenated doc-comment content of the source files a
/// commit changed, as they stand in that commit's tree.
pub trait CommentSource {
    /// Doc-comment text of one commit's changed source files.
    fn comment_text(&self, hash: &str, source_extensions: &[String]) -> Result<String>;
}

/// Issue records loaded from a JSON export of the tracker database.
#[derive(Debug, Clone)]
pub struct JsonIssueSource {
    path: PathBuf,
}

impl JsonIssueSource {
    /// Point the source at a JSON file holding an array of issue records.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IssueSource for JsonIssueSource {
    fn load_issues(&self) -> Result<Vec<Issue>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            TracelinkError::io(
                format!("Failed to read issue export: {}", self.path.display()),
                e,
            )
        })?;
        let mut issues: Vec<Issue> = serde_json::from_str(&content)?;
        // Derive patch file sets for records that ship raw patch text in
        // the description field convention "patch:".
        for issue in &mut issues {
            if issue.patch_paths.is_empty() {
                if let Some(description) = &issue.description {
                    issue.patch_paths = patch_paths(description);
                }
            }
        }
        debug!(count = issues.len(), "loaded issue export");
        Ok(issues)
    }
}

/// Pre-loaded records, used by tests and by callers that assemble their
/// own extraction step.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    /// Studied issues
    pub issues: Vec<Issue>,
    /// Studied commits
    pub commits: Vec<Commit>,
}

impl IssueSource for InMemorySource {
    fn load_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.issues.clone())
    }
}

impl CommitSource for InMemorySource {
    fn load_commits(&self) -> Result<Vec<Commit>> {
        Ok(self.commits.clone())
    }
}

/// Commit records read from a local git repository via libgit2.
pub struct GitCommitSource {
    repo: Repository,
    hashes: Option<Vec<CommitHash>>,
}

impl GitCommitSource {
    /// Open a repository; `hashes` restricts the studied set, `None`
    /// walks every non-merge commit reachable from HEAD.
    pub fn open(path: impl AsRef<Path>, hashes: Option<Vec<CommitHash>>) -> Result<Self> {
        let repo = Repository::open(path.as_ref())?;
        Ok(Self { repo, hashes })
    }

    fn to_commit(&self, commit: &git2::Commit<'_>) -> Result<Commit> {
        let author = commit.author();
        let committer = commit.committer();
        Ok(Commit {
            hash: commit.id().to_string(),
            author: author.name().unwrap_or_default().to_string(),
            committer: committer.name().unwrap_or_default().to_string(),
            author_date: git_time_to_utc(&author.when())?,
            commit_date: git_time_to_utc(&committer.when())?,
            message: commit.message().unwrap_or_default().to_string(),
            files: self.changed_files(commit)?,
        })
    }

    /// Changed file paths, excluding pure deletions.
    fn changed_files(&self, commit: &git2::Commit<'_>) -> Result<Vec<String>> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0)?.tree()?),
        };
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            if delta.status() == Delta::Deleted {
                continue;
            }
            if let Some(path) = delta.new_file().path() {
                files.push(path.to_string_lossy().into_owned());
            }
        }
        Ok(files)
    }

    fn lookup(&self, hash: &str) -> Result<git2::Commit<'_>> {
        let oid = git2::Oid::from_str(hash)
            .map_err(|_| TracelinkError::missing_commit(hash))?;
        self.repo
            .find_commit(oid)
            .map_err(|_| TracelinkError::missing_commit(hash))
    }
}

impl CommitSource for GitCommitSource {
    fn load_commits(&self) -> Result<Vec<Commit>> {
        let mut commits = Vec::new();
        match &self.hashes {
            Some(hashes) => {
                for hash in hashes {
                    commits.push(self.to_commit(&self.lookup(hash)?)?);
                }
            }
            None => {
                let mut walk = self.repo.revwalk()?;
                walk.push_head()?;
                for oid in walk {
                    let commit = self.repo.find_commit(oid?)?;
                    // Merge commits carry no resolving change of their own.
                    if commit.parent_count() > 1 {
                        continue;
                    }
                    commits.push(self.to_commit(&commit)?);
                }
            }
        }
        debug!(count = commits.len(), "loaded commit records");
        Ok(commits)
    }
}

impl DiffSource for GitCommitSource {
    fn diff_text(&self, hash: &str, context_lines: u32) -> Result<String> {
        let commit = self.lookup(hash)?;
        let tree = commit.tree()?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0)?.tree()?),
        };
        let mut options = DiffOptions::new();
        options.context_lines(context_lines);
        let diff =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut options))?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_, _, line| {
            match line.origin() {
                '+' | '-' | ' ' => text.push(line.origin()),
                _ => {}
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(text)
    }
}

impl CommentSource for GitCommitSource {
    fn comment_text(&self, hash: &str, source_extensions: &[String]) -> Result<String> {
        let commit = self.lookup(hash)?;
        let tree = commit.tree()?;

        let mut text = String::new();
        for file in self.changed_files(&commit)? {
            if !source_extensions.iter().any(|ext| file.ends_with(ext.as_str())) {
                continue;
            }
            // A changed file can still be absent from the tree when the
            // path crossed a rename; it simply contributes no text.
            let Ok(entry) = tree.get_path(Path::new(&file)) else {
                continue;
            };
            let object = entry.to_object(&self.repo)?;
            if let Some(blob) = object.as_blob() {
                let content = String::from_utf8_lossy(blob.content());
                text.push_str(&doc_comment_text(&content));
            }
        }
        Ok(text)
    }
}

static DOC_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*\*(.*?)\*/").unwrap());

/// Content of every `/** ... */` doc block in a source file, one line per
/// non-empty block line with the leading asterisk gutter stripped.
pub fn doc_comment_text(source: &str) -> String {
    let mut text = String::new();
    for captures in DOC_BLOCK.captures_iter(source) {
        for line in captures[1].lines() {
            let stripped = line.trim_start().trim_start_matches('*').trim();
            if !stripped.is_empty() {
                text.push_str(stripped);
                text.push('\n');
            }
        }
    }
    text
}

fn git_time_to_utc(time: &git2::Time) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .ok_or_else(|| TracelinkError::parse(format!("timestamp out of range: {}", time.seconds())))
}
