//! Core record types shared across the pipeline.
//!
//! [`Issue`] and [`Commit`] records are produced once per run by the
//! boundary sources in [`crate::io::sources`] and treated as read-only
//! afterwards. Everything else in this module is a small value type keyed
//! by issue id or commit hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TracelinkError};

/// Unique textual ticket identifier, e.g. `HADOOP-5213`.
pub type IssueId = String;

/// Unique commit content hash.
pub type CommitHash = String;

/// An issue-tracker ticket as seen by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Project-prefixed identifier
    pub id: IssueId,
    /// Description text (may be absent)
    pub description: Option<String>,
    /// All comments concatenated into one string (may be absent)
    pub comments: Option<String>,
    /// Creation date
    pub created: DateTime<Utc>,
    /// Last-updated date
    pub updated: DateTime<Utc>,
    /// Resolution date
    pub resolved: DateTime<Utc>,
    /// File paths referenced by the issue's latest attached patch
    pub patch_paths: Vec<String>,
}

impl Issue {
    /// Select one of the three issue date fields.
    pub fn date(&self, field: IssueDateField) -> DateTime<Utc> {
        match field {
            IssueDateField::Created => self.created,
            IssueDateField::Updated => self.updated,
            IssueDateField::Resolved => self.resolved,
        }
    }

    /// Description and comments concatenated, empty when both are absent.
    pub fn full_text(&self) -> String {
        let mut text = self.description.clone().unwrap_or_default();
        if let Some(comments) = &self.comments {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(comments);
        }
        text
    }
}

/// A version-control commit as seen by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Content hash
    pub hash: CommitHash,
    /// Author name
    pub author: String,
    /// Committer name
    pub committer: String,
    /// Author date
    pub author_date: DateTime<Utc>,
    /// Commit date
    pub commit_date: DateTime<Utc>,
    /// Full commit message
    pub message: String,
    /// Changed file paths (pure deletions excluded at the boundary)
    pub files: Vec<String>,
}

impl Commit {
    /// Select one of the two commit date fields.
    pub fn date(&self, field: CommitDateField) -> DateTime<Utc> {
        match field {
            CommitDateField::AuthorDate => self.author_date,
            CommitDateField::CommitDate => self.commit_date,
        }
    }

    /// Select the author or committer name.
    pub fn name(&self, field: NameField) -> &str {
        match field {
            NameField::Author => &self.author,
            NameField::Committer => &self.committer,
        }
    }
}

/// Which issue date field a time comparison reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueDateField {
    /// Ticket creation date
    Created,
    /// Ticket last-updated date
    Updated,
    /// Ticket resolution date
    Resolved,
}

impl IssueDateField {
    /// All three fields, in the order the candidate generator probes them.
    pub const ALL: [IssueDateField; 3] = [Self::Created, Self::Updated, Self::Resolved];
}

/// Which commit date field a time comparison reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitDateField {
    /// Date the change was authored
    AuthorDate,
    /// Date the change was committed
    CommitDate,
}

impl CommitDateField {
    /// Both fields, in the order the candidate generator probes them.
    pub const ALL: [CommitDateField; 2] = [Self::AuthorDate, Self::CommitDate];
}

/// Which developer identity the phantom expander compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameField {
    /// Commit author
    Author,
    /// Commit committer
    Committer,
}

/// An (issue, commit) combination that survived the candidate window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    /// Issue side of the pair
    pub issue: IssueId,
    /// Commit side of the pair
    pub commit: CommitHash,
}

impl PairKey {
    /// Create a new pair key.
    pub fn new(issue: impl Into<IssueId>, commit: impl Into<CommitHash>) -> Self {
        Self {
            issue: issue.into(),
            commit: commit.into(),
        }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.issue, self.commit)
    }
}

/// Parse an ISO-8601 timestamp with offset into UTC.
///
/// Accepts both the issue-tracker shape (`2009-05-01T10:22:33.000+0000`)
/// and plain RFC 3339.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .or_else(|_| DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .or_else(|_| DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S %z"))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TracelinkError::parse_with_input(format!("invalid timestamp: {e}"), input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_variants() {
        let a = parse_datetime("2009-05-01T10:22:33.000+0000").unwrap();
        let b = parse_datetime("2009-05-01T10:22:33+00:00").unwrap();
        let c = parse_datetime("2009-05-01 10:22:33 +0000").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("May 1st 2009").is_err());
    }

    #[test]
    fn test_issue_full_text() {
        let issue = Issue {
            id: "TEST-1".into(),
            description: Some("namenode crash".into()),
            comments: Some("fixed in trunk".into()),
            created: Utc::now(),
            updated: Utc::now(),
            resolved: Utc::now(),
            patch_paths: vec![],
        };
        assert_eq!(issue.full_text(), "namenode crash fixed in trunk");

        let bare = Issue {
            description: None,
            comments: None,
            ..issue
        };
        assert_eq!(bare.full_text(), "");
    }
}
