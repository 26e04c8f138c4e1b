//! Candidate pair generation over temporal plausibility windows.
//!
//! A pair enters the candidate universe when ANY of the six date-field
//! combinations (three issue fields times two commit fields) places the
//! issue date inside `[commit_date - before, commit_date + after]`. The
//! disjunction makes the universe monotone in the window size: widening
//! `before` or `after` can only add pairs, never remove them.

use chrono::Duration;

use crate::core::config::CandidateConfig;
use crate::core::types::{Commit, CommitDateField, Issue, IssueDateField, PairKey};

/// Temporal relation of a candidate pair under the canonical date fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeFeatures {
    /// Absolute distance between the canonical dates, in seconds
    pub delta_secs: f64,
    /// 0 when the issue date is at or before the commit date, 1 otherwise
    pub direction: f64,
}

/// Generates the candidate (issue, commit) universe.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    config: CandidateConfig,
}

impl CandidateGenerator {
    /// Build a generator from its window configuration.
    pub fn new(config: CandidateConfig) -> Self {
        Self { config }
    }

    /// True when the pair falls inside the window for at least one of the
    /// six date-field combinations.
    pub fn is_candidate(&self, issue: &Issue, commit: &Commit) -> bool {
        let before = Duration::seconds(self.config.before_secs);
        let after = Duration::seconds(self.config.after_secs);
        for issue_field in IssueDateField::ALL {
            let issue_date = issue.date(issue_field);
            for commit_field in CommitDateField::ALL {
                let commit_date = commit.date(commit_field);
                if issue_date >= commit_date - before && issue_date <= commit_date + after {
                    return true;
                }
            }
        }
        false
    }

    /// Cross product of issues and commits restricted to the window.
    ///
    /// Output order follows the input slices so downstream feature batches
    /// are reproducible across runs.
    pub fn generate(&self, issues: &[Issue], commits: &[Commit]) -> Vec<PairKey> {
        let mut pairs = Vec::new();
        for issue in issues {
            for commit in commits {
                if self.is_candidate(issue, commit) {
                    pairs.push(PairKey::new(issue.id.clone(), commit.hash.clone()));
                }
            }
        }
        pairs
    }

    /// Temporal features of a pair under the configured canonical fields.
    pub fn time_features(&self, issue: &Issue, commit: &Commit) -> TimeFeatures {
        let issue_date = issue.date(self.config.issue_date_field);
        let commit_date = commit.date(self.config.commit_date_field);
        let delta = (commit_date - issue_date).num_seconds();
        TimeFeatures {
            delta_secs: delta.abs() as f64,
            direction: if issue_date <= commit_date { 0.0 } else { 1.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::parse_datetime;
    use chrono::{DateTime, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        parse_datetime(s).unwrap()
    }

    fn issue(id: &str, created: &str, updated: &str, resolved: &str) -> Issue {
        Issue {
            id: id.into(),
            description: None,
            comments: None,
            created: at(created),
            updated: at(updated),
            resolved: at(resolved),
            patch_paths: vec![],
        }
    }

    fn commit(hash: &str, authored: &str, committed: &str) -> Commit {
        Commit {
            hash: hash.into(),
            author: "alice".into(),
            committer: "alice".into(),
            author_date: at(authored),
            commit_date: at(committed),
            message: String::new(),
            files: vec![],
        }
    }

    fn generator(before_secs: i64, after_secs: i64) -> CandidateGenerator {
        CandidateGenerator::new(CandidateConfig {
            before_secs,
            after_secs,
            ..CandidateConfig::default()
        })
    }

    #[test]
    fn test_any_field_combination_admits_pair() {
        // Only the created/author_date combination is close.
        let i = issue(
            "T-1",
            "2009-05-01T00:00:00+00:00",
            "2010-01-01T00:00:00+00:00",
            "2010-06-01T00:00:00+00:00",
        );
        let c = commit(
            "c1",
            "2009-05-02T00:00:00+00:00",
            "2009-09-01T00:00:00+00:00",
        );
        let generator = generator(7 * 86_400, 7 * 86_400);
        assert!(generator.is_candidate(&i, &c));
    }

    #[test]
    fn test_out_of_window_pair_rejected() {
        let i = issue(
            "T-1",
            "2009-01-01T00:00:00+00:00",
            "2009-01-02T00:00:00+00:00",
            "2009-01-03T00:00:00+00:00",
        );
        let c = commit(
            "c1",
            "2009-06-01T00:00:00+00:00",
            "2009-06-01T00:00:00+00:00",
        );
        assert!(!generator(7 * 86_400, 7 * 86_400).is_candidate(&i, &c));
    }

    #[test]
    fn test_widening_window_is_monotone() {
        let issues: Vec<Issue> = (0..10)
            .map(|k| {
                let day = format!("2009-01-{:02}T12:00:00+00:00", k + 1);
                issue(&format!("T-{k}"), &day, &day, &day)
            })
            .collect();
        let commits: Vec<Commit> = (0..10)
            .map(|k| {
                let day = format!("2009-01-{:02}T18:00:00+00:00", 2 * k + 1);
                commit(&format!("c{k}"), &day, &day)
            })
            .collect();

        let narrow = generator(86_400, 86_400).generate(&issues, &commits);
        let wide = generator(5 * 86_400, 5 * 86_400).generate(&issues, &commits);
        assert!(wide.len() >= narrow.len());
        for pair in &narrow {
            assert!(wide.contains(pair), "widening dropped {pair}");
        }
    }

    #[test]
    fn test_time_features_direction_and_delta() {
        let generator = generator(7 * 86_400, 7 * 86_400);
        // Default canonical fields are resolved / commit_date.
        let i = issue(
            "T-1",
            "2009-05-01T00:00:00+00:00",
            "2009-05-01T00:00:00+00:00",
            "2009-05-01T00:00:00+00:00",
        );
        let later = commit(
            "c1",
            "2009-05-01T00:10:00+00:00",
            "2009-05-01T00:10:00+00:00",
        );
        let features = generator.time_features(&i, &later);
        assert_eq!(features.delta_secs, 600.0);
        assert_eq!(features.direction, 0.0);

        let earlier = commit(
            "c2",
            "2009-04-30T23:55:00+00:00",
            "2009-04-30T23:55:00+00:00",
        );
        let features = generator.time_features(&i, &earlier);
        assert_eq!(features.delta_secs, 300.0);
        assert_eq!(features.direction, 1.0);
    }
}
