//! Label blinding for evaluation runs.
//!
//! Hides a random fraction of keyword-linked commits from the positive
//! map before training, so the pipeline's ability to re-discover hidden
//! links can be measured. Sampling is over the sorted hash universe with
//! a fixed seed, making blinded runs reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::core::linkmap::IssueLinkMap;

/// Remove `rate` of the linked commit hashes from every issue entry.
///
/// The sample is drawn from the union of linked hashes, so a blinded hash
/// disappears from every issue that referenced it. Issues left with no
/// commits are dropped entirely. `rate` is a fraction in `[0, 1]`.
pub fn blind(links: &IssueLinkMap, rate: f64, seed: u64) -> IssueLinkMap {
    let mut universe: Vec<String> = links.all_commits().into_iter().collect();
    universe.sort_unstable();

    let blind_count = (rate * universe.len() as f64) as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let blinded: Vec<String> = universe
        .choose_multiple(&mut rng, blind_count)
        .cloned()
        .collect();

    info!(
        linked = universe.len(),
        blinded = blinded.len(),
        "blinding keyword links"
    );

    let mut result = links.clone();
    for hash in &blinded {
        result.remove_commit(hash);
    }
    result.prune_empty();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_links() -> IssueLinkMap {
        let mut map = IssueLinkMap::new();
        for i in 0..10 {
            map.insert(format!("T-{i}"), format!("hash{i:02}"));
        }
        // One shared hash across two issues.
        map.insert("T-0", "hash05");
        map
    }

    #[test]
    fn test_blinds_expected_fraction() {
        let links = sample_links();
        let blinded = blind(&links, 0.3, 200);
        let removed = links.all_commits().len() - blinded.all_commits().len();
        assert_eq!(removed, 3);
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let links = sample_links();
        assert_eq!(blind(&links, 0.0, 200), links);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let links = sample_links();
        assert_eq!(blind(&links, 0.5, 200), blind(&links, 0.5, 200));
    }

    #[test]
    fn test_emptied_issues_are_dropped() {
        let links = sample_links();
        let blinded = blind(&links, 1.0, 200);
        assert!(blinded.is_empty());
    }
}
