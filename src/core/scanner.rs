//! Randomized Castle project identifier scanner.
//!
//! The project directory only supports lookup by id, so discovery by name is
//! brute force: generate random candidate ids, look each one up, and keep
//! the ones whose name contains the query substring (case-insensitive). The
//! loop stops at the first of two limits — attempt count or match count —
//! and every match is announced through the sink the moment it is found.
//!
//! Lookups run strictly one at a time. The attempt counter increments
//! *before* the duplicate check, so a colliding candidate still consumes
//! budget; that keeps the worst-case wall-clock time bounded.

use std::collections::HashSet;

use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::debug;

use crate::core::reply::{Notification, ReplySink};
use crate::errors::Result;

/// A project found in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectHit {
    /// Project name as reported by the directory.
    pub name: String,
    /// User-facing project link.
    pub url: String,
}

/// Lookup-by-id against the project directory. Any failure (404, transport
/// error, malformed response) is `None`: "no project at this id".
#[async_trait]
pub trait ProjectLookup: Send + Sync {
    /// Resolves a candidate id to a project, if one exists.
    async fn lookup(&self, id: &str) -> Option<ProjectHit>;
}

/// Scan termination and candidate-shape limits.
#[derive(Debug, Clone)]
pub struct ScanLimits {
    /// Hard ceiling on lookup attempts per invocation.
    pub max_attempts: u32,
    /// Stop as soon as this many matches have been found.
    pub max_matches: usize,
    /// Minimum candidate id length.
    pub min_len: usize,
    /// Maximum candidate id length.
    pub max_len: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_attempts: 20_000,
            max_matches: 5,
            min_len: 12,
            max_len: 20,
        }
    }
}

/// One matching project, with the id that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// The random candidate id that resolved to this project.
    pub candidate_id: String,
    /// Project name.
    pub name: String,
    /// User-facing project link.
    pub url: String,
}

/// Outcome of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// Attempts consumed (duplicates included).
    pub attempts: u32,
    /// Matches in attempt order.
    pub results: Vec<ScanResult>,
}

/// Generates one candidate id: length uniform in `[min_len, max_len]`, each
/// symbol uniform over the 62-character alphanumeric alphabet.
fn random_candidate(min_len: usize, max_len: usize) -> String {
    // A fresh thread-local RNG per candidate; it must not be held across
    // the lookup await point.
    let mut rng = rand::thread_rng();
    candidate_with_rng(&mut rng, min_len, max_len)
}

fn candidate_with_rng(rng: &mut impl Rng, min_len: usize, max_len: usize) -> String {
    let length = rng.gen_range(min_len..=max_len);
    (0..length).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Runs one scan to completion, emitting a [`Notification::ScanMatch`] per
/// match as it is found.
pub async fn run_scan(
    lookup: &dyn ProjectLookup,
    term: &str,
    limits: &ScanLimits,
    sink: &mut dyn ReplySink,
) -> Result<ScanSummary> {
    let mut next = || random_candidate(limits.min_len, limits.max_len);
    scan_with_candidates(lookup, term, limits, sink, &mut next).await
}

async fn scan_with_candidates(
    lookup: &dyn ProjectLookup,
    term: &str,
    limits: &ScanLimits,
    sink: &mut dyn ReplySink,
    next_candidate: &mut (dyn FnMut() -> String + Send),
) -> Result<ScanSummary> {
    let needle = term.to_lowercase();
    let mut tried: HashSet<String> = HashSet::new();
    let mut attempts: u32 = 0;
    let mut results: Vec<ScanResult> = Vec::new();

    while attempts < limits.max_attempts && results.len() < limits.max_matches {
        // Duplicates consume budget: increment before the dedup check.
        attempts += 1;

        let candidate = next_candidate();
        if !tried.insert(candidate.clone()) {
            continue;
        }

        let Some(hit) = lookup.lookup(&candidate).await else {
            continue;
        };

        if hit.name.to_lowercase().contains(&needle) {
            debug!(attempts, name = %hit.name, "scan match");
            sink.notify(Notification::ScanMatch {
                name: hit.name.clone(),
                url: hit.url.clone(),
            })
            .await?;
            results.push(ScanResult {
                candidate_id: candidate,
                name: hit.name,
                url: hit.url,
            });
        }
    }

    Ok(ScanSummary { attempts, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{NamedLookup, NeverFoundLookup, RecordingLookup, RecordingSink};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_limits(max_attempts: u32, max_matches: usize) -> ScanLimits {
        ScanLimits {
            max_attempts,
            max_matches,
            ..ScanLimits::default()
        }
    }

    #[test]
    fn default_limits_match_production_constants() {
        let limits = ScanLimits::default();
        assert_eq!(limits.max_attempts, 20_000);
        assert_eq!(limits.max_matches, 5);
        assert_eq!(limits.min_len, 12);
        assert_eq!(limits.max_len, 20);
    }

    #[test]
    fn candidates_stay_inside_length_and_alphabet_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let id = candidate_with_rng(&mut rng, 12, 20);
            assert!((12..=20).contains(&id.len()), "bad length: {id}");
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()), "bad symbol: {id}");
        }
    }

    #[tokio::test]
    async fn exhausts_attempt_budget_when_nothing_is_found() {
        let lookup = NeverFoundLookup::default();
        let mut sink = RecordingSink::default();

        let summary = run_scan(&lookup, "foo", &small_limits(50, 5), &mut sink)
            .await
            .expect("scan completes");

        assert_eq!(summary.attempts, 50);
        assert!(summary.results.is_empty());
        assert!(sink.notifications.is_empty());
    }

    #[tokio::test]
    async fn queried_ids_respect_the_candidate_contract() {
        let lookup = RecordingLookup::default();
        let mut sink = RecordingSink::default();

        run_scan(&lookup, "foo", &small_limits(200, 5), &mut sink)
            .await
            .expect("scan completes");

        let queried = lookup.queried();
        assert!(!queried.is_empty());
        for id in queried {
            assert!((12..=20).contains(&id.len()));
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[tokio::test]
    async fn stops_at_match_limit_and_notifies_in_order() {
        // Every id resolves to a project whose name contains the term.
        let lookup = NamedLookup::new("The FOO Castle");
        let mut sink = RecordingSink::default();

        let summary = run_scan(&lookup, "foo", &small_limits(1_000, 5), &mut sink)
            .await
            .expect("scan completes");

        assert_eq!(summary.results.len(), 5);
        assert_eq!(summary.attempts, 5);
        assert_eq!(sink.notifications.len(), 5);
        for (note, result) in sink.notifications.iter().zip(&summary.results) {
            assert_eq!(
                note,
                &Notification::ScanMatch {
                    name: result.name.clone(),
                    url: result.url.clone(),
                }
            );
        }
    }

    #[tokio::test]
    async fn non_matching_names_are_filtered_case_insensitively() {
        let lookup = NamedLookup::new("Racing Game");
        let mut sink = RecordingSink::default();

        let summary = run_scan(&lookup, "castle", &small_limits(30, 5), &mut sink)
            .await
            .expect("scan completes");

        assert_eq!(summary.attempts, 30);
        assert!(summary.results.is_empty());
    }

    #[tokio::test]
    async fn duplicate_candidates_consume_attempts() {
        let lookup = RecordingLookup::default();
        let mut sink = RecordingSink::default();

        // Three distinct ids over six attempts.
        let script = ["aaaaaaaaaaaa", "aaaaaaaaaaaa", "bbbbbbbbbbbb",
                      "bbbbbbbbbbbb", "cccccccccccc", "cccccccccccc"];
        let mut cursor = 0;
        let mut next = move || {
            let id = script[cursor % script.len()].to_string();
            cursor += 1;
            id
        };

        let summary = scan_with_candidates(
            &lookup,
            "foo",
            &small_limits(6, 5),
            &mut sink,
            &mut next,
        )
        .await
        .expect("scan completes");

        // All six attempts consumed, but each id only queried once.
        assert_eq!(summary.attempts, 6);
        assert_eq!(lookup.queried().len(), 3);
    }
}
