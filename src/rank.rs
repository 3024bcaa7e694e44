//! Bayesian-averaged ranking of fetched candidates.
//!
//! A raw average rating is a poor ranking key: a title with two votes averaging
//! 9.9 would beat a title with five thousand votes averaging 8.7. The ranker
//! shrinks every average toward a corpus-wide prior in proportion to how few
//! votes back it:
//!
//! ```text
//! score(r, v) = (v / (v + m)) * r + (m / (v + m)) * C
//! ```
//!
//! * `r` - the candidate's average rating
//! * `v` - the candidate's vote count
//! * `C` - the prior mean, computed once per run from the fetched candidates
//! * `m` - the confidence threshold, the vote count at which `r` and `C` weigh
//!   the same
//!
//! As `v` grows the score approaches `r`; with no votes it is exactly `C`.
//!
//! # Defaults
//!
//! * `C` is the mean rating of candidates that have at least one vote. If no
//!   candidate has votes, every candidate's rating is averaged instead.
//! * `m` defaults to [`ConfidenceThreshold::Fixed`]`(50.0)`. A corpus-derived
//!   [`ConfidenceThreshold::Percentile`] is available. Either way the resolved
//!   value is at least [`MIN_CONFIDENCE_THRESHOLD`], so `v + m` is never zero.
//! * Ties keep the order in which the candidates were fetched.
//!
//! # Examples
//!
//! ```rust
//! use mangarank::prelude::*;
//!
//! let candidates = vec![
//!     Candidate { id: "a".into(), title: "Hyped".into(), rating: 9.9, votes: 2, follows: 10 },
//!     Candidate { id: "b".into(), title: "Classic".into(), rating: 8.7, votes: 5000, follows: 90_000 },
//!     Candidate { id: "c".into(), title: "Niche".into(), rating: 8.0, votes: 100, follows: 800 },
//!     Candidate { id: "d".into(), title: "Meh".into(), rating: 6.0, votes: 800, follows: 4000 },
//!     Candidate { id: "e".into(), title: "Bad".into(), rating: 5.5, votes: 1200, follows: 3000 },
//! ];
//!
//! let ranked = Ranker::new(ConfidenceThreshold::Fixed(50.0)).rank(candidates);
//! assert_eq!(ranked[0].candidate.id, "b");
//! ```

use tracing::debug;

use crate::types::{Candidate, RankedCandidate};

/// Smallest confidence threshold the ranker will use.
pub const MIN_CONFIDENCE_THRESHOLD: f64 = 1.0;

/// Confidence threshold used when nothing else is configured.
pub const DEFAULT_MIN_VOTES: f64 = 50.0;

/// How the confidence threshold `m` is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfidenceThreshold {
    /// A fixed number of votes.
    Fixed(f64),

    /// The given percentile (0-100) of the candidates' vote counts, using the
    /// nearest-rank method.
    Percentile(f64),
}

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        ConfidenceThreshold::Fixed(DEFAULT_MIN_VOTES)
    }
}

impl ConfidenceThreshold {
    /// Resolves the threshold against a corpus.
    ///
    /// Non-finite values and values below [`MIN_CONFIDENCE_THRESHOLD`] resolve to
    /// [`MIN_CONFIDENCE_THRESHOLD`].
    ///
    /// ```rust
    /// use mangarank::rank::ConfidenceThreshold;
    ///
    /// assert_eq!(ConfidenceThreshold::Fixed(25.0).resolve(&[]), 25.0);
    /// assert_eq!(ConfidenceThreshold::Fixed(0.0).resolve(&[]), 1.0);
    /// assert_eq!(ConfidenceThreshold::Percentile(50.0).resolve(&[]), 1.0);
    /// ```
    pub fn resolve(&self, candidates: &[Candidate]) -> f64 {
        let raw = match *self {
            ConfidenceThreshold::Fixed(votes) => votes,
            ConfidenceThreshold::Percentile(percentile) => vote_percentile(candidates, percentile),
        };

        if raw.is_finite() && raw > MIN_CONFIDENCE_THRESHOLD {
            raw
        } else {
            MIN_CONFIDENCE_THRESHOLD
        }
    }
}

/// Nearest-rank percentile of the candidates' vote counts; `0.0` when empty.
fn vote_percentile(candidates: &[Candidate], percentile: f64) -> f64 {
    if candidates.is_empty() {
        return 0.0;
    }

    let mut votes: Vec<u64> = candidates.iter().map(|c| c.votes).collect();
    votes.sort_unstable();

    let percentile = if percentile.is_nan() {
        0.0
    } else {
        percentile.clamp(0.0, 100.0)
    };
    let rank = ((percentile / 100.0) * votes.len() as f64).ceil() as usize;
    let index = rank.clamp(1, votes.len()) - 1;

    votes[index] as f64
}

/// Mean rating used as the prior `C`.
///
/// Candidates without votes are ignored unless no candidate has votes.
/// Returns `None` for an empty corpus.
///
/// ```rust
/// use mangarank::{Candidate, rank::prior_mean};
///
/// let voted = Candidate { id: "a".into(), title: "A".into(), rating: 8.0, votes: 10, follows: 0 };
/// let unvoted = Candidate { id: "b".into(), title: "B".into(), rating: 0.0, votes: 0, follows: 0 };
///
/// assert_eq!(prior_mean(&[voted, unvoted]), Some(8.0));
/// assert_eq!(prior_mean(&[]), None);
/// ```
pub fn prior_mean(candidates: &[Candidate]) -> Option<f64> {
    if candidates.is_empty() {
        return None;
    }

    let (sum, count) = candidates
        .iter()
        .filter(|c| c.has_votes())
        .fold((0.0, 0usize), |(sum, count), c| (sum + c.rating, count + 1));

    if count > 0 {
        return Some(sum / count as f64);
    }

    let sum: f64 = candidates.iter().map(|c| c.rating).sum();
    Some(sum / candidates.len() as f64)
}

/// Bayesian-averaged score of a rating `rating` backed by `votes` votes.
///
/// `min_votes` must be positive; [`ConfidenceThreshold::resolve`] guarantees it.
///
/// ```rust
/// use mangarank::rank::bayesian_score;
///
/// // No votes: exactly the prior.
/// assert_eq!(bayesian_score(9.9, 0, 50.0, 7.5), 7.5);
///
/// // Many votes: close to the raw average.
/// let score = bayesian_score(8.0, 10_000, 10.0, 5.0);
/// assert!((score - 8.0).abs() / 8.0 < 0.001);
/// ```
pub fn bayesian_score(rating: f64, votes: u64, min_votes: f64, prior_mean: f64) -> f64 {
    let votes = votes as f64;
    let total = votes + min_votes;
    (votes / total) * rating + (min_votes / total) * prior_mean
}

/// Corpus-wide constants for one ranking run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingContext {
    /// The prior mean `C`
    pub prior_mean: f64,
    /// The resolved confidence threshold `m`
    pub min_votes: f64,
}

impl RankingContext {
    /// Scores a single candidate against this context.
    pub fn score(&self, candidate: &Candidate) -> f64 {
        bayesian_score(
            candidate.rating,
            candidate.votes,
            self.min_votes,
            self.prior_mean,
        )
    }
}

/// Ranks candidates by Bayesian-averaged score.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    threshold: ConfidenceThreshold,
}

impl Ranker {
    pub fn new(threshold: ConfidenceThreshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> ConfidenceThreshold {
        self.threshold
    }

    /// Computes `C` and `m` for a corpus. `None` when the corpus is empty.
    pub fn context(&self, candidates: &[Candidate]) -> Option<RankingContext> {
        let prior_mean = prior_mean(candidates)?;
        Some(RankingContext {
            prior_mean,
            min_votes: self.threshold.resolve(candidates),
        })
    }

    /// Scores every candidate and sorts them by descending score.
    ///
    /// The output is a permutation of the input. Equal scores keep their
    /// input order.
    pub fn rank(&self, candidates: Vec<Candidate>) -> Vec<RankedCandidate> {
        let Some(context) = self.context(&candidates) else {
            return Vec::new();
        };

        debug!(
            candidates = candidates.len(),
            prior_mean = context.prior_mean,
            min_votes = context.min_votes,
            "Ranking candidates"
        );

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .map(|candidate| RankedCandidate {
                score: context.score(&candidate),
                candidate,
            })
            .collect();

        // Stable: ties stay in fetch order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

/// Extension trait for trimming a ranked list.
pub trait RankedListExt {
    /// Keeps entries whose score is strictly above `min_score`.
    fn above(self, min_score: f64) -> Self;

    /// Keeps at most the first `limit` entries.
    fn top(self, limit: usize) -> Self;
}

impl RankedListExt for Vec<RankedCandidate> {
    fn above(mut self, min_score: f64) -> Self {
        self.retain(|entry| entry.score > min_score);
        self
    }

    fn top(mut self, limit: usize) -> Self {
        self.truncate(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_votes(votes: &[u64]) -> Vec<Candidate> {
        votes
            .iter()
            .enumerate()
            .map(|(i, &votes)| Candidate {
                id: i.to_string(),
                title: format!("Title {}", i),
                rating: 7.0,
                votes,
                follows: 0,
            })
            .collect()
    }

    #[test]
    fn test_vote_percentile_nearest_rank() {
        let corpus = with_votes(&[40, 10, 30, 20, 50]);
        assert_eq!(vote_percentile(&corpus, 0.0), 10.0);
        assert_eq!(vote_percentile(&corpus, 20.0), 10.0);
        assert_eq!(vote_percentile(&corpus, 50.0), 30.0);
        assert_eq!(vote_percentile(&corpus, 90.0), 50.0);
        assert_eq!(vote_percentile(&corpus, 100.0), 50.0);
    }

    #[test]
    fn test_vote_percentile_clamps_out_of_range() {
        let corpus = with_votes(&[5, 15]);
        assert_eq!(vote_percentile(&corpus, -10.0), 5.0);
        assert_eq!(vote_percentile(&corpus, 250.0), 15.0);
        assert_eq!(vote_percentile(&corpus, f64::NAN), 5.0);
        assert_eq!(vote_percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_percentile_of_unvoted_corpus_is_clamped() {
        let corpus = with_votes(&[0, 0, 0]);
        let threshold = ConfidenceThreshold::Percentile(75.0);
        assert_eq!(threshold.resolve(&corpus), MIN_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn test_non_finite_fixed_threshold_is_clamped() {
        assert_eq!(
            ConfidenceThreshold::Fixed(f64::INFINITY).resolve(&[]),
            MIN_CONFIDENCE_THRESHOLD
        );
        assert_eq!(
            ConfidenceThreshold::Fixed(-3.0).resolve(&[]),
            MIN_CONFIDENCE_THRESHOLD
        );
    }
}
