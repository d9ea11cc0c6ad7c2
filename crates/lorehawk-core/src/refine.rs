//! Deterministic re-scoring of the raw model score.
//!
//! The only stage with no network dependency: a pure function of the raw
//! score, the covered-topic count, and the submission's word count.

/// Word count at which the length factor stops penalizing.
pub const IDEAL_WORD_COUNT: usize = 75;

/// Submissions below this word count are capped hard.
pub const SHORT_ANSWER_WORD_LIMIT: usize = 10;

/// Ceiling applied to sub-threshold submissions.
pub const SHORT_ANSWER_CEILING: u8 = 20;

/// The insight component is the raw score shifted down by this offset.
/// Approximation of the original scoring scheme, kept as-is.
const INSIGHT_BASELINE: f64 = 10.0;

const CONCISE_BONUS: f64 = 1.10;
const CONCISE_BONUS_MIN_WORDS: usize = 20;
const CONCISE_BONUS_MAX_WORDS: usize = 50;

/// Whitespace-delimited non-empty tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Recompute the final score from the raw analysis.
///
/// Very short answers get a hard ceiling. Everything else is a weighted
/// blend of coverage, accuracy, and insight, scaled by how close the
/// submission comes to the ideal length, with a bonus for answers that are
/// concise but complete.
pub fn refine(raw_score: u8, covered_topics: usize, word_count: usize) -> u8 {
    let raw = f64::from(raw_score.min(100));

    if word_count < SHORT_ANSWER_WORD_LIMIT {
        return (raw.round() as u8).min(SHORT_ANSWER_CEILING);
    }

    let coverage = (covered_topics as f64 * 25.0).min(100.0);
    let accuracy = raw;
    let insight = (raw - INSIGHT_BASELINE).max(0.0);

    let (coverage_weight, accuracy_weight, insight_weight) = if word_count < 30 {
        (0.40, 0.30, 0.30)
    } else {
        (0.60, 0.25, 0.15)
    };

    let base = coverage * coverage_weight + accuracy * accuracy_weight + insight * insight_weight;
    let length_factor = (word_count as f64 / IDEAL_WORD_COUNT as f64).min(1.0);
    let mut score = base * length_factor;

    if (CONCISE_BONUS_MIN_WORDS..=CONCISE_BONUS_MAX_WORDS).contains(&word_count)
        && coverage >= 75.0
        && accuracy >= 80.0
    {
        score = (score * CONCISE_BONUS).min(100.0);
    }

    score.clamp(0.0, 100.0).round() as u8
}
