// fuzzy.rs — Similarity-ranked suggestions for mistyped position names.
//
// When a user's answer matches no position exactly, we offer up to two
// "did you mean" candidates. Scoring is normalized Levenshtein over the
// case-folded strings; anything under the threshold is noise and is not
// suggested.

use strsim::normalized_levenshtein;

/// Minimum similarity for a candidate to qualify as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Maximum number of suggestions surfaced to the user.
const MAX_SUGGESTIONS: usize = 2;

/// Return up to two candidates most similar to `input`, best first.
/// Candidates below the similarity threshold are dropped entirely; an
/// empty result is a valid outcome.
pub fn closest_matches(input: &str, candidates: &[String]) -> Vec<String> {
    let needle = input.to_lowercase();

    let mut scored: Vec<(f64, &String)> = candidates
        .iter()
        .map(|candidate| (normalized_levenshtein(&needle, &candidate.to_lowercase()), candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();

    // Stable sort keeps the original catalog order among equal scores.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate.clone())
        .collect()
}
