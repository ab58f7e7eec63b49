//! Near-duplicate detection for solution submissions.
//!
//! Similarity is the Sørensen–Dice coefficient over character bigrams with
//! whitespace removed, in `[0.0, 1.0]`.

use std::collections::HashMap;

use crate::domain::entities::SubmittedText;

/// Submissions scoring strictly above this against a prior one are rejected.
pub const DUPLICATE_THRESHOLD: f64 = 0.85;

/// Normalised comparison text for a submission.
pub fn submission_text(code: &str, explanation: &str) -> String {
    format!("{code} {explanation}").to_lowercase()
}

pub fn dice_coefficient(first: &str, second: &str) -> f64 {
    let first: Vec<char> = first.chars().filter(|c| !c.is_whitespace()).collect();
    let second: Vec<char> = second.chars().filter(|c| !c.is_whitespace()).collect();

    if first == second {
        return 1.0;
    }
    if first.len() < 2 || second.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in first.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for pair in second.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1]))
            && *count > 0
        {
            *count -= 1;
            intersection += 1;
        }
    }

    (2.0 * intersection as f64) / (first.len() + second.len() - 2) as f64
}

/// True when `candidate` is too close to any of `prior`.
pub fn is_near_duplicate<'a>(
    candidate: &SubmittedText,
    prior: impl IntoIterator<Item = &'a SubmittedText>,
) -> bool {
    let candidate_text = submission_text(&candidate.code, &candidate.explanation);
    prior.into_iter().any(|existing| {
        let existing_text = submission_text(&existing.code, &existing.explanation);
        dice_coefficient(&existing_text, &candidate_text) > DUPLICATE_THRESHOLD
    })
}
