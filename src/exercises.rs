// src/exercises.rs

//! Answer grading and sentence scrambling for practice sessions.

use rand::{Rng, seq::SliceRandom};

use crate::config::STARS_PER_CORRECT_ANSWER;

/// Lowercases, drops punctuation, and collapses whitespace.
pub fn normalize_answer(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case- and punctuation-insensitive comparison.
/// An empty submission is always wrong.
pub fn grade_answer(expected: &str, submitted: &str) -> bool {
    let submitted = normalize_answer(submitted);
    !submitted.is_empty() && normalize_answer(expected) == submitted
}

pub fn stars_for(correct: bool) -> u32 {
    if correct { STARS_PER_CORRECT_ANSWER } else { 0 }
}

/// Splits a sentence on whitespace and shuffles the pieces.
///
/// When the sentence has at least two distinct tokens the returned order
/// always differs from the original.
pub fn scramble_tokens<R: Rng + ?Sized>(sentence: &str, rng: &mut R) -> Vec<String> {
    let original: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();
    let mut tokens = original.clone();
    tokens.shuffle(rng);

    if tokens == original && original.iter().any(|t| t != &original[0]) {
        tokens.rotate_left(1);
    }
    tokens
}
