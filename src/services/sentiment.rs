//! Rule-based sentiment scorer for feedback text.

use crate::models::feedback::SentimentLabel;

const POSITIVE_WORDS: [&str; 4] = ["good", "great", "helpful", "happy"];
const NEGATIVE_WORDS: [&str; 4] = ["bad", "terrible", "angry", "poor"];

/// Classify free text as Positive, Negative, or Neutral with a confidence in
/// 0.5..=1.0. Keyword hits are substring matches on the lower-cased input
/// ("goodbye" counts for "good"), each keyword counting at most once.
pub fn analyse(text: &str) -> (SentimentLabel, f64) {
    let lowered = text.to_lowercase();
    let positive = POSITIVE_WORDS
        .iter()
        .filter(|word| lowered.contains(**word))
        .count() as i64;
    let negative = NEGATIVE_WORDS
        .iter()
        .filter(|word| lowered.contains(**word))
        .count() as i64;

    if positive > negative {
        (SentimentLabel::Positive, confidence(positive - negative))
    } else if negative > positive {
        (SentimentLabel::Negative, confidence(negative - positive))
    } else {
        (SentimentLabel::Neutral, 0.5)
    }
}

fn confidence(diff: i64) -> f64 {
    f64::min(0.6 + 0.1 * diff as f64, 1.0)
}
