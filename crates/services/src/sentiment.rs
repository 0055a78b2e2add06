//! Lexicon sentiment used when the contributor does not pick a type.

use domains::FeedbackType;

const POSITIVE: &[&str] = &[
    "great", "good", "love", "excellent", "amazing", "helpful", "awesome", "like", "nice",
    "fast", "easy", "clear", "thanks", "perfect", "enjoy", "improved",
];

const NEGATIVE: &[&str] = &[
    "bad", "slow", "hate", "broken", "bug", "confusing", "terrible", "poor", "crash",
    "annoying", "hard", "difficult", "worse", "missing", "fail", "error",
];

/// Counts lexicon hits; ties resolve to `Neutral`.
pub fn classify(text: &str) -> FeedbackType {
    let mut score: i32 = 0;
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        if POSITIVE.contains(&word.as_str()) {
            score += 1;
        } else if NEGATIVE.contains(&word.as_str()) {
            score -= 1;
        }
    }
    match score {
        s if s > 0 => FeedbackType::Positive,
        s if s < 0 => FeedbackType::Negative,
        _ => FeedbackType::Neutral,
    }
}
