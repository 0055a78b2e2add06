//! Local input checks. Everything here runs before the first network call.

use domains::{DomainError, FeedbackType, Result};

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 500;
pub const CATEGORY_MAX: usize = 50;
pub const FEEDBACK_MIN: usize = 50;
pub const FEEDBACK_MAX: usize = 2000;
pub const MAX_TAGS: usize = 5;
/// Including the leading '#'
pub const TAG_MAX: usize = 31;

/// Creator input for a new board.
#[derive(Debug, Clone)]
pub struct BoardDraft {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// Contributor input for a feedback submission.
#[derive(Debug, Clone)]
pub struct FeedbackDraft {
    pub text: String,
    /// Explicit type; `None` lets the sentiment heuristic decide.
    pub feedback_type: Option<FeedbackType>,
    pub tags: Vec<String>,
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    if len < min || len > max {
        return Err(DomainError::Validation(format!(
            "{field} must be between {min} and {max} characters (got {len})"
        )));
    }
    Ok(())
}

/// Returns a trimmed copy of the draft.
pub fn validate_board(draft: &BoardDraft) -> Result<BoardDraft> {
    let title = draft.title.trim().to_string();
    let description = draft.description.trim().to_string();
    let category = draft.category.trim().to_string();

    check_len("title", &title, 1, TITLE_MAX)?;
    check_len("description", &description, DESCRIPTION_MIN, DESCRIPTION_MAX)?;
    check_len("category", &category, 1, CATEGORY_MAX)?;

    Ok(BoardDraft {
        title,
        description,
        category,
    })
}

/// Returns a trimmed copy of the draft with normalized tags.
pub fn validate_feedback(draft: &FeedbackDraft) -> Result<FeedbackDraft> {
    let text = draft.text.trim().to_string();
    check_len("feedback", &text, FEEDBACK_MIN, FEEDBACK_MAX)?;
    let tags = normalize_tags(&draft.tags)?;
    Ok(FeedbackDraft {
        text,
        feedback_type: draft.feedback_type,
        tags,
    })
}

/// Hashtag-formats tags: `#lowercase`, `[a-z0-9_-]` only, deduplicated,
/// at most `MAX_TAGS`.
pub fn normalize_tags(raw: &[String]) -> Result<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let body = tag.trim().trim_start_matches('#').to_lowercase();
        if body.is_empty() {
            continue;
        }
        if !body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DomainError::Validation(format!("invalid tag '{tag}'")));
        }
        let formatted = format!("#{body}");
        if formatted.len() > TAG_MAX {
            return Err(DomainError::Validation(format!(
                "tag '{tag}' is longer than {} characters",
                TAG_MAX - 1
            )));
        }
        if !tags.contains(&formatted) {
            tags.push(formatted);
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(DomainError::Validation(format!(
            "at most {MAX_TAGS} tags are allowed"
        )));
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, description: &str, category: &str) -> BoardDraft {
        BoardDraft {
            title: title.into(),
            description: description.into(),
            category: category.into(),
        }
    }

    #[test]
    fn board_fields_are_trimmed() {
        let ok = validate_board(&draft("  Roadmap ", " Tell us what to build next ", " product ")).unwrap();
        assert_eq!(ok.title, "Roadmap");
        assert_eq!(ok.category, "product");
    }

    #[test]
    fn board_rejects_missing_and_oversized() {
        assert!(validate_board(&draft("", "long enough text", "c")).is_err());
        assert!(validate_board(&draft("t", "short", "c")).is_err());
        assert!(validate_board(&draft("t", "long enough text", &"c".repeat(51))).is_err());
        assert!(validate_board(&draft(&"t".repeat(101), "long enough text", "c")).is_err());
    }

    #[test]
    fn feedback_length_bounds() {
        let mut d = FeedbackDraft {
            text: "x".repeat(49),
            feedback_type: None,
            tags: vec![],
        };
        assert!(validate_feedback(&d).is_err());
        d.text = "x".repeat(50);
        assert!(validate_feedback(&d).is_ok());
        d.text = "x".repeat(2001);
        assert!(validate_feedback(&d).is_err());
    }

    #[test]
    fn tags_normalized_and_capped() {
        let tags = normalize_tags(&["UX".into(), "#ux".into(), " onboarding ".into(), "".into()]).unwrap();
        assert_eq!(tags, vec!["#ux", "#onboarding"]);

        let six: Vec<String> = (0..6).map(|i| format!("t{i}")).collect();
        assert!(normalize_tags(&six).is_err());

        assert!(normalize_tags(&["no spaces".into()]).is_err());
    }
}
