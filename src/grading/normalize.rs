// src/grading/normalize.rs

use crate::config::OPTION_COUNT;
use crate::models::question::QuestionType;

const TRUE_TOKENS: [&str; 4] = ["true", "t", "1", "yes"];
const FALSE_TOKENS: [&str; 4] = ["false", "f", "0", "no"];

/// Canonicalizes an answer for comparison.
///
/// Applied identically to the submitted answer and to the stored correct answer:
/// * Always trims surrounding whitespace; a missing answer becomes `""`.
/// * Multiple choice: text equal to one of the options becomes that option's index ("0".."3").
///   Stored options are compared after trimming their surrounding whitespace, case-sensitively;
///   blank options never match. Anything else (an index already, or unmatched text) is kept as-is.
/// * True/false: lowercased, then any accepted token maps to `"true"` or `"false"`.
///   Unrecognized tokens pass through lowercased and can never match.
/// * Identification: lowercased.
pub fn normalize(
    raw: Option<&str>,
    question_type: QuestionType,
    options: &[Option<&str>; OPTION_COUNT],
) -> String {
    let trimmed = raw.unwrap_or_default().trim();

    let normalized = match question_type {
        QuestionType::MultipleChoice => option_index(trimmed, options)
            .map(|idx| idx.to_string())
            .unwrap_or_else(|| trimmed.to_string()),
        QuestionType::TrueFalse => {
            let lowered = trimmed.to_lowercase();
            if TRUE_TOKENS.contains(&lowered.as_str()) {
                "true".to_string()
            } else if FALSE_TOKENS.contains(&lowered.as_str()) {
                "false".to_string()
            } else {
                lowered
            }
        }
        QuestionType::Identification => trimmed.to_lowercase(),
    };

    tracing::trace!(
        question_type = question_type.code(),
        raw = ?raw,
        normalized = %normalized,
        "normalized answer"
    );

    normalized
}

/// Index of the first option whose trimmed text equals `value`. Blank options never match.
fn option_index(value: &str, options: &[Option<&str>; OPTION_COUNT]) -> Option<usize> {
    if value.is_empty() {
        return None;
    }
    options
        .iter()
        .position(|opt| opt.is_some_and(|text| text.trim() == value))
}

/// Human-readable form of a normalized answer.
///
/// Multiple choice indexes are shown as their option text, falling back to the
/// normalized value when it is not a valid index or the slot is empty.
pub fn display_form(
    normalized: &str,
    question_type: QuestionType,
    options: &[Option<&str>; OPTION_COUNT],
) -> String {
    if question_type != QuestionType::MultipleChoice {
        return normalized.to_string();
    }

    normalized
        .parse::<usize>()
        .ok()
        .and_then(|idx| options.get(idx).copied().flatten())
        .map(str::to_string)
        .unwrap_or_else(|| normalized.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPITALS: [Option<&str>; 4] = [Some("Paris"), Some("Lyon"), Some(" Nice "), None];
    const NONE: [Option<&str>; 4] = [None; 4];

    #[test]
    fn missing_input_is_empty() {
        for qt in [
            QuestionType::MultipleChoice,
            QuestionType::TrueFalse,
            QuestionType::Identification,
        ] {
            assert_eq!(normalize(None, qt, &CAPITALS), "");
            assert_eq!(normalize(Some("   "), qt, &CAPITALS), "");
        }
    }

    #[test]
    fn multiple_choice_maps_option_text_to_index() {
        let mc = QuestionType::MultipleChoice;
        assert_eq!(normalize(Some("Paris"), mc, &CAPITALS), "0");
        assert_eq!(normalize(Some("  Lyon "), mc, &CAPITALS), "1");
        assert_eq!(normalize(Some("Nice"), mc, &CAPITALS), "2");
        assert_eq!(normalize(Some("2"), mc, &CAPITALS), "2");
        // Option matching is case-sensitive; unmatched text is kept.
        assert_eq!(normalize(Some("paris"), mc, &CAPITALS), "paris");
        assert_eq!(normalize(Some("Berlin"), mc, &CAPITALS), "Berlin");
    }

    #[test]
    fn padded_stored_options_match_after_trimming() {
        let mc = QuestionType::MultipleChoice;
        assert_eq!(normalize(Some("Nice"), mc, &CAPITALS), "2");
        assert_eq!(normalize(Some(" Nice "), mc, &CAPITALS), "2");
        assert_eq!(normalize(Some("nice"), mc, &CAPITALS), "nice");
    }

    #[test]
    fn multiple_choice_prefers_first_duplicate_option() {
        let dup = [Some("Yes"), Some("Yes"), None, None];
        assert_eq!(normalize(Some("Yes"), QuestionType::MultipleChoice, &dup), "0");
    }

    #[test]
    fn true_false_tokens() {
        let tf = QuestionType::TrueFalse;
        for token in ["true", "T", "1", "YES", " True "] {
            assert_eq!(normalize(Some(token), tf, &NONE), "true", "token {token:?}");
        }
        for token in ["false", "F", "0", "No", "FALSE"] {
            assert_eq!(normalize(Some(token), tf, &NONE), "false", "token {token:?}");
        }
        assert_eq!(normalize(Some("Maybe"), tf, &NONE), "maybe");
    }

    #[test]
    fn identification_trims_and_lowercases() {
        let id = QuestionType::Identification;
        assert_eq!(normalize(Some("  Manila "), id, &NONE), "manila");
        assert_eq!(normalize(Some("São Paulo"), id, &NONE), "são paulo");
    }

    #[test]
    fn display_form_shows_option_text() {
        let mc = QuestionType::MultipleChoice;
        assert_eq!(display_form("0", mc, &CAPITALS), "Paris");
        assert_eq!(display_form("3", mc, &CAPITALS), "3");
        assert_eq!(display_form("7", mc, &CAPITALS), "7");
        assert_eq!(display_form("", mc, &CAPITALS), "");
        assert_eq!(display_form("Berlin", mc, &CAPITALS), "Berlin");
        assert_eq!(display_form("0", QuestionType::Identification, &CAPITALS), "0");
    }
}
