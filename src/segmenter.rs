//! Turns a fingerspelled gesture stream into a candidate word.
//!
//! The recognizer emits letter groups separated by a terminator marker, e.g.
//! `AYA-STOP-NBC-STOP-DEF-STOP`. Every completed group contributes its first
//! letter; whatever follows the final terminator is an unfinished entry and
//! is discarded.

/// Marker the recognizer emits between fingerspelled letters.
pub const DEFAULT_TERMINATOR: &str = "STOP";

/// Extracts the candidate word from `stream`.
///
/// A stream without any terminator yields an empty string: all of its
/// content counts as the trailing, unfinished entry. `-` and whitespace at
/// the edges of a group are separators, so a group made only of them counts
/// as empty and contributes nothing. Letters keep their case.
pub fn segment(stream: &str, terminator: &str) -> String {
    if terminator.is_empty() {
        return String::new();
    }
    let mut segments: Vec<&str> = stream.split(terminator).collect();
    segments.pop();
    segments
        .into_iter()
        .map(strip_glue)
        .filter_map(|segment| segment.chars().next())
        .collect()
}

// `-` and whitespace join letter groups to terminators; they are never letters.
fn strip_glue(segment: &str) -> &str {
    segment.trim_matches(|ch: char| ch == '-' || ch.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_letter_of_each_completed_group() {
        assert_eq!(segment("AYA-STOP-NBC-STOP-DEF-STOP", DEFAULT_TERMINATOR), "AND");
        assert_eq!(segment("ASTOPNSTOPDSTOP", DEFAULT_TERMINATOR), "AND");
    }

    #[test]
    fn trailing_entry_is_dropped() {
        assert_eq!(segment("AYA-STOP-NBC-STOP-DEF", DEFAULT_TERMINATOR), "AN");
        assert_eq!(segment("A-STOP-N-STOP-D-STOP-XYZ", DEFAULT_TERMINATOR), "AND");
    }

    #[test]
    fn no_terminator_yields_empty_candidate() {
        assert_eq!(segment("ANN", DEFAULT_TERMINATOR), "");
        assert_eq!(segment("", DEFAULT_TERMINATOR), "");
    }

    #[test]
    fn consecutive_terminators_are_skipped() {
        assert_eq!(segment("A-STOP-STOP-N-STOP--STOP-N-STOP", DEFAULT_TERMINATOR), "ANN");
        assert_eq!(segment("STOPSTOP", DEFAULT_TERMINATOR), "");
    }

    #[test]
    fn whitespace_only_group_is_empty() {
        assert_eq!(segment("A-STOP- \t -STOP-N-STOP", DEFAULT_TERMINATOR), "AN");
        assert_eq!(segment(" STOP", DEFAULT_TERMINATOR), "");
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(segment("a-STOP-nn-STOP-N-STOP", DEFAULT_TERMINATOR), "anN");
    }

    #[test]
    fn digits_pass_through() {
        assert_eq!(segment("1-STOP-2-STOP-0-STOP", DEFAULT_TERMINATOR), "120");
    }

    #[test]
    fn custom_terminator() {
        assert_eq!(segment("A|B|C", "|"), "AB");
        assert_eq!(segment("A|B|C", ""), "");
    }
}
