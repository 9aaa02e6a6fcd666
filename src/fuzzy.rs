//! Lexical similarity between a token and a list of labels.
//!
//! Scores are normalized Indel similarities on a 0-100 scale, rounded to the
//! nearest integer. Both sides are compared after processing: lowercase,
//! non-alphanumerics replaced by spaces, outer whitespace trimmed.

/// Best lexical match for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch<'a> {
    /// Matched label, as given by the caller.
    pub label: &'a str,
    /// Similarity in `[0, 100]`.
    pub score: f32,
}

/// Lowercases, blanks out non-alphanumerics and trims.
pub fn process(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();
    mapped.trim().to_string()
}

/// Similarity of two strings on a 0-100 scale after processing.
pub fn ratio(a: &str, b: &str) -> f32 {
    indel_ratio(&process(a), &process(b))
}

fn indel_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = lcs_len(&a, &b);
    (200.0 * lcs as f32 / total as f32).round()
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Best-scoring label for `text`, first maximum winning ties.
///
/// Returns `None` when there are no labels or when `text` has nothing
/// comparable left after processing; callers treat that as "no fuzzy
/// evidence" rather than a failure.
pub fn match_fuzzy<'a, I>(text: &str, labels: I) -> Option<FuzzyMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = process(text);
    if query.is_empty() {
        return None;
    }
    let mut best: Option<FuzzyMatch<'a>> = None;
    for label in labels {
        let score = indel_ratio(&query, &process(label));
        match best {
            Some(top) if score <= top.score => {}
            _ => best = Some(FuzzyMatch { label, score }),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [&str; 4] = ["Doctor", "Nurse", "Teacher", "Police Officer"];

    #[test]
    fn processing_normalizes_case_and_punctuation() {
        assert_eq!(process("  Police-Officer! "), "police officer");
        assert_eq!(process("?!"), "");
    }

    #[test]
    fn ratio_scale() {
        assert_eq!(ratio("Doctor", "doctor"), 100.0);
        assert_eq!(ratio("Doctr", "Doctor"), 91.0);
        assert_eq!(ratio("Nurs", "Nurse"), 89.0);
        assert_eq!(ratio("Polise Ofice", "Police Officer"), 85.0);
        assert_eq!(ratio("Ann", "Doctor"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn picks_best_label() {
        let found = match_fuzzy("Teachr", LABELS).expect("evidence");
        assert_eq!(found.label, "Teacher");
        assert_eq!(found.score, 92.0);
    }

    #[test]
    fn first_label_wins_ties() {
        let found = match_fuzzy("xyz", ["Abc", "Def"]).expect("evidence");
        assert_eq!(found.label, "Abc");
        assert_eq!(found.score, 0.0);
    }

    #[test]
    fn no_evidence_cases() {
        assert_eq!(match_fuzzy("Doctor", Vec::<&str>::new()), None);
        assert_eq!(match_fuzzy("", LABELS), None);
        assert_eq!(match_fuzzy("--", LABELS), None);
    }
}
