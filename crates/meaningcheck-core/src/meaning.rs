//! Splitting a canonical meaning into its candidate senses.
//!
//! Reference answers in the word lists mix ASCII and full-width punctuation,
//! e.g. `反常的，异常的；变态的`. All four separators are equivalent.

/// The separator every alternate delimiter is normalized to.
pub const PRIMARY_DELIMITER: char = ';';

/// Alternate separators rewritten to [`PRIMARY_DELIMITER`] before splitting.
pub const ALTERNATE_DELIMITERS: [char; 3] = ['；', ',', '，'];

/// Split a canonical meaning into an ordered list of distinct, trimmed,
/// non-empty senses.
///
/// Order follows the first occurrence in the source string. Returns an empty
/// list only when the input has no non-whitespace content between delimiters.
pub fn split_meanings(canonical: &str) -> Vec<String> {
    let normalized: String = canonical
        .chars()
        .map(|c| {
            if ALTERNATE_DELIMITERS.contains(&c) {
                PRIMARY_DELIMITER
            } else {
                c
            }
        })
        .collect();

    let mut meanings: Vec<String> = Vec::new();
    for piece in normalized.split(PRIMARY_DELIMITER).map(str::trim) {
        if !piece.is_empty() && !meanings.iter().any(|m| m == piece) {
            meanings.push(piece.to_string());
        }
    }
    meanings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_all_four_delimiters() {
        assert_eq!(
            split_meanings("a;b，c,d；e"),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn delimiter_permutations_are_equivalent() {
        let delims = [";", "，", ",", "；"];
        for first in delims {
            for second in delims {
                let input = format!("x{first}y{second}z");
                assert_eq!(split_meanings(&input), vec!["x", "y", "z"], "{input}");
            }
        }
    }

    #[test]
    fn drops_empty_pieces() {
        assert_eq!(split_meanings("a;;b"), vec!["a", "b"]);
        assert_eq!(split_meanings(";a；，b,"), vec!["a", "b"]);
    }

    #[test]
    fn trims_each_sense() {
        assert_eq!(
            split_meanings("  反常的 ， 异常的；变态的  "),
            vec!["反常的", "异常的", "变态的"]
        );
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(split_meanings("").is_empty());
        assert!(split_meanings("   ").is_empty());
        assert!(split_meanings(" ; ，, ；").is_empty());
    }

    #[test]
    fn single_sense_is_kept() {
        assert_eq!(split_meanings("放弃"), vec!["放弃"]);
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        assert_eq!(split_meanings("a;b;a，b"), vec!["a", "b"]);
    }
}
