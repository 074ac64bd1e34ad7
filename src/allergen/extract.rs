//! @ai:module:intent Canonicalize allergen text into label sets
//! @ai:module:layer domain
//! @ai:module:public_api AllergenSet, extract, approximate_lexical_match, canonical_prediction_text
//! @ai:module:stateless true

use crate::allergen::label::AllergenLabel;
use std::collections::BTreeSet;

/// Literal a model outputs when it finds no allergen.
pub const EMPTY_SENTINEL: &str = "EMPTY";

/// Normalized, order-insensitive set of allergen tokens.
///
/// Tokens outside the fixed vocabulary are kept; they still count toward
/// precision and recall.
pub type AllergenSet = BTreeSet<String>;

/// @ai:intent Split comma-separated allergen text into a normalized set
/// @ai:post no token is empty or equal to "empty"
/// @ai:example (Some("Milk, egg ,, EMPTY")) -> {"egg", "milk"}
/// @ai:effects pure
pub fn extract(text: Option<&str>) -> AllergenSet {
    let Some(text) = text else {
        return AllergenSet::new();
    };

    text.to_lowercase()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty() && *token != "empty")
        .map(str::to_string)
        .collect()
}

/// @ai:intent Scan free text for each vocabulary phrase as a plain substring
///
/// This is deliberately approximate: it does not tokenize, so "shellfish"
/// also yields "fish" and "eggplant" yields "egg".
/// @ai:post result is in vocabulary order without duplicates
/// @ai:effects pure
pub fn approximate_lexical_match(text: &str) -> Vec<AllergenLabel> {
    let lowered = text.to_lowercase();

    AllergenLabel::ALL
        .into_iter()
        .filter(|label| lowered.contains(label.as_str()))
        .collect()
}

/// @ai:intent Render predicted labels the way records store them
/// @ai:effects pure
pub fn canonical_prediction_text(labels: &[AllergenLabel]) -> String {
    if labels.is_empty() {
        return EMPTY_SENTINEL.to_string();
    }

    labels
        .iter()
        .map(|label| label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> AllergenSet {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_extract_normalizes_tokens() {
        assert_eq!(extract(Some(" Milk, EGG ,milk")), set(&["egg", "milk"]));
    }

    #[test]
    fn test_extract_drops_empty_and_sentinel() {
        assert_eq!(extract(Some("EMPTY")), AllergenSet::new());
        assert_eq!(extract(Some(" , ,")), AllergenSet::new());
        assert_eq!(extract(Some("soy, empty")), set(&["soy"]));
    }

    #[test]
    fn test_extract_none_is_empty() {
        assert!(extract(None).is_empty());
    }

    #[test]
    fn test_extract_keeps_unknown_tokens() {
        assert_eq!(extract(Some("mustard, soy")), set(&["mustard", "soy"]));
    }

    #[test]
    fn test_lexical_match_is_substring_based() {
        let labels = approximate_lexical_match("Contains SHELLFISH and peanuts.");
        assert_eq!(
            labels,
            vec![AllergenLabel::Peanut, AllergenLabel::Fish, AllergenLabel::Shellfish]
        );
    }

    #[test]
    fn test_lexical_match_nothing() {
        assert!(approximate_lexical_match("none found").is_empty());
    }

    #[test]
    fn test_canonical_prediction_text() {
        assert_eq!(canonical_prediction_text(&[]), "EMPTY");
        assert_eq!(
            canonical_prediction_text(&[AllergenLabel::Milk, AllergenLabel::TreeNut]),
            "milk, tree nut"
        );
    }
}
