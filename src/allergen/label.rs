//! @ai:module:intent Fixed allergen label vocabulary
//! @ai:module:layer domain
//! @ai:module:public_api AllergenLabel
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// @ai:intent One of the nine allergens the benchmark scores against
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergenLabel {
    Milk,
    Egg,
    Peanut,
    TreeNut,
    Wheat,
    Soy,
    Fish,
    Shellfish,
    Sesame,
}

impl AllergenLabel {
    /// Canonical vocabulary order, used for prompts, matching and macro-F1.
    pub const ALL: [AllergenLabel; 9] = [
        AllergenLabel::Milk,
        AllergenLabel::Egg,
        AllergenLabel::Peanut,
        AllergenLabel::TreeNut,
        AllergenLabel::Wheat,
        AllergenLabel::Soy,
        AllergenLabel::Fish,
        AllergenLabel::Shellfish,
        AllergenLabel::Sesame,
    ];

    /// @ai:intent Convert label to its lower-case phrase
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            AllergenLabel::Milk => "milk",
            AllergenLabel::Egg => "egg",
            AllergenLabel::Peanut => "peanut",
            AllergenLabel::TreeNut => "tree nut",
            AllergenLabel::Wheat => "wheat",
            AllergenLabel::Soy => "soy",
            AllergenLabel::Fish => "fish",
            AllergenLabel::Shellfish => "shellfish",
            AllergenLabel::Sesame => "sesame",
        }
    }

    /// @ai:intent Look up a label by its exact phrase
    /// @ai:pre phrase is already trimmed and lower-cased
    /// @ai:effects pure
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == phrase)
    }

    /// @ai:intent Comma-separated vocabulary as shown to the model
    /// @ai:effects pure
    pub fn vocabulary_line() -> String {
        Self::ALL
            .iter()
            .map(|label| label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for AllergenLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
