//! @ai:module:intent Allergen vocabulary, set extraction and lexical matching
//! @ai:module:layer domain
//! @ai:module:public_api AllergenLabel, AllergenSet, extract, approximate_lexical_match
//! @ai:module:stateless true

pub mod extract;
pub mod label;

pub use extract::{
    approximate_lexical_match, canonical_prediction_text, extract, AllergenSet, EMPTY_SENTINEL,
};
pub use label::AllergenLabel;
