//! @ai:module:intent Food item definitions for the allergen dataset
//! @ai:module:layer domain
//! @ai:module:public_api FoodItem, DatasetFile
//! @ai:module:stateless true

use crate::allergen::{extract, AllergenSet};
use serde::{Deserialize, Serialize};

/// @ai:intent A single food item with its ground-truth allergens
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub ingredients: String,
    /// Allergen text as printed on the source label
    #[serde(default)]
    pub allergens_raw: String,
    /// Allergen text mapped onto the fixed vocabulary; the ground truth
    #[serde(default)]
    pub allergens_mapped: String,
}

impl FoodItem {
    /// @ai:intent Ground-truth label set for scoring
    /// @ai:effects pure
    pub fn ground_truth(&self) -> AllergenSet {
        extract(Some(&self.allergens_mapped))
    }
}

/// @ai:intent Raw dataset structure from a TOML file
/// @ai:effects pure
#[derive(Debug, Deserialize)]
pub struct DatasetFile {
    #[serde(default)]
    pub dataset: Option<DatasetMetadata>,
    #[serde(default, rename = "item")]
    pub items: Vec<FoodItem>,
}

/// @ai:intent Optional descriptive header of a dataset file
#[derive(Debug, Deserialize)]
pub struct DatasetMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_truth_extraction() {
        let item = FoodItem {
            id: "f-1".to_string(),
            name: "Pancake".to_string(),
            ingredients: "flour, milk, eggs".to_string(),
            allergens_raw: "Wheat flour, Milk, Egg".to_string(),
            allergens_mapped: "wheat, milk, egg".to_string(),
        };

        let gt = item.ground_truth();
        assert_eq!(gt.len(), 3);
        assert!(gt.contains("wheat"));
    }

    #[test]
    fn test_parse_dataset_file() {
        let content = r#"
[dataset]
name = "set-a"

[[item]]
id = "f-1"
name = "Satay"
ingredients = "chicken, peanut sauce"
allergens_mapped = "peanut"
"#;
        let file: DatasetFile = toml::from_str(content).unwrap();
        assert_eq!(file.dataset.unwrap().name, "set-a");
        assert_eq!(file.items.len(), 1);
        assert_eq!(file.items[0].allergens_raw, "");
    }
}
