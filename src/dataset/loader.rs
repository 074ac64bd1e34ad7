//! @ai:module:intent TOML dataset loader for food items
//! @ai:module:layer infrastructure
//! @ai:module:public_api DatasetLoader, DatasetLoaderTrait
//! @ai:module:stateless true

use crate::config::FilterConfig;
use crate::dataset::item::{DatasetFile, FoodItem};
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Trait for loading the food item dataset
pub trait DatasetLoaderTrait: Send + Sync {
    /// @ai:intent Load all items from the dataset directory
    fn load_all(&self, dataset_dir: &Path) -> Result<Vec<FoodItem>>;

    /// @ai:intent Load items matching filter criteria
    fn load_filtered(&self, dataset_dir: &Path, filter: &FilterConfig) -> Result<Vec<FoodItem>>;

    /// @ai:intent Strictly validate every dataset file
    fn validate(&self, dataset_dir: &Path) -> Result<Vec<FoodItem>>;
}

/// @ai:intent Loads food items from TOML files
/// @ai:effects pure (stateless)
pub struct DatasetLoader;

impl DatasetLoader {
    /// @ai:intent Create a new dataset loader
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Parse a single dataset file
    /// @ai:effects fs:read
    fn parse_dataset_file(path: &Path) -> Result<Vec<FoodItem>> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::file_access(path, e))?;

        let file: DatasetFile = toml::from_str(&content).map_err(|source| Error::DatasetParse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(meta) = &file.dataset {
            tracing::debug!("Parsed dataset {} ({} items)", meta.name, file.items.len());
        }

        Ok(file.items)
    }

    /// @ai:intent Find all TOML files in directory, in path order
    /// @ai:effects fs:read
    fn find_dataset_files(dataset_dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dataset_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "toml")
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// @ai:intent Reject items without an id or with a repeated id
    /// @ai:effects pure
    fn check_items(items: &[FoodItem]) -> Result<()> {
        let mut seen = HashSet::new();

        for item in items {
            if item.id.trim().is_empty() {
                return Err(Error::InvalidItem {
                    id: item.name.clone(),
                    message: "missing id".to_string(),
                });
            }

            if !seen.insert(item.id.as_str()) {
                return Err(Error::InvalidItem {
                    id: item.id.clone(),
                    message: "duplicate id".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoaderTrait for DatasetLoader {
    /// @ai:intent Load all items, skipping unreadable files
    /// @ai:effects fs:read
    fn load_all(&self, dataset_dir: &Path) -> Result<Vec<FoodItem>> {
        if !dataset_dir.exists() {
            return Err(Error::file_access(
                dataset_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "dataset directory not found"),
            ));
        }

        let mut items = Vec::new();

        for path in Self::find_dataset_files(dataset_dir) {
            match Self::parse_dataset_file(&path) {
                Ok(parsed) => items.extend(parsed),
                Err(e) => {
                    tracing::warn!("Skipping invalid dataset file {}: {}", path.display(), e);
                }
            }
        }

        Ok(items)
    }

    /// @ai:intent Load items matching filter criteria
    /// @ai:effects fs:read
    fn load_filtered(&self, dataset_dir: &Path, filter: &FilterConfig) -> Result<Vec<FoodItem>> {
        let filtered: Vec<FoodItem> = self
            .load_all(dataset_dir)?
            .into_iter()
            .filter(|item| filter.matches(&item.id))
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(filtered)
    }

    /// @ai:intent Load every file strictly, failing on the first problem
    /// @ai:effects fs:read
    fn validate(&self, dataset_dir: &Path) -> Result<Vec<FoodItem>> {
        let mut items = Vec::new();

        for path in Self::find_dataset_files(dataset_dir) {
            items.extend(Self::parse_dataset_file(&path)?);
        }

        Self::check_items(&items)?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_dataset_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    const SET_A: &str = r#"
[[item]]
id = "a-1"
name = "Pad Thai"
ingredients = "rice noodles, peanuts, egg, fish sauce"
allergens_mapped = "peanut, egg, fish"

[[item]]
id = "a-2"
name = "Garden Salad"
ingredients = "lettuce, tomato"
allergens_mapped = ""
"#;

    #[test]
    fn test_load_keeps_file_order() {
        let temp = TempDir::new().unwrap();
        create_dataset_file(temp.path(), "a.toml", SET_A);

        let loader = DatasetLoader::new();
        let items = loader.load_all(temp.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a-1");
        assert_eq!(items[1].id, "a-2");
    }

    #[test]
    fn test_load_skips_invalid_files() {
        let temp = TempDir::new().unwrap();
        create_dataset_file(temp.path(), "a.toml", SET_A);
        create_dataset_file(temp.path(), "broken.toml", "[[item]\nid = ");

        let loader = DatasetLoader::new();
        let items = loader.load_all(temp.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert!(loader.validate(temp.path()).is_err());
    }

    #[test]
    fn test_load_filtered_by_id_and_limit() {
        let temp = TempDir::new().unwrap();
        create_dataset_file(temp.path(), "nested/a.toml", SET_A);

        let loader = DatasetLoader::new();
        let filter = FilterConfig {
            item_ids: Some(vec!["a-2".to_string()]),
            ..Default::default()
        };
        let items = loader.load_filtered(temp.path(), &filter).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Garden Salad");

        let limited = FilterConfig {
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(loader.load_filtered(temp.path(), &limited).unwrap().len(), 1);
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let temp = TempDir::new().unwrap();
        create_dataset_file(temp.path(), "a.toml", SET_A);
        create_dataset_file(temp.path(), "b.toml", SET_A);

        let loader = DatasetLoader::new();
        let err = loader.validate(temp.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate id"));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let loader = DatasetLoader::new();
        assert!(loader.load_all(Path::new("/definitely/not/here")).is_err());
    }
}
