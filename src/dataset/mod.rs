//! @ai:module:intent Food item dataset definitions and loading
//! @ai:module:layer domain
//! @ai:module:public_api FoodItem, DatasetLoader

pub mod item;
pub mod loader;

pub use item::{DatasetFile, FoodItem};
pub use loader::{DatasetLoader, DatasetLoaderTrait};
