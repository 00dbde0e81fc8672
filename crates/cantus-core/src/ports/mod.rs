pub mod catalog;
pub mod owner;

pub use catalog::{CatalogStore, CatalogTx, EntityQuery, ResumeKey, ScanBound};
pub use owner::OwnerResolver;
