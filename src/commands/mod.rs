//! CLI command implementations.

mod catalog;
mod update;

pub use catalog::CatalogCmd;
pub use update::UpdateCmd;
