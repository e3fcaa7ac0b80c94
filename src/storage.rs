/// The course catalogue and catalogue-level prerequisite queries.
pub mod catalogue;
mod text;

pub use catalogue::{Catalogue, CatalogueEntry, CatalogueError, Lead, NestedItem, PrerequisiteKind};
