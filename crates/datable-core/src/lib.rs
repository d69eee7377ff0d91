//! Datable archive core library.
//!
//! Derives the years, and the months within a year, for which rows of a
//! SQLite table exist (grouped on a configurable timestamp column), and
//! renders that breakdown as a nested navigation list. With the `python`
//! feature the crate also builds as the `_datable_core` extension module so
//! page templates of a Python web host can call it.

pub mod errors;
pub mod models;
pub mod query;
pub mod render;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use errors::{DatableError, DatableResult};
pub use models::{
    ArchiveCollection, ArchiveConfig, ArchiveOptions, ArchiveTarget, CompareOp, Filter,
    FilterValue, Selection, SortOrder,
};
pub use render::archive::{render_archive, ArchiveRenderer};
pub use store::database::Database;
pub use store::registry::{ArchiveRegistry, DatableModel};
