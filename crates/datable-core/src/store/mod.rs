pub mod database;
pub mod registry;
