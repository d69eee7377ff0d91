pub mod archive;
pub mod builder;
