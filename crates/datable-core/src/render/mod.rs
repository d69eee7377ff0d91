pub mod archive;
pub mod markup;
