pub mod document;
pub mod geometry;
pub mod id;
pub mod precision;
pub mod scope;
