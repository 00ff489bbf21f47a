pub mod embedder;
pub mod registry;
pub mod token;
