pub mod resolve;
pub mod structural_path;
