pub mod file;
pub mod fs;
pub mod json;
