pub mod directory;
pub mod stats;
