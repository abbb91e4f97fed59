pub mod adjustment;
pub mod capacity;
pub mod engine;
pub mod resolver;
