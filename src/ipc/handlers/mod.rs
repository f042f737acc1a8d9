pub mod categories;
pub mod core;
pub mod engine;
pub mod plan;
pub mod slots;
