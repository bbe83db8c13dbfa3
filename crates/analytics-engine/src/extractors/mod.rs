pub mod money;
pub mod timestamp;
