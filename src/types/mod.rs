pub mod ids;
pub mod timestamp;
