pub mod entry;
pub mod lecture;
pub mod store;
pub mod student;
