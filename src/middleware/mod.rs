pub mod no_cache;
pub mod notification;
