pub mod keys;
pub mod notification;
pub mod reading;
pub mod retry;
pub mod rule;
pub mod stream_config;
pub mod trace_id;
