mod health;
mod metrics;
mod server;

pub use self::server::{router, serve};
