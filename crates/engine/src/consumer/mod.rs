mod connection;
mod consumer_loop;
mod handler;
mod processor;

pub use self::connection::{connect_jetstream, create_pull_consumer, ensure_stream};
pub use self::consumer_loop::ConsumerLoop;
pub use self::handler::{decode_reading, pull_batch, DecodeError};
pub use self::processor::{ProcessorOptions, ReadingProcessor};
