//! Shared tracing setup for the pagewatch binaries.

mod subscriber;

pub use subscriber::{LogFormat, init_tracing, init_with_level, try_init};
