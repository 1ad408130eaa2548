//! Output side of the conversion: where encoded lines go.
//!
//! A [`SinkProvider`] hands out one writer per table; the [`Router`] opens
//! them lazily, writes the header once and guarantees every writer is
//! flushed before it is released.

pub mod router;
pub mod sink;

pub use router::Router;
pub use sink::{DirectorySinks, SharedSink, SinkProvider};
