pub mod app;
pub mod cli;
pub mod comm;
pub mod data;
pub mod error;
pub mod plotting;
pub mod serial;
pub mod source;

/// Samples buffered between a producer and the window.
const SAMPLE_QUEUE_SIZE: usize = 128;
