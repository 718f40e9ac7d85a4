pub mod config;
pub mod error;
pub mod report;
pub mod ring_buffer;
pub mod stats;
