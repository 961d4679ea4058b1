//! Multi-key polling over keyed data queues.
//!
//! A keyed data queue can only be read one key at a time. This crate keeps a
//! dynamic, expiring registry of keys of interest and turns each poll into a
//! short-circuiting scan over them, so one connection can watch many keys.
//!
//! - [`keys`]: the key registry, its expiry sweep and the keyed scan
//! - [`endpoint`]: polling consumer, producer and key processors
//! - [`queue`]: the data queue traits and an in-memory implementation
//! - [`config`]: endpoint configuration

pub mod config;
pub mod constants;
pub mod endpoint;
pub mod error;
pub mod keys;
pub mod message;
pub mod queue;

pub use config::{EndpointConfig, ValidationResult};
pub use endpoint::{
    AddKeyProcessor, Processor, QueuePollingConsumer, QueueProducer, RemoveKeyProcessor,
    ServiceState,
};
pub use error::{Error, Result};
pub use keys::{ExpirySweeper, KeyRegistry, KeyedScanner, ScanHit};
pub use message::{Body, Format, HeaderValue, Message};
