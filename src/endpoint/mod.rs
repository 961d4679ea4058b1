//! Queue endpoints: polling consumer, producer and key processors.
//!
//! Both endpoints own their data queue connection for their whole running
//! lifetime: `Stopped → Starting → Running → Stopping → Stopped`.
//!
//! # Example
//!
//! ```rust
//! use keyscan::{EndpointConfig, Message, QueuePollingConsumer, QueueProducer};
//! use keyscan::queue::MemoryConnector;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> keyscan::Result<()> {
//! let connector = Arc::new(MemoryConnector::default());
//! let config = EndpointConfig::new("REPLIES").keyed(true);
//!
//! let producer = QueueProducer::new(config.clone(), connector.clone());
//! let consumer = QueuePollingConsumer::new(config, connector);
//! producer.start()?;
//! consumer.start()?;
//!
//! consumer.registry().add_key("client-7");
//! producer.send(&Message::new("hello").with_header("KEY", "client-7"))?;
//!
//! let message = consumer.receive_no_wait()?.unwrap();
//! assert_eq!(message.body().as_text(), Some("hello"));
//! # consumer.stop()?;
//! # producer.stop()?;
//! # Ok(())
//! # }
//! ```

mod consumer;
mod processor;
mod producer;
mod service;

pub use consumer::QueuePollingConsumer;
pub use processor::{AddKeyProcessor, Processor, RemoveKeyProcessor};
pub use producer::QueueProducer;
pub use service::ServiceState;
