//! Processors that maintain a [`KeyRegistry`] from routed messages.
//!
//! Upstream routes announce interest in a key by sending a message whose
//! body is the key. Routing that message through an [`AddKeyProcessor`]
//! registers (or refreshes) the key for every consumer sharing the registry.

use crate::error::{Error, Result};
use crate::keys::KeyRegistry;
use crate::message::Message;
use tracing::info;

/// A step that handles a routed message.
pub trait Processor: Send + Sync {
    /// Handle `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be processed.
    fn process(&self, message: &Message) -> Result<()>;
}

fn key_from_body(message: &Message) -> Result<&str> {
    message
        .body()
        .as_text()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| Error::configuration("search key message body must be non-empty text"))
}

/// Registers the key carried in the message body.
#[derive(Debug, Clone)]
pub struct AddKeyProcessor {
    registry: KeyRegistry,
}

impl AddKeyProcessor {
    pub fn new(registry: KeyRegistry) -> Self {
        Self { registry }
    }
}

impl Processor for AddKeyProcessor {
    fn process(&self, message: &Message) -> Result<()> {
        let key = key_from_body(message)?;
        self.registry.add_key(key);
        info!(key = %key, "Added search key");
        Ok(())
    }
}

/// Unregisters the key carried in the message body.
#[derive(Debug, Clone)]
pub struct RemoveKeyProcessor {
    registry: KeyRegistry,
}

impl RemoveKeyProcessor {
    pub fn new(registry: KeyRegistry) -> Self {
        Self { registry }
    }
}

impl Processor for RemoveKeyProcessor {
    fn process(&self, message: &Message) -> Result<()> {
        let key = key_from_body(message)?;
        if self.registry.remove_key(key) {
            info!(key = %key, "Removed search key");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_key() {
        let registry = KeyRegistry::new();
        let add = AddKeyProcessor::new(registry.clone());
        let remove = RemoveKeyProcessor::new(registry.clone());

        add.process(&Message::new("ORDER-42")).unwrap();
        add.process(&Message::new(b"ORDER-43".to_vec())).unwrap();
        add.process(&Message::new("ORDER-42")).unwrap();
        assert_eq!(registry.snapshot(), vec!["ORDER-42", "ORDER-43"]);

        remove.process(&Message::new("ORDER-42")).unwrap();
        remove.process(&Message::new("unknown")).unwrap();
        assert_eq!(registry.snapshot(), vec!["ORDER-43"]);
    }

    #[test]
    fn test_rejects_empty_or_binary_key() {
        let registry = KeyRegistry::new();
        let add = AddKeyProcessor::new(registry.clone());

        assert!(matches!(
            add.process(&Message::new("")),
            Err(Error::Configuration(_))
        ));
        assert!(add.process(&Message::new(vec![0xff, 0x00])).is_err());
        assert!(registry.is_empty());
    }
}
