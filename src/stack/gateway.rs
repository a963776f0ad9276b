//! Kong gateway configuration
//!
//! The gateway file is kept as a generic YAML tree. Mapping order follows the
//! document, so a file that is loaded and saved keeps its key order even
//! though comments and formatting are not preserved.

use crate::error::{HservError, Result};
use serde_yaml::{Mapping, Value};

const CONSUMERS: &str = "consumers";
const USERNAME: &str = "username";
const KEYAUTH_CREDENTIALS: &str = "keyauth_credentials";

/// Parsed gateway configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayConfig {
    document: Value,
}

impl GatewayConfig {
    /// Parse a YAML document
    pub fn from_yaml(text: &str) -> Result<Self> {
        let document = serde_yaml::from_str::<Value>(text)?;
        Ok(Self { document })
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.document)?)
    }

    pub fn value(&self) -> &Value {
        &self.document
    }

    fn consumer(&self, username: &str) -> Option<&Value> {
        self.document
            .get(CONSUMERS)?
            .as_sequence()?
            .iter()
            .find(|consumer| consumer.get(USERNAME).and_then(Value::as_str) == Some(username))
    }

    fn consumer_mut(&mut self, username: &str) -> Option<&mut Mapping> {
        self.document
            .get_mut(CONSUMERS)?
            .as_sequence_mut()?
            .iter_mut()
            .find(|consumer| consumer.get(USERNAME).and_then(Value::as_str) == Some(username))?
            .as_mapping_mut()
    }

    /// Keys configured for a consumer's key-auth credentials
    pub fn consumer_keys(&self, username: &str) -> Result<Vec<String>> {
        let consumer = self
            .consumer(username)
            .ok_or_else(|| HservError::consumer_not_found(username))?;

        let keys = consumer
            .get(KEYAUTH_CREDENTIALS)
            .and_then(Value::as_sequence)
            .map(|credentials| {
                credentials
                    .iter()
                    .filter_map(|credential| credential.get("key").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(keys)
    }

    /// Replace a consumer's key-auth credentials with a single key
    pub fn set_consumer_key(&mut self, username: &str, key: &str) -> Result<()> {
        let consumer = self
            .consumer_mut(username)
            .ok_or_else(|| HservError::consumer_not_found(username))?;

        let mut credential = Mapping::new();
        credential.insert(Value::from("key"), Value::from(key));
        consumer.insert(
            Value::from(KEYAUTH_CREDENTIALS),
            Value::Sequence(vec![Value::Mapping(credential)]),
        );

        Ok(())
    }
}
