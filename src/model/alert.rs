//! Alerts as received from the source and after decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An undecoded alert, stamped with the time it was received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAlert {
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl RawAlert {
    pub fn new(body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            timestamp,
        }
    }

    /// Parse the body as JSON.
    pub fn decode(&self) -> Result<Alert> {
        Ok(Alert {
            payload: serde_json::from_str(&self.body)?,
            timestamp: self.timestamp,
        })
    }
}

/// A decoded alert handed to the decision logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Opaque to the dispatcher.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Look up a string field on the payload.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(|v| v.as_str())
    }
}
