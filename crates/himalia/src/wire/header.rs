/*
 * header.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

/// The messaging protocol version stamped on headers we create
pub const PROTOCOL_VERSION: &str = "5.3";

/// Represents the header of a Jupyter message
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JupyterHeader {
    /// The message identifier; must be unique per message
    pub msg_id: String,

    /// Session ID; must be unique per session
    #[serde(default)]
    pub session: String,

    /// Username; must be unique per user
    #[serde(default)]
    pub username: String,

    /// Date/time when message was created (ISO 8601)
    pub date: Option<String>,

    /// Message type
    pub msg_type: String,

    /// Message protocol version
    pub version: Option<String>,

    /// Any other fields sent by the peer (e.g. `subtype`); kept so they
    /// survive a decode/encode round trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JupyterHeader {
    /// Creates a new header with a fresh message ID.
    pub fn create(msg_type: String, session: String, username: String) -> Self {
        Self {
            msg_id: Uuid::new_v4().to_string(),
            session,
            username,
            date: Some(chrono::Utc::now().to_rfc3339()),
            msg_type,
            version: Some(String::from(PROTOCOL_VERSION)),
            extra: Map::new(),
        }
    }
}
