/*
 * shutdown_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the frontend to shut the kernel down
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShutdownRequest {
    /// False if final shutdown; true if shutdown precedes a restart
    #[serde(default)]
    pub restart: bool,
}

impl MessageType for ShutdownRequest {
    fn message_type() -> String {
        String::from("shutdown_request")
    }
}
