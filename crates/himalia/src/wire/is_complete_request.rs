/*
 * is_complete_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Asks whether `code` is ready to run. Code is opaque to the kernel, so the
/// answer is always `unknown`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IsCompleteRequest {
    #[serde(default)]
    pub code: String,
}

impl MessageType for IsCompleteRequest {
    fn message_type() -> String {
        String::from("is_complete_request")
    }
}
