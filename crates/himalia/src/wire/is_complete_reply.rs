/*
 * is_complete_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum IsComplete {
    Complete,
    Incomplete,
    Invalid,
    Unknown,
}

/// Represents a reply to an is_complete_request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IsCompleteReply {
    /// The status of the code
    pub status: IsComplete,

    /// Characters to use for indenting the next line (if incomplete)
    pub indent: String,
}

impl MessageType for IsCompleteReply {
    fn message_type() -> String {
        String::from("is_complete_reply")
    }
}
