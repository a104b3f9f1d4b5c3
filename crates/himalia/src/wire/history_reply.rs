/*
 * history_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryReply {
    pub status: Status,

    /// (session, line_number, input) entries; always empty
    pub history: Vec<Value>,
}

impl MessageType for HistoryReply {
    fn message_type() -> String {
        String::from("history_reply")
    }
}
