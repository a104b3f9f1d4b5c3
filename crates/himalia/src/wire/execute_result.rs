/*
 * execute_result.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Broadcast on IOPub with the rendered result of an execution
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecuteResult {
    /// The data giving the result of the execution, keyed by MIME type
    pub data: Value,

    /// A monotonically increasing execution counter
    pub execution_count: u32,

    /// Optional additional metadata
    pub metadata: Value,
}

impl MessageType for ExecuteResult {
    fn message_type() -> String {
        String::from("execute_result")
    }
}
