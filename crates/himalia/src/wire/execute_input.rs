/*
 * execute_input.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Broadcast on IOPub to echo the code being executed to every frontend
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecuteInput {
    /// The code that is about to run
    pub code: String,

    /// The execution counter assigned to this request
    pub execution_count: u32,
}

impl MessageType for ExecuteInput {
    fn message_type() -> String {
        String::from("execute_input")
    }
}
