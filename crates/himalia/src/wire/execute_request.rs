/*
 * execute_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the frontend to execute code
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecuteRequest {
    /// The code to be executed
    pub code: String,

    /// Whether the code should be executed silently (not shown to the user)
    #[serde(default)]
    pub silent: bool,

    /// Whether the code should be stored in history
    #[serde(default = "default_true")]
    pub store_history: bool,

    /// Mapping of user expressions to be evaluated after code is executed.
    #[serde(default)]
    pub user_expressions: Value,

    /// Whether to allow the kernel to send stdin requests
    #[serde(default)]
    pub allow_stdin: bool,

    /// Whether the kernel should discard the execution queue if evaluating the
    /// code results in an error
    #[serde(default)]
    pub stop_on_error: bool,
}

fn default_true() -> bool {
    true
}

impl ExecuteRequest {
    pub fn new(code: &str) -> Self {
        Self {
            code: String::from(code),
            silent: false,
            store_history: true,
            user_expressions: Value::Object(serde_json::Map::new()),
            allow_stdin: false,
            stop_on_error: false,
        }
    }
}

impl MessageType for ExecuteRequest {
    fn message_type() -> String {
        String::from("execute_request")
    }
}
