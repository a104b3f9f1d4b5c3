/*
 * execute_error.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::exception::Exception;
use crate::wire::jupyter_message::MessageType;

/// IOPub broadcast of a failed execution, message type `error`. The Shell
/// side of the same failure is an `execute_reply` with status `error`
/// (see `ExecuteReplyException`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecuteError {
    #[serde(flatten)]
    pub exception: Exception,
}

impl From<Exception> for ExecuteError {
    fn from(exception: Exception) -> Self {
        Self { exception }
    }
}

impl MessageType for ExecuteError {
    fn message_type() -> String {
        String::from("error")
    }
}
