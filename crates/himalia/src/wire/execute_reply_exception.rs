/*
 * execute_reply_exception.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::exception::Exception;
use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// An `execute_reply` for code that failed. Same shape as an `ErrorReply`,
/// kept as its own type so replies can be matched by outcome.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecuteReplyException {
    /// The status; always Error
    pub status: Status,

    /// The execution counter
    pub execution_count: u32,

    /// The exception that occurred during execution
    #[serde(flatten)]
    pub exception: Exception,
}

impl MessageType for ExecuteReplyException {
    fn message_type() -> String {
        String::from("execute_reply")
    }
}
