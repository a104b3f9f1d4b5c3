/*
 * error_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::exception::Exception;
use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;

/// Represents an error that occurred after processing a request on a
/// ROUTER/DEALER socket.
///
/// Every error reply carries the execution counter as it stood when the
/// request was refused, so frontends can keep their prompt numbering in sync
/// even for requests the kernel doesn't understand.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorReply {
    /// The status; always Error
    pub status: Status,

    /// The current value of the execution counter
    pub execution_count: u32,

    /// The exception describing why the request was refused
    #[serde(flatten)]
    pub exception: Exception,
}

/// Note that the message type of an error reply is set from its request type
/// (e.g. foo_request => foo_reply). The message type implemented here is only
/// a placeholder and should not appear in any serialized/deserialized message.
impl MessageType for ErrorReply {
    fn message_type() -> String {
        String::from("*error payload*")
    }
}
