/*
 * input_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Text typed by the user, sent on Stdin. The kernel never prompts, so any
/// that arrive are unsolicited.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InputReply {
    #[serde(default)]
    pub value: String,
}

impl MessageType for InputReply {
    fn message_type() -> String {
        String::from("input_reply")
    }
}
