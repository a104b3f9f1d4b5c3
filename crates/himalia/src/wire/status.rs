/*
 * status.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Busy,
    Idle,
    Starting,
}

/// Broadcast on IOPub whenever the kernel starts or finishes handling a
/// request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KernelStatus {
    pub execution_state: ExecutionState,
}

impl MessageType for KernelStatus {
    fn message_type() -> String {
        String::from("status")
    }
}
