/*
 * history_request.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a request from the frontend for past inputs. The kernel keeps
/// no history, so none of the fields change the (empty) answer; they are
/// accepted so well-formed requests decode.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct HistoryRequest {
    #[serde(default)]
    pub output: bool,

    #[serde(default)]
    pub raw: bool,

    /// One of "range", "tail", or "search"
    #[serde(default)]
    pub hist_access_type: String,
}

impl MessageType for HistoryRequest {
    fn message_type() -> String {
        String::from("history_request")
    }
}
