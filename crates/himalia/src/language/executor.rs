/*
 * executor.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::wire::kernel_info_reply::KernelInfo;

/// A rendered result, keyed by MIME type (e.g. `text/plain`).
pub type MimeBundle = Map<String, Value>;

/// The backend that actually runs code. The kernel owns the protocol; an
/// executor only turns code into a result.
#[async_trait]
pub trait Executor: Send {
    /// Describes the implementation and language for `kernel_info_reply`.
    fn kernel_info(&self) -> KernelInfo;

    /// Runs `code` and returns its rendered result.
    ///
    /// Return `Error::Execution` to report a failure in the code itself (it
    /// is relayed to the frontend as-is). Any other error is reported as an
    /// internal kernel error. Either way the channel keeps running.
    async fn execute(&mut self, code: &str) -> crate::Result<MimeBundle>;
}
