/*
 * kernel_info_reply.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::header::PROTOCOL_VERSION;
use crate::wire::help_link::HelpLink;
use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::Status;
use crate::wire::language_info::LanguageInfo;

/// What an execution backend says about itself. The kernel adds the protocol
/// fields when building the `kernel_info_reply`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KernelInfo {
    /// The kernel implementation name (e.g. "simple_kernel")
    pub implementation: String,

    /// The version of the implementation
    pub implementation_version: String,

    /// Information about the language the kernel supports
    pub language_info: LanguageInfo,

    /// A startup banner
    pub banner: String,

    /// A list of help links
    pub help_links: Vec<HelpLink>,
}

/// Represents a reply to a kernel_info_request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KernelInfoReply {
    /// Version of messaging protocol
    pub protocol_version: String,

    /// The execution status ("ok" or "error")
    pub status: Status,

    pub implementation: String,

    pub implementation_version: String,

    /// Information about the language the kernel supports
    pub language_info: LanguageInfo,

    /// A startup banner
    pub banner: String,

    /// Whether debugging is supported
    pub debugger: bool,

    /// A list of help links
    pub help_links: Vec<HelpLink>,
}

impl MessageType for KernelInfoReply {
    fn message_type() -> String {
        String::from("kernel_info_reply")
    }
}

/// Adds the protocol fields to the backend's `KernelInfo`.
impl From<KernelInfo> for KernelInfoReply {
    fn from(value: KernelInfo) -> Self {
        Self {
            protocol_version: String::from(PROTOCOL_VERSION),
            status: Status::Ok,
            debugger: false,

            implementation: value.implementation,
            implementation_version: value.implementation_version,
            language_info: value.language_info,
            banner: value.banner,
            help_links: value.help_links,
        }
    }
}
