/*
 * mod.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

pub mod comm_info_reply;
pub mod comm_info_request;
pub mod error_reply;
pub mod exception;
pub mod execute_error;
pub mod execute_input;
pub mod execute_reply;
pub mod execute_reply_exception;
pub mod execute_request;
pub mod execute_result;
pub mod header;
pub mod help_link;
pub mod history_reply;
pub mod history_request;
pub mod input_reply;
pub mod is_complete_reply;
pub mod is_complete_request;
pub mod jupyter_message;
pub mod kernel_info_reply;
pub mod kernel_info_request;
pub mod language_info;
pub mod shutdown_request;
pub mod status;
pub mod subscription_message;
pub mod wire_message;
