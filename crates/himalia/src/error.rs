/*
 * error.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::fmt;

use crate::session::SignatureScheme;
use crate::wire::exception::Exception;

/// Errors produced by the kernel's wire, socket, and dispatch layers.
#[derive(Debug)]
pub enum Error {
    MissingDelimiter,
    InsufficientParts(usize, usize),
    BadSignature(String),
    Utf8Error(String, Vec<u8>, std::str::Utf8Error),
    JsonParseError(String, String, serde_json::Error),
    InvalidPart(String, serde_json::Value, serde_json::Error),
    InvalidMessage(String, serde_json::Value, serde_json::Error),
    CannotSerialize(serde_json::Error),
    UnknownMessageType(String),
    UnsupportedSignatureScheme(String),
    UnsupportedTransport(String),
    HmacKeyInvalid(String, hmac::digest::InvalidLength),
    CreateSocketFailed(String, zmq::Error),
    SocketBindError(String, String, zmq::Error),
    SocketConnectError(String, String, zmq::Error),
    UnsupportedSocketType(zmq::SocketType),
    ZmqError(String, zmq::Error),
    ChannelClosed(String),
    ThreadSpawnFailed(String, std::io::Error),
    ThreadPanicked(String),
    ConnectionFile(String, std::io::Error),
    ConnectionFileJson(String, serde_json::Error),
    Execution(Exception),
    Anyhow(anyhow::Error),
}

impl Error {
    /// Whether this error is a transport interrupt (`EINTR`), which channel
    /// loops always retry.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Error::ZmqError(_, zmq::Error::EINTR))
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingDelimiter => {
                write!(
                    f,
                    "ZeroMQ message did not include expected <IDS|MSG> delimiter"
                )
            },
            Error::InsufficientParts(found, expected) => {
                write!(
                    f,
                    "ZeroMQ message did not contain sufficient parts (found {found}, expected {expected})"
                )
            },
            Error::BadSignature(sig) => {
                write!(f, "ZeroMQ message HMAC signature '{sig}' is incorrect")
            },
            Error::Utf8Error(part, data, err) => {
                write!(
                    f,
                    "Message part '{part}' was not valid UTF-8: {err} (raw: {data:?})"
                )
            },
            Error::JsonParseError(part, str, err) => {
                write!(f, "Message part '{part}' is invalid JSON: {err} (raw: {str})")
            },
            Error::InvalidPart(part, json, err) => {
                write!(
                    f,
                    "Message part '{part}' does not match schema: {err} (raw: {json})"
                )
            },
            Error::InvalidMessage(kind, json, err) => {
                write!(f, "Invalid '{kind}' message: {err} (raw: {json})")
            },
            Error::CannotSerialize(err) => {
                write!(f, "Cannot serialize message: {err}")
            },
            Error::UnknownMessageType(kind) => {
                write!(f, "Unknown message type '{kind}'")
            },
            Error::UnsupportedSignatureScheme(scheme) => {
                write!(
                    f,
                    "Unsupported signature scheme '{scheme}' (expected one of: {})",
                    SignatureScheme::supported()
                )
            },
            Error::UnsupportedTransport(transport) => {
                write!(f, "Unsupported transport '{transport}'")
            },
            Error::HmacKeyInvalid(str, err) => {
                write!(
                    f,
                    "The HMAC supplied signing key '{}' ({} bytes) cannot be used: {}",
                    str,
                    str.len(),
                    err
                )
            },
            Error::CreateSocketFailed(name, err) => {
                write!(f, "Could not create ZeroMQ socket '{name}': {err}")
            },
            Error::SocketBindError(name, endpoint, err) => {
                write!(
                    f,
                    "Could not bind ZeroMQ socket '{name}' to endpoint {endpoint}: {err}"
                )
            },
            Error::SocketConnectError(name, endpoint, err) => {
                write!(
                    f,
                    "Could not connect ZeroMQ socket '{name}' to endpoint {endpoint}: {err}"
                )
            },
            Error::UnsupportedSocketType(kind) => {
                write!(f, "Unsupported ZeroMQ socket type: {kind:?}")
            },
            Error::ZmqError(name, err) => {
                write!(f, "ZeroMQ protocol error on {name} socket: {err}")
            },
            Error::ChannelClosed(name) => {
                write!(f, "The {name} channel was closed")
            },
            Error::ThreadSpawnFailed(name, err) => {
                write!(f, "Could not spawn thread '{name}': {err}")
            },
            Error::ThreadPanicked(name) => {
                write!(f, "Thread '{name}' panicked")
            },
            Error::ConnectionFile(path, err) => {
                write!(f, "Could not access connection file '{path}': {err}")
            },
            Error::ConnectionFileJson(path, err) => {
                write!(f, "Connection file '{path}' is not valid: {err}")
            },
            Error::Execution(exception) => {
                write!(f, "{}: {}", exception.ename, exception.evalue)
            },
            Error::Anyhow(err) => {
                write!(f, "{err:?}")
            },
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Self::Anyhow(error)
    }
}

#[macro_export]
macro_rules! anyhow {
    ($($rest: expr),*) => {{
        let message = anyhow::anyhow!($($rest, )*);
        $crate::error::Error::Anyhow(message)
    }}
}
