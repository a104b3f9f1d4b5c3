/*
 * wire_message.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use log::trace;
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::json;
use serde_json::value::Value;

use crate::error::Error;
use crate::session::Session;
use crate::session::SignaturePolicy;
use crate::session::Signer;
use crate::socket::socket::Socket;
use crate::wire::header::JupyterHeader;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::ProtocolMessage;

/// This delimiter separates the ZeroMQ socket identities (IDS) from the message
/// body payload (MSG).
pub const MSG_DELIM: &[u8] = b"<IDS|MSG>";

/// Represents an untyped Jupyter message delivered over the wire. A WireMessage
/// can represent any kind of Jupyter message; typically its header will be
/// examined and it will be converted into a typed JupyterMessage.
#[derive(Debug, Clone, PartialEq)]
pub struct WireMessage {
    /// The ZeroMQ identities. These store the peer identity for messages
    /// delivered request-reply style over ROUTER sockets (like the shell)
    pub zmq_identities: Vec<Vec<u8>>,

    /// The header for this message
    pub header: JupyterHeader,

    /// The header of the message from which this message originated, if any.
    /// If none, it's serialized as an empty dict as required by the Jupyter
    /// protocol.
    pub parent_header: Option<JupyterHeader>,

    /// Additional metadata, if any
    pub metadata: Value,

    /// The body (payload) of the message
    pub content: Value,
}

/// The result of decoding an envelope, before any signature policy has been
/// applied.
#[derive(Debug)]
pub struct Decoded {
    pub message: WireMessage,

    /// The signature as received
    pub signature: String,

    /// Whether `signature` matches the digest recomputed over the received
    /// parts
    pub verified: bool,
}

impl WireMessage {
    /// Read a WireMessage from a ZeroMQ socket.
    pub fn read_from_socket(socket: &Socket) -> Result<WireMessage, Error> {
        let bufs = socket.recv_multipart()?;
        Self::from_buffers(bufs, &socket.session)
    }

    /// Return the Jupyter type of the message.
    pub fn message_type(&self) -> String {
        self.header.msg_type.clone()
    }

    /// Parse a Jupyter message from an array of buffers (from a ZeroMQ
    /// message), applying the session's signature policy.
    pub fn from_buffers(bufs: Vec<Vec<u8>>, session: &Session) -> Result<WireMessage, Error> {
        let envelope = Envelope::split(bufs)?;
        envelope.check_signature(session)?;
        envelope.parse()
    }

    /// Decodes a multipart message without applying any signature policy;
    /// the caller decides what to do with `verified`.
    pub fn decode(bufs: Vec<Vec<u8>>, signer: &Signer) -> Result<Decoded, Error> {
        let envelope = Envelope::split(bufs)?;
        let verified = envelope.verify(signer);
        Ok(Decoded {
            message: envelope.parse()?,
            signature: envelope.signature(),
            verified,
        })
    }

    /// Serializes and signs the message, producing the frames to hand to
    /// ZeroMQ: identities, delimiter, signature, then the four message parts.
    pub fn encode(&self, signer: &Signer) -> Result<Vec<Vec<u8>>, Error> {
        // Serialize JSON values into byte parts in preparation for transmission
        let mut parts: Vec<Vec<u8>> = match self.to_raw_parts() {
            Ok(v) => v,
            Err(err) => return Err(Error::CannotSerialize(err)),
        };

        let signature = signer.sign(&parts);

        // Start with the socket identities, if any
        let mut msg: Vec<Vec<u8>> = self.zmq_identities.clone();
        msg.push(MSG_DELIM.to_vec());
        msg.push(signature.into_bytes());
        msg.append(&mut parts);

        Ok(msg)
    }

    /// Send this message to the given ZeroMQ socket.
    pub fn send(&self, socket: &Socket) -> Result<(), Error> {
        match &self.parent_header {
            Some(parent) => {
                trace!(
                    "Sending '{}' message (reply to '{}') via {} socket",
                    self.header.msg_type,
                    parent.msg_type,
                    socket.name
                );
            },
            None => {
                trace!(
                    "Sending '{}' message via {} socket",
                    self.header.msg_type,
                    socket.name
                );
            },
        }

        let msg = self.encode(&socket.session.signer)?;
        socket.send_multipart(&msg)
    }

    /// Returns a vector containing the raw parts of the message
    fn to_raw_parts(&self) -> Result<Vec<Vec<u8>>, serde_json::Error> {
        let mut parts: Vec<Vec<u8>> = Vec::new();
        parts.push(serde_json::to_vec(&self.header)?);

        // The Jupyter protocol states that orphan messages should have an
        // empty dict as parent
        match &self.parent_header {
            Some(parent) => parts.push(serde_json::to_vec(parent)?),
            None => parts.push(serde_json::to_vec(&serde_json::Map::new())?),
        }

        parts.push(serde_json::to_vec(&self.metadata)?);
        parts.push(serde_json::to_vec(&self.content)?);
        Ok(parts)
    }
}

/// A multipart message split at the `<IDS|MSG>` delimiter, with the message
/// frames still in their raw received form. The signature must be checked
/// against these exact bytes, not against a re-serialization.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub zmq_identities: Vec<Vec<u8>>,
    pub signature: Vec<u8>,

    /// The header, parent header, metadata, and content frames, in order
    pub frames: Vec<Vec<u8>>,
}

impl Envelope {
    /// Locates the delimiter, skipping any routing identities that precede
    /// it, and takes the signature and four message frames that follow.
    pub fn split(mut bufs: Vec<Vec<u8>>) -> Result<Self, Error> {
        // Find the position of the <IDS|MSG> delimiter in the message, which
        // separates the socket identities (IDS) from the body of the message
        // (MSG).
        let pos = match bufs.iter().position(|buf| &buf[..] == MSG_DELIM) {
            Some(p) => p,
            None => return Err(Error::MissingDelimiter),
        };

        // Form a collection of the remaining parts, and remove the delimiter.
        let mut parts: Vec<_> = bufs.drain(pos + 1..).collect();
        bufs.pop();

        // We expect to have at least 5 parts left (the HMAC + 4 message frames).
        // Anything past those is a binary buffer, which we don't use.
        if parts.len() < 5 {
            return Err(Error::InsufficientParts(parts.len(), 5));
        }
        parts.truncate(5);
        let frames = parts.split_off(1);
        let signature = parts.remove(0);

        Ok(Self {
            zmq_identities: bufs,
            signature,
            frames,
        })
    }

    pub fn signature(&self) -> String {
        String::from_utf8_lossy(&self.signature).into_owned()
    }

    pub fn verify(&self, signer: &Signer) -> bool {
        signer.verify(&self.frames, &self.signature)
    }

    /// Applies the session's signature policy.
    pub fn check_signature(&self, session: &Session) -> Result<(), Error> {
        if self.verify(&session.signer) {
            return Ok(());
        }
        match session.policy {
            SignaturePolicy::Enforce => Err(Error::BadSignature(self.signature())),
            SignaturePolicy::Permissive => {
                warn!(
                    "Accepting message with incorrect signature '{}'",
                    self.signature()
                );
                Ok(())
            },
        }
    }

    /// Parses only the header frame. Used to address an error reply when the
    /// rest of the message can't be decoded.
    pub fn header(&self) -> Result<JupyterHeader, Error> {
        Self::parse_header(String::from("header"), &self.frames[0])
    }

    /// Parses all four frames into a message.
    pub fn parse(&self) -> Result<WireMessage, Error> {
        let header = self.header()?;

        // The parent header is an empty dict when there is no parent
        let parent_val = Self::parse_buffer(String::from("parent header"), &self.frames[1])?;
        let parent_header = match &parent_val {
            Value::Object(map) if map.is_empty() => None,
            Value::Null => None,
            _ => Some(Self::parse_header_value(
                String::from("parent header"),
                parent_val,
            )?),
        };

        Ok(WireMessage {
            zmq_identities: self.zmq_identities.clone(),
            header,
            parent_header,
            metadata: Self::parse_buffer(String::from("metadata"), &self.frames[2])?,
            content: Self::parse_buffer(String::from("content"), &self.frames[3])?,
        })
    }

    fn parse_header(desc: String, buf: &[u8]) -> Result<JupyterHeader, Error> {
        let val = Self::parse_buffer(desc.clone(), buf)?;
        Self::parse_header_value(desc, val)
    }

    fn parse_header_value(desc: String, val: Value) -> Result<JupyterHeader, Error> {
        match serde_json::from_value(val.clone()) {
            Ok(h) => Ok(h),
            Err(err) => Err(Error::InvalidPart(desc, val, err)),
        }
    }

    /// Parse raw buffer data from a single part of a multipart ZeroMQ message
    /// into a JSON value.
    fn parse_buffer(desc: String, buf: &[u8]) -> Result<Value, Error> {
        // Convert the raw byte sequence from the ZeroMQ message into UTF-8
        let str = match std::str::from_utf8(buf) {
            Ok(s) => s,
            Err(err) => return Err(Error::Utf8Error(desc, buf.to_vec(), err)),
        };

        // Parse the UTF-8 string as JSON
        match serde_json::from_str(str) {
            Ok(v) => Ok(v),
            Err(err) => Err(Error::JsonParseError(desc, String::from(str), err)),
        }
    }
}

// Conversion: WireMessage (untyped) -> JupyterMessage (typed); used on
// messages we receive over the wire to parse into the correct type.
impl<T: ProtocolMessage + DeserializeOwned> TryFrom<&WireMessage> for JupyterMessage<T> {
    type Error = crate::error::Error;
    fn try_from(msg: &WireMessage) -> Result<JupyterMessage<T>, Error> {
        let content = match serde_json::from_value(msg.content.clone()) {
            Ok(val) => val,
            Err(err) => {
                return Err(Error::InvalidMessage(
                    T::message_type(),
                    msg.content.clone(),
                    err,
                ))
            },
        };
        Ok(JupyterMessage {
            zmq_identities: msg.zmq_identities.clone(),
            header: msg.header.clone(),
            parent_header: msg.parent_header.clone(),
            content,
        })
    }
}

// Conversion: JupyterMessage (typed) -> WireMessage (untyped); used prior to
// sending messages to get them ready for dispatch.
impl<T: ProtocolMessage> TryFrom<&JupyterMessage<T>> for WireMessage {
    type Error = crate::error::Error;

    fn try_from(msg: &JupyterMessage<T>) -> Result<Self, Error> {
        let content = match serde_json::to_value(&msg.content) {
            Ok(val) => val,
            Err(err) => return Err(Error::CannotSerialize(err)),
        };
        Ok(Self {
            zmq_identities: msg.zmq_identities.clone(),
            header: msg.header.clone(),
            parent_header: msg.parent_header.clone(),
            metadata: json!({}),
            content,
        })
    }
}
