/*
 * socket.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::time::Duration;

use log::trace;

use crate::error::Error;
use crate::session::Session;

/// A ZeroMQ socket paired with the session used to sign and verify the
/// messages that travel over it.
pub struct Socket {
    /// The Jupyter session information associated with the socket, including
    /// the session ID and HMAC signer
    pub session: Session,

    /// The name of the socket; used only to give context to debugging/trace
    /// messages
    pub name: String,

    /// A ZeroMQ socket over which signed messages are to be sent/received
    pub socket: zmq::Socket,
}

impl Socket {
    /// Create a new Socket instance from a kernel session and a ZeroMQ context.
    pub fn new(
        session: Session,
        ctx: zmq::Context,
        name: String,
        kind: zmq::SocketType,
        identity: Option<&[u8]>,
        endpoint: String,
    ) -> Result<Self, Error> {
        let socket = match ctx.socket(kind) {
            Ok(s) => s,
            Err(err) => return Err(Error::CreateSocketFailed(name, err)),
        };

        // Pending messages are discarded on close so shutdown never blocks on
        // a peer that went away
        if let Err(err) = socket.set_linger(0) {
            return Err(Error::CreateSocketFailed(name, err));
        }

        if let Some(identity) = identity {
            if let Err(err) = socket.set_identity(identity) {
                return Err(Error::CreateSocketFailed(name, err));
            }
        }

        // One side of a socket must `bind()` to its endpoint, and the other
        // side must `connect()` to the same endpoint. The `bind()` side
        // will be the server, and the `connect()` side will be the client.
        match kind {
            zmq::SocketType::ROUTER | zmq::SocketType::XPUB | zmq::SocketType::REP => {
                trace!("Binding to ZeroMQ '{}' socket at {}", name, endpoint);
                if let Err(err) = socket.bind(&endpoint) {
                    return Err(Error::SocketBindError(name, endpoint, err));
                }
            },
            zmq::SocketType::DEALER | zmq::SocketType::SUB | zmq::SocketType::REQ => {
                trace!("Connecting to ZeroMQ '{}' socket at {}", name, endpoint);
                if let Err(err) = socket.connect(&endpoint) {
                    return Err(Error::SocketConnectError(name, endpoint, err));
                }
            },
            _ => return Err(Error::UnsupportedSocketType(kind)),
        }

        // If this is a debug build, set `ZMQ_ROUTER_MANDATORY` on all `ROUTER`
        // sockets, so that we get errors instead of silent message drops for
        // unroutable messages.
        #[cfg(debug_assertions)]
        {
            if kind == zmq::ROUTER {
                if let Err(err) = socket.set_router_mandatory(true) {
                    return Err(Error::SocketBindError(name, endpoint, err));
                }
            }
        }

        Ok(Self {
            socket,
            session,
            name,
        })
    }

    /// Receive a multi-part message from the socket.
    ///
    /// **Note**: This will block until a message is delivered on the socket.
    pub fn recv_multipart(&self) -> Result<Vec<Vec<u8>>, Error> {
        match self.socket.recv_multipart(0) {
            Ok(data) => Ok(data),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    /// Send a multi-part message on the socket.
    pub fn send_multipart(&self, data: &Vec<Vec<u8>>) -> Result<(), Error> {
        match self.socket.send_multipart(data, 0) {
            Ok(data) => Ok(data),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    /// Wait up to `timeout_ms` for incoming data. Returns whether a message
    /// is ready to be received.
    pub fn poll_incoming(&self, timeout_ms: i64) -> Result<bool, Error> {
        match self.socket.poll(zmq::PollEvents::POLLIN, timeout_ms) {
            Ok(n) => Ok(n != 0),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    /// Receive a multi-part message, waiting at most `timeout`. Returns
    /// `None` if nothing arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Vec<Vec<u8>>>, Error> {
        let timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
        if !self.poll_incoming(timeout_ms)? {
            return Ok(None);
        }
        self.recv_multipart().map(Some)
    }

    /// Subscribes a SUB socket to all the published messages from a PUB socket.
    ///
    /// Note that this needs to be called *after* the socket connection is
    /// established on both ends.
    pub fn subscribe(&self) -> Result<(), Error> {
        match self.socket.set_subscribe(b"") {
            Ok(_) => Ok(()),
            Err(err) => Err(Error::ZmqError(self.name.clone(), err)),
        }
    }

    /// The port this socket is bound or connected to, read back from its last
    /// endpoint. Used to discover ports the transport picked for us.
    pub fn port(&self) -> crate::Result<u16> {
        let name = self.name.as_str();

        let address = match self.socket.get_last_endpoint() {
            Ok(Ok(address)) => address,
            Ok(Err(_)) => {
                return Err(crate::anyhow!(
                    "Can't access last endpoint of '{name}' socket."
                ));
            },
            Err(err) => {
                return Err(crate::anyhow!(
                    "Can't access last endpoint of '{name}' socket due to {err:?}"
                ));
            },
        };

        // We've got the full address but we only want the port at the very end
        let Some(loc) = address.rfind(':') else {
            return Err(crate::anyhow!(
                "Failed to find port in the '{name}' socket address '{address}'."
            ));
        };

        let port = &address[(loc + 1)..];
        port.parse::<u16>().map_err(|err| {
            crate::anyhow!("Can't parse port '{port}' into a `u16` due to {err:?}")
        })
    }
}
