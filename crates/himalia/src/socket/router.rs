/*
 * router.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use crossbeam::channel::Sender;
use log::trace;
use log::warn;
use serde_json::json;

use crate::dispatch::Dispatcher;
use crate::dispatch::Outbound;
use crate::dispatch::Undecodable;
use crate::socket::socket::Socket;
use crate::supervisor::Worker;
use crate::wire::wire_message::Envelope;
use crate::wire::wire_message::WireMessage;

/// Serves one ROUTER channel (Shell, Control or Stdin): requests are decoded,
/// dispatched, and answered strictly one at a time in arrival order.
pub struct Router {
    socket: Socket,
    dispatcher: Dispatcher,

    /// Broadcasts are handed to the IOPub thread, which owns the IOPub socket
    iopub_tx: Sender<WireMessage>,

    /// Set once the IOPub thread is gone. Broadcasts are then dropped, but
    /// replies on this channel keep flowing.
    iopub_closed: bool,
}

impl Router {
    pub fn new(socket: Socket, dispatcher: Dispatcher, iopub_tx: Sender<WireMessage>) -> Self {
        Self {
            socket,
            dispatcher,
            iopub_tx,
            iopub_closed: false,
        }
    }

    /// Listens for requests until shutdown.
    pub fn listen(&mut self, worker: &Worker) -> crate::Result<()> {
        let socket = &self.socket;
        let dispatcher = &mut self.dispatcher;
        let iopub_tx = &self.iopub_tx;
        let iopub_closed = &mut self.iopub_closed;

        worker.run(
            |timeout| socket.recv_timeout(timeout),
            |bufs| {
                let Some(inbound) = decode_request(socket, bufs) else {
                    return Ok(());
                };
                for outbound in dispatcher.dispatch(inbound) {
                    match outbound {
                        Outbound::Reply(msg) => {
                            // A peer that went away mustn't take the channel down
                            if let Err(err) = msg.send(socket) {
                                warn!(
                                    "{}: could not deliver '{}': {err}",
                                    socket.name, msg.header.msg_type
                                );
                            }
                        },
                        Outbound::Broadcast(msg) => {
                            if iopub_tx.send(msg).is_err() && !*iopub_closed {
                                *iopub_closed = true;
                                warn!(
                                    "{}: IOPub is gone, dropping broadcasts from now on",
                                    socket.name
                                );
                            }
                        },
                    }
                }
                Ok(())
            },
        )
    }
}

/// Decodes a raw request. Returns `None` for messages that must be dropped:
/// no delimiter, too few frames, a rejected signature, or a header too broken
/// to address a reply to.
fn decode_request(
    socket: &Socket,
    bufs: Vec<Vec<u8>>,
) -> Option<std::result::Result<WireMessage, Undecodable>> {
    let envelope = match Envelope::split(bufs) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!("{}: dropping malformed message: {err}", socket.name);
            return None;
        },
    };

    if let Err(err) = envelope.check_signature(&socket.session) {
        warn!("{}: dropping message: {err}", socket.name);
        return None;
    }

    match envelope.parse() {
        Ok(msg) => {
            trace!("{}: received '{}'", socket.name, msg.header.msg_type);
            Some(Ok(msg))
        },
        Err(error) => match envelope.header() {
            Ok(header) => Some(Err(Undecodable {
                request: WireMessage {
                    zmq_identities: envelope.zmq_identities,
                    header,
                    parent_header: None,
                    metadata: json!({}),
                    content: json!({}),
                },
                error,
            })),
            Err(err) => {
                warn!("{}: dropping message with unusable header: {err}", socket.name);
                None
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use crossbeam::channel::unbounded;

    use super::*;
    use crate::dispatch::Channel;
    use crate::session::Session;
    use crate::session::SignaturePolicy;
    use crate::state::KernelState;
    use crate::wire::jupyter_message::JupyterMessage;
    use crate::wire::kernel_info_reply::KernelInfo;
    use crate::wire::kernel_info_request::KernelInfoRequest;
    use crate::wire::language_info::LanguageInfo;

    fn kernel_info() -> KernelInfo {
        KernelInfo {
            implementation: String::from("test"),
            implementation_version: String::from("0.0.1"),
            language_info: LanguageInfo::plain_text("Test", "1.0"),
            banner: String::new(),
            help_links: vec![],
        }
    }

    fn recv_reply(client: &Socket) -> WireMessage {
        assert!(client.poll_incoming(5000).unwrap(), "no reply from router");
        WireMessage::read_from_socket(client).unwrap()
    }

    #[test]
    fn test_replies_survive_closed_iopub() {
        let session = Session::create("secret", "hmac-sha256", SignaturePolicy::Enforce).unwrap();
        let state = KernelState::new(session.clone());
        let ctx = zmq::Context::new();

        let server = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Shell"),
            zmq::ROUTER,
            None,
            String::from("tcp://127.0.0.1:0"),
        )
        .unwrap();
        let port = server.port().unwrap();

        let client = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from("Client"),
            zmq::DEALER,
            Some(b"client".as_slice()),
            format!("tcp://127.0.0.1:{port}"),
        )
        .unwrap();

        // The IOPub end is gone before the first request arrives
        let (iopub_tx, iopub_rx) = unbounded::<WireMessage>();
        drop(iopub_rx);

        let dispatcher = Dispatcher::new(Channel::Shell, state.clone(), kernel_info(), None);
        let worker = Worker::new("Shell", state.shutdown.clone())
            .with_poll_interval(Duration::from_millis(20));
        let listener =
            thread::spawn(move || Router::new(server, dispatcher, iopub_tx).listen(&worker));

        for _ in 0..2 {
            JupyterMessage::create(KernelInfoRequest {}, None, &session)
                .send(&client)
                .unwrap();
            let reply = recv_reply(&client);
            assert_eq!(reply.header.msg_type, "kernel_info_reply");
        }

        // Still serving until asked to stop
        assert!(!listener.is_finished());
        state.shutdown.set();
        assert!(listener.join().unwrap().is_ok());
    }
}
