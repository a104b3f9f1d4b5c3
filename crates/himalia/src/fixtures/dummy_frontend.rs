/*
 * dummy_frontend.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::Value;
use uuid::Uuid;

use crate::connection_file::ConnectionFile;
use crate::session::Session;
use crate::session::SignaturePolicy;
use crate::socket::socket::Socket;
use crate::wire::execute_input::ExecuteInput;
use crate::wire::execute_request::ExecuteRequest;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::Message;
use crate::wire::jupyter_message::ProtocolMessage;
use crate::wire::jupyter_message::Status;
use crate::wire::status::ExecutionState;
use crate::wire::wire_message::WireMessage;

/// How long to wait for an expected message before failing the test
const RECV_TIMEOUT_MS: i64 = 5000;

/// A minimal frontend that connects to a running kernel's five sockets.
pub struct DummyFrontend {
    pub control_socket: Socket,
    pub shell_socket: Socket,
    pub iopub_socket: Socket,
    pub stdin_socket: Socket,
    pub heartbeat_socket: Socket,
    pub session: Session,
}

impl DummyFrontend {
    /// Connects to the ports advertised in `connection_file`.
    pub fn connect(connection_file: &ConnectionFile) -> Self {
        // Messages from the kernel are always checked
        let session = Session::create(
            &connection_file.key,
            &connection_file.signature_scheme,
            SignaturePolicy::Enforce,
        )
        .unwrap();

        // Per the Jupyter messaging protocol, the shell and stdin sockets must
        // share a ZeroMQ identity.
        let shell_id = Uuid::new_v4();

        let ctx = zmq::Context::new();
        let socket = |name: &str, kind: zmq::SocketType, identity: Option<&[u8]>, port: u16| {
            Socket::new(
                session.clone(),
                ctx.clone(),
                String::from(name),
                kind,
                identity,
                connection_file.endpoint(port).unwrap(),
            )
            .unwrap()
        };

        Self {
            control_socket: socket("Control", zmq::DEALER, None, connection_file.control_port),
            shell_socket: socket(
                "Shell",
                zmq::DEALER,
                Some(shell_id.as_bytes().as_slice()),
                connection_file.shell_port,
            ),
            iopub_socket: socket("IOPub", zmq::SUB, None, connection_file.iopub_port),
            stdin_socket: socket(
                "Stdin",
                zmq::DEALER,
                Some(shell_id.as_bytes().as_slice()),
                connection_file.stdin_port,
            ),
            heartbeat_socket: socket("Heartbeat", zmq::REQ, None, connection_file.hb_port),
            session,
        }
    }

    /// Completes initialization of the frontend (usually done after the kernel
    /// is ready and connected)
    pub fn complete_initialization(&self) {
        self.iopub_socket.subscribe().unwrap();
    }

    /// Creates a message from this frontend, ready to be sent
    pub fn create<T: ProtocolMessage>(&self, content: T) -> JupyterMessage<T> {
        JupyterMessage::create(content, None, &self.session)
    }

    /// Sends a Jupyter message on the Shell socket; returns the ID of the newly
    /// created message
    pub fn send_shell<T: ProtocolMessage>(&self, msg: T) -> String {
        self.send(&self.shell_socket, msg)
    }

    pub fn send_control<T: ProtocolMessage>(&self, msg: T) -> String {
        self.send(&self.control_socket, msg)
    }

    pub fn send_stdin<T: ProtocolMessage>(&self, msg: T) -> String {
        self.send(&self.stdin_socket, msg)
    }

    pub fn send_execute_request(&self, code: &str) -> String {
        self.send_shell(ExecuteRequest::new(code))
    }

    fn send<T: ProtocolMessage>(&self, socket: &Socket, msg: T) -> String {
        let message = self.create(msg);
        let id = message.header.msg_id.clone();
        message.send(socket).unwrap();
        id
    }

    /// Sends raw frames, bypassing encoding and signing
    pub fn send_raw(&self, socket: &Socket, frames: Vec<Vec<u8>>) {
        socket.send_multipart(&frames).unwrap();
    }

    /// Receives a message without interpreting its type. Useful for error
    /// replies, whose message type varies with the request.
    pub fn recv_wire(&self, socket: &Socket) -> WireMessage {
        // It's important to wait with a timeout because the kernel thread might
        // have failed, preventing it from sending the expected message. The
        // tests would then hang indefinitely.
        if socket.poll_incoming(RECV_TIMEOUT_MS).unwrap() {
            return WireMessage::read_from_socket(socket).unwrap();
        }

        panic!("Timeout while expecting message on socket {}", socket.name);
    }

    pub fn recv(&self, socket: &Socket) -> Message {
        let wire = self.recv_wire(socket);
        Message::try_from(&wire).unwrap()
    }

    /// Receives a Jupyter message from the Shell socket
    pub fn recv_shell(&self) -> Message {
        self.recv(&self.shell_socket)
    }

    /// Receives a Jupyter message from the Control socket
    pub fn recv_control(&self) -> Message {
        self.recv(&self.control_socket)
    }

    /// Receives a Jupyter message from the IOPub socket
    pub fn recv_iopub(&self) -> Message {
        self.recv(&self.iopub_socket)
    }

    /// Receive from Shell and assert `ExecuteReply` message.
    /// Returns `execution_count`.
    pub fn recv_shell_execute_reply(&self) -> u32 {
        let msg = self.recv_shell();

        assert_matches!(msg, Message::ExecuteReply(data) => {
            assert_eq!(data.content.status, Status::Ok);
            data.content.execution_count
        })
    }

    /// Receive from Shell and assert `ExecuteReplyException` message.
    /// Returns `execution_count`.
    pub fn recv_shell_execute_reply_exception(&self) -> u32 {
        let msg = self.recv_shell();

        assert_matches!(msg, Message::ExecuteReplyException(data) => {
            assert_eq!(data.content.status, Status::Error);
            data.content.execution_count
        })
    }

    /// Receive from IOPub and assert Busy message
    pub fn recv_iopub_busy(&self) {
        let msg = self.recv_iopub();

        assert_matches!(msg, Message::Status(data) => {
            assert_eq!(data.content.execution_state, ExecutionState::Busy);
        });
    }

    /// Receive from IOPub and assert Idle message
    pub fn recv_iopub_idle(&self) {
        let msg = self.recv_iopub();

        assert_matches!(msg, Message::Status(data) => {
            assert_eq!(data.content.execution_state, ExecutionState::Idle);
        });
    }

    /// Receive from IOPub and assert ExecuteInput message
    pub fn recv_iopub_execute_input(&self) -> ExecuteInput {
        let msg = self.recv_iopub();

        assert_matches!(msg, Message::ExecuteInput(data) => {
            data.content
        })
    }

    /// Receive from IOPub and assert ExecuteResult message. Returns compulsory
    /// `text/plain` result.
    pub fn recv_iopub_execute_result(&self) -> String {
        let msg = self.recv_iopub();

        assert_matches!(msg, Message::ExecuteResult(data) => {
            assert_matches!(data.content.data, Value::Object(map) => {
                assert_matches!(map["text/plain"], Value::String(ref string) => {
                    string.clone()
                })
            })
        })
    }

    /// Receive from IOPub and assert ExecuteError message. Returns compulsory
    /// `evalue` field.
    pub fn recv_iopub_execute_error(&self) -> String {
        let msg = self.recv_iopub();

        assert_matches!(msg, Message::ExecuteError(data) => {
            data.content.exception.evalue
        })
    }

    /// Sends (raw) frames to the heartbeat socket
    pub fn send_heartbeat(&self, frames: Vec<Vec<u8>>) {
        self.heartbeat_socket.send_multipart(&frames).unwrap();
    }

    /// Receives (raw) frames from the heartbeat socket
    pub fn recv_heartbeat(&self) -> Vec<Vec<u8>> {
        if self.heartbeat_socket.poll_incoming(RECV_TIMEOUT_MS).unwrap() {
            return self.heartbeat_socket.recv_multipart().unwrap();
        }
        panic!("Timeout while expecting heartbeat echo");
    }

    /// Asserts that nothing arrives on `socket` within `timeout`
    pub fn assert_silent(&self, socket: &Socket, timeout: Duration) {
        let timeout_ms = i64::try_from(timeout.as_millis()).unwrap();
        if socket.poll_incoming(timeout_ms).unwrap() {
            let frames = socket.recv_multipart().unwrap();
            panic!("Unexpected message on {} socket: {frames:?}", socket.name);
        }
    }

    /// Asserts that no socket has incoming data
    pub fn assert_no_incoming(&self) {
        for socket in [
            &self.control_socket,
            &self.shell_socket,
            &self.iopub_socket,
            &self.stdin_socket,
            &self.heartbeat_socket,
        ] {
            self.assert_silent(socket, Duration::ZERO);
        }
    }
}
