/*
 * dispatch.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use futures::executor::block_on;
use log::error;
use log::info;
use log::trace;
use log::warn;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use strum_macros::Display;

use crate::error::Error;
use crate::language::executor::Executor;
use crate::state::KernelState;
use crate::wire::comm_info_reply::CommInfoReply;
use crate::wire::exception::Exception;
use crate::wire::execute_error::ExecuteError;
use crate::wire::execute_input::ExecuteInput;
use crate::wire::execute_reply::ExecuteReply;
use crate::wire::execute_request::ExecuteRequest;
use crate::wire::execute_result::ExecuteResult;
use crate::wire::history_reply::HistoryReply;
use crate::wire::is_complete_reply::IsComplete;
use crate::wire::is_complete_reply::IsCompleteReply;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::Message;
use crate::wire::jupyter_message::MessageType;
use crate::wire::jupyter_message::ProtocolMessage;
use crate::wire::jupyter_message::Status;
use crate::wire::kernel_info_reply::KernelInfo;
use crate::wire::kernel_info_reply::KernelInfoReply;
use crate::wire::status::ExecutionState;
use crate::wire::status::KernelStatus;
use crate::wire::wire_message::WireMessage;

/// The request/reply channels. IOPub and Heartbeat never dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Channel {
    Shell,
    Control,
    Stdin,
}

/// A message produced while handling a request, in emission order.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Goes back to the requesting peer on the request's channel
    Reply(WireMessage),

    /// Goes to every IOPub subscriber
    Broadcast(WireMessage),
}

/// A request whose header could be read but whose remaining parts could not.
/// `request` carries the identities and header (and empty parts) so it can
/// still be answered.
#[derive(Debug)]
pub struct Undecodable {
    pub request: WireMessage,
    pub error: Error,
}

/// Turns one inbound request into its replies and broadcasts.
///
/// Each channel owns its own dispatcher; the only state shared between them
/// is the `KernelState`.
pub struct Dispatcher {
    channel: Channel,
    state: KernelState,
    kernel_info: KernelInfo,
    executor: Option<Box<dyn Executor>>,
}

impl Dispatcher {
    pub fn new(
        channel: Channel,
        state: KernelState,
        kernel_info: KernelInfo,
        executor: Option<Box<dyn Executor>>,
    ) -> Self {
        Self {
            channel,
            state,
            kernel_info,
            executor,
        }
    }

    /// Handles one request. Never fails: problems with the request itself
    /// become error replies.
    pub fn dispatch(&mut self, inbound: Result<WireMessage, Undecodable>) -> Vec<Outbound> {
        let (request, message) = match inbound {
            Ok(wire) => {
                let message = Message::try_from(&wire);
                (untyped(wire), message)
            },
            Err(Undecodable { request, error }) => (untyped(request), Err(error)),
        };

        trace!(
            "{} dispatching '{}' (msg_id {})",
            self.channel,
            request.header.msg_type,
            request.header.msg_id
        );

        let mut outbox = Outbox::default();

        // Frontends track kernel activity from the busy/idle bracket around
        // every Shell request
        let bracket = self.channel == Channel::Shell;
        if bracket {
            outbox.broadcast(request.create_broadcast(KernelStatus {
                execution_state: ExecutionState::Busy,
            }));
        }

        match message {
            Ok(message) => self.handle(&request, message, &mut outbox),
            Err(err) => {
                warn!(
                    "{} could not handle '{}' request: {err}",
                    self.channel, request.header.msg_type
                );
                self.refuse(&request, exception_from(err), &mut outbox);
            },
        }

        if bracket {
            outbox.broadcast(request.create_broadcast(KernelStatus {
                execution_state: ExecutionState::Idle,
            }));
        }

        outbox.0
    }

    fn handle(&mut self, request: &JupyterMessage<Value>, message: Message, outbox: &mut Outbox) {
        match (self.channel, message) {
            (Channel::Shell, Message::ExecuteRequest(req)) => self.handle_execute(req, outbox),

            (Channel::Shell | Channel::Control, Message::KernelInfoRequest(req)) => {
                outbox.reply(req.create_reply(KernelInfoReply::from(self.kernel_info.clone())));
            },

            (Channel::Shell, Message::HistoryRequest(req)) => {
                outbox.reply(req.create_reply(HistoryReply {
                    status: Status::Ok,
                    history: vec![],
                }));
            },

            (Channel::Shell, Message::IsCompleteRequest(req)) => {
                outbox.reply(req.create_reply(IsCompleteReply {
                    status: IsComplete::Unknown,
                    indent: String::new(),
                }));
            },

            (Channel::Shell, Message::CommInfoRequest(req)) => {
                outbox.reply(req.create_reply(CommInfoReply {
                    status: Status::Ok,
                    comms: Map::new(),
                }));
            },

            (Channel::Control, Message::ShutdownRequest(req)) => {
                warn!(
                    "Ignoring shutdown request (restart: {}); shutdown over Control is not implemented",
                    req.content.restart
                );
                let exception = Exception::not_implemented(
                    "Shutdown requests are not supported by this kernel",
                );
                outbox.reply(req.create_error_reply(
                    String::from("shutdown_reply"),
                    exception,
                    self.state.execution_count.current(),
                ));
            },

            (Channel::Stdin, Message::InputReply(req)) => {
                // No input request is ever issued, so there's nobody waiting
                info!(
                    "Discarding unsolicited input reply ({} chars)",
                    req.content.value.len()
                );
            },

            (channel, _) => {
                warn!(
                    "{channel} does not handle '{}' messages",
                    request.header.msg_type
                );
                let exception = Exception::new(
                    "UnknownMessageType",
                    format!(
                        "'{}' is not handled on the {channel} channel",
                        request.header.msg_type
                    ),
                );
                self.refuse(request, exception, outbox);
            },
        }
    }

    fn handle_execute(&mut self, req: JupyterMessage<ExecuteRequest>, outbox: &mut Outbox) {
        let execution_count = self.state.execution_count.increment();
        let silent = req.content.silent;

        if !silent {
            outbox.broadcast(req.create_broadcast(ExecuteInput {
                code: req.content.code.clone(),
                execution_count,
            }));
        }

        let result = match self.executor.as_mut() {
            Some(executor) => block_on(executor.execute(&req.content.code)),
            None => Err(Error::Execution(Exception::not_implemented(
                "No executor is attached to this channel",
            ))),
        };

        match result {
            Ok(data) => {
                if !silent {
                    outbox.broadcast(req.create_broadcast(ExecuteResult {
                        data: Value::Object(data),
                        execution_count,
                        metadata: json!({}),
                    }));
                }
                outbox.reply(req.create_reply(ExecuteReply {
                    status: Status::Ok,
                    execution_count,
                    payload: vec![],
                    user_expressions: json!({}),
                }));
            },
            Err(err) => {
                let exception = exception_from(err);
                info!(
                    "Execution {execution_count} failed: {}: {}",
                    exception.ename, exception.evalue
                );
                outbox.broadcast(req.create_broadcast(ExecuteError::from(exception.clone())));
                outbox.reply(req.create_error_reply(
                    ExecuteReply::message_type(),
                    exception,
                    execution_count,
                ));
            },
        }
    }

    /// Answers a request we can't serve with an error reply carrying the
    /// current (unchanged) execution count.
    fn refuse(&self, request: &JupyterMessage<Value>, exception: Exception, outbox: &mut Outbox) {
        outbox.reply(request.create_error_reply(
            reply_type(&request.header.msg_type),
            exception,
            self.state.execution_count.current(),
        ));
    }
}

/// `foo_request` is answered with `foo_reply`; anything else with an
/// `execute_reply`, the most generic reply frontends understand.
pub fn reply_type(msg_type: &str) -> String {
    match msg_type.strip_suffix("_request") {
        Some(stem) => format!("{stem}_reply"),
        None => String::from("execute_reply"),
    }
}

fn exception_from(err: Error) -> Exception {
    let ename = match err {
        Error::Execution(exception) => return exception,
        Error::UnknownMessageType(_) => "UnknownMessageType",
        Error::InvalidMessage(..) |
        Error::InvalidPart(..) |
        Error::JsonParseError(..) |
        Error::Utf8Error(..) => "InvalidMessage",
        _ => return Exception::internal_error(err.to_string()),
    };
    Exception::new(ename, err.to_string())
}

fn untyped(wire: WireMessage) -> JupyterMessage<Value> {
    JupyterMessage {
        zmq_identities: wire.zmq_identities,
        header: wire.header,
        parent_header: wire.parent_header,
        content: wire.content,
    }
}

#[derive(Default)]
struct Outbox(Vec<Outbound>);

impl Outbox {
    fn reply<T: ProtocolMessage>(&mut self, msg: JupyterMessage<T>) {
        match WireMessage::try_from(&msg) {
            Ok(wire) => self.0.push(Outbound::Reply(wire)),
            Err(err) => error!("Can't serialize '{}' reply: {err}", msg.header.msg_type),
        }
    }

    fn broadcast<T: ProtocolMessage>(&mut self, msg: JupyterMessage<T>) {
        match WireMessage::try_from(&msg) {
            Ok(wire) => self.0.push(Outbound::Broadcast(wire)),
            Err(err) => error!("Can't serialize '{}' broadcast: {err}", msg.header.msg_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;
    use crate::session::Session;
    use crate::session::SignaturePolicy;
    use crate::wire::header::JupyterHeader;
    use crate::wire::input_reply::InputReply;
    use crate::wire::kernel_info_request::KernelInfoRequest;
    use crate::wire::language_info::LanguageInfo;
    use crate::wire::shutdown_request::ShutdownRequest;

    struct Echo;

    #[async_trait]
    impl Executor for Echo {
        fn kernel_info(&self) -> KernelInfo {
            kernel_info()
        }

        async fn execute(
            &mut self,
            code: &str,
        ) -> crate::Result<crate::language::executor::MimeBundle> {
            if code == "fail" {
                return Err(Error::Execution(Exception {
                    ename: String::from("ValueError"),
                    evalue: String::from("bad value"),
                    traceback: vec![String::from("line 1")],
                }));
            }
            if code == "crash" {
                return Err(crate::anyhow!("backend went away"));
            }
            let mut bundle = Map::new();
            bundle.insert(String::from("text/plain"), json!(code));
            Ok(bundle)
        }
    }

    fn kernel_info() -> KernelInfo {
        KernelInfo {
            implementation: String::from("test"),
            implementation_version: String::from("0.0.1"),
            language_info: LanguageInfo::plain_text("simple", "1.0"),
            banner: String::new(),
            help_links: vec![],
        }
    }

    fn state() -> KernelState {
        KernelState::new(Session::create("", "hmac-sha256", SignaturePolicy::Enforce).unwrap())
    }

    fn dispatcher(channel: Channel, state: &KernelState) -> Dispatcher {
        Dispatcher::new(channel, state.clone(), kernel_info(), Some(Box::new(Echo)))
    }

    fn request<T: ProtocolMessage>(content: T, state: &KernelState) -> WireMessage {
        let mut msg = JupyterMessage::create(content, None, &state.session);
        msg.zmq_identities = vec![b"peer".to_vec()];
        msg.header.msg_id = String::from("a");
        msg.header.username = String::from("u");
        msg.header.session = String::from("s");
        WireMessage::try_from(&msg).unwrap()
    }

    fn replies(out: &[Outbound]) -> Vec<&WireMessage> {
        out.iter()
            .filter_map(|o| match o {
                Outbound::Reply(msg) => Some(msg),
                Outbound::Broadcast(_) => None,
            })
            .collect()
    }

    fn kinds(out: &[Outbound]) -> Vec<String> {
        out.iter()
            .map(|o| match o {
                Outbound::Reply(msg) => format!("reply:{}", msg.header.msg_type),
                Outbound::Broadcast(msg) => format!("broadcast:{}", msg.header.msg_type),
            })
            .collect()
    }

    fn parent_of(out: &Outbound) -> &JupyterHeader {
        let msg = match out {
            Outbound::Reply(msg) | Outbound::Broadcast(msg) => msg,
        };
        msg.parent_header.as_ref().unwrap()
    }

    #[test]
    fn test_kernel_info_reply() {
        let state = state();
        let req = request(KernelInfoRequest {}, &state);
        let out = dispatcher(Channel::Shell, &state).dispatch(Ok(req.clone()));

        assert_eq!(kinds(&out), vec![
            "broadcast:status",
            "reply:kernel_info_reply",
            "broadcast:status"
        ]);
        for msg in out.iter() {
            assert_eq!(parent_of(msg), &req.header);
        }

        let reply = replies(&out)[0];
        assert_eq!(reply.zmq_identities, vec![b"peer".to_vec()]);
        assert_eq!(reply.header.username, "u");
        assert_eq!(reply.header.session, "s");
        assert_ne!(reply.header.msg_id, "a");
        assert_matches!(Message::try_from(reply), Ok(Message::KernelInfoReply(msg)) => {
            assert_eq!(msg.content.language_info.name, "simple");
            assert_eq!(msg.content.status, Status::Ok);
            assert!(!msg.content.debugger);
        });
    }

    #[test]
    fn test_busy_idle_bracket() {
        let state = state();
        let out = dispatcher(Channel::Shell, &state)
            .dispatch(Ok(request(KernelInfoRequest {}, &state)));

        let states: Vec<Value> = out
            .iter()
            .filter_map(|o| match o {
                Outbound::Broadcast(msg) => Some(msg.content["execution_state"].clone()),
                Outbound::Reply(_) => None,
            })
            .collect();
        assert_eq!(states, vec![json!("busy"), json!("idle")]);

        for msg in out.iter() {
            if let Outbound::Broadcast(msg) = msg {
                assert!(msg.zmq_identities.is_empty());
            }
        }
    }

    #[test]
    fn test_execute_counts_up() {
        let state = state();
        let mut shell = dispatcher(Channel::Shell, &state);

        let out = shell.dispatch(Ok(request(ExecuteRequest::new("1+1"), &state)));
        assert_eq!(kinds(&out), vec![
            "broadcast:status",
            "broadcast:execute_input",
            "broadcast:execute_result",
            "reply:execute_reply",
            "broadcast:status"
        ]);
        assert_matches!(Message::try_from(replies(&out)[0]), Ok(Message::ExecuteReply(msg)) => {
            assert_eq!(msg.content.status, Status::Ok);
            assert_eq!(msg.content.execution_count, 1);
        });
        assert_matches!(&out[2], Outbound::Broadcast(msg) => {
            assert_eq!(msg.content["data"]["text/plain"], json!("1+1"));
            assert_eq!(msg.content["execution_count"], json!(1));
        });

        let out = shell.dispatch(Ok(request(ExecuteRequest::new("2+2"), &state)));
        assert_matches!(Message::try_from(replies(&out)[0]), Ok(Message::ExecuteReply(msg)) => {
            assert_eq!(msg.content.execution_count, 2);
        });
        assert_eq!(state.execution_count.current(), 2);
    }

    #[test]
    fn test_silent_execute_skips_broadcasts() {
        let state = state();
        let mut req = ExecuteRequest::new("1+1");
        req.silent = true;

        let out = dispatcher(Channel::Shell, &state)
            .dispatch(Ok(request(req, &state)));
        assert_eq!(kinds(&out), vec![
            "broadcast:status",
            "reply:execute_reply",
            "broadcast:status"
        ]);
        assert_eq!(state.execution_count.current(), 1);
    }

    #[test]
    fn test_execution_failure() {
        let state = state();
        let out = dispatcher(Channel::Shell, &state)
            .dispatch(Ok(request(ExecuteRequest::new("fail"), &state)));

        assert_eq!(kinds(&out), vec![
            "broadcast:status",
            "broadcast:execute_input",
            "broadcast:error",
            "reply:execute_reply",
            "broadcast:status"
        ]);
        let reply = Message::try_from(replies(&out)[0]);
        assert_matches!(reply, Ok(Message::ExecuteReplyException(msg)) => {
            assert_eq!(msg.content.status, Status::Error);
            assert_eq!(msg.content.execution_count, 1);
            assert_eq!(msg.content.exception.ename, "ValueError");
            assert_eq!(msg.content.exception.traceback, vec![String::from("line 1")]);
        });
    }

    #[test]
    fn test_backend_error_is_internal_error() {
        let state = state();
        let out = dispatcher(Channel::Shell, &state)
            .dispatch(Ok(request(ExecuteRequest::new("crash"), &state)));
        let reply = Message::try_from(replies(&out)[0]);
        assert_matches!(reply, Ok(Message::ExecuteReplyException(msg)) => {
            assert_eq!(msg.content.exception.ename, "InternalError");
            assert!(msg.content.exception.evalue.contains("backend went away"));
        });
    }

    #[test]
    fn test_history_reply() {
        let state = state();
        let mut req = request(KernelInfoRequest {}, &state);
        req.header.msg_type = String::from("history_request");
        req.content = json!({"hist_access_type": "tail", "output": false, "raw": true});

        let out = dispatcher(Channel::Shell, &state).dispatch(Ok(req));
        assert_matches!(Message::try_from(replies(&out)[0]), Ok(Message::HistoryReply(msg)) => {
            assert_eq!(msg.content.status, Status::Ok);
            assert!(msg.content.history.is_empty());
        });
    }

    #[test]
    fn test_unknown_type_leaves_counter_alone() {
        let state = state();
        let mut shell = dispatcher(Channel::Shell, &state);
        shell.dispatch(Ok(request(ExecuteRequest::new("1"), &state)));

        let mut req = request(KernelInfoRequest {}, &state);
        req.header.msg_type = String::from("frobnicate_request");
        let out = shell.dispatch(Ok(req.clone()));

        let reply = replies(&out)[0];
        assert_eq!(reply.header.msg_type, "frobnicate_reply");
        assert_eq!(reply.parent_header.as_ref(), Some(&req.header));
        assert_eq!(reply.content["status"], json!("error"));
        assert_eq!(reply.content["execution_count"], json!(1));
        assert_eq!(reply.content["ename"], json!("UnknownMessageType"));
        assert_eq!(reply.content["traceback"], json!([]));
        assert_eq!(state.execution_count.current(), 1);
    }

    #[test]
    fn test_non_request_type_gets_execute_reply() {
        assert_eq!(reply_type("kernel_info_request"), "kernel_info_reply");
        assert_eq!(reply_type("ping"), "execute_reply");

        let state = state();
        let mut req = request(KernelInfoRequest {}, &state);
        req.header.msg_type = String::from("ping");
        let out = dispatcher(Channel::Shell, &state).dispatch(Ok(req));
        assert_eq!(replies(&out)[0].header.msg_type, "execute_reply");
    }

    #[test]
    fn test_invalid_content_degrades_to_error_reply() {
        let state = state();
        let mut req = request(ExecuteRequest::new("1"), &state);
        req.content = json!({"silent": true});

        let out = dispatcher(Channel::Shell, &state).dispatch(Ok(req));
        let reply = replies(&out)[0];
        assert_eq!(reply.header.msg_type, "execute_reply");
        assert_eq!(reply.content["status"], json!("error"));
        assert_eq!(reply.content["ename"], json!("InvalidMessage"));
        assert_eq!(state.execution_count.current(), 0);
    }

    #[test]
    fn test_undecodable_body_is_answered() {
        let state = state();
        let req = request(KernelInfoRequest {}, &state);
        let undecodable = Undecodable {
            request: req.clone(),
            error: Error::JsonParseError(
                String::from("content"),
                String::from("{"),
                serde_json::from_str::<Value>("{").unwrap_err(),
            ),
        };

        let out = dispatcher(Channel::Shell, &state).dispatch(Err(undecodable));
        let reply = replies(&out)[0];
        assert_eq!(reply.header.msg_type, "kernel_info_reply");
        assert_eq!(reply.content["status"], json!("error"));
        assert_eq!(reply.content["ename"], json!("InvalidMessage"));
    }

    #[test]
    fn test_control_shutdown_is_not_implemented() {
        let state = state();
        let out = dispatcher(Channel::Control, &state)
            .dispatch(Ok(request(ShutdownRequest { restart: false }, &state)));

        assert_eq!(kinds(&out), vec!["reply:shutdown_reply"]);
        let reply = replies(&out)[0];
        assert_eq!(reply.content["status"], json!("error"));
        assert_eq!(reply.content["ename"], json!("NotImplementedError"));
        assert!(!state.shutdown.is_set());
    }

    #[test]
    fn test_control_kernel_info() {
        let state = state();
        let out = Dispatcher::new(Channel::Control, state.clone(), kernel_info(), None)
            .dispatch(Ok(request(KernelInfoRequest {}, &state)));
        assert_eq!(kinds(&out), vec!["reply:kernel_info_reply"]);
    }

    #[test]
    fn test_control_refuses_execute() {
        let state = state();
        let out = Dispatcher::new(Channel::Control, state.clone(), kernel_info(), None)
            .dispatch(Ok(request(ExecuteRequest::new("1"), &state)));
        assert_eq!(kinds(&out), vec!["reply:execute_reply"]);
        assert_eq!(state.execution_count.current(), 0);
    }

    #[test]
    fn test_stdin_input_reply_is_absorbed() {
        let state = state();
        let mut stdin = Dispatcher::new(Channel::Stdin, state.clone(), kernel_info(), None);

        let out = stdin.dispatch(Ok(request(
            InputReply {
                value: String::from("42"),
            },
            &state,
        )));
        assert!(out.is_empty());

        let out = stdin.dispatch(Ok(request(KernelInfoRequest {}, &state)));
        assert_eq!(kinds(&out), vec!["reply:kernel_info_reply"]);
        assert_eq!(replies(&out)[0].content["status"], json!("error"));
    }
}
