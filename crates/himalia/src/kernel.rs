/*
 * kernel.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::bounded;
use crossbeam::channel::unbounded;
use crossbeam::channel::Receiver;
use crossbeam::channel::Sender;
use log::error;
use log::info;

use crate::connection_file::BoundPorts;
use crate::connection_file::ConnectionFile;
use crate::dispatch::Channel;
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::language::executor::Executor;
use crate::session::Session;
use crate::session::SignaturePolicy;
use crate::socket::heartbeat::Heartbeat;
use crate::socket::iopub::IOPub;
use crate::socket::router::Router;
use crate::socket::socket::Socket;
use crate::state::KernelState;
use crate::supervisor::Worker;
use crate::wire::wire_message::WireMessage;

/// A running kernel: five bound sockets, each served by its own thread.
pub struct KernelHandle {
    state: KernelState,
    ports: BoundPorts,
    connection_file: ConnectionFile,
    subscription_rx: Receiver<()>,
    threads: Vec<(String, JoinHandle<crate::Result<()>>)>,
}

/// Binds the kernel's sockets and starts serving them.
///
/// Ports given as 0 are picked by the transport; the ones actually used are
/// available from the returned handle. Any binding failure is returned and
/// nothing is left running.
pub fn connect(
    name: &str,
    connection_file: ConnectionFile,
    policy: SignaturePolicy,
    executor: Box<dyn Executor>,
) -> crate::Result<KernelHandle> {
    let ctx = zmq::Context::new();

    let session = Session::create(
        connection_file.key.as_str(),
        connection_file.signature_scheme.as_str(),
        policy,
    )?;

    if connection_file.transport == "ipc" {
        let ports = [
            connection_file.control_port,
            connection_file.shell_port,
            connection_file.stdin_port,
            connection_file.iopub_port,
            connection_file.hb_port,
        ];
        if ports.contains(&0) {
            return Err(crate::anyhow!(
                "The ipc transport can't pick ports; all five must be given"
            ));
        }
    }

    let state = KernelState::new(session.clone());

    // Create all the sockets up front so a binding failure aborts startup
    // before any thread is running
    let bind = |name: &str, kind: zmq::SocketType, port: u16| -> crate::Result<(Socket, u16)> {
        let socket = Socket::new(
            session.clone(),
            ctx.clone(),
            String::from(name),
            kind,
            None,
            connection_file.endpoint(port)?,
        )?;
        let port = port_finalize(&socket, port)?;
        Ok((socket, port))
    };

    let (shell_socket, shell_port) = bind("Shell", zmq::ROUTER, connection_file.shell_port)?;
    let (control_socket, control_port) =
        bind("Control", zmq::ROUTER, connection_file.control_port)?;
    let (stdin_socket, stdin_port) = bind("Stdin", zmq::ROUTER, connection_file.stdin_port)?;
    let (iopub_socket, iopub_port) = bind("IOPub", zmq::XPUB, connection_file.iopub_port)?;
    let (heartbeat_socket, hb_port) = bind("Heartbeat", zmq::REP, connection_file.hb_port)?;

    let ports = BoundPorts {
        control: control_port,
        shell: shell_port,
        stdin: stdin_port,
        iopub: iopub_port,
        hb: hb_port,
    };
    info!("{name} bound to ports {ports:?}");

    // Notified by the IOPub thread when a frontend subscribes
    let (subscription_tx, subscription_rx) = bounded::<()>(1);

    let threads = match start_threads(
        name,
        &state,
        [shell_socket, control_socket, stdin_socket, iopub_socket, heartbeat_socket],
        executor,
        subscription_tx,
    ) {
        Ok(threads) => threads,
        Err(err) => {
            // Stop whatever did start before reporting the failure
            state.shutdown.set();
            return Err(err);
        },
    };

    let connection_file = connection_file.with_ports(&ports);

    Ok(KernelHandle {
        state,
        ports,
        connection_file,
        subscription_rx,
        threads,
    })
}

impl KernelHandle {
    pub fn ports(&self) -> BoundPorts {
        self.ports
    }

    /// The connection file a frontend should use to reach this kernel, with
    /// the bound ports filled in.
    pub fn connection_file(&self) -> &ConnectionFile {
        &self.connection_file
    }

    pub fn execution_count(&self) -> u32 {
        self.state.execution_count.current()
    }

    /// Blocks until a frontend subscribes to IOPub. Broadcasts published
    /// before that are lost, so callers that care wait here first.
    pub fn wait_for_subscriber(&self, timeout: Duration) -> crate::Result<()> {
        info!("Waiting on IOPub subscription confirmation");
        self.subscription_rx.recv_timeout(timeout).map_err(|err| {
            crate::anyhow!("No IOPub subscription within {timeout:?}: {err:?}")
        })
    }

    /// Asks every channel loop to stop. Loops notice within one poll
    /// interval.
    pub fn shutdown(&self) {
        info!("Kernel shutdown requested");
        self.state.shutdown.set();
    }

    /// Waits for every channel thread to finish. Returns the first error a
    /// loop terminated with, if any.
    pub fn join(self) -> crate::Result<()> {
        let mut result = Ok(());

        for (name, thread) in self.threads {
            let outcome = match thread.join() {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::ThreadPanicked(name.clone())),
            };
            if let Err(err) = outcome {
                error!("Thread '{name}' failed: {err}");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        result
    }
}

/// Spawns one thread per channel. Sockets come in the order Shell, Control,
/// Stdin, IOPub, Heartbeat.
fn start_threads(
    name: &str,
    state: &KernelState,
    sockets: [Socket; 5],
    executor: Box<dyn Executor>,
    subscription_tx: Sender<()>,
) -> crate::Result<Vec<(String, JoinHandle<crate::Result<()>>)>> {
    let [shell_socket, control_socket, stdin_socket, iopub_socket, heartbeat_socket] = sockets;

    let kernel_info = executor.kernel_info();

    // Broadcasts from the router threads to the IOPub thread
    let (iopub_tx, iopub_rx) = unbounded::<WireMessage>();

    let mut threads = Vec::new();

    let worker = Worker::new("IOPub", state.shutdown.clone());
    threads.push(spawn(format!("{name}-iopub"), move || {
        IOPub::new(iopub_socket, iopub_rx, subscription_tx).listen(&worker)
    })?);

    let worker = Worker::new("Heartbeat", state.shutdown.clone());
    threads.push(spawn(format!("{name}-heartbeat"), move || {
        Heartbeat::new(heartbeat_socket).listen(&worker)
    })?);

    let routers = [
        (Channel::Shell, shell_socket, Some(executor)),
        (Channel::Control, control_socket, None),
        (Channel::Stdin, stdin_socket, None),
    ];
    for (channel, socket, executor) in routers {
        let dispatcher = Dispatcher::new(channel, state.clone(), kernel_info.clone(), executor);
        let worker = Worker::new(channel.to_string(), state.shutdown.clone());
        let iopub_tx = iopub_tx.clone();
        let thread_name = format!("{name}-{}", channel.to_string().to_lowercase());
        threads.push(spawn(thread_name, move || {
            Router::new(socket, dispatcher, iopub_tx).listen(&worker)
        })?);
    }

    Ok(threads)
}

fn spawn<F>(name: String, f: F) -> crate::Result<(String, JoinHandle<crate::Result<()>>)>
where
    F: FnOnce() -> crate::Result<()> + Send + 'static,
{
    match std::thread::Builder::new().name(name.clone()).spawn(f) {
        Ok(handle) => Ok((name, handle)),
        Err(err) => Err(Error::ThreadSpawnFailed(name, err)),
    }
}

fn port_finalize(socket: &Socket, port: u16) -> crate::Result<u16> {
    if port == 0 {
        // We gave zmq a port number of `0` to begin with, so ask the socket
        // which one it picked
        socket.port()
    } else {
        Ok(port)
    }
}
