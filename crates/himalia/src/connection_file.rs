/*
 * connection_file.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Error;

/// The contents of the Connection File as described by the Jupyter client docs;
/// directly parsed from JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConnectionFile {
    /// ZeroMQ port: Control channel (kernel interrupts)
    pub control_port: u16,

    /// ZeroMQ port: Shell channel (execution, completion)
    pub shell_port: u16,

    /// ZeroMQ port: Standard input channel (prompts)
    pub stdin_port: u16,

    /// ZeroMQ port: IOPub channel (broadcasts input/output)
    pub iopub_port: u16,

    /// ZeroMQ port: Heartbeat messages (echo)
    pub hb_port: u16,

    /// The transport type to use for ZeroMQ; "tcp" or "ipc"
    pub transport: String,

    /// The signature scheme to use for messages; generally "hmac-sha256"
    pub signature_scheme: String,

    /// The IP address to bind to
    pub ip: String,

    /// The HMAC signing key, or an empty string for an unauthenticated
    /// connection
    pub key: String,
}

/// Stand-alone configuration: loopback TCP, every port picked by the OS, and
/// a fresh random key.
impl Default for ConnectionFile {
    fn default() -> Self {
        Self {
            control_port: 0,
            shell_port: 0,
            stdin_port: 0,
            iopub_port: 0,
            hb_port: 0,
            transport: String::from("tcp"),
            signature_scheme: String::from("hmac-sha256"),
            ip: String::from("127.0.0.1"),
            key: Uuid::new_v4().to_string(),
        }
    }
}

impl ConnectionFile {
    /// Create a ConnectionFile by parsing the contents of a connection file.
    pub fn from_file<P: AsRef<Path>>(connection_file: P) -> crate::Result<ConnectionFile> {
        let path = connection_file.as_ref();
        let file = File::open(path)
            .map_err(|err| Error::ConnectionFile(path.display().to_string(), err))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|err| Error::ConnectionFileJson(path.display().to_string(), err))
    }

    /// Write to an actual file as pretty JSON.
    pub fn to_file<P: AsRef<Path>>(&self, connection_file: P) -> crate::Result<()> {
        let path = connection_file.as_ref();
        let file = File::create(path)
            .map_err(|err| Error::ConnectionFile(path.display().to_string(), err))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self)
            .map_err(|err| Error::ConnectionFileJson(path.display().to_string(), err))
    }

    /// Given a port, return a URI-like string that can be used to connect to
    /// the port, given the other parameters in the connection file.
    ///
    /// Example: `32` => `"tcp://127.0.0.1:32"`, or `"ipc://127.0.0.1-32"`
    /// for the ipc transport.
    pub fn endpoint(&self, port: u16) -> crate::Result<String> {
        match self.transport.as_str() {
            "tcp" => Ok(format!("tcp://{}:{}", self.ip, port)),
            "ipc" => Ok(format!("ipc://{}-{}", self.ip, port)),
            other => Err(Error::UnsupportedTransport(String::from(other))),
        }
    }

    /// Copy of this connection file advertising the given bound ports.
    pub fn with_ports(&self, ports: &BoundPorts) -> ConnectionFile {
        ConnectionFile {
            control_port: ports.control,
            shell_port: ports.shell,
            stdin_port: ports.stdin,
            iopub_port: ports.iopub,
            hb_port: ports.hb,
            ..self.clone()
        }
    }
}

/// The ports the kernel actually listens on, once port 0 requests have been
/// resolved by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundPorts {
    pub control: u16,
    pub shell: u16,
    pub stdin: u16,
    pub iopub: u16,
    pub hb: u16,
}
