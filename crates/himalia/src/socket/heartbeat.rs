/*
 * heartbeat.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use log::trace;

use crate::socket::socket::Socket;
use crate::supervisor::Worker;

/// Structure used for heartbeat messages
pub struct Heartbeat {
    socket: Socket,
}

impl Heartbeat {
    /// Create a new heartbeat handler from the given heartbeat socket
    pub fn new(socket: Socket) -> Self {
        Self { socket }
    }

    /// Echoes every message straight back, frame for frame. No framing or
    /// signing applies on this channel.
    pub fn listen(&self, worker: &Worker) -> crate::Result<()> {
        worker.run(
            |timeout| self.socket.recv_timeout(timeout),
            |frames| {
                trace!("Heartbeat message: {} frame(s)", frames.len());
                self.socket.send_multipart(&frames)
            },
        )
    }
}
