/*
 * iopub.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::time::Duration;

use crossbeam::channel::Receiver;
use crossbeam::channel::RecvTimeoutError;
use crossbeam::channel::Sender;
use log::info;
use log::warn;

use crate::error::Error;
use crate::socket::socket::Socket;
use crate::supervisor::Worker;
use crate::wire::subscription_message::SubscriptionKind;
use crate::wire::subscription_message::SubscriptionMessage;
use crate::wire::wire_message::WireMessage;

/// Owns the IOPub XPUB socket. Other threads hand it broadcasts over a
/// channel; it signs and publishes them, and watches for subscribers.
pub struct IOPub {
    /// The underlying IOPub socket
    socket: Socket,

    /// A channel that receives IOPub messages from other threads
    receiver: Receiver<WireMessage>,

    /// Notified whenever a frontend subscribes
    subscription_tx: Sender<()>,
}

impl IOPub {
    pub fn new(
        socket: Socket,
        receiver: Receiver<WireMessage>,
        subscription_tx: Sender<()>,
    ) -> Self {
        Self {
            socket,
            receiver,
            subscription_tx,
        }
    }

    /// Publishes broadcasts until shutdown.
    pub fn listen(&self, worker: &Worker) -> crate::Result<()> {
        worker.run(|timeout| self.next(timeout), |msg| msg.send(&self.socket))
    }

    /// Drains pending subscription frames, then waits for the next broadcast.
    fn next(&self, timeout: Duration) -> crate::Result<Option<WireMessage>> {
        while self.socket.poll_incoming(0)? {
            self.process_subscription();
        }

        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::ChannelClosed(String::from("IOPub"))),
        }
    }

    fn process_subscription(&self) {
        let message = match SubscriptionMessage::read_from_socket(&self.socket) {
            Ok(message) => message,
            Err(err) => {
                warn!("Ignoring malformed IOPub subscription message: {err}");
                return;
            },
        };

        match message.kind {
            SubscriptionKind::Subscribe => {
                info!("IOPub subscription received: '{}'", message.subscription);
                // Only the first subscription matters to a waiter; a full
                // channel means one is already pending
                let _ = self.subscription_tx.try_send(());
            },
            SubscriptionKind::Unsubscribe => {
                info!("IOPub unsubscription received: '{}'", message.subscription);
            },
        }
    }
}
