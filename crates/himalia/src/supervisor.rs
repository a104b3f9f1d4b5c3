/*
 * supervisor.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::time::Duration;

use log::error;
use log::info;
use log::trace;

use crate::error::Error;
use crate::state::ShutdownFlag;

/// How long a channel loop blocks waiting for work before checking the
/// shutdown flag again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The loop every channel thread runs: wait (bounded) for the next unit of
/// work, handle it, repeat.
///
/// Interrupted waits are retried. Once the shutdown flag is set the loop
/// exits quietly, whether it notices at a timeout boundary or because the
/// transport was torn down underneath it. Any other error ends this loop
/// only and is returned to the caller.
pub struct Worker {
    name: String,
    shutdown: ShutdownFlag,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(name: impl Into<String>, shutdown: ShutdownFlag) -> Self {
        Self {
            name: name.into(),
            shutdown,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs until shutdown or the first unrecoverable error.
    ///
    /// `recv` gets the poll interval and returns `Ok(None)` when nothing
    /// arrived in time. `handle` is called for every item, in arrival order,
    /// and must finish (including sending replies) before the next wait.
    pub fn run<T, R, H>(&self, mut recv: R, mut handle: H) -> crate::Result<()>
    where
        R: FnMut(Duration) -> crate::Result<Option<T>>,
        H: FnMut(T) -> crate::Result<()>,
    {
        info!("{} loop started", self.name);

        loop {
            if self.shutdown.is_set() {
                info!("{} loop exiting on shutdown", self.name);
                return Ok(());
            }

            let item = match recv(self.poll_interval) {
                Ok(Some(item)) => item,
                Ok(None) => continue,
                Err(err) if err.is_interrupt() => {
                    trace!("{} wait interrupted, retrying", self.name);
                    continue;
                },
                Err(err) => return self.fail(err),
            };

            match handle(item) {
                Ok(()) => {},
                Err(err) if err.is_interrupt() => {
                    trace!("{} handler interrupted, waiting for next message", self.name);
                },
                Err(err) => return self.fail(err),
            }
        }
    }

    fn fail(&self, err: Error) -> crate::Result<()> {
        if self.shutdown.is_set() {
            info!("{} loop exiting on shutdown ({err})", self.name);
            return Ok(());
        }
        error!("{} loop terminated: {err}", self.name);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::Error;

    fn interrupt() -> Error {
        Error::ZmqError(String::from("test"), zmq::Error::EINTR)
    }

    #[test]
    fn test_interrupts_are_retried() {
        let shutdown = ShutdownFlag::new();
        let worker = Worker::new("test", shutdown.clone());

        let mut script = vec![Ok(None), Err(interrupt()), Ok(Some(1)), Ok(Some(2))].into_iter();
        let mut handled = Vec::new();

        let result = worker.run(
            |_| script.next().unwrap_or(Ok(None)),
            |item| {
                handled.push(item);
                if item == 2 {
                    shutdown.set();
                }
                Ok(())
            },
        );

        assert_matches!(result, Ok(()));
        assert_eq!(handled, vec![1, 2]);
    }

    #[test]
    fn test_unexpected_error_terminates_loop() {
        let worker = Worker::new("test", ShutdownFlag::new());
        let result: crate::Result<()> = worker.run(
            |_| Err::<Option<()>, _>(Error::ChannelClosed(String::from("test"))),
            |_| Ok(()),
        );
        assert_matches!(result, Err(Error::ChannelClosed(_)));
    }

    #[test]
    fn test_handler_error_terminates_loop() {
        let worker = Worker::new("test", ShutdownFlag::new());
        let mut calls = 0;
        let result = worker.run(
            |_| Ok(Some(())),
            |_| {
                calls += 1;
                Err(crate::anyhow!("boom"))
            },
        );
        assert_matches!(result, Err(Error::Anyhow(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_error_during_shutdown_exits_quietly() {
        let shutdown = ShutdownFlag::new();
        let worker = Worker::new("test", shutdown.clone());
        let result: crate::Result<()> = worker.run(
            |_| {
                shutdown.set();
                Err::<Option<()>, _>(Error::ChannelClosed(String::from("test")))
            },
            |_| Ok(()),
        );
        assert_matches!(result, Ok(()));
    }

    #[test]
    fn test_shutdown_is_observed_between_waits() {
        let shutdown = ShutdownFlag::new();
        let worker =
            Worker::new("test", shutdown.clone()).with_poll_interval(Duration::from_millis(1));
        let mut waits = 0;
        let result = worker.run(
            |timeout| {
                assert_eq!(timeout, Duration::from_millis(1));
                waits += 1;
                if waits == 3 {
                    shutdown.set();
                }
                Ok::<Option<()>, Error>(None)
            },
            |_| Ok(()),
        );
        assert_matches!(result, Ok(()));
        assert_eq!(waits, 3);
    }
}
