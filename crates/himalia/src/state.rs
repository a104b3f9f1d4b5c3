/*
 * state.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::session::Session;

/// Process-wide execution counter. Starts at 0, so the first accepted
/// execute request is numbered 1.
#[derive(Debug, Default)]
pub struct ExecutionCounter(AtomicU32);

impl ExecutionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the counter and returns the new value.
    pub fn increment(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Write-once flag telling every channel loop to wind down at its next
/// receive timeout.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything the channel loops share. The session is immutable, the counter
/// is only bumped by the Shell dispatcher, and the flag is set once.
#[derive(Debug, Clone)]
pub struct KernelState {
    pub session: Session,
    pub execution_count: Arc<ExecutionCounter>,
    pub shutdown: ShutdownFlag,
}

impl KernelState {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            execution_count: Arc::new(ExecutionCounter::new()),
            shutdown: ShutdownFlag::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_counter_starts_at_one() {
        let counter = ExecutionCounter::new();
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn test_counter_never_hands_out_duplicates() {
        let counter = Arc::new(ExecutionCounter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || (0..250).map(|_| counter.increment()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen: Vec<u32> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        seen.sort();
        assert_eq!(seen, (1..=1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_shutdown_flag_is_shared() {
        let flag = ShutdownFlag::new();
        let other = flag.clone();
        assert!(!other.is_set());
        flag.set();
        assert!(other.is_set());
    }
}
