/*
 * mod.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

pub mod heartbeat;
pub mod iopub;
pub mod router;
pub mod socket;
