// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Keyboard interrupt handling for the examples runner
//!
//! SIGINT and SIGTERM only raise a flag. The runner polls it between
//! examples and falls through to the normal release path.

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Register the interrupt flag for SIGINT and SIGTERM
///
/// Registration failures are logged; the flag is returned either way and
/// simply never fires.
pub fn install_interrupt_flag() -> Arc<AtomicBool> {
    let interrupted = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&interrupted)) {
            log::warn!("Can't register handler for signal {}: {}", signal, e);
        }
    }
    interrupted
}
