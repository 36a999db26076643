// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for ResolveLite
//!
//! Provides the demonstration runner, project setup and one-off engine
//! operations.

pub mod commands;
pub mod demo;
pub mod handlers;
pub mod output;
pub mod signal;

pub use commands::{Cli, Commands};
pub use demo::run_examples;
pub use handlers::{
    handle_add, handle_get, handle_path, handle_search, handle_setup, handle_stats, handle_why,
    open_engine, release_engine,
};
pub use signal::install_interrupt_flag;
