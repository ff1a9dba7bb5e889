// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for `vsm-launch-test`, the launcher for the daemon's unit-test binaries.
//!
//! A run goes through these stages:
//!
//! 1. [`supervisor`] resolves the test binary (and the wrapper tool, if any) and spawns it.
//! 2. [`classify`] renders the child's output live, colored by severity, while extracting the
//!    report embedded in it.
//! 3. [`report`] parses the extracted report into a tree of suites and cases.
//! 4. [`reporter`] prints the summary, replay commands for failing cases, and a diagnosis if the
//!    binary was terminated by a signal.

pub mod classify;
pub mod config;
pub mod errors;
mod helpers;
pub mod report;
pub mod reporter;
pub mod supervisor;
pub mod wrapper;

pub use helpers::TerminationStatus;
