// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Launcher for the daemon's unit-test binaries.
//!
//! Runs a test binary, optionally under valgrind or a debugger, colors its output by severity as
//! it arrives, and finishes with a summary of the test suites along with commands that re-run
//! each failing case.
//!
//! The logic lives in the `vsm-test-runner` crate. This crate only parses the command line and
//! maps errors to exit codes.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, StderrStyles};
