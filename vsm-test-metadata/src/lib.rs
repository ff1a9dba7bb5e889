// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable contracts of `vsm-launch-test`.
//!
//! Scripts that drive the launcher (CI jobs, integration-test wrappers) can use the exit codes
//! documented here to tell apart a failing test binary from a launcher-level problem.

mod exit_codes;

pub use exit_codes::*;
