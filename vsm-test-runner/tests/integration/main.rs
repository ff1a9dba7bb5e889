// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests that supervise shell scripts standing in for test binaries.

#[cfg(unix)]
mod basic;
#[cfg(unix)]
mod fixtures;
#[cfg(unix)]
mod wrappers;
