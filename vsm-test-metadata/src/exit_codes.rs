// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `vsm-launch-test`.
///
/// When the test binary exits normally, the launcher exits with the binary's own exit code, so
/// the codes below only apply to runs that never got that far, or to binaries that were killed
/// by a signal.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum VsmExitCode {}

impl VsmExitCode {
    /// No errors occurred and the test binary exited with code 0.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up the launch, for example an invalid config file.
    pub const SETUP_ERROR: i32 = 96;

    /// The test binary could not be spawned even though it was found on the search path.
    pub const SPAWN_FAILED: i32 = 104;

    /// The test binary was terminated by a signal.
    ///
    /// The launcher prints a diagnosis of the signal before exiting with this code.
    pub const TEST_BINARY_SIGNALED: i32 = 105;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// The test binary or the wrapper tool was not found on the search path.
    ///
    /// Matches the shell's "command not found" status.
    pub const BINARY_NOT_FOUND: i32 = 127;
}
