// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{borrow::Cow, process::ExitStatus};

/// How a test binary terminated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TerminationStatus {
    /// The process exited normally with this exit code.
    Exited(i32),

    /// The process was terminated by this signal number (Unix only).
    Signaled(i32),
}

impl TerminationStatus {
    /// Extracts the termination status from a platform exit status.
    pub fn from_exit_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }

        // Stopped or continued processes are never reported by wait.
        termination_signal(status).map_or(Self::Exited(1), Self::Signaled)
    }

    /// Returns the signal number if the process was terminated by a signal.
    pub fn signal(self) -> Option<i32> {
        match self {
            Self::Exited(_) => None,
            Self::Signaled(signal) => Some(signal),
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn termination_signal(status: ExitStatus) -> Option<i32> {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        }
    } else {
        fn termination_signal(_status: ExitStatus) -> Option<i32> {
            None
        }
    }
}

/// The signal number of a segmentation fault.
pub(crate) const SIGSEGV: i32 = 11;

/// Returns the abbreviated name of a signal, without the `SIG` prefix.
pub(crate) fn signal_str(signal: i32) -> Option<&'static str> {
    // These signal numbers are the same on at least Linux, macOS, FreeBSD and illumos.
    match signal {
        1 => Some("HUP"),
        2 => Some("INT"),
        3 => Some("QUIT"),
        4 => Some("ILL"),
        5 => Some("TRAP"),
        6 => Some("ABRT"),
        8 => Some("FPE"),
        9 => Some("KILL"),
        11 => Some("SEGV"),
        13 => Some("PIPE"),
        14 => Some("ALRM"),
        15 => Some("TERM"),
        _ => None,
    }
}

/// Returns a short description of the usual cause of a signal.
pub(crate) fn signal_cause(signal: i32) -> Option<&'static str> {
    match signal {
        1 => Some("hangup"),
        2 => Some("interrupted"),
        3 => Some("quit"),
        4 => Some("illegal instruction"),
        5 => Some("trace or breakpoint trap"),
        6 => Some("aborted"),
        8 => Some("floating point exception"),
        9 => Some("killed"),
        11 => Some("segmentation fault"),
        13 => Some("broken pipe"),
        14 => Some("alarm clock"),
        15 => Some("terminated"),
        _ => None,
    }
}

/// Describes how a process was terminated by a signal, e.g. `SIGSEGV (segmentation fault)`.
pub(crate) fn display_signal(signal: i32) -> String {
    match (signal_str(signal), signal_cause(signal)) {
        (Some(name), Some(cause)) => format!("SIG{name} ({cause})"),
        (Some(name), None) => format!("SIG{name}"),
        _ => format!("signal {signal}"),
    }
}

/// Joins tokens into a command line that can be pasted into a shell.
///
/// Only tokens that need it are quoted, so `--report_format=XML` stays as is.
pub(crate) fn shell_join<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (idx, token) in tokens.into_iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        // A leading `NAME=value` word is an environment assignment to the shell.
        out.push_str(&shell_quote(token, idx == 0));
    }
    out
}

/// Quotes a single token for the shell if it contains anything but safe characters.
pub(crate) fn shell_quote(token: &str, is_first: bool) -> Cow<'_, str> {
    let is_safe = |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, ',' | '.' | '_' | '+' | ':' | '@' | '%' | '/' | '-')
    };
    if !token.is_empty() && token.chars().all(|c| is_safe(c) || (c == '=' && !is_first)) {
        Cow::Borrowed(token)
    } else {
        shell_words::quote(token)
    }
}
