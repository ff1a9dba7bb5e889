// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use vsm_test_metadata::VsmExitCode;
use vsm_test_runner::errors::{ConfigParseError, SupervisorError, WrapperParseError};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are expected to be printed with
// display_to_stderr, which colorizes them.

/// An error that stopped the launcher before the test binary's own exit code was known.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirInvalid {
        #[source]
        error: std::io::Error,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("wrapper parse error")]
    WrapperParseError {
        #[from]
        err: WrapperParseError,
    },
    #[error("supervisor error")]
    SupervisorError {
        #[from]
        err: SupervisorError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirInvalid { .. }
            | Self::ConfigParseError { .. }
            | Self::WrapperParseError { .. } => VsmExitCode::SETUP_ERROR,
            Self::SupervisorError { err } => match err {
                SupervisorError::BinaryNotFound { .. } => VsmExitCode::BINARY_NOT_FOUND,
                SupervisorError::Spawn { .. } | SupervisorError::Read { .. } => {
                    VsmExitCode::SPAWN_FAILED
                }
                SupervisorError::Write { .. } => VsmExitCode::WRITE_OUTPUT_ERROR,
                _ => 1,
            },
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirInvalid { error } => {
                tracing::error!("could not determine the current directory");
                Some(error as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse launcher config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::WrapperParseError { err } => {
                match err {
                    WrapperParseError::ShellWords { value, .. } => tracing::error!(
                        "failed to split `{}` into shell words",
                        value.style(styles.bold)
                    ),
                    WrapperParseError::BinaryNotSpecified { source_name } => tracing::error!(
                        "wrapper command from {} does not name a program",
                        source_name.style(styles.bold)
                    ),
                }
                err.source()
            }
            Self::SupervisorError { err } => display_supervisor_error(err, styles),
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

fn display_supervisor_error<'a>(
    err: &'a SupervisorError,
    styles: &StderrStyles,
) -> Option<&'a (dyn Error + 'static)> {
    match err {
        SupervisorError::BinaryNotFound {
            binary,
            is_wrapper,
            error,
        } => {
            if *is_wrapper {
                tracing::error!(
                    "{} NOT FOUND {}",
                    binary.style(styles.bold),
                    "(wrapper tool)".style(styles.warning_text)
                );
            } else {
                tracing::error!("{} NOT FOUND", binary.style(styles.bold));
            }
            Some(error as &dyn Error)
        }
        SupervisorError::Spawn { command, error } => {
            tracing::error!("failed to spawn `{}`", command.style(styles.bold));
            Some(error as &dyn Error)
        }
        SupervisorError::Read { command, error } => {
            tracing::error!("failed to read output of `{}`", command.style(styles.bold));
            Some(error as &dyn Error)
        }
        SupervisorError::Write { error } => {
            tracing::error!("failed to write to the console");
            Some(error as &dyn Error)
        }
        other => {
            tracing::error!("{other}");
            other.source()
        }
    }
}
