// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the test supervisor.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error::Error as StdError, fmt, io};
use thiserror::Error;

/// Displays an error followed by its chain of sources, separated by `: `.
pub struct DisplayErrorChain<E>(E);

impl<E: StdError> DisplayErrorChain<E> {
    /// Wraps the given error.
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<E: StdError> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut next = self.0.source();
        while let Some(error) = next {
            write!(f, ": {error}")?;
            next = error.source();
        }
        Ok(())
    }
}

/// An error that occurred while reading the launcher config.
#[derive(Debug, Error)]
#[error("failed to parse launcher config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that produced the error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while reading the launcher config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// The config could not be built or deserialized.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// A report marker was configured as an empty string.
    #[error("report.{key} must not be empty")]
    EmptyMarker {
        /// The key of the marker.
        key: &'static str,
    },

    /// A wrapper command was configured as an empty list.
    #[error("wrappers.{key} must name a command")]
    EmptyWrapper {
        /// The key of the wrapper.
        key: &'static str,
    },

    /// The case column width was set to zero.
    #[error("launcher.case-column-width must be greater than zero")]
    ZeroColumnWidth,
}

/// An error that occurred while parsing a wrapper command from a string.
#[derive(Clone, Debug, Error)]
pub enum WrapperParseError {
    /// The string could not be split into shell words.
    #[error("error splitting `{value}` into shell words")]
    ShellWords {
        /// The value that failed to split.
        value: String,

        /// The underlying error.
        #[source]
        error: shell_words::ParseError,
    },

    /// The string did not contain a command.
    #[error("wrapper `{source_name}` does not name a command")]
    BinaryNotSpecified {
        /// Where the wrapper came from, e.g. an environment variable.
        source_name: String,
    },
}

/// An error that occurred while supervising a test binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SupervisorError {
    /// The test binary or the wrapper tool is not on the search path, or is not executable.
    #[error("{binary} NOT FOUND")]
    BinaryNotFound {
        /// The binary as requested by the user.
        binary: String,

        /// Whether the binary is the wrapper tool rather than the test binary.
        is_wrapper: bool,

        /// The lookup error.
        #[source]
        error: which::Error,
    },

    /// The child process could not be spawned.
    #[error("failed to spawn `{command}`")]
    Spawn {
        /// The full command line, shell-quoted.
        command: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Reading the child's output stream failed.
    #[error("failed to read output of `{command}`")]
    Read {
        /// The full command line, shell-quoted.
        command: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Writing to the console failed.
    #[error("failed to write to the console")]
    Write {
        /// The underlying error.
        #[from]
        error: io::Error,
    },
}

/// An error that occurred while parsing an extracted report fragment.
///
/// Surfaced to the user as a malformed report; the run itself still counts as completed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportParseError {
    /// The fragment is not well-formed XML.
    #[error("invalid XML at byte {position}")]
    Xml {
        /// The byte offset into the fragment.
        position: usize,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// The fragment is not valid UTF-8.
    #[error("report is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The document root is not the expected element.
    #[error("expected root element `{expected}`, found `{found}`")]
    UnexpectedRoot {
        /// The expected root element.
        expected: &'static str,

        /// The element that was found.
        found: String,
    },

    /// The fragment contained no root element.
    #[error("report is empty")]
    Empty,

    /// An element is missing a required attribute.
    #[error("`{element}` element is missing the `{attribute}` attribute")]
    MissingAttribute {
        /// The element.
        element: &'static str,

        /// The attribute.
        attribute: &'static str,
    },

    /// A count attribute is not a non-negative integer.
    #[error("attribute `{attribute}` of suite `{suite}` has invalid count `{value}`")]
    InvalidCount {
        /// The suite carrying the attribute.
        suite: String,

        /// The attribute.
        attribute: &'static str,

        /// The value that failed to parse.
        value: String,
    },

    /// A test case has a result value that isn't known.
    #[error("test case `{case}` has unknown result `{result}`")]
    UnknownResult {
        /// The test case.
        case: String,

        /// The result value.
        result: String,
    },

    /// A test case appears outside of any test suite.
    #[error("test case `{case}` is not inside a test suite")]
    CaseOutsideSuite {
        /// The test case.
        case: String,
    },

    /// The fragment ended while elements were still open.
    #[error("report ended before `{element}` was closed")]
    Unclosed {
        /// The innermost open element.
        element: String,
    },
}

impl ReportParseError {
    pub(crate) fn xml(position: usize, error: impl Into<quick_xml::Error>) -> Self {
        Self::Xml {
            position,
            error: error.into(),
        }
    }
}
