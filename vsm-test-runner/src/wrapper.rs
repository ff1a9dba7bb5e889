// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wrapper tools that test binaries are run under, such as a memory checker or a debugger.

use crate::{config::LauncherConfig, errors::WrapperParseError};
use std::fmt;

/// The environment variable that overrides the debugger command.
pub const DEBUGGER_ENV: &str = "VSM_DEBUGGER";

/// The kind of wrapper a test binary is run under.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WrapperKind {
    /// A memory checker such as valgrind. The report is still extracted.
    MemoryChecker,

    /// An interactive debugger. Output is not captured, so no report is extracted.
    Debugger,

    /// Any other wrapper command. The report is still extracted.
    Custom,
}

impl fmt::Display for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemoryChecker => write!(f, "memory checker"),
            Self::Debugger => write!(f, "debugger"),
            Self::Custom => write!(f, "wrapper"),
        }
    }
}

/// A prefix command prepended to the test binary's invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WrapperSpec {
    kind: WrapperKind,
    binary: String,
    args: Vec<String>,
}

impl WrapperSpec {
    /// Creates a new wrapper from a list of tokens. The first token is the wrapper binary.
    pub fn new<I, S>(kind: WrapperKind, tokens: I) -> Result<Self, WrapperParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = tokens.into_iter().map(Into::into);
        let binary = tokens
            .next()
            .ok_or_else(|| WrapperParseError::BinaryNotSpecified {
                source_name: kind.to_string(),
            })?;
        Ok(Self {
            kind,
            binary,
            args: tokens.collect(),
        })
    }

    /// Parses a wrapper from a string, splitting it into shell words.
    ///
    /// `source_name` is used in error messages, e.g. the name of an environment variable.
    pub fn parse(
        kind: WrapperKind,
        source_name: &str,
        value: &str,
    ) -> Result<Self, WrapperParseError> {
        let tokens = shell_words::split(value).map_err(|error| WrapperParseError::ShellWords {
            value: value.to_owned(),
            error,
        })?;
        if tokens.is_empty() {
            return Err(WrapperParseError::BinaryNotSpecified {
                source_name: source_name.to_owned(),
            });
        }
        Self::new(kind, tokens)
    }

    /// Returns the memory checker configured in `config`.
    pub fn memcheck(config: &LauncherConfig) -> Result<Self, WrapperParseError> {
        Self::new(WrapperKind::MemoryChecker, config.memcheck_command())
    }

    /// Returns the debugger: `env_override` if specified (typically the value of
    /// [`DEBUGGER_ENV`]), otherwise the one configured in `config`.
    pub fn debugger(
        config: &LauncherConfig,
        env_override: Option<&str>,
    ) -> Result<Self, WrapperParseError> {
        match env_override {
            Some(value) => Self::parse(WrapperKind::Debugger, DEBUGGER_ENV, value),
            None => Self::new(WrapperKind::Debugger, config.debugger_command()),
        }
    }

    /// Appends extra arguments to the wrapper, placed before the test binary.
    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the kind of this wrapper.
    pub fn kind(&self) -> WrapperKind {
        self.kind
    }

    /// The wrapper binary, as given. Resolved against `PATH` when the test binary is run.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// The arguments passed to the wrapper binary before the test binary.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(AsRef::as_ref)
    }

    /// Returns true if the test binary's report can be extracted while running under this wrapper.
    pub fn extracts_report(&self) -> bool {
        self.kind != WrapperKind::Debugger
    }

    /// Returns the binary followed by the arguments.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.binary.as_str()).chain(self.args())
    }
}
