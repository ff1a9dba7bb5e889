// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs a test binary and supervises its output.
//!
//! The main structure in this module is [`TestSupervisor`], created through a
//! [`SupervisorBuilder`].

use crate::{
    classify::{ExtractedFragment, OutputClassifier},
    config::LauncherConfig,
    errors::{ReportParseError, SupervisorError},
    helpers::{TerminationStatus, shell_join},
    report::{FailingCase, SuiteNode, parse_report},
    reporter::{OutcomeReporter, Styles},
    wrapper::WrapperSpec,
};
use owo_colors::OwoColorize;
use std::{
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};
use vsm_test_metadata::VsmExitCode;

/// Builder for a [`TestSupervisor`].
#[derive(Clone, Debug)]
pub struct SupervisorBuilder {
    command: Vec<String>,
    wrapper: Option<WrapperSpec>,
    should_colorize: bool,
}

impl SupervisorBuilder {
    /// Creates a new builder for running `binary` with the given arguments.
    pub fn new<I, S>(binary: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = std::iter::once(binary.into())
            .chain(args.into_iter().map(Into::into))
            .collect();
        Self {
            command,
            wrapper: None,
            should_colorize: false,
        }
    }

    /// Sets the wrapper the test binary is run under.
    ///
    /// A debugger wrapper turns off report extraction: the child inherits the console instead.
    pub fn set_wrapper(&mut self, wrapper: Option<WrapperSpec>) -> &mut Self {
        self.wrapper = wrapper;
        self
    }

    /// Set to true if child output and the summary should be colorized.
    pub fn set_colorize(&mut self, should_colorize: bool) -> &mut Self {
        self.should_colorize = should_colorize;
        self
    }

    /// Creates a new supervisor.
    pub fn build<'a>(&self, config: &'a LauncherConfig) -> TestSupervisor<'a> {
        let mut styles = Styles::default();
        if self.should_colorize {
            styles.colorize();
        }
        TestSupervisor {
            config,
            command: self.command.clone(),
            wrapper: self.wrapper.clone(),
            styles,
        }
    }
}

/// Runs a single test binary, optionally under a wrapper, and reports on the outcome.
#[derive(Debug)]
pub struct TestSupervisor<'a> {
    config: &'a LauncherConfig,
    command: Vec<String>,
    wrapper: Option<WrapperSpec>,
    styles: Styles,
}

impl TestSupervisor<'_> {
    /// Returns true if the test binary's report will be extracted from its output.
    pub fn extracts_report(&self) -> bool {
        self.wrapper.as_ref().is_none_or(WrapperSpec::extracts_report)
    }

    /// Runs the test binary to completion, writing its output and the summary to `writer`.
    ///
    /// Failing to find the test binary or the wrapper is an error, as is failing to spawn or read
    /// from the child. Everything that happens after the child has started, including failing
    /// tests, crashes and missing or malformed reports, is part of the returned [`RunOutcome`].
    pub fn run(&self, writer: &mut dyn Write) -> Result<RunOutcome, SupervisorError> {
        let binary = self.binary();
        let resolved_binary = resolve_binary(binary, false)?;
        let resolved_wrapper = match &self.wrapper {
            Some(wrapper) => Some(resolve_binary(wrapper.binary(), true)?),
            None => None,
        };

        let extract = self.extracts_report();
        let command_line = self.command_line(extract);
        let display = shell_join(command_line.iter().copied());

        writeln!(
            writer,
            "{}",
            format!("Starting {binary} ...").style(self.styles.bold)
        )?;
        writeln!(
            writer,
            "{}",
            format!("Invoking `{display}`").style(self.styles.bold)
        )?;
        writer.flush()?;

        // The first token is the wrapper if there is one. Spawn the resolved path, and pass the
        // rest of the command line through as given.
        let program = resolved_wrapper.unwrap_or(resolved_binary);
        let args = &command_line[1..];
        tracing::debug!(program = %program.display(), ?args, extract, "spawning test binary");

        let outcome = if extract {
            self.run_extracting(program, args, &display, writer)?
        } else {
            self.run_passthrough(program, args, &display)?
        };
        tracing::debug!(termination = ?outcome.termination, "test binary exited");

        OutcomeReporter::new(self.config, &self.styles, &self.command)
            .write_outcome(&outcome, writer)?;
        writeln!(
            writer,
            "{}",
            format!("{binary} finished.").style(self.styles.bold)
        )?;
        writer.flush()?;

        Ok(outcome)
    }

    fn binary(&self) -> &str {
        // The builder always puts the binary first.
        &self.command[0]
    }

    /// Returns the full command line as shown to the user: the wrapper, the test binary and its
    /// arguments, then the arguments that control the test framework's output.
    fn command_line(&self, extract: bool) -> Vec<&str> {
        let mut command_line: Vec<&str> = Vec::new();
        if let Some(wrapper) = &self.wrapper {
            command_line.extend(wrapper.tokens());
        }
        command_line.extend(self.command.iter().map(String::as_str));
        if extract {
            command_line.extend(self.config.format_args().iter().map(String::as_str));
        }
        command_line.extend(self.config.common_args().iter().map(String::as_str));
        command_line
    }

    fn run_extracting(
        &self,
        program: PathBuf,
        args: &[&str],
        display: &str,
        writer: &mut dyn Write,
    ) -> Result<RunOutcome, SupervisorError> {
        let read_error = |error: io::Error| SupervisorError::Read {
            command: display.to_owned(),
            error,
        };

        let handle = duct::cmd(program, args)
            .stderr_to_stdout()
            .unchecked()
            .reader()
            .map_err(|error| SupervisorError::Spawn {
                command: display.to_owned(),
                error,
            })?;

        // Read until the end of the stream, even if the child has already exited: output may
        // still be buffered in the pipe.
        let mut classifier = OutputClassifier::new(self.config, &self.styles);
        let mut reader = BufReader::new(&handle);
        let mut line = Vec::new();
        loop {
            line.clear();
            let bytes_read = reader.read_until(b'\n', &mut line).map_err(read_error)?;
            if bytes_read == 0 {
                break;
            }
            classifier.process_line(&line, writer)?;
        }

        // After reading completes (EOF), the handle is internally waited on.
        let output = handle.try_wait().map_err(read_error)?.ok_or_else(|| {
            read_error(io::Error::other(
                "child process was still running after its output ended",
            ))
        })?;
        let termination = TerminationStatus::from_exit_status(output.status);
        let fragment = classifier.finish(writer)?;

        let report_status = match (termination, fragment) {
            (TerminationStatus::Signaled(signal), fragment) => {
                if fragment != ExtractedFragment::NotFound {
                    tracing::debug!(signal, "ignoring report of test binary terminated by signal");
                }
                ReportStatus::AbandonedBySignal
            }
            (TerminationStatus::Exited(_), ExtractedFragment::Complete(fragment)) => {
                match parse_report(&fragment) {
                    Ok(root) => ReportStatus::Parsed(root),
                    Err(error) => {
                        tracing::debug!(%error, "failed to parse report");
                        ReportStatus::Malformed(error)
                    }
                }
            }
            (
                TerminationStatus::Exited(_),
                ExtractedFragment::Unterminated | ExtractedFragment::NotFound,
            ) => ReportStatus::NoReportProduced,
        };

        Ok(RunOutcome::new(termination, report_status))
    }

    fn run_passthrough(
        &self,
        program: PathBuf,
        args: &[&str],
        display: &str,
    ) -> Result<RunOutcome, SupervisorError> {
        let output = duct::cmd(program, args)
            .unchecked()
            .run()
            .map_err(|error| SupervisorError::Spawn {
                command: display.to_owned(),
                error,
            })?;
        let termination = TerminationStatus::from_exit_status(output.status);
        Ok(RunOutcome::new(termination, ReportStatus::NotRequested))
    }
}

fn resolve_binary(binary: &str, is_wrapper: bool) -> Result<PathBuf, SupervisorError> {
    match which::which(binary) {
        Ok(path) => {
            tracing::debug!(binary, path = %path.display(), is_wrapper, "resolved binary");
            Ok(path)
        }
        Err(error) => Err(SupervisorError::BinaryNotFound {
            binary: binary.to_owned(),
            is_wrapper,
            error,
        }),
    }
}

/// What became of the report a test binary was expected to produce.
#[derive(Debug)]
pub enum ReportStatus {
    /// The binary was run under a debugger, so no report was requested.
    NotRequested,

    /// The report was extracted and parsed.
    Parsed(SuiteNode),

    /// The binary exited without producing a complete report.
    NoReportProduced,

    /// The binary produced a report that could not be parsed.
    Malformed(ReportParseError),

    /// The binary was terminated by a signal, so any report it produced is not trusted.
    AbandonedBySignal,
}

impl ReportStatus {
    /// Returns the parsed report, if any.
    pub fn report(&self) -> Option<&SuiteNode> {
        match self {
            Self::Parsed(root) => Some(root),
            _ => None,
        }
    }
}

/// The outcome of a supervised run.
#[derive(Debug)]
pub struct RunOutcome {
    termination: TerminationStatus,
    report_status: ReportStatus,
    failing_cases: Vec<FailingCase>,
}

impl RunOutcome {
    fn new(termination: TerminationStatus, report_status: ReportStatus) -> Self {
        let failing_cases = report_status
            .report()
            .map(SuiteNode::failing_cases)
            .unwrap_or_default();
        Self {
            termination,
            report_status,
            failing_cases,
        }
    }

    /// How the test binary terminated.
    pub fn termination(&self) -> TerminationStatus {
        self.termination
    }

    /// What became of the report.
    pub fn report_status(&self) -> &ReportStatus {
        &self.report_status
    }

    /// Test cases that did not pass, in report order.
    pub fn failing_cases(&self) -> &[FailingCase] {
        &self.failing_cases
    }

    /// The exit code the launcher should exit with.
    ///
    /// This is the test binary's own exit code if it exited normally.
    pub fn exit_code(&self) -> i32 {
        match self.termination {
            TerminationStatus::Exited(code) => code,
            TerminationStatus::Signaled(_) => VsmExitCode::TEST_BINARY_SIGNALED,
        }
    }
}
