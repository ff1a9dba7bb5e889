// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints the outcome of a supervised run.
//!
//! The main structure in this module is [`OutcomeReporter`], which renders the summary of the
//! parsed report, replay commands for failing test cases and diagnoses for abnormal termination.

mod diagnostics;
mod summary;

use crate::{config::LauncherConfig, supervisor::RunOutcome};
use owo_colors::Style;
use std::io::{self, Write};

/// Console styles used for child output and the outcome of a run.
#[derive(Clone, Debug, Default)]
pub struct Styles {
    pub(crate) error: Style,
    pub(crate) warning: Style,
    pub(crate) help: Style,
    pub(crate) info: Style,
    pub(crate) debug: Style,
    pub(crate) trace: Style,
    pub(crate) progress: Style,
    pub(crate) bold: Style,
    pub(crate) title: Style,
    pub(crate) pass: Style,
    pub(crate) fail: Style,
}

impl Styles {
    /// Turns on colors for all styles.
    pub fn colorize(&mut self) {
        self.error = Style::new().red().bold();
        self.warning = Style::new().yellow().bold();
        self.help = Style::new().magenta().bold();
        self.info = Style::new().blue().bold();
        self.debug = Style::new().green();
        self.trace = Style::new().dimmed();
        self.progress = Style::new().cyan();
        self.bold = Style::new().bold();
        self.title = Style::new().cyan().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
    }
}

/// Writes the summary and diagnostics for a finished run.
#[derive(Debug)]
pub struct OutcomeReporter<'a> {
    config: &'a LauncherConfig,
    styles: &'a Styles,
    command: &'a [String],
}

impl<'a> OutcomeReporter<'a> {
    /// Creates a new reporter.
    ///
    /// `command` is the test binary followed by its arguments, as given by the user.
    pub fn new(config: &'a LauncherConfig, styles: &'a Styles, command: &'a [String]) -> Self {
        Self {
            config,
            styles,
            command,
        }
    }

    /// Writes everything known about the outcome: the summary if a report was parsed, replay
    /// commands for failing cases, a note if the report was missing or malformed, and a
    /// diagnosis if the binary was terminated by a signal.
    pub fn write_outcome(&self, outcome: &RunOutcome, writer: &mut dyn Write) -> io::Result<()> {
        if let Some(root) = outcome.report_status().report() {
            summary::write_summary(root, self.config.case_column_width(), self.styles, writer)?;
        }
        diagnostics::write_replay_commands(
            self.config.replay_command(),
            self.binary(),
            outcome.failing_cases(),
            self.styles,
            writer,
        )?;
        diagnostics::write_report_note(outcome.report_status(), self.styles, writer)?;
        if let Some(signal) = outcome.termination().signal() {
            diagnostics::write_signal_diagnosis(
                self.config.replay_command(),
                self.command,
                signal,
                self.styles,
                writer,
            )?;
        }
        writer.flush()
    }

    fn binary(&self) -> &str {
        self.command.first().map_or("", String::as_str)
    }
}
