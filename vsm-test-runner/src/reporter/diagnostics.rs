// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Styles;
use crate::{
    errors::DisplayErrorChain,
    helpers::{SIGSEGV, display_signal, shell_join, shell_quote},
    report::FailingCase,
    supervisor::ReportStatus,
};
use owo_colors::OwoColorize;
use std::io::{self, Write};

const INDENT: &str = "    ";

/// Writes a command that re-runs each failing test case on its own.
pub(super) fn write_replay_commands(
    launcher: &str,
    binary: &str,
    failing: &[FailingCase],
    styles: &Styles,
    writer: &mut dyn Write,
) -> io::Result<()> {
    if failing.is_empty() {
        return Ok(());
    }

    writeln!(
        writer,
        "{}",
        "Some tests failed. Use following command(s) to launch them explicitly:".style(styles.title)
    )?;
    let binary = shell_quote(binary, true);
    for case in failing {
        let command = format!(
            "{launcher} {binary} -t {}",
            shell_quote(&case.to_string(), false)
        );
        writeln!(writer, "{INDENT}{}", command.style(styles.fail))?;
    }
    Ok(())
}

/// Writes a note if the report was expected but could not be used.
pub(super) fn write_report_note(
    status: &ReportStatus,
    styles: &Styles,
    writer: &mut dyn Write,
) -> io::Result<()> {
    let note = match status {
        ReportStatus::NoReportProduced => "test binary did not produce a report".to_owned(),
        ReportStatus::Malformed(error) => format!(
            "test binary produced a malformed report: {}",
            DisplayErrorChain::new(error)
        ),
        ReportStatus::NotRequested | ReportStatus::Parsed(_) | ReportStatus::AbandonedBySignal => {
            return Ok(());
        }
    };
    writeln!(writer, "{}", note.style(styles.warning))
}

/// Writes a diagnosis for a test binary terminated by a signal.
///
/// For segmentation faults, also suggests a command that re-runs the binary under the debugger.
pub(super) fn write_signal_diagnosis(
    launcher: &str,
    command: &[String],
    signal: i32,
    styles: &Styles,
    writer: &mut dyn Write,
) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=========== FAILED ===========".style(styles.fail))?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        format!("Terminated by {}", display_signal(signal)).style(styles.fail)
    )?;

    if signal == SIGSEGV {
        writeln!(writer)?;
        writeln!(
            writer,
            "{}",
            "Use following command to launch debugger:".style(styles.fail)
        )?;
        let debug_command = format!(
            "{launcher} --gdb {}",
            shell_join(command.iter().map(String::as_str))
        );
        writeln!(writer, "{INDENT}{}", debug_command.style(styles.fail))?;
    }
    Ok(())
}
