// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Styles;
use crate::report::{CaseNode, CaseResult, ReportNode, SuiteNode};
use owo_colors::OwoColorize;
use std::io::{self, Write};

const INDENT: &str = "    ";

/// Writes the recursive summary of a parsed report.
///
/// The root `TestResult` node has no heading of its own: its suites start at the outermost level.
pub(super) fn write_summary(
    root: &SuiteNode,
    case_width: usize,
    styles: &Styles,
    writer: &mut dyn Write,
) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "=========== SUMMARY ===========".style(styles.bold)
    )?;
    writeln!(writer)?;

    for child in root.children() {
        if let ReportNode::Suite(suite) = child {
            write_suite(suite, 0, case_width, styles, writer)?;
        }
    }
    Ok(())
}

fn write_suite(
    suite: &SuiteNode,
    level: usize,
    case_width: usize,
    styles: &Styles,
    writer: &mut dyn Write,
) -> io::Result<()> {
    let indent = INDENT.repeat(level);
    writeln!(
        writer,
        "{indent}{}",
        format!("{} results:", suite.name()).style(styles.title)
    )?;

    for child in suite.children() {
        match child {
            ReportNode::Suite(child) => write_suite(child, level + 1, case_width, styles, writer)?,
            ReportNode::Case(case) => write_case(case, level + 1, case_width, styles, writer)?,
        }
    }

    if let Some(counts) = suite.reported_counts() {
        writeln!(
            writer,
            "{indent}{}",
            format!("{} summary:", suite.name()).style(styles.title)
        )?;
        for (label, count) in [
            ("Passed", counts.passed),
            ("Failed", counts.failed),
            ("Skipped", counts.skipped),
        ] {
            writeln!(
                writer,
                "{indent}{}",
                format!("{label} tests: {count}").style(styles.bold)
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_case(
    case: &CaseNode,
    level: usize,
    case_width: usize,
    styles: &Styles,
    writer: &mut dyn Write,
) -> io::Result<()> {
    let result_style = match case.result() {
        CaseResult::Passed => styles.pass,
        CaseResult::Failed | CaseResult::Skipped | CaseResult::Aborted => styles.fail,
    };
    writeln!(
        writer,
        "{}{}{}",
        INDENT.repeat(level),
        format!("{:<case_width$}", case.name()).style(styles.bold),
        case.result().style(result_style),
    )
}
