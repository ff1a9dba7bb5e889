// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live classification of a test binary's output, and extraction of the report embedded in it.

use crate::{config::LauncherConfig, reporter::Styles};
use bstr::ByteSlice;
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

/// The severity of a line of test binary output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// An error logged by the daemon or reported by the test framework.
    Error,
    /// A warning.
    Warning,
    /// A help message from the daemon.
    Help,
    /// An informational message from the daemon.
    Info,
    /// A debug message from the daemon.
    Debug,
    /// A trace message from the daemon.
    Trace,
    /// The test framework entering or leaving a suite or case.
    Progress,
}

/// Markers that classify a line, in priority order. The first marker found in a line wins.
pub const SEVERITY_MARKERS: &[(&str, Severity)] = &[
    ("[ERROR]", Severity::Error),
    ("fatal error: in", Severity::Error),
    ("error: in", Severity::Error),
    ("[WARN]", Severity::Warning),
    ("warning: in", Severity::Warning),
    ("[HELP]", Severity::Help),
    ("[INFO]", Severity::Info),
    ("[DEBUG]", Severity::Debug),
    ("[TRACE]", Severity::Trace),
    ("Entering test", Severity::Progress),
    ("Leaving test", Severity::Progress),
];

impl Severity {
    /// Classifies a line by the first matching marker in [`SEVERITY_MARKERS`].
    pub fn classify(line: &[u8]) -> Option<Self> {
        SEVERITY_MARKERS
            .iter()
            .find(|(marker, _)| line.find(marker).is_some())
            .map(|&(_, severity)| severity)
    }

    pub(crate) fn style(self, styles: &Styles) -> Style {
        match self {
            Self::Error => styles.error,
            Self::Warning => styles.warning,
            Self::Help => styles.help,
            Self::Info => styles.info,
            Self::Debug => styles.debug,
            Self::Trace => styles.trace,
            Self::Progress => styles.progress,
        }
    }
}

/// What the classifier found in the output once the stream has ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExtractedFragment {
    /// A complete fragment, from the begin marker through the end marker.
    Complete(Vec<u8>),

    /// The begin marker was seen, but the stream ended before the end marker.
    Unterminated,

    /// No begin marker was seen.
    NotFound,
}

/// Renders test binary output line by line while extracting the embedded report.
///
/// Lines are written and flushed as soon as they are processed, so output appears live. Text
/// between the begin and end markers is captured and never written.
#[derive(Debug)]
pub struct OutputClassifier<'a> {
    begin_marker: &'a [u8],
    end_marker: &'a [u8],
    styles: &'a Styles,
    // Bytes of a fragment that has begun but not ended yet.
    pending: Option<Vec<u8>>,
    fragment: Option<Vec<u8>>,
    lines: usize,
}

impl<'a> OutputClassifier<'a> {
    /// Creates a new classifier using the report markers from `config`.
    pub fn new(config: &'a LauncherConfig, styles: &'a Styles) -> Self {
        Self::with_markers(config.begin_marker(), config.end_marker(), styles)
    }

    fn with_markers(begin_marker: &'a str, end_marker: &'a str, styles: &'a Styles) -> Self {
        Self {
            begin_marker: begin_marker.as_bytes(),
            end_marker: end_marker.as_bytes(),
            styles,
            pending: None,
            fragment: None,
            lines: 0,
        }
    }

    /// Processes a single line of output, including its line terminator if any.
    pub fn process_line(&mut self, line: &[u8], writer: &mut dyn Write) -> io::Result<()> {
        self.lines += 1;
        let mut visible = Vec::new();
        let mut touched_fragment = self.pending.is_some();
        let mut rest = line;

        loop {
            match &mut self.pending {
                Some(pending) => match rest.find(self.end_marker) {
                    Some(idx) => {
                        let end = idx + self.end_marker.len();
                        pending.extend_from_slice(&rest[..end]);
                        rest = &rest[end..];
                        self.complete_fragment();
                    }
                    None => {
                        pending.extend_from_slice(rest);
                        break;
                    }
                },
                None => match rest.find(self.begin_marker) {
                    Some(idx) => {
                        tracing::debug!(line = self.lines, "report fragment begins");
                        touched_fragment = true;
                        visible.extend_from_slice(&rest[..idx]);
                        let start = idx + self.begin_marker.len();
                        self.pending = Some(rest[idx..start].to_vec());
                        rest = &rest[start..];
                    }
                    None => {
                        visible.extend_from_slice(rest);
                        break;
                    }
                },
            }
        }

        let visible = strip_line_terminator(&visible);
        if touched_fragment && visible.trim_ascii().is_empty() {
            return Ok(());
        }
        self.write_visible(visible, writer)
    }

    /// Finishes processing once the stream has ended, returning the extracted fragment.
    ///
    /// If several complete fragments were seen, the last one is returned. If the stream ended
    /// inside a fragment, the held-back output is written to `writer` so that messages printed
    /// just before a crash are not lost.
    pub fn finish(mut self, writer: &mut dyn Write) -> io::Result<ExtractedFragment> {
        if let Some(pending) = self.pending.take() {
            tracing::warn!(
                bytes = pending.len(),
                "output ended inside the report, printing the partial report"
            );
            for line in pending.lines_with_terminator() {
                self.write_visible(strip_line_terminator(line), writer)?;
            }
            return Ok(ExtractedFragment::Unterminated);
        }
        Ok(match self.fragment {
            Some(fragment) => ExtractedFragment::Complete(fragment),
            None => ExtractedFragment::NotFound,
        })
    }

    fn write_visible(&self, visible: &[u8], writer: &mut dyn Write) -> io::Result<()> {
        match Severity::classify(visible) {
            Some(severity) => {
                writeln!(writer, "{}", visible.as_bstr().style(severity.style(self.styles)))?
            }
            None => {
                writer.write_all(visible)?;
                writer.write_all(b"\n")?;
            }
        }
        writer.flush()
    }

    fn complete_fragment(&mut self) {
        let Some(fragment) = self.pending.take() else {
            return;
        };
        tracing::debug!(
            line = self.lines,
            bytes = fragment.len(),
            "report fragment ends"
        );
        if self.fragment.replace(fragment).is_some() {
            tracing::warn!("test binary produced more than one report, using the last one");
        }
    }
}

fn strip_line_terminator(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n")
        .map_or(line, |line| line.strip_suffix(b"\r").unwrap_or(line))
}
