// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The structured report emitted by test binaries, and a parser for it.
//!
//! The report is an XML document rooted at `TestResult`, containing arbitrarily nested
//! `TestSuite` elements with `TestCase` leaves:
//!
//! ```xml
//! <TestResult>
//!   <TestSuite name="ZoneSuite" test_cases_passed="1" test_cases_failed="1">
//!     <TestCase name="Start" result="passed"/>
//!     <TestCase name="Stop" result="failed"/>
//!   </TestSuite>
//! </TestResult>
//! ```
//!
//! Elements other than these are skipped along with their contents.

use crate::errors::ReportParseError;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{fmt, ops::AddAssign};

static RESULT_TAG: &str = "TestResult";
static SUITE_TAG: &str = "TestSuite";
static CASE_TAG: &str = "TestCase";

static NAME_ATTR: &str = "name";
static RESULT_ATTR: &str = "result";
static PASSED_ATTR: &str = "test_cases_passed";
static FAILED_ATTR: &str = "test_cases_failed";
static SKIPPED_ATTR: &str = "test_cases_skipped";

/// A node in the report tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReportNode {
    /// A test suite.
    Suite(SuiteNode),
    /// A test case.
    Case(CaseNode),
}

impl ReportNode {
    /// Returns the counts of test cases in this subtree.
    pub fn counts(&self) -> CaseCounts {
        match self {
            Self::Suite(suite) => suite.counts,
            Self::Case(case) => CaseCounts::of(case.result),
        }
    }
}

/// A test suite, containing test cases and nested suites.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SuiteNode {
    name: String,
    children: Vec<ReportNode>,
    counts: CaseCounts,
    reported: Option<CaseCounts>,
}

impl SuiteNode {
    fn new(name: String, children: Vec<ReportNode>, reported: Option<CaseCounts>) -> Self {
        let mut counts = CaseCounts::default();
        for child in &children {
            counts += child.counts();
        }
        Self {
            name,
            children,
            counts,
            reported,
        }
    }

    /// The name of the suite. The root of the report is named `TestResult`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The suites and cases in this suite, in report order.
    pub fn children(&self) -> &[ReportNode] {
        &self.children
    }

    /// The counts of test cases in this suite, computed from its children recursively.
    pub fn counts(&self) -> CaseCounts {
        self.counts
    }

    /// The aggregate counts the report carried for this suite, if any.
    pub fn reported_counts(&self) -> Option<CaseCounts> {
        self.reported
    }

    /// Returns every test case that did not pass, in pre-order.
    pub fn failing_cases(&self) -> Vec<FailingCase> {
        let mut out = Vec::new();
        self.collect_failing(&mut out);
        out
    }

    fn collect_failing(&self, out: &mut Vec<FailingCase>) {
        for child in &self.children {
            match child {
                ReportNode::Suite(suite) => suite.collect_failing(out),
                ReportNode::Case(case) if case.result != CaseResult::Passed => {
                    out.push(FailingCase {
                        suite: case.suite.clone(),
                        case: case.name.clone(),
                    });
                }
                ReportNode::Case(_) => {}
            }
        }
    }
}

/// A single test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaseNode {
    name: String,
    result: CaseResult,
    suite: String,
}

impl CaseNode {
    /// The name of the test case.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The result of the test case.
    pub fn result(&self) -> CaseResult {
        self.result
    }

    /// The name of the nearest suite containing this case.
    pub fn suite(&self) -> &str {
        &self.suite
    }
}

/// The result of a single test case.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaseResult {
    /// The test case passed.
    Passed,
    /// The test case failed.
    Failed,
    /// The test case was skipped.
    Skipped,
    /// The test case was aborted. Counted as a failure.
    Aborted,
}

impl CaseResult {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }

    /// Returns the result as it appears in the report.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts of test cases by result.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CaseCounts {
    /// The number of cases that passed.
    pub passed: usize,
    /// The number of cases that failed or were aborted.
    pub failed: usize,
    /// The number of cases that were skipped.
    pub skipped: usize,
}

impl CaseCounts {
    fn of(result: CaseResult) -> Self {
        let mut counts = Self::default();
        match result {
            CaseResult::Passed => counts.passed = 1,
            CaseResult::Failed | CaseResult::Aborted => counts.failed = 1,
            CaseResult::Skipped => counts.skipped = 1,
        }
        counts
    }

    /// The total number of cases.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

impl AddAssign for CaseCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.passed += rhs.passed;
        self.failed += rhs.failed;
        self.skipped += rhs.skipped;
    }
}

/// A test case that did not pass, identified by its nearest suite.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailingCase {
    /// The name of the nearest suite containing the case.
    pub suite: String,
    /// The name of the case.
    pub case: String,
}

impl fmt::Display for FailingCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.suite, self.case)
    }
}

/// Parses an extracted report fragment into a tree rooted at the `TestResult` element.
pub fn parse_report(fragment: &[u8]) -> Result<SuiteNode, ReportParseError> {
    let text = std::str::from_utf8(fragment)?;
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|error| ReportParseError::xml(reader.buffer_position(), error))?;
        match event {
            Event::Start(start) => {
                let element = open_element(&start, &stack, root.is_some())?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&start, &stack, root.is_some())?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                // quick-xml checks that end tags match start tags.
                if let Some(element) = stack.pop() {
                    close_element(element, &mut stack, &mut root);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ReportParseError::Unclosed {
            element: open.tag_name(),
        });
    }
    root.ok_or(ReportParseError::Empty)
}

#[derive(Debug)]
enum OpenElement {
    Root(Vec<ReportNode>),
    Suite {
        name: String,
        reported: Option<CaseCounts>,
        children: Vec<ReportNode>,
    },
    Case(CaseNode),
    Skipped(String),
}

impl OpenElement {
    fn tag_name(&self) -> String {
        match self {
            Self::Root(_) => RESULT_TAG.to_owned(),
            Self::Suite { .. } => SUITE_TAG.to_owned(),
            Self::Case(_) => CASE_TAG.to_owned(),
            Self::Skipped(name) => name.clone(),
        }
    }
}

fn open_element(
    start: &BytesStart<'_>,
    stack: &[OpenElement],
    seen_root: bool,
) -> Result<OpenElement, ReportParseError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let parent_suite = match stack.last() {
        None => {
            if tag != RESULT_TAG || seen_root {
                return Err(ReportParseError::UnexpectedRoot {
                    expected: RESULT_TAG,
                    found: tag,
                });
            }
            return Ok(OpenElement::Root(Vec::new()));
        }
        Some(OpenElement::Root(_)) => None,
        Some(OpenElement::Suite { name, .. }) => Some(name.as_str()),
        Some(OpenElement::Case(_) | OpenElement::Skipped(_)) => {
            return Ok(OpenElement::Skipped(tag));
        }
    };

    if tag == SUITE_TAG {
        let name = required_attr(start, SUITE_TAG, NAME_ATTR)?;
        let reported = reported_counts(start, &name)?;
        Ok(OpenElement::Suite {
            name,
            reported,
            children: Vec::new(),
        })
    } else if tag == CASE_TAG {
        let name = required_attr(start, CASE_TAG, NAME_ATTR)?;
        let Some(suite) = parent_suite else {
            return Err(ReportParseError::CaseOutsideSuite { case: name });
        };
        let result = required_attr(start, CASE_TAG, RESULT_ATTR)?;
        let result = CaseResult::parse(&result).ok_or_else(|| ReportParseError::UnknownResult {
            case: name.clone(),
            result,
        })?;
        Ok(OpenElement::Case(CaseNode {
            name,
            result,
            suite: suite.to_owned(),
        }))
    } else {
        tracing::debug!(element = %tag, "skipping unknown element in report");
        Ok(OpenElement::Skipped(tag))
    }
}

fn close_element(
    element: OpenElement,
    stack: &mut [OpenElement],
    root: &mut Option<SuiteNode>,
) {
    let node = match element {
        OpenElement::Root(children) => {
            *root = Some(SuiteNode::new(RESULT_TAG.to_owned(), children, None));
            return;
        }
        OpenElement::Suite {
            name,
            reported,
            children,
        } => {
            let suite = SuiteNode::new(name, children, reported);
            if let Some(reported) = suite.reported {
                if reported != suite.counts {
                    tracing::warn!(
                        suite = %suite.name,
                        ?reported,
                        computed = ?suite.counts,
                        "report counts for suite do not match its test cases"
                    );
                }
            }
            ReportNode::Suite(suite)
        }
        OpenElement::Case(case) => ReportNode::Case(case),
        OpenElement::Skipped(_) => return,
    };

    match stack.last_mut() {
        Some(OpenElement::Root(children) | OpenElement::Suite { children, .. }) => {
            children.push(node);
        }
        // Suites and cases are only opened directly under the root or a suite.
        Some(OpenElement::Case(_) | OpenElement::Skipped(_)) | None => {}
    }
}

fn find_attr(
    start: &BytesStart<'_>,
    attribute: &'static str,
) -> Result<Option<String>, ReportParseError> {
    for attr in start.attributes() {
        let attr = attr.map_err(|error| ReportParseError::xml(0, error))?;
        if attr.key.as_ref() == attribute.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|error| ReportParseError::xml(0, error))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required_attr(
    start: &BytesStart<'_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<String, ReportParseError> {
    find_attr(start, attribute)?.ok_or(ReportParseError::MissingAttribute { element, attribute })
}

fn reported_counts(
    start: &BytesStart<'_>,
    suite: &str,
) -> Result<Option<CaseCounts>, ReportParseError> {
    let parse_count = |attribute: &'static str| -> Result<Option<usize>, ReportParseError> {
        find_attr(start, attribute)?
            .map(|value| {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ReportParseError::InvalidCount {
                        suite: suite.to_owned(),
                        attribute,
                        value,
                    })
            })
            .transpose()
    };

    let passed = parse_count(PASSED_ATTR)?;
    let failed = parse_count(FAILED_ATTR)?;
    let skipped = parse_count(SKIPPED_ATTR)?;
    if passed.is_none() && failed.is_none() && skipped.is_none() {
        return Ok(None);
    }
    Ok(Some(CaseCounts {
        passed: passed.unwrap_or(0),
        failed: failed.unwrap_or(0),
        skipped: skipped.unwrap_or(0),
    }))
}
