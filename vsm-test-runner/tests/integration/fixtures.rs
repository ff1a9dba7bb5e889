// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::Result;
use std::{
    os::unix::fs::PermissionsExt,
    sync::{Mutex, MutexGuard},
};
use vsm_test_runner::{
    config::LauncherConfig,
    errors::SupervisorError,
    supervisor::{RunOutcome, SupervisorBuilder},
};

// Executing a script while another thread has just forked with the script still open for writing
// fails with ETXTBSY. Tests hold this lock while writing and running scripts.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn spawn_lock() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A shell script standing in for a test binary.
pub(crate) struct FakeBinary {
    // Keeps the directory alive.
    _dir: Utf8TempDir,
    path: Utf8PathBuf,
}

impl FakeBinary {
    pub(crate) fn new(body: &str) -> Result<Self> {
        let dir = Utf8TempDir::new()?;
        let path = dir.path().join("unit-tests");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        Ok(Self { _dir: dir, path })
    }

    pub(crate) fn path(&self) -> &str {
        self.path.as_str()
    }
}

/// A fragment with one passing and one failing case.
pub(crate) static PASS_FAIL_REPORT: &str = concat!(
    r#"<TestResult><TestSuite name="ZoneSuite" test_cases_passed="1" test_cases_failed="1" test_cases_skipped="0">"#,
    r#"<TestCase name="Start" result="passed"/><TestCase name="Stop" result="failed"/>"#,
    r#"</TestSuite></TestResult>"#,
);

/// Runs the supervisor, returning the outcome and everything written to the console.
pub(crate) fn run(
    builder: &SupervisorBuilder,
    config: &LauncherConfig,
) -> Result<(RunOutcome, String), SupervisorError> {
    let supervisor = builder.build(config);
    let mut out = Vec::new();
    let outcome = supervisor.run(&mut out)?;
    Ok((outcome, String::from_utf8_lossy(&out).into_owned()))
}
