// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use vsm_test_metadata::VsmExitCode;
use vsm_test_runner::{
    TerminationStatus,
    config::LauncherConfig,
    errors::SupervisorError,
    supervisor::{ReportStatus, SupervisorBuilder},
};

#[test]
fn test_pass_and_fail() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new(&format!(
        "echo 'Running 2 test cases...'\n\
         echo '[INFO] zone started'\n\
         echo 'unit.cpp(12): error: in \"ZoneSuite/Stop\": check failed'\n\
         echo '{PASS_FAIL_REPORT}'\n\
         exit 0"
    ))?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), ["--color"]), &config)?;

    assert_eq!(outcome.termination(), TerminationStatus::Exited(0));
    assert_eq!(outcome.exit_code(), 0);
    let failing: Vec<_> = outcome
        .failing_cases()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(failing, ["ZoneSuite/Stop"]);

    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines[0], format!("Starting {} ...", binary.path()));
    assert_eq!(
        lines[1],
        format!(
            "Invoking `{} --color --report_format=XML --catch_system_errors=no \
             --log_level=test_suite --report_level=detailed`",
            binary.path()
        )
    );
    assert_eq!(lines[2], "Running 2 test cases...");
    assert_eq!(lines[3], "[INFO] zone started");
    ensure!(!out.contains("<TestResult>"), "report was not extracted:\n{out}");
    ensure!(out.contains("=========== SUMMARY ==========="), "{out}");
    ensure!(out.contains("ZoneSuite results:\n"), "{out}");
    ensure!(
        out.contains(&format!("    {:<50}passed\n", "Start")),
        "{out}"
    );
    ensure!(
        out.contains(&format!("    {:<50}failed\n", "Stop")),
        "{out}"
    );
    ensure!(
        out.contains(&format!(
            "Some tests failed. Use following command(s) to launch them explicitly:\n    \
             vsm-launch-test {} -t ZoneSuite/Stop\n",
            binary.path()
        )),
        "{out}"
    );
    assert_eq!(
        lines.last().copied(),
        Some(format!("{} finished.", binary.path()).as_str())
    );
    Ok(())
}

#[test]
fn test_exit_code_is_propagated() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new(
        "echo '<TestResult><TestSuite name=\"S\"><TestCase name=\"c\" result=\"passed\"/></TestSuite></TestResult>'\n\
         exit 4",
    )?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), Vec::<String>::new()), &config)?;

    assert_eq!(outcome.exit_code(), 4);
    assert!(matches!(outcome.report_status(), ReportStatus::Parsed(_)));
    ensure!(outcome.failing_cases().is_empty(), "no failing cases");
    ensure!(!out.contains("Some tests failed"), "{out}");
    Ok(())
}

#[test]
fn test_segv_before_report() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new("echo '[INFO] about to crash'\nkill -s SEGV $$")?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), ["-t", "ZoneSuite"]), &config)?;

    assert_eq!(outcome.termination(), TerminationStatus::Signaled(11));
    assert_eq!(outcome.exit_code(), VsmExitCode::TEST_BINARY_SIGNALED);
    assert!(matches!(
        outcome.report_status(),
        ReportStatus::AbandonedBySignal
    ));
    ensure!(!out.contains("SUMMARY"), "{out}");
    ensure!(out.contains("=========== FAILED ==========="), "{out}");
    ensure!(
        out.contains("Terminated by SIGSEGV (segmentation fault)\n"),
        "{out}"
    );
    ensure!(
        out.contains(&format!(
            "Use following command to launch debugger:\n    vsm-launch-test --gdb {} -t ZoneSuite\n",
            binary.path()
        )),
        "{out}"
    );
    Ok(())
}

#[test]
fn test_signal_during_report() -> Result<()> {
    let _guard = spawn_lock();
    // The complete report is discarded too: a binary killed by a signal isn't trusted.
    let binary = FakeBinary::new(&format!("echo '{PASS_FAIL_REPORT}'\nkill -s TERM $$"))?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), Vec::<String>::new()), &config)?;

    assert_eq!(outcome.termination(), TerminationStatus::Signaled(15));
    ensure!(outcome.failing_cases().is_empty(), "report is not used");
    ensure!(!out.contains("SUMMARY"), "{out}");
    ensure!(out.contains("Terminated by SIGTERM (terminated)\n"), "{out}");
    ensure!(!out.contains("--gdb"), "{out}");
    Ok(())
}

#[test]
fn test_unterminated_report() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new(
        "echo 'before'\nprintf '<TestResult><TestSuite name=\"S\">\\n'\necho 'inside'\nexit 1",
    )?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), Vec::<String>::new()), &config)?;

    assert_eq!(outcome.exit_code(), 1);
    assert!(matches!(
        outcome.report_status(),
        ReportStatus::NoReportProduced
    ));
    ensure!(out.contains("before\n"), "{out}");
    // Output held back after the begin marker is printed once the stream ends.
    ensure!(out.contains("inside\n"), "{out}");
    ensure!(
        out.find("inside").expect("checked above")
            < out.find("did not produce a report").expect("checked below"),
        "{out}"
    );
    ensure!(!out.contains("SUMMARY"), "{out}");
    ensure!(
        out.contains("test binary did not produce a report\n"),
        "{out}"
    );
    Ok(())
}

#[test]
fn test_crash_inside_report_keeps_output() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new(
        "printf '<TestResult><TestSuite name=\"S\">\\n'\necho '[ERROR] dying'\nkill -s SEGV $$",
    )?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), Vec::<String>::new()), &config)?;

    assert_eq!(outcome.termination(), TerminationStatus::Signaled(11));
    ensure!(out.contains("[ERROR] dying\n"), "{out}");
    ensure!(
        out.contains("Terminated by SIGSEGV (segmentation fault)\n"),
        "{out}"
    );
    Ok(())
}

#[test]
fn test_malformed_report() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new(
        "echo '<TestResult><TestCase name=\"c\" result=\"passed\"/></TestResult>'",
    )?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), Vec::<String>::new()), &config)?;

    assert_eq!(outcome.exit_code(), 0);
    assert!(matches!(outcome.report_status(), ReportStatus::Malformed(_)));
    ensure!(
        out.contains(
            "test binary produced a malformed report: test case `c` is not inside a test suite\n"
        ),
        "{out}"
    );
    Ok(())
}

#[test]
fn test_output_after_exit_is_read() -> Result<()> {
    let _guard = spawn_lock();
    // Enough output to fill the pipe several times over before the report arrives.
    let binary = FakeBinary::new(&format!(
        "i=0\n\
         while [ $i -lt 2000 ]; do echo \"[DEBUG] line $i\"; i=$((i+1)); done\n\
         echo '{PASS_FAIL_REPORT}'"
    ))?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), Vec::<String>::new()), &config)?;

    ensure!(out.contains("[DEBUG] line 0\n"), "first line missing");
    ensure!(out.contains("[DEBUG] line 1999\n"), "last line missing");
    assert!(matches!(outcome.report_status(), ReportStatus::Parsed(_)));
    assert_eq!(outcome.failing_cases().len(), 1);
    Ok(())
}

#[test]
fn test_stderr_and_missing_newline() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new("echo '[ERROR] from stderr' >&2\nprintf 'no newline at end'")?;
    let config = LauncherConfig::default_config();
    let (outcome, out) = run(&SupervisorBuilder::new(binary.path(), Vec::<String>::new()), &config)?;

    ensure!(out.contains("[ERROR] from stderr\n"), "{out}");
    ensure!(out.contains("no newline at end\n"), "{out}");
    assert!(matches!(
        outcome.report_status(),
        ReportStatus::NoReportProduced
    ));
    Ok(())
}

#[test]
fn test_binary_not_found() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let missing = dir.path().join("missing-unit-tests");
    let config = LauncherConfig::default_config();

    let error = run(
        &SupervisorBuilder::new(missing.as_str(), Vec::<String>::new()),
        &config,
    )
    .expect_err("binary does not exist");
    match error {
        SupervisorError::BinaryNotFound {
            binary, is_wrapper, ..
        } => {
            assert_eq!(binary, missing.as_str());
            assert!(!is_wrapper);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn test_binary_not_executable() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let path = dir.path().join("not-executable");
    std::fs::write(&path, "#!/bin/sh\nexit 0\n")?;
    let config = LauncherConfig::default_config();

    let error = run(
        &SupervisorBuilder::new(path.as_str(), Vec::<String>::new()),
        &config,
    )
    .expect_err("binary is not executable");
    assert!(matches!(error, SupervisorError::BinaryNotFound { .. }));
    Ok(())
}

#[test]
fn test_configured_replay_command() -> Result<()> {
    let _guard = spawn_lock();
    let config_dir = Utf8TempDir::new()?;
    let config_file = config_dir.path().join("launch.toml");
    std::fs::write(
        &config_file,
        "[launcher]\nreplay-command = \"vsm_launch_test.py\"\ncase-column-width = 10\n",
    )?;
    let config = LauncherConfig::from_sources(config_dir.path(), Some(&config_file))?;

    let binary = FakeBinary::new(&format!("echo '{PASS_FAIL_REPORT}'"))?;
    let (_, out) = run(&SupervisorBuilder::new(binary.path(), Vec::<String>::new()), &config)?;
    ensure!(
        out.contains(&format!("    vsm_launch_test.py {} -t ZoneSuite/Stop\n", binary.path())),
        "{out}"
    );
    ensure!(out.contains("    Start     passed\n"), "{out}");
    Ok(())
}
