// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use vsm_test_runner::{
    config::LauncherConfig,
    errors::SupervisorError,
    supervisor::{ReportStatus, SupervisorBuilder},
    wrapper::{WrapperKind, WrapperSpec},
};

#[test]
fn test_custom_wrapper_keeps_extraction() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new(&format!("echo \"args: $*\"\necho '{PASS_FAIL_REPORT}'"))?;
    let config = LauncherConfig::default_config();
    // `env` runs its arguments as a command, which makes it a transparent wrapper.
    let wrapper = WrapperSpec::new(WrapperKind::Custom, ["env"])?.with_extra_args(["VSM_WRAPPED=1"]);

    let mut builder = SupervisorBuilder::new(binary.path(), ["-t", "ZoneSuite"]);
    builder.set_wrapper(Some(wrapper));
    let (outcome, out) = run(&builder, &config)?;

    ensure!(
        out.contains(&format!(
            "Invoking `env VSM_WRAPPED=1 {} -t ZoneSuite --report_format=XML",
            binary.path()
        )),
        "{out}"
    );
    ensure!(
        out.contains(
            "args: -t ZoneSuite --report_format=XML --catch_system_errors=no \
             --log_level=test_suite --report_level=detailed\n"
        ),
        "{out}"
    );
    assert!(matches!(outcome.report_status(), ReportStatus::Parsed(_)));
    // Replay commands name the test binary, not the wrapper.
    ensure!(
        out.contains(&format!("    vsm-launch-test {} -t ZoneSuite/Stop\n", binary.path())),
        "{out}"
    );
    Ok(())
}

#[test]
fn test_debugger_wrapper_passes_through() -> Result<()> {
    let _guard = spawn_lock();
    // Exits with 9 if it was asked for the report, which a debugger run must not do.
    let binary = FakeBinary::new(
        "for arg in \"$@\"; do\n\
         \x20   if [ \"$arg\" = \"--report_format=XML\" ]; then exit 9; fi\n\
         done\n\
         exit 3",
    )?;
    let config = LauncherConfig::default_config();
    let debugger = WrapperSpec::debugger(&config, Some("env"))?;

    let mut builder = SupervisorBuilder::new(binary.path(), Vec::<String>::new());
    builder.set_wrapper(Some(debugger));
    let (outcome, out) = run(&builder, &config)?;

    assert_eq!(outcome.exit_code(), 3);
    assert!(matches!(outcome.report_status(), ReportStatus::NotRequested));
    ensure!(
        out.contains(&format!(
            "Invoking `env {} --catch_system_errors=no --log_level=test_suite --report_level=detailed`\n",
            binary.path()
        )),
        "{out}"
    );
    ensure!(!out.contains("did not produce a report"), "{out}");
    Ok(())
}

#[test]
fn test_wrapper_not_found() -> Result<()> {
    let _guard = spawn_lock();
    let binary = FakeBinary::new("exit 0")?;
    let config = LauncherConfig::default_config();
    let wrapper = WrapperSpec::new(WrapperKind::MemoryChecker, ["vsm-no-such-memory-checker"])?;

    let mut builder = SupervisorBuilder::new(binary.path(), Vec::<String>::new());
    builder.set_wrapper(Some(wrapper));
    let supervisor = builder.build(&config);
    let mut out = Vec::new();
    let error = supervisor
        .run(&mut out)
        .expect_err("wrapper does not exist");

    match error {
        SupervisorError::BinaryNotFound {
            binary, is_wrapper, ..
        } => {
            assert_eq!(binary, "vsm-no-such-memory-checker");
            assert!(is_wrapper);
        }
        other => panic!("unexpected error: {other}"),
    }
    ensure!(out.is_empty(), "nothing is printed or spawned");
    Ok(())
}

#[test]
fn test_missing_binary_checked_before_wrapper() -> Result<()> {
    let config = LauncherConfig::default_config();
    let wrapper = WrapperSpec::new(WrapperKind::MemoryChecker, ["vsm-no-such-memory-checker"])?;

    let mut builder = SupervisorBuilder::new("./vsm-no-such-unit-tests", Vec::<String>::new());
    builder.set_wrapper(Some(wrapper));
    let error = run(&builder, &config).expect_err("neither exists");
    assert!(matches!(
        error,
        SupervisorError::BinaryNotFound {
            is_wrapper: false,
            ..
        }
    ));
    Ok(())
}
