// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result},
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::Utf8PathBuf;
use clap::{ArgGroup, Parser};
use std::io::Write;
use vsm_test_runner::{
    config::{self, LauncherConfig},
    supervisor::SupervisorBuilder,
    wrapper::{DEBUGGER_ENV, WrapperSpec},
};

/// Launch a vasum unit-test binary and summarize its results.
///
/// Output of the test binary is colored by severity as it arrives. After the binary exits, the
/// launcher prints a summary of every suite and the commands that re-run each failing case.
#[derive(Debug, Parser)]
#[command(
    name = "vsm-launch-test",
    version,
    styles = clap_styles::style(),
    max_term_width = 100,
    group(ArgGroup::new("wrapper").args(["valgrind", "gdb"]))
)]
pub struct LaunchTestApp {
    /// Run the test binary under the memory checker
    #[arg(long, help_heading = "Wrapper options")]
    valgrind: bool,

    /// Run the test binary under a debugger, with report extraction turned off
    #[arg(long, help_heading = "Wrapper options")]
    gdb: bool,

    /// Debugger command used by --gdb [default: gdb --args]
    #[arg(
        long,
        value_name = "COMMAND",
        env = DEBUGGER_ENV,
        help_heading = "Wrapper options"
    )]
    debugger: Option<String>,

    /// Extra argument passed to the wrapper tool, placed before the test binary
    #[arg(
        long = "tool-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        requires = "wrapper",
        help_heading = "Wrapper options"
    )]
    tool_args: Vec<String>,

    /// Launcher config file [default: .config/vsm-launch.toml in the current directory]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputOpts,

    /// The test binary to launch, followed by its arguments
    ///
    /// Everything after the binary is passed through to it, including a `--` separator.
    #[arg(
        value_name = "BINARY",
        required = true,
        num_args = 1..,
        trailing_var_arg = true
    )]
    command: Vec<String>,
}

impl LaunchTestApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code of the test binary, or the code for its terminating signal.
    pub fn exec(self, output: OutputContext, writer: &mut dyn Write) -> Result<i32> {
        let current_dir = config::current_dir()
            .map_err(|error| ExpectedError::CurrentDirInvalid { error })?;
        let config = LauncherConfig::from_sources(&current_dir, self.config_file.as_deref())?;

        let wrapper = self.wrapper(&config)?;
        let mut command = self.command.into_iter();
        let binary = command.next().unwrap_or_default();
        let mut builder = SupervisorBuilder::new(binary, command);
        builder
            .set_wrapper(wrapper)
            .set_colorize(output.colorize_stdout());
        let supervisor = builder.build(&config);
        tracing::debug!(
            "launching with report extraction {}",
            if supervisor.extracts_report() {
                "enabled"
            } else {
                "disabled"
            }
        );

        let outcome = supervisor.run(writer)?;
        Ok(outcome.exit_code())
    }

    fn wrapper(&self, config: &LauncherConfig) -> Result<Option<WrapperSpec>> {
        let wrapper = if self.valgrind {
            WrapperSpec::memcheck(config)?
        } else if self.gdb {
            // An empty variable means the configured debugger.
            let debugger = self
                .debugger
                .as_deref()
                .filter(|value| !value.trim().is_empty());
            WrapperSpec::debugger(config, debugger)?
        } else {
            return Ok(None);
        };
        Ok(Some(wrapper.with_extra_args(self.tool_args.iter().cloned())))
    }
}
