// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the launcher.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

/// Overall launcher configuration.
///
/// Consists of the built-in defaults with an optional repository-specific file layered on top.
#[derive(Clone, Debug)]
pub struct LauncherConfig {
    inner: LauncherConfigImpl,
}

impl LauncherConfig {
    /// The default location of the config within a directory: `.config/vsm-launch.toml`.
    pub const CONFIG_PATH: &'static str = ".config/vsm-launch.toml";

    /// Contains the default config as a TOML file.
    ///
    /// The default settings included with this copy of vsm-test-runner are:
    ///
    /// ```toml
    #[doc = include_str!("../default-config.toml")]
    /// ```
    ///
    /// Custom configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the launcher config from the given file, or if not specified from
    /// `.config/vsm-launch.toml` in the given directory.
    ///
    /// An explicitly specified file must exist. If no file is specified and the directory has no
    /// `.config/vsm-launch.toml`, only the default config is used.
    pub fn from_sources(
        base_dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = base_dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let inner = Self::build_and_deserialize(builder, &config_file)?;
        tracing::debug!(%config_file, "read launcher config");
        Ok(Self { inner })
    }

    /// Returns the default config, without any custom configuration layered on top.
    pub fn default_config() -> Self {
        let inner = Self::build_and_deserialize(
            Self::make_default_config(),
            Utf8Path::new("<default config>"),
        )
        .expect("default config is always valid");
        Self { inner }
    }

    /// Returns the command printed in replay and debugger suggestions.
    pub fn replay_command(&self) -> &str {
        &self.inner.launcher.replay_command
    }

    /// Returns the column width test case names are padded to in the summary.
    pub fn case_column_width(&self) -> usize {
        self.inner.launcher.case_column_width
    }

    /// Returns the marker that begins the embedded report.
    pub fn begin_marker(&self) -> &str {
        &self.inner.report.begin_marker
    }

    /// Returns the marker that ends the embedded report.
    pub fn end_marker(&self) -> &str {
        &self.inner.report.end_marker
    }

    /// Returns the arguments that make the test binary emit the embedded report.
    pub fn format_args(&self) -> &[String] {
        &self.inner.report.format_args
    }

    /// Returns the arguments passed to the test binary on every run.
    pub fn common_args(&self) -> &[String] {
        &self.inner.report.common_args
    }

    /// Returns the memory checker command.
    pub fn memcheck_command(&self) -> &[String] {
        &self.inner.wrappers.memcheck
    }

    /// Returns the debugger command.
    pub fn debugger_command(&self) -> &[String] {
        &self.inner.wrappers.debugger
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize(
        builder: ConfigBuilder<DefaultState>,
        config_file: &Utf8Path,
    ) -> Result<LauncherConfigImpl, ConfigParseError> {
        let build_error = |error| {
            ConfigParseError::new(
                config_file,
                ConfigParseErrorKind::BuildError(Box::new(error)),
            )
        };
        let inner: LauncherConfigImpl = builder
            .build()
            .map_err(build_error)?
            .try_deserialize()
            .map_err(build_error)?;
        inner
            .validate()
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;
        Ok(inner)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LauncherConfigImpl {
    launcher: LauncherSection,
    report: ReportSection,
    wrappers: WrapperSection,
}

impl LauncherConfigImpl {
    fn validate(&self) -> Result<(), ConfigParseErrorKind> {
        if self.launcher.case_column_width == 0 {
            return Err(ConfigParseErrorKind::ZeroColumnWidth);
        }
        if self.report.begin_marker.is_empty() {
            return Err(ConfigParseErrorKind::EmptyMarker {
                key: "begin-marker",
            });
        }
        if self.report.end_marker.is_empty() {
            return Err(ConfigParseErrorKind::EmptyMarker { key: "end-marker" });
        }
        if self.wrappers.memcheck.is_empty() {
            return Err(ConfigParseErrorKind::EmptyWrapper { key: "memcheck" });
        }
        if self.wrappers.debugger.is_empty() {
            return Err(ConfigParseErrorKind::EmptyWrapper { key: "debugger" });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LauncherSection {
    replay_command: String,
    case_column_width: usize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReportSection {
    begin_marker: String,
    end_marker: String,
    format_args: Vec<String>,
    common_args: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct WrapperSection {
    memcheck: Vec<String>,
    debugger: Vec<String>,
}

/// Returns the current directory as a UTF-8 path, for use as the base directory of
/// [`LauncherConfig::from_sources`].
pub fn current_dir() -> std::io::Result<Utf8PathBuf> {
    let dir = std::env::current_dir()?;
    Utf8PathBuf::from_path_buf(dir).map_err(|dir| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("current directory `{}` is not valid UTF-8", dir.display()),
        )
    })
}
