// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::{Command, ErrorCategoryMapping};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [command]
/// dir = "build"
/// env = ["DEBUG=true"]
/// shell = "/bin/bash"
/// timeout = "10m"
///
/// [error_categories]
/// config = ["bad config", "configuration error"]
/// build = ["build failed"]
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub command: CommandSection,

    /// Category label -> substring patterns.
    ///
    /// Categories are tried in label order.
    #[serde(default)]
    pub error_categories: BTreeMap<String, Vec<String>>,
}

/// `[command]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSection {
    /// Working directory for the child; relative paths are resolved by the
    /// OS against the current directory at launch.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// `KEY=VALUE` overrides appended to the inherited environment.
    #[serde(default)]
    pub env: Vec<String>,

    /// Shell used by `cmdrun shell` when none is given on the command line.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Duration string such as `"30s"` or `"10m"`.
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_shell() -> String {
    "/bin/sh".to_string()
}

impl Default for CommandSection {
    fn default() -> Self {
        Self {
            dir: None,
            env: Vec::new(),
            shell: default_shell(),
            timeout: None,
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, see
/// [`validate`](crate::config::validate).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    dir: Option<PathBuf>,
    env: Vec<String>,
    shell: String,
    timeout: Option<Duration>,
    error_categories: BTreeMap<String, Vec<String>>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        command: CommandSection,
        timeout: Option<Duration>,
        error_categories: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            dir: command.dir,
            env: command.env,
            shell: command.shell,
            timeout,
            error_categories,
        }
    }

    pub fn dir(&self) -> Option<&PathBuf> {
        self.dir.as_ref()
    }

    pub fn env(&self) -> &[String] {
        &self.env
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn error_categories(&self) -> &BTreeMap<String, Vec<String>> {
        &self.error_categories
    }

    /// Build a [`Command`] configured from this file.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new();
        self.apply_to(&mut cmd);
        cmd
    }

    /// Apply working directory, environment, timeout and error categories.
    pub fn apply_to(&self, cmd: &mut Command) {
        if let Some(dir) = &self.dir {
            cmd.set_dir(dir.clone());
        }
        cmd.set_env(self.env.clone());
        cmd.set_timeout(self.timeout);
        cmd.set_error_category_mapping(ErrorCategoryMapping::from(
            self.error_categories.clone(),
        ));
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(CommandSection::default(), None, BTreeMap::new())
    }
}
