#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use cmdrun::config::{CommandSection, ConfigFile, RawConfigFile};
use cmdrun::errors::Result;

/// Builder for `RawConfigFile` / `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                command: CommandSection::default(),
                error_categories: BTreeMap::new(),
            },
        }
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.command.dir = Some(dir.into());
        self
    }

    pub fn env(mut self, entry: &str) -> Self {
        self.config.command.env.push(entry.to_string());
        self
    }

    pub fn shell(mut self, shell: &str) -> Self {
        self.config.command.shell = shell.to_string();
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.config.command.timeout = Some(duration.to_string());
        self
    }

    pub fn category(mut self, label: &str, patterns: &[&str]) -> Self {
        self.config
            .error_categories
            .insert(label.to_string(), patterns.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
