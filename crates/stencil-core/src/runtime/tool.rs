//! External tool probing
//!
//! Answers two questions about a CLI tool: is it on PATH, and what version
//! does it report. Probing never fails the process by itself.

use anyhow::{Context, Result};
use std::process::Command;

/// Static description of an external tool.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Name of the tool binary (e.g., "git")
    pub name: &'static str,
    /// Display name for user-facing messages
    pub display_name: &'static str,
    /// URL to the installation documentation
    pub docs_url: &'static str,
}

pub struct ToolProbe {
    config: ToolConfig,
}

impl ToolProbe {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Check if the tool is installed and available in PATH.
    pub fn is_installed(&self) -> bool {
        Command::new("which")
            .arg(self.config.name)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// The installed tool's `--version` output, first line, trimmed.
    pub fn version(&self) -> Option<String> {
        Command::new(self.config.name)
            .arg("--version")
            .output()
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .and_then(|stdout| first_line(&stdout))
    }

    /// Open the tool's installation docs in the user's browser.
    pub fn open_docs(&self) -> Result<()> {
        open::that(self.config.docs_url)
            .with_context(|| format!("Failed to open {}", self.config.docs_url))
    }
}

fn first_line(output: &str) -> Option<String> {
    let line = output.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Probe for git, the only tool this CLI cares about.
pub fn git_tool() -> ToolProbe {
    ToolProbe::new(ToolConfig {
        name: "git",
        display_name: "git",
        docs_url: "https://git-scm.com/downloads",
    })
}
