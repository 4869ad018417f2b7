//! Vendor installer invocation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{info, warn};

use crate::config::InstallerConfig;

/// Command line for a downloaded BIOS package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl InstallerCommand {
    pub fn new(program: &Path, silent: bool, auto_restart: bool) -> Self {
        let mut args = Vec::new();
        if silent {
            args.push("/s".to_string());
        }
        if auto_restart {
            args.push("/r".to_string());
        }
        Self {
            program: program.to_path_buf(),
            args,
        }
    }

    pub fn from_config(program: &Path, config: &InstallerConfig) -> Self {
        Self::new(program, config.silent, config.auto_restart)
    }

    /// Command that actually gets spawned
    ///
    /// On Windows the package is started through `Start-Process -Verb RunAs`
    /// so that it runs elevated.
    fn build(&self) -> Command {
        if cfg!(windows) {
            let mut script = format!(
                "Start-Process -FilePath '{}' -Verb RunAs",
                self.program.display().to_string().replace('\'', "''")
            );
            if !self.args.is_empty() {
                script.push_str(&format!(" -ArgumentList '{}'", self.args.join(" ")));
            }
            let mut cmd = Command::new("powershell.exe");
            cmd.args(["-NoProfile", "-NonInteractive", "-Command", &script]);
            cmd
        } else {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args);
            cmd
        }
    }

    /// Launch the installer without waiting for it to finish
    pub fn launch(&self) -> Result<()> {
        if !cfg!(windows) {
            warn!("BIOS packages are Windows executables; launching directly");
        }
        let child = self
            .build()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.program.display()))?;
        info!(pid = child.id(), program = %self.program.display(), "Installer launched");
        Ok(())
    }
}

impl std::fmt::Display for InstallerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
