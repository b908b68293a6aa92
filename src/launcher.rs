//! External program launching
//!
//! Narrow collaborator seam for the Program action family and the
//! open-browser built-in. The resolver only sees the trait; failures come
//! back as plain errors it reduces to log lines.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::info;

/// Launches an external executable or shortcut by path.
pub trait ProgramLauncher {
    fn launch(&self, path: &Path) -> Result<()>;
}

/// Spawns the target as a detached child process.
pub struct SystemLauncher;

impl ProgramLauncher for SystemLauncher {
    fn launch(&self, path: &Path) -> Result<()> {
        let child = Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch '{}'", path.display()))?;
        info!(path = %path.display(), pid = child.id(), "Launched program");
        Ok(())
    }
}

/// Open a URL in the default browser
pub fn open_browser(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| format!("Failed to open browser at {url}"))?;
    info!(url = %url, "Opened browser");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launching_missing_executable_fails_cleanly() {
        let result = SystemLauncher.launch(Path::new("/nonexistent/deckpad-test-binary"));
        assert!(result.is_err());
    }
}
