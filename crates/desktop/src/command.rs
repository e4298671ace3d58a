use std::ffi::OsStr;
use std::io::ErrorKind;

use tokio::process::Command;

use crate::error::DesktopError;

/// Runs an external tool to completion and returns its stdout.
pub async fn run_tool<I, S>(tool: &'static str, args: I) -> Result<Vec<u8>, DesktopError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(tool)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => DesktopError::ToolMissing { tool },
            _ => DesktopError::Io(e),
        })?;

    if !output.status.success() {
        return Err(DesktopError::CommandFailed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}
