use std::process::{Command, Stdio};

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use crate::error::DesktopError;

/// Basename of the first token of an application command line.
///
/// `"/usr/bin/xterm -T bp"` → `xterm`, `C:\Apps\bp.exe` → `bp.exe`.
pub fn process_name_from_command(command_line: &str) -> Option<String> {
    let executable = command_line.split_whitespace().next()?;
    executable
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Whether any process has exactly this name, ignoring case.
pub fn is_process_running(process_name: &str) -> bool {
    let mut sys = System::new_with_specifics(RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing()));
    sys.refresh_processes(ProcessesToUpdate::All, true);
    let names = sys.processes().values().map(|p| p.name().to_string_lossy().into_owned());
    contains_process(names, process_name)
}

fn contains_process<I: IntoIterator<Item = String>>(names: I, wanted: &str) -> bool {
    names.into_iter().any(|name| name.eq_ignore_ascii_case(wanted))
}

/// Starts the application detached and returns its pid.
///
/// Arguments are split on whitespace; quoting is not interpreted.
pub fn launch(command_line: &str) -> Result<u32, DesktopError> {
    let mut parts = command_line.split_whitespace();
    let program = parts.next().ok_or(DesktopError::EmptyCommand)?;

    let child = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| DesktopError::Launch { command: command_line.to_string(), source })?;

    let pid = child.id();
    tracing::info!(command = %command_line, pid, "Launched application");
    Ok(pid)
}
