use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::command::run_tool;
use crate::error::DesktopError;
use crate::process::process_name_from_command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: String,
    pub title: String,
}

// `wmctrl -l`: <id> <desktop> <host> <title...>
fn re_wmctrl_line() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"^(\S+)\s+\S+\s+\S+\s+(.+)$").expect("invalid regex"))
}

pub fn parse_wmctrl_list(output: &str) -> Vec<WindowInfo> {
    output
        .lines()
        .filter_map(|line| re_wmctrl_line().captures(line.trim_end()))
        .map(|caps| WindowInfo { id: caps[1].to_string(), title: caps[2].to_string() })
        .collect()
}

/// Fallback title pattern for an application command line.
pub fn default_title_pattern(command_line: &str) -> String {
    let lower = command_line.to_lowercase();
    if lower.contains("gedit") {
        ".*gedit.*".to_string()
    } else if lower.contains("notepad") {
        ".*Notepad.*".to_string()
    } else if lower.contains("calc") {
        ".*Calculator.*".to_string()
    } else {
        match process_name_from_command(command_line) {
            Some(name) => format!(".*{}.*", regex::escape(name.trim_end_matches(".exe"))),
            None => ".*".to_string(),
        }
    }
}

/// Window titles are matched case-insensitively.
pub fn title_regex(pattern: &str) -> Result<Regex, DesktopError> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

pub async fn find_window(title: &Regex) -> Result<Option<WindowInfo>, DesktopError> {
    let stdout = run_tool("wmctrl", ["-l"]).await?;
    let windows = parse_wmctrl_list(&String::from_utf8_lossy(&stdout));
    let found = windows.into_iter().find(|w| title.is_match(&w.title));
    match &found {
        Some(w) => tracing::info!(id = %w.id, title = %w.title, "Found window"),
        None => tracing::warn!(pattern = %title, "No window title matched"),
    }
    Ok(found)
}

pub async fn focus_window(window: &WindowInfo) -> Result<(), DesktopError> {
    run_tool("wmctrl", ["-i", "-a", window.id.as_str()]).await?;
    tracing::info!(id = %window.id, "Focused window");
    Ok(())
}
