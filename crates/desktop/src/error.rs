use thiserror::Error;

#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("{tool} not found; please ensure it is installed")]
    ToolMissing { tool: &'static str },
    #[error("{tool} failed ({status}): {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },
    #[error("Failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Empty application command")]
    EmptyCommand,
    #[error("Invalid window title pattern: {0}")]
    TitlePattern(#[from] regex::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
