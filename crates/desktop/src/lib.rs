//! X11 desktop collaborators: process liveness, window focus, input
//! simulation and screen capture, driven through the usual command-line tools
//! (`wmctrl`, `xdotool`, ImageMagick `import`).

pub mod capture;
pub mod command;
pub mod error;
pub mod input;
pub mod process;
pub mod window;

pub use capture::crop_geometry;
pub use error::DesktopError;
pub use input::{perform_login, LoginTargets};
pub use process::{is_process_running, process_name_from_command};
pub use window::{default_title_pattern, parse_wmctrl_list, title_regex, WindowInfo};

use std::future::Future;
use std::time::Duration;

use bpwatch_core::{Point, Region};
use regex::Regex;

/// Everything the watcher needs from the desktop session.
pub trait Desktop: Send + Sync {
    fn is_running(&self, process_name: &str) -> bool;

    fn launch(&self, command_line: &str) -> impl Future<Output = Result<(), DesktopError>> + Send;

    fn find_window(&self, title: &Regex) -> impl Future<Output = Result<Option<WindowInfo>, DesktopError>> + Send;

    fn focus(&self, window: &WindowInfo) -> impl Future<Output = Result<(), DesktopError>> + Send;

    fn click(&self, at: Point) -> impl Future<Output = Result<(), DesktopError>> + Send;

    fn type_text(&self, text: &str, keystroke_delay: Duration) -> impl Future<Output = Result<(), DesktopError>> + Send;

    /// PNG bytes of a screen region.
    fn capture(&self, region: Region) -> impl Future<Output = Result<Vec<u8>, DesktopError>> + Send;
}

/// The real X11 session.
#[derive(Debug, Clone, Copy, Default)]
pub struct X11Desktop;

impl Desktop for X11Desktop {
    fn is_running(&self, process_name: &str) -> bool {
        process::is_process_running(process_name)
    }

    async fn launch(&self, command_line: &str) -> Result<(), DesktopError> {
        process::launch(command_line).map(|_| ())
    }

    async fn find_window(&self, title: &Regex) -> Result<Option<WindowInfo>, DesktopError> {
        window::find_window(title).await
    }

    async fn focus(&self, window: &WindowInfo) -> Result<(), DesktopError> {
        window::focus_window(window).await
    }

    async fn click(&self, at: Point) -> Result<(), DesktopError> {
        input::click_at(at).await
    }

    async fn type_text(&self, text: &str, keystroke_delay: Duration) -> Result<(), DesktopError> {
        input::type_text(text, keystroke_delay).await
    }

    async fn capture(&self, region: Region) -> Result<Vec<u8>, DesktopError> {
        capture::capture_region(region).await
    }
}
