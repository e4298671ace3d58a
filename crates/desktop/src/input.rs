use std::time::Duration;

use bpwatch_core::{Credentials, Point};

use crate::command::run_tool;
use crate::error::DesktopError;
use crate::Desktop;

/// Screen positions used by the login sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTargets {
    pub username_field: Point,
    pub password_field: Point,
    pub login_button: Point,
}

pub async fn click_at(at: Point) -> Result<(), DesktopError> {
    let (x, y) = (at.x.to_string(), at.y.to_string());
    run_tool("xdotool", ["mousemove", x.as_str(), y.as_str(), "click", "1"]).await?;
    tracing::debug!(x = at.x, y = at.y, "Clicked");
    Ok(())
}

pub async fn type_text(text: &str, keystroke_delay: Duration) -> Result<(), DesktopError> {
    let delay_ms = keystroke_delay.as_millis().to_string();
    run_tool("xdotool", ["type", "--delay", delay_ms.as_str(), "--", text]).await?;
    Ok(())
}

/// Click username, type it, click password, type it, click login.
pub async fn perform_login<D: Desktop>(
    desktop: &D,
    credentials: &Credentials,
    targets: LoginTargets,
    keystroke_delay: Duration,
    pause: Duration,
) -> Result<(), DesktopError> {
    tracing::info!(at = ?targets.username_field, "Clicking username field");
    desktop.click(targets.username_field).await?;
    tokio::time::sleep(pause).await;
    tracing::info!(username = %credentials.username, "Typing username");
    desktop.type_text(&credentials.username, keystroke_delay).await?;
    tokio::time::sleep(pause).await;

    tracing::info!(at = ?targets.password_field, "Clicking password field");
    desktop.click(targets.password_field).await?;
    tokio::time::sleep(pause).await;
    tracing::info!("Typing password");
    desktop.type_text(&credentials.password, keystroke_delay).await?;
    tokio::time::sleep(pause).await;

    tracing::info!(at = ?targets.login_button, "Clicking login button");
    desktop.click(targets.login_button).await?;
    tracing::info!("Login sequence submitted");
    Ok(())
}
