//! Best-effort launch of the system browser

use std::process::Command;

/// Opens `url` with the platform's default handler.
///
/// # Errors
///
/// Returns the spawn error when the opener command is unavailable.
pub fn open(url: &str) -> std::io::Result<()> {
    opener_command(url).spawn().map(|_| ())
}

/// Opens `url`, logging instead of failing when no browser can be started.
///
/// The authorization URL is printed separately, so the user can always
/// navigate to it manually.
pub fn try_open(url: &str) {
    match open(url) {
        Ok(()) => tracing::debug!("Opened system browser"),
        Err(e) => tracing::warn!(error = %e, "Error opening default browser"),
    }
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

// `cmd /C start` would split the URL at every `&`.
#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("rundll32");
    cmd.arg("url.dll,FileProtocolHandler").arg(url);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}
