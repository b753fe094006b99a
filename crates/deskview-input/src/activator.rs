//! Foreground window activation
//!
//! Page keys land in whatever window has keyboard focus, so scrolling
//! re-activates the frontmost window first.

use deskview_core::{Error, Result};
use std::process::Command;
use tracing::debug;

/// Brings the frontmost window to the foreground with focus
pub trait WindowActivator: Send {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Activate the current foreground window
    ///
    /// Returns [`Error::Unsupported`] when the platform has no strategy.
    fn activate(&self) -> Result<()>;
}

fn run_command(program: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::command_failed(program, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::command_failed(program, stderr.trim()));
    }
    Ok(())
}

/// X11 desktops, via xdotool
pub struct LinuxActivator;

impl WindowActivator for LinuxActivator {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    fn activate(&self) -> Result<()> {
        debug!("Activating foreground window via xdotool");
        run_command("xdotool", &["getactivewindow", "windowactivate"])
    }
}

/// macOS, via System Events scripting
pub struct MacActivator;

const FRONTMOST_SCRIPT: &str = "tell application \"System Events\" to set frontmost of \
    first application process whose frontmost is true to true";

impl WindowActivator for MacActivator {
    fn name(&self) -> &'static str {
        "osascript"
    }

    fn activate(&self) -> Result<()> {
        debug!("Activating foreground window via osascript");
        run_command("osascript", &["-e", FRONTMOST_SCRIPT])
    }
}

/// Windows, via the Win32 foreground window API
pub struct WindowsActivator;

impl WindowActivator for WindowsActivator {
    fn name(&self) -> &'static str {
        "win32"
    }

    #[cfg(target_os = "windows")]
    fn activate(&self) -> Result<()> {
        use windows::Win32::UI::WindowsAndMessaging::{
            GetForegroundWindow, SetForegroundWindow, ShowWindow, SW_SHOW,
        };

        // SAFETY: plain Win32 calls on a handle returned by the system
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_invalid() {
                return Err(Error::Activation("no foreground window".to_string()));
            }
            let _ = ShowWindow(hwnd, SW_SHOW);
            if !SetForegroundWindow(hwnd).as_bool() {
                return Err(Error::Activation("SetForegroundWindow refused".to_string()));
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    fn activate(&self) -> Result<()> {
        Err(Error::Unsupported(
            "Win32 activation in a non-Windows build".to_string(),
        ))
    }
}

/// Platforms with no activation strategy
pub struct UnsupportedActivator;

impl WindowActivator for UnsupportedActivator {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn activate(&self) -> Result<()> {
        Err(Error::Unsupported(format!(
            "window activation on {}",
            std::env::consts::OS
        )))
    }
}

/// Pick the activation strategy for the running platform
pub fn detect_activator() -> Box<dyn WindowActivator> {
    activator_for(std::env::consts::OS)
}

fn activator_for(os: &str) -> Box<dyn WindowActivator> {
    match os {
        "windows" => Box::new(WindowsActivator),
        "macos" => Box::new(MacActivator),
        "linux" => Box::new(LinuxActivator),
        _ => Box::new(UnsupportedActivator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activator_selection() {
        assert_eq!(activator_for("linux").name(), "xdotool");
        assert_eq!(activator_for("macos").name(), "osascript");
        assert_eq!(activator_for("windows").name(), "win32");
        assert_eq!(activator_for("freebsd").name(), "unsupported");
    }

    #[test]
    fn test_unsupported_reports_unsupported() {
        assert!(matches!(
            UnsupportedActivator.activate(),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_missing_program_is_command_failure() {
        let result = run_command("deskview-no-such-program", &[]);
        assert!(matches!(result, Err(Error::CommandFailed { .. })));
    }
}
