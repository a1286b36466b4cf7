//! User-visible diagnostics

use crate::config::DiagnosticsTarget;
use crate::exceptions::LaunchError;
use log::error;
use std::fmt;

/// Caption for every diagnostic
pub const DIAGNOSTIC_TITLE: &str = "Locale Emulator";

/// Shows one diagnostic and returns once it has been acknowledged
pub trait Reporter: fmt::Debug {
    fn show(&self, title: &str, message: &str);
}

/// Writes diagnostics to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn show(&self, title: &str, message: &str) {
        error!("❌ {}", message.replace("\r\n", " | "));
        eprintln!("{title}: {message}");
    }
}

/// Reporter for the configured diagnostics target
pub fn reporter_for(target: DiagnosticsTarget) -> Box<dyn Reporter> {
    match target {
        DiagnosticsTarget::Console => Box::new(ConsoleReporter),
        #[cfg(windows)]
        DiagnosticsTarget::Dialog => Box::new(MessageBoxReporter),
        #[cfg(not(windows))]
        DiagnosticsTarget::Dialog => Box::new(ConsoleReporter),
    }
}

/// Diagnostic text for a non-zero loader result
pub fn format_failure(code: u32, command_line: &str) -> String {
    LaunchError::NativeLoaderFailure {
        code,
        command_line: command_line.to_string(),
    }
    .to_string()
}

/// Show a diagnostic for `code` unless it signals success.
///
/// Returns whether anything was shown.
pub fn report_result(reporter: &dyn Reporter, code: u32, command_line: &str) -> bool {
    if code == 0 {
        return false;
    }
    reporter.show(DIAGNOSTIC_TITLE, &format_failure(code, command_line));
    true
}

/// Show `err` verbatim
pub fn report_error(reporter: &dyn Reporter, err: &LaunchError) {
    reporter.show(DIAGNOSTIC_TITLE, &err.to_string());
}

#[cfg(windows)]
pub use system::MessageBoxReporter;

#[cfg(windows)]
mod system {
    use super::Reporter;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{MB_ICONERROR, MB_OK, MessageBoxW};
    use windows::core::HSTRING;

    /// Modal `MessageBoxW` with an error icon
    #[derive(Debug, Clone, Copy, Default)]
    pub struct MessageBoxReporter;

    impl Reporter for MessageBoxReporter {
        #[allow(unsafe_code)] // Required for Windows API FFI calls
        fn show(&self, title: &str, message: &str) {
            log::error!("❌ {}", message.replace("\r\n", " | "));
            let text = HSTRING::from(message);
            let caption = HSTRING::from(title);
            unsafe {
                let _ = MessageBoxW(HWND::default(), &text, &caption, MB_OK | MB_ICONERROR);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Collects diagnostics instead of showing them
    #[derive(Debug, Default)]
    pub(crate) struct RecordingReporter {
        pub(crate) shown: RefCell<Vec<(String, String)>>,
    }

    impl Reporter for RecordingReporter {
        fn show(&self, title: &str, message: &str) {
            self.shown
                .borrow_mut()
                .push((title.to_string(), message.to_string()));
        }
    }

    #[test]
    fn test_success_is_silent() {
        let reporter = RecordingReporter::default();
        assert!(!report_result(&reporter, 0, "\"C:\\a.exe\""));
        assert!(reporter.shown.borrow().is_empty());
    }

    #[test]
    fn test_failure_shows_hex_code_and_command() {
        let reporter = RecordingReporter::default();
        assert!(report_result(&reporter, 0x2E4, "\"C:\\Games\\game.exe\" -w"));

        let shown = reporter.shown.borrow();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, DIAGNOSTIC_TITLE);
        assert_eq!(shown[0].1, "Error Code: 2E4\r\nCommand: \"C:\\Games\\game.exe\" -w");
    }

    #[test]
    fn test_format_failure_has_no_padding() {
        assert_eq!(format_failure(5, "x"), "Error Code: 5\r\nCommand: x");
        assert_eq!(format_failure(0xdeadbeef, "x"), "Error Code: DEADBEEF\r\nCommand: x");
    }

    #[test]
    fn test_report_error_is_verbatim() {
        let reporter = RecordingReporter::default();
        report_error(&reporter, &LaunchError::PathNotFound("game".to_string()));
        assert_eq!(reporter.shown.borrow()[0].1, "game: No such file or directory");
    }
}
