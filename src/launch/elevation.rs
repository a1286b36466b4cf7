//! Relaunching the launcher with administrator rights

use crate::exceptions::Result;
use std::fmt;
use std::path::Path;

/// Starts `exe` again elevated in `working_dir`; does not wait for it.
///
/// The elevated copy resolves relative targets and profile paths against
/// `working_dir`, so it must be the caller's current directory.
pub trait Relauncher: fmt::Debug {
    fn relaunch_elevated(&self, exe: &Path, args: &[String], working_dir: &Path) -> Result<()>;
}

/// Relauncher for this platform
pub fn default_relauncher() -> Box<dyn Relauncher> {
    #[cfg(windows)]
    {
        Box::new(ShellRelauncher)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnsupportedRelauncher)
    }
}

/// Refuses every relaunch
#[cfg(not(windows))]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedRelauncher;

#[cfg(not(windows))]
impl Relauncher for UnsupportedRelauncher {
    fn relaunch_elevated(&self, exe: &Path, _args: &[String], _working_dir: &Path) -> Result<()> {
        Err(crate::exceptions::LaunchError::ElevationFailed(format!(
            "{}: elevation is only available on Windows",
            exe.display()
        )))
    }
}

#[cfg(windows)]
pub use system::ShellRelauncher;

#[cfg(windows)]
mod system {
    use super::Relauncher;
    use crate::exceptions::{LaunchError, Result};
    use crate::launch::command::quote_argument;
    use log::info;
    use std::path::Path;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;
    use windows::core::HSTRING;

    /// `ShellExecuteW` with the `runas` verb
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ShellRelauncher;

    impl Relauncher for ShellRelauncher {
        #[allow(unsafe_code)] // Required for Windows API FFI calls
        fn relaunch_elevated(
            &self,
            exe: &Path,
            args: &[String],
            working_dir: &Path,
        ) -> Result<()> {
            let parameters = args
                .iter()
                .map(|a| quote_argument(a))
                .collect::<Vec<_>>()
                .join(" ");
            info!(
                "🛡️ Relaunching elevated in {}: {} {}",
                working_dir.display(),
                exe.display(),
                parameters
            );

            let verb = HSTRING::from("runas");
            let file = HSTRING::from(exe);
            let parameters = HSTRING::from(parameters.as_str());
            let directory = HSTRING::from(working_dir);
            let instance = unsafe {
                ShellExecuteW(
                    HWND::default(),
                    &verb,
                    &file,
                    &parameters,
                    &directory,
                    SW_SHOWNORMAL,
                )
            };

            // values up to 32 are error codes
            let status = instance.0 as isize;
            if status > 32 {
                Ok(())
            } else {
                Err(LaunchError::ElevationFailed(format!(
                    "ShellExecuteW returned {status}"
                )))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// A recorded relaunch: executable, arguments, working directory
    pub(crate) type Relaunch = (PathBuf, Vec<String>, PathBuf);

    /// Records relaunch requests and answers with a fixed outcome
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRelauncher {
        pub(crate) fail: bool,
        pub(crate) calls: RefCell<Vec<Relaunch>>,
    }

    impl Relauncher for RecordingRelauncher {
        fn relaunch_elevated(&self, exe: &Path, args: &[String], working_dir: &Path) -> Result<()> {
            self.calls.borrow_mut().push((
                exe.to_path_buf(),
                args.to_vec(),
                working_dir.to_path_buf(),
            ));
            if self.fail {
                Err(crate::exceptions::LaunchError::ElevationFailed(
                    "cancelled".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn test_unsupported_platform_fails() {
        let err = default_relauncher()
            .relaunch_elevated(Path::new("leproc"), &[], Path::new("/"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Elevation failed"));
    }
}
