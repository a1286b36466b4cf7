//! Handoff to the native loader
//!
//! A gateway returns 0 once emulation is configured and the target process has
//! been created. The launcher does not wait for the child to exit. Any other
//! value is a loader or Win32 error code.

use super::descriptor::LaunchDescriptor;
use crate::exceptions::{LaunchError, Result};
use log::{debug, trace};
use std::fmt;
use std::path::Path;

/// Loader library exporting `LeCreateProcess`
pub const LOADER_DLL: &str = "LoaderDll.dll";

/// Hook library the loader injects into the child
pub const HOOK_DLL: &str = "LocaleEmulator.dll";

/// Files that must sit next to the launcher
pub const NATIVE_COMPONENTS: &[&str] = &[LOADER_DLL, HOOK_DLL];

/// Exported loader entry point
pub const ENTRY_POINT: &str = "LeCreateProcess";

/// `ERROR_ELEVATION_REQUIRED`
pub const ERROR_ELEVATION_REQUIRED: u32 = 740;

/// `ERROR_PROC_NOT_FOUND`, used when the loader cannot be bound
pub const ERROR_PROC_NOT_FOUND: u32 = 127;

/// `ERROR_INVALID_PARAMETER`, used when the descriptor cannot be marshalled
pub const ERROR_INVALID_PARAMETER: u32 = 87;

/// Starts a process from a fully built descriptor
pub trait NativeLoaderGateway: fmt::Debug {
    fn start(&self, descriptor: &LaunchDescriptor) -> u32;
}

/// Fail with `MissingDependency` unless every native component is in `root`
pub fn check_native_components(root: &Path) -> Result<()> {
    trace!("🔍 Checking native components in {}", root.display());
    let missing: Vec<String> = NATIVE_COMPONENTS
        .iter()
        .filter(|name| !root.join(name).is_file())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        debug!("✅ Native components present in {}", root.display());
        Ok(())
    } else {
        Err(LaunchError::MissingDependency(missing))
    }
}

/// Gateway backed by the loader library in `root`
#[cfg(windows)]
pub fn default_gateway(root: &Path) -> Result<Box<dyn NativeLoaderGateway>> {
    check_native_components(root)?;
    Ok(Box::new(LoaderDllGateway::new(root)))
}

/// Gateway backed by the loader library in `root`
#[cfg(not(windows))]
pub fn default_gateway(root: &Path) -> Result<Box<dyn NativeLoaderGateway>> {
    check_native_components(root)?;
    Err(LaunchError::Generic(
        "The native loader can only run on Windows".to_string(),
    ))
}

#[cfg(windows)]
pub use system::LoaderDllGateway;

#[cfg(windows)]
mod system {
    use super::{
        ENTRY_POINT, ERROR_INVALID_PARAMETER, ERROR_PROC_NOT_FOUND, LOADER_DLL,
        NativeLoaderGateway,
    };
    use crate::launch::descriptor::LaunchDescriptor;
    use crate::launch::{leb, timezone};
    use anyhow::{Context, anyhow};
    use log::{debug, error, info};
    use std::ffi::{OsStr, c_void};
    use std::os::windows::ffi::OsStrExt;
    use std::path::{Path, PathBuf};
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
    use windows::Win32::System::Threading::{CREATE_SUSPENDED, PROCESS_INFORMATION, STARTUPINFOW};
    use windows::core::{HSTRING, s};

    type LeCreateProcessFn = unsafe extern "system" fn(
        leb: *const u8,
        application_name: *const u16,
        command_line: *mut u16,
        current_directory: *const u16,
        creation_flags: u32,
        startup_info: *const STARTUPINFOW,
        process_information: *mut PROCESS_INFORMATION,
        process_attributes: *const c_void,
        thread_attributes: *const c_void,
        environment: *const c_void,
        token: HANDLE,
    ) -> u32;

    /// Calls `LeCreateProcess` from `LoaderDll.dll`
    #[derive(Debug, Clone)]
    pub struct LoaderDllGateway {
        root_dir: PathBuf,
    }

    impl LoaderDllGateway {
        pub fn new(root_dir: &Path) -> Self {
            Self {
                root_dir: root_dir.to_path_buf(),
            }
        }

        #[allow(unsafe_code)] // Required for Windows API FFI calls
        fn entry_point(&self) -> anyhow::Result<LeCreateProcessFn> {
            let dll = self.root_dir.join(LOADER_DLL);
            let name = HSTRING::from(dll.as_path());
            let module = unsafe { LoadLibraryW(&name) }
                .with_context(|| format!("Failed to load {}", dll.display()))?;
            let proc = unsafe { GetProcAddress(module, s!("LeCreateProcess")) }
                .ok_or_else(|| anyhow!("{} does not export {}", dll.display(), ENTRY_POINT))?;
            // SAFETY: LeCreateProcess is declared with this signature by the loader
            Ok(unsafe {
                std::mem::transmute::<unsafe extern "system" fn() -> isize, LeCreateProcessFn>(
                    proc,
                )
            })
        }
    }

    impl NativeLoaderGateway for LoaderDllGateway {
        #[allow(unsafe_code)] // Required for Windows API FFI calls
        fn start(&self, descriptor: &LaunchDescriptor) -> u32 {
            let le_create_process = match self.entry_point() {
                Ok(f) => f,
                Err(e) => {
                    error!("❌ {e:#}");
                    return e
                        .downcast_ref::<windows::core::Error>()
                        .map(|w| w.code().0 as u32)
                        .unwrap_or(ERROR_PROC_NOT_FOUND);
                }
            };

            let tz = timezone::lookup(descriptor.timezone())
                .unwrap_or_else(|| timezone::TimezoneInformation::named(descriptor.timezone()));
            let block = match leb::encode(descriptor, &tz) {
                Ok(block) => block,
                Err(e) => {
                    error!("❌ {e}");
                    return ERROR_INVALID_PARAMETER;
                }
            };
            debug!("📦 LEB is {} bytes", block.len());

            let application_name = wide(descriptor.application_name().as_os_str());
            let mut command_line = wide(OsStr::new(descriptor.command_line()));
            let current_directory = wide(descriptor.current_directory().as_os_str());
            let creation_flags = if descriptor.debug_mode() {
                CREATE_SUSPENDED.0
            } else {
                0
            };

            let startup_info = STARTUPINFOW {
                cb: std::mem::size_of::<STARTUPINFOW>() as u32,
                ..Default::default()
            };
            let mut process_information = PROCESS_INFORMATION::default();

            info!("🚀 Starting {}", descriptor.application_name().display());
            let code = unsafe {
                le_create_process(
                    block.as_ptr(),
                    application_name.as_ptr(),
                    command_line.as_mut_ptr(),
                    current_directory.as_ptr(),
                    creation_flags,
                    &startup_info,
                    &mut process_information,
                    std::ptr::null(),
                    std::ptr::null(),
                    std::ptr::null(),
                    HANDLE::default(),
                )
            };

            if code == 0 {
                debug!("✅ Started process {}", process_information.dwProcessId);
                unsafe {
                    let _ = CloseHandle(process_information.hThread);
                    let _ = CloseHandle(process_information.hProcess);
                }
            }
            code
        }
    }

    fn wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_all_components_present() {
        let dir = TempDir::new().unwrap();
        for name in NATIVE_COMPONENTS {
            fs::write(dir.path().join(name), b"MZ").unwrap();
        }
        assert!(check_native_components(dir.path()).is_ok());
    }

    #[test]
    fn test_missing_components_are_named() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LOADER_DLL), b"MZ").unwrap();

        let err = check_native_components(dir.path()).unwrap_err();
        match err {
            LaunchError::MissingDependency(names) => assert_eq!(names, vec![HOOK_DLL.to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_gateway_requires_components() {
        let dir = TempDir::new().unwrap();
        let err = default_gateway(dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::MissingDependency(ref n) if n.len() == 2));
    }
}
