//! Locale name → codepage and LCID lookup

use crate::exceptions::{LaunchError, Result};
use std::fmt;

/// Numeric identity of a locale as seen by legacy Windows APIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleInfo {
    /// Canonical locale name, e.g. `ja-JP`
    pub name: String,
    pub ansi_code_page: u32,
    pub oem_code_page: u32,
    pub locale_id: u32,
}

impl LocaleInfo {
    pub fn new(name: impl Into<String>, ansi_code_page: u32, oem_code_page: u32, locale_id: u32) -> Self {
        Self {
            name: name.into(),
            ansi_code_page,
            oem_code_page,
            locale_id,
        }
    }
}

/// Locale information provider
pub trait LocaleService: fmt::Debug {
    fn lookup(&self, location: &str) -> Result<LocaleInfo>;
}

/// (name, ANSI codepage, OEM codepage, LCID)
const BUILTIN_LOCALES: &[(&str, u32, u32, u32)] = &[
    ("ja-JP", 932, 932, 0x0411),
    ("zh-CN", 936, 936, 0x0804),
    ("zh-SG", 936, 936, 0x1004),
    ("zh-TW", 950, 950, 0x0404),
    ("zh-HK", 950, 950, 0x0C04),
    ("ko-KR", 949, 949, 0x0412),
    ("en-US", 1252, 437, 0x0409),
    ("en-GB", 1252, 850, 0x0809),
    ("de-DE", 1252, 850, 0x0407),
    ("fr-FR", 1252, 850, 0x040C),
    ("es-ES", 1252, 850, 0x0C0A),
    ("it-IT", 1252, 850, 0x0410),
    ("pt-BR", 1252, 850, 0x0416),
    ("ru-RU", 1251, 866, 0x0419),
    ("uk-UA", 1251, 866, 0x0422),
    ("pl-PL", 1250, 852, 0x0415),
    ("cs-CZ", 1250, 852, 0x0405),
    ("hu-HU", 1250, 852, 0x040E),
    ("el-GR", 1253, 737, 0x0408),
    ("tr-TR", 1254, 857, 0x041F),
    ("he-IL", 1255, 862, 0x040D),
    ("ar-SA", 1256, 720, 0x0401),
    ("lt-LT", 1257, 775, 0x0427),
    ("th-TH", 874, 874, 0x041E),
    ("vi-VN", 1258, 1258, 0x042A),
];

/// Static table of common locales; needs no system calls
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLocales;

impl LocaleService for BuiltinLocales {
    fn lookup(&self, location: &str) -> Result<LocaleInfo> {
        let location = location.trim().replace('_', "-");
        BUILTIN_LOCALES
            .iter()
            .find(|(name, ..)| name.eq_ignore_ascii_case(&location))
            .map(|&(name, acp, oemcp, lcid)| LocaleInfo::new(name, acp, oemcp, lcid))
            .ok_or(LaunchError::UnknownLocale(location))
    }
}

/// Locale service used by the launcher on this platform
pub fn default_locale_service() -> Box<dyn LocaleService> {
    #[cfg(windows)]
    {
        Box::new(SystemLocales)
    }
    #[cfg(not(windows))]
    {
        Box::new(BuiltinLocales)
    }
}

#[cfg(windows)]
pub use system::SystemLocales;

#[cfg(windows)]
mod system {
    use super::{BuiltinLocales, LocaleInfo, LocaleService};
    use crate::exceptions::{LaunchError, Result};
    use log::debug;
    use windows::Win32::Globalization::{
        GetLocaleInfoEx, LOCALE_IDEFAULTANSICODEPAGE, LOCALE_IDEFAULTCODEPAGE,
        LOCALE_RETURN_NUMBER, LocaleNameToLCID,
    };
    use windows::core::HSTRING;

    /// Locale data from the Windows NLS tables, falling back to the built-in table
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemLocales;

    impl LocaleService for SystemLocales {
        fn lookup(&self, location: &str) -> Result<LocaleInfo> {
            if let Some(info) = query(location.trim()) {
                return Ok(info);
            }
            debug!("🌐 NLS lookup failed for {}, trying built-in table", location);
            BuiltinLocales
                .lookup(location)
                .map_err(|_| LaunchError::UnknownLocale(location.to_string()))
        }
    }

    #[allow(unsafe_code)] // Required for Windows API FFI calls
    fn query(location: &str) -> Option<LocaleInfo> {
        let name = HSTRING::from(location);
        let locale_id = unsafe { LocaleNameToLCID(&name, 0) };
        if locale_id == 0 {
            return None;
        }
        let ansi_code_page = number(&name, LOCALE_IDEFAULTANSICODEPAGE)?;
        let oem_code_page = number(&name, LOCALE_IDEFAULTCODEPAGE)?;
        Some(LocaleInfo::new(location, ansi_code_page, oem_code_page, locale_id))
    }

    #[allow(unsafe_code)] // Required for Windows API FFI calls
    fn number(name: &HSTRING, lctype: u32) -> Option<u32> {
        // LOCALE_RETURN_NUMBER writes a DWORD into two UTF-16 slots
        let mut buffer = [0u16; 2];
        let written =
            unsafe { GetLocaleInfoEx(name, lctype | LOCALE_RETURN_NUMBER, Some(&mut buffer)) };
        if written == 0 {
            return None;
        }
        Some(u32::from(buffer[0]) | (u32::from(buffer[1]) << 16))
    }
}
