//! Timezone name → `TIME_ZONE_INFORMATION`
//!
//! Windows stores each zone under
//! `HKLM\SOFTWARE\Microsoft\Windows NT\CurrentVersion\Time Zones\<name>` with a
//! 44-byte `TZI` blob plus `Std` and `Dlt` display names.

use log::debug;

pub const TIME_ZONES_KEY: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion\Time Zones";

/// Size of the `REG_TZI_FORMAT` blob
pub const TZI_SIZE: usize = 44;

/// Size of a marshalled `TIME_ZONE_INFORMATION`
pub const TIME_ZONE_INFORMATION_SIZE: usize = 172;

/// `WCHAR[32]` name fields
const NAME_CHARS: usize = 32;

/// `SYSTEMTIME` as eight little-endian words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemTime(pub [u16; 8]);

/// Owned counterpart of the Win32 `TIME_ZONE_INFORMATION`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimezoneInformation {
    pub bias: i32,
    pub standard_name: String,
    pub standard_date: SystemTime,
    pub standard_bias: i32,
    pub daylight_name: String,
    pub daylight_date: SystemTime,
    pub daylight_bias: i32,
}

impl TimezoneInformation {
    /// Zero-bias placeholder carrying only the zone name
    pub fn named(name: &str) -> Self {
        Self {
            standard_name: name.to_string(),
            daylight_name: name.to_string(),
            ..Self::default()
        }
    }

    /// Decode a `TZI` registry blob
    pub fn from_tzi(tzi: &[u8], standard_name: &str, daylight_name: &str) -> Option<Self> {
        if tzi.len() < TZI_SIZE {
            debug!("⚠️ TZI blob too short: {} bytes", tzi.len());
            return None;
        }
        let i32_at = |offset: usize| {
            i32::from_le_bytes([tzi[offset], tzi[offset + 1], tzi[offset + 2], tzi[offset + 3]])
        };
        let time_at = |offset: usize| {
            let mut words = [0u16; 8];
            for (i, word) in words.iter_mut().enumerate() {
                let at = offset + i * 2;
                *word = u16::from_le_bytes([tzi[at], tzi[at + 1]]);
            }
            SystemTime(words)
        };

        Some(Self {
            bias: i32_at(0),
            standard_bias: i32_at(4),
            daylight_bias: i32_at(8),
            standard_date: time_at(12),
            daylight_date: time_at(28),
            standard_name: standard_name.to_string(),
            daylight_name: daylight_name.to_string(),
        })
    }

    /// Append the 172-byte `TIME_ZONE_INFORMATION` layout to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bias.to_le_bytes());
        write_name(out, &self.standard_name);
        write_time(out, &self.standard_date);
        out.extend_from_slice(&self.standard_bias.to_le_bytes());
        write_name(out, &self.daylight_name);
        write_time(out, &self.daylight_date);
        out.extend_from_slice(&self.daylight_bias.to_le_bytes());
    }
}

/// Fixed `WCHAR[32]`, truncated to keep the terminator
fn write_name(out: &mut Vec<u8>, name: &str) {
    let mut chars: Vec<u16> = name.encode_utf16().take(NAME_CHARS - 1).collect();
    chars.resize(NAME_CHARS, 0);
    for c in chars {
        out.extend_from_slice(&c.to_le_bytes());
    }
}

fn write_time(out: &mut Vec<u8>, time: &SystemTime) {
    for word in time.0 {
        out.extend_from_slice(&word.to_le_bytes());
    }
}

/// Look up `name` in the system timezone database
#[cfg(windows)]
pub fn lookup(name: &str) -> Option<TimezoneInformation> {
    system::lookup(name)
}

/// Look up `name` in the system timezone database
#[cfg(not(windows))]
pub fn lookup(name: &str) -> Option<TimezoneInformation> {
    debug!("🕐 No timezone database on this platform for {}", name);
    None
}

#[cfg(windows)]
mod system {
    use super::{TIME_ZONES_KEY, TZI_SIZE, TimezoneInformation};
    use log::debug;
    use windows::Win32::Foundation::ERROR_SUCCESS;
    use windows::Win32::System::Registry::{
        HKEY_LOCAL_MACHINE, RRF_RT_REG_BINARY, RRF_RT_REG_SZ, RegGetValueW,
    };
    use windows::core::HSTRING;

    pub(super) fn lookup(name: &str) -> Option<TimezoneInformation> {
        let key = format!("{TIME_ZONES_KEY}\\{name}");
        let tzi = read_binary(&key, "TZI")?;
        let standard = read_string(&key, "Std").unwrap_or_else(|| name.to_string());
        let daylight = read_string(&key, "Dlt").unwrap_or_else(|| name.to_string());
        debug!("🕐 Loaded timezone {} ({} / {})", name, standard, daylight);
        TimezoneInformation::from_tzi(&tzi, &standard, &daylight)
    }

    #[allow(unsafe_code)] // Required for Windows API FFI calls
    fn read_binary(key: &str, value: &str) -> Option<Vec<u8>> {
        let key = HSTRING::from(key);
        let value = HSTRING::from(value);
        let mut data = vec![0u8; TZI_SIZE];
        let mut size = data.len() as u32;
        let status = unsafe {
            RegGetValueW(
                HKEY_LOCAL_MACHINE,
                &key,
                &value,
                RRF_RT_REG_BINARY,
                None,
                Some(data.as_mut_ptr().cast()),
                Some(&mut size as *mut u32),
            )
        };
        if status != ERROR_SUCCESS {
            return None;
        }
        data.truncate(size as usize);
        Some(data)
    }

    #[allow(unsafe_code)] // Required for Windows API FFI calls
    fn read_string(key: &str, value: &str) -> Option<String> {
        let key = HSTRING::from(key);
        let value = HSTRING::from(value);
        let mut buffer = [0u16; 128];
        let mut size = std::mem::size_of_val(&buffer) as u32;
        let status = unsafe {
            RegGetValueW(
                HKEY_LOCAL_MACHINE,
                &key,
                &value,
                RRF_RT_REG_SZ,
                None,
                Some(buffer.as_mut_ptr().cast()),
                Some(&mut size as *mut u32),
            )
        };
        if status != ERROR_SUCCESS {
            return None;
        }
        let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        Some(String::from_utf16_lossy(&buffer[..end]))
    }
}
