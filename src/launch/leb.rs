//! Locale emulator block (LEB) marshalling
//!
//! Layout, little-endian:
//!
//! | offset | size | field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 20   | ACP, OEMCP, LCID, charset, hook UI API |
//! | 20     | 64   | default face name (`WCHAR[32]`, empty) |
//! | 84     | 172  | `TIME_ZONE_INFORMATION`                |
//! | 256    | 8    | number of registry entries             |
//! | 264    | 64×n | registry entry records                 |
//! | …      | …    | UTF-16 string pool                     |
//!
//! Entry record: root `HKEY` (u64), subkey and value name as
//! `UNICODE_STRING64` (u16 length, u16 maximum length, 4 bytes padding, u64
//! buffer), data type (u64), data (u64), data size (u64). Buffers and data
//! hold offsets from the start of the block; the loader rebases them.

use super::descriptor::LaunchDescriptor;
use super::registry::RegistryRedirectionEntry;
use super::timezone::{TIME_ZONE_INFORMATION_SIZE, TimezoneInformation};
use crate::exceptions::{LaunchError, Result};

pub const FACE_NAME_SIZE: usize = 64;
pub const HEADER_SIZE: usize = 5 * 4 + FACE_NAME_SIZE + TIME_ZONE_INFORMATION_SIZE;
pub const ENTRY_COUNT_OFFSET: usize = HEADER_SIZE;
pub const ENTRIES_OFFSET: usize = ENTRY_COUNT_OFFSET + 8;
pub const ENTRY_SIZE: usize = 64;

/// Serialise `descriptor` into a LEB block
pub fn encode(descriptor: &LaunchDescriptor, timezone: &TimezoneInformation) -> Result<Vec<u8>> {
    let entries = descriptor.registry_redirection_entries();

    let mut block = Vec::with_capacity(ENTRIES_OFFSET + entries.len() * ENTRY_SIZE + 256);
    push_u32(&mut block, descriptor.ansi_code_page());
    push_u32(&mut block, descriptor.oem_code_page());
    push_u32(&mut block, descriptor.locale_id());
    push_u32(&mut block, descriptor.default_charset());
    push_u32(&mut block, u32::from(descriptor.hook_ui_language_api()));
    block.resize(block.len() + FACE_NAME_SIZE, 0);
    timezone.write_to(&mut block);

    encode_entries(&mut block, entries)?;
    Ok(block)
}

/// Fail unless `entry` fits the `UNICODE_STRING64` length fields
pub fn check_entry(entry: &RegistryRedirectionEntry) -> Result<()> {
    string_lengths(&entry.key)?;
    string_lengths(&entry.name)?;
    Ok(())
}

/// Append the entry count, the entry records and the string pool
fn encode_entries(block: &mut Vec<u8>, entries: &[RegistryRedirectionEntry]) -> Result<()> {
    push_u64(block, entries.len() as u64);

    let pool_offset = block.len() + entries.len() * ENTRY_SIZE;
    let mut pool = StringPool::new(pool_offset);
    for entry in entries {
        write_entry(block, &mut pool, entry)?;
    }
    block.extend_from_slice(&pool.bytes);
    Ok(())
}

fn write_entry(
    block: &mut Vec<u8>,
    pool: &mut StringPool,
    entry: &RegistryRedirectionEntry,
) -> Result<()> {
    let subkey = pool.push_str(&entry.key)?;
    let name = pool.push_str(&entry.name)?;
    let (data_offset, data_size) = pool.push_units(&entry.value.to_wide());

    push_u64(block, entry.root.handle());
    subkey.write_to(block);
    name.write_to(block);
    push_u64(block, u64::from(entry.kind().code()));
    push_u64(block, data_offset);
    push_u64(block, data_size as u64);
    Ok(())
}

/// `(Length, MaximumLength)` in bytes; the maximum counts the terminator
fn string_lengths(s: &str) -> Result<(u16, u16)> {
    let units = s.encode_utf16().count();
    let too_long = || {
        LaunchError::Config(format!(
            "registry path component is too long ({units} UTF-16 units): {}",
            s.chars().take(32).collect::<String>()
        ))
    };
    let length = u16::try_from(units * 2).map_err(|_| too_long())?;
    let maximum_length = u16::try_from((units + 1) * 2).map_err(|_| too_long())?;
    Ok((length, maximum_length))
}

/// `UNICODE_STRING64` pointing into the pool
#[derive(Debug, Clone, Copy)]
struct PooledString {
    length: u16,
    maximum_length: u16,
    offset: u64,
}

impl PooledString {
    fn write_to(&self, block: &mut Vec<u8>) {
        block.extend_from_slice(&self.length.to_le_bytes());
        block.extend_from_slice(&self.maximum_length.to_le_bytes());
        block.extend_from_slice(&[0u8; 4]);
        push_u64(block, self.offset);
    }
}

#[derive(Debug)]
struct StringPool {
    base: usize,
    bytes: Vec<u8>,
}

impl StringPool {
    fn new(base: usize) -> Self {
        Self {
            base,
            bytes: Vec::new(),
        }
    }

    fn push_str(&mut self, s: &str) -> Result<PooledString> {
        let (length, maximum_length) = string_lengths(s)?;
        let mut wide: Vec<u16> = s.encode_utf16().collect();
        wide.push(0);
        let (offset, _) = self.push_units(&wide);
        Ok(PooledString {
            length,
            maximum_length,
            offset,
        })
    }

    /// Returns the block offset and byte size of `wide`, which must already
    /// carry its terminators
    fn push_units(&mut self, wide: &[u16]) -> (u64, usize) {
        let offset = (self.base + self.bytes.len()) as u64;
        for unit in wide {
            self.bytes.extend_from_slice(&unit.to_le_bytes());
        }
        // keep the next string 8-byte aligned
        while self.bytes.len() % 8 != 0 {
            self.bytes.push(0);
        }
        (offset, wide.len() * 2)
    }
}

fn push_u32(block: &mut Vec<u8>, value: u32) {
    block.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(block: &mut Vec<u8>, value: u64) {
    block.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::association::StaticAssociations;
    use crate::launch::descriptor::{LaunchContext, LaunchDescriptorBuilder, LaunchRequest};
    use crate::launch::locale::BuiltinLocales;
    use crate::launch::paths::SearchPath;
    use crate::launch::registry::{RegistryRoot, RegistryValue};
    use crate::profile::LocaleProfile;
    use std::fs;

    fn u32_at(block: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(block[offset..offset + 4].try_into().unwrap())
    }

    fn u64_at(block: &[u8], offset: usize) -> u64 {
        u64::from_le_bytes(block[offset..offset + 8].try_into().unwrap())
    }

    fn wide_at(block: &[u8], offset: usize, bytes: usize) -> String {
        let units: Vec<u16> = block[offset..offset + bytes]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    }

    fn descriptor(profile: &LocaleProfile) -> LaunchDescriptor {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("game.exe"), b"MZ").unwrap();
        let associations = StaticAssociations::new();
        let ctx = LaunchContext {
            current_dir: dir.path().to_path_buf(),
            search_path: SearchPath::default(),
            locales: &BuiltinLocales,
            associations: &associations,
        };
        LaunchDescriptorBuilder::new(&ctx)
            .build(&LaunchRequest::new("game", vec![]), profile)
            .unwrap()
    }

    #[test]
    fn test_header_fields() {
        let profile = LocaleProfile {
            is_advanced_redirection: true,
            ..LocaleProfile::default()
        };
        let descriptor = descriptor(&profile);
        let block = encode(&descriptor, &TimezoneInformation::named(descriptor.timezone())).unwrap();

        assert_eq!(HEADER_SIZE, 256);
        assert_eq!(u32_at(&block, 0), 932);
        assert_eq!(u32_at(&block, 4), 932);
        assert_eq!(u32_at(&block, 8), 0x0411);
        assert_eq!(u32_at(&block, 12), 128);
        assert_eq!(u32_at(&block, 16), 1);
        assert_eq!(u64_at(&block, ENTRY_COUNT_OFFSET), 8);
    }

    #[test]
    fn test_entry_records_point_into_pool() {
        let descriptor = descriptor(&LocaleProfile::default());
        let block = encode(&descriptor, &TimezoneInformation::default()).unwrap();

        let entries = descriptor.registry_redirection_entries();
        let first = ENTRIES_OFFSET;
        assert_eq!(u64_at(&block, first), 0x8000_0002);

        let subkey_len = u16::from_le_bytes([block[first + 8], block[first + 9]]) as usize;
        let subkey_offset = u64_at(&block, first + 16) as usize;
        assert_eq!(wide_at(&block, subkey_offset, subkey_len), entries[0].key);

        let name_len = u16::from_le_bytes([block[first + 24], block[first + 25]]) as usize;
        let name_offset = u64_at(&block, first + 32) as usize;
        assert_eq!(wide_at(&block, name_offset, name_len), "InstallLanguage");

        assert_eq!(u64_at(&block, first + 40), 1);
        let data_offset = u64_at(&block, first + 48) as usize;
        let data_size = u64_at(&block, first + 56) as usize;
        assert_eq!(wide_at(&block, data_offset, data_size), "1041\0");
    }

    #[test]
    fn test_no_entries_without_redirection() {
        let profile = LocaleProfile {
            redirect_registry: false,
            ..LocaleProfile::default()
        };
        let descriptor = descriptor(&profile);
        let block = encode(&descriptor, &TimezoneInformation::default()).unwrap();
        assert_eq!(u64_at(&block, ENTRY_COUNT_OFFSET), 0);
        assert_eq!(block.len(), ENTRIES_OFFSET);
    }

    #[test]
    fn test_overlong_key_is_rejected() {
        let entry = RegistryRedirectionEntry {
            root: RegistryRoot::CurrentUser,
            key: "k".repeat(40_000),
            name: "Locale".to_string(),
            value: RegistryValue::String("00000411".to_string()),
        };
        assert!(matches!(check_entry(&entry), Err(LaunchError::Config(_))));

        let mut block = Vec::new();
        assert!(encode_entries(&mut block, &[entry]).is_err());
    }

    #[test]
    fn test_longest_encodable_name() {
        // 32766 units plus the terminator is exactly u16::MAX - 1 bytes
        let entry = RegistryRedirectionEntry {
            root: RegistryRoot::CurrentUser,
            key: "k".repeat(32_766),
            name: "n".to_string(),
            value: RegistryValue::String(String::new()),
        };
        assert!(check_entry(&entry).is_ok());
    }
}
