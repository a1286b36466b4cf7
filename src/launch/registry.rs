//! Registry values virtualised for the emulated process
//!
//! Rules are registered in [`REDIRECTION_RULES`]. Each rule is tagged core or
//! advanced and computes its value from the target locale, so one table serves
//! every locale. Core rules come first; an advanced plan is the core plan with
//! the advanced entries appended.

use super::locale::LocaleInfo;
use log::trace;
use std::fmt;

const NLS_CODEPAGE_KEY: &str = r"System\CurrentControlSet\Control\Nls\CodePage";
const INTERNATIONAL_KEY: &str = r"Control Panel\International";
const DESKTOP_KEY: &str = r"Control Panel\Desktop";
const MUI_CACHED_KEY: &str = r"Control Panel\Desktop\MuiCached";

/// Predefined registry hive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryRoot {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
}

impl RegistryRoot {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryRoot::ClassesRoot => "HKEY_CLASSES_ROOT",
            RegistryRoot::CurrentUser => "HKEY_CURRENT_USER",
            RegistryRoot::LocalMachine => "HKEY_LOCAL_MACHINE",
            RegistryRoot::Users => "HKEY_USERS",
        }
    }

    /// Predefined `HKEY` handle value
    pub fn handle(&self) -> u64 {
        match self {
            RegistryRoot::ClassesRoot => 0x8000_0000,
            RegistryRoot::CurrentUser => 0x8000_0001,
            RegistryRoot::LocalMachine => 0x8000_0002,
            RegistryRoot::Users => 0x8000_0003,
        }
    }
}

impl fmt::Display for RegistryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry value type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryValueKind {
    String,
    MultiString,
}

impl RegistryValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryValueKind::String => "REG_SZ",
            RegistryValueKind::MultiString => "REG_MULTI_SZ",
        }
    }

    /// `REG_*` numeric type
    pub fn code(&self) -> u32 {
        match self {
            RegistryValueKind::String => 1,
            RegistryValueKind::MultiString => 7,
        }
    }
}

/// Data substituted for a redirected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    String(String),
    MultiString(Vec<String>),
}

impl RegistryValue {
    pub fn kind(&self) -> RegistryValueKind {
        match self {
            RegistryValue::String(_) => RegistryValueKind::String,
            RegistryValue::MultiString(_) => RegistryValueKind::MultiString,
        }
    }

    /// Value as UTF-16 registry data, including terminators
    pub fn to_wide(&self) -> Vec<u16> {
        let mut wide = Vec::new();
        match self {
            RegistryValue::String(s) => {
                wide.extend(s.encode_utf16());
                wide.push(0);
            }
            RegistryValue::MultiString(items) => {
                for item in items {
                    wide.extend(item.encode_utf16());
                    wide.push(0);
                }
                wide.push(0);
            }
        }
        wide
    }
}

impl fmt::Display for RegistryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryValue::String(s) => f.write_str(s),
            RegistryValue::MultiString(items) => f.write_str(&items.join("\\0")),
        }
    }
}

/// One registry value the native loader substitutes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRedirectionEntry {
    pub root: RegistryRoot,
    pub key: String,
    pub name: String,
    pub value: RegistryValue,
}

impl RegistryRedirectionEntry {
    pub fn kind(&self) -> RegistryValueKind {
        self.value.kind()
    }
}

impl fmt::Display for RegistryRedirectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\\{}\\{} ({}) = {}",
            self.root,
            self.key,
            self.name,
            self.kind().as_str(),
            self.value
        )
    }
}

/// When a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTier {
    /// Always applied when registry redirection is on
    Core,
    /// Applied only for advanced redirection
    Advanced,
}

/// Registered redirection rule
#[derive(Debug, Clone, Copy)]
pub struct RedirectionRule {
    pub tier: RuleTier,
    pub root: RegistryRoot,
    pub key: &'static str,
    pub name: &'static str,
    pub value: fn(&LocaleInfo) -> RegistryValue,
}

impl RedirectionRule {
    fn entry(&self, locale: &LocaleInfo) -> RegistryRedirectionEntry {
        RegistryRedirectionEntry {
            root: self.root,
            key: self.key.to_string(),
            name: self.name.to_string(),
            value: (self.value)(locale),
        }
    }
}

fn lcid_decimal(locale: &LocaleInfo) -> RegistryValue {
    RegistryValue::String(locale.locale_id.to_string())
}

fn lcid_hex(locale: &LocaleInfo) -> RegistryValue {
    RegistryValue::String(format!("{:08X}", locale.locale_id))
}

fn oem_code_page(locale: &LocaleInfo) -> RegistryValue {
    RegistryValue::String(locale.oem_code_page.to_string())
}

fn ansi_code_page(locale: &LocaleInfo) -> RegistryValue {
    RegistryValue::String(locale.ansi_code_page.to_string())
}

fn locale_name(locale: &LocaleInfo) -> RegistryValue {
    RegistryValue::String(locale.name.clone())
}

fn ui_languages(locale: &LocaleInfo) -> RegistryValue {
    RegistryValue::MultiString(vec![locale.name.clone()])
}

/// Built-in rules, in the order the loader applies them
pub const REDIRECTION_RULES: &[RedirectionRule] = &[
    RedirectionRule {
        tier: RuleTier::Core,
        root: RegistryRoot::LocalMachine,
        key: NLS_CODEPAGE_KEY,
        name: "InstallLanguage",
        value: lcid_decimal,
    },
    RedirectionRule {
        tier: RuleTier::Core,
        root: RegistryRoot::LocalMachine,
        key: NLS_CODEPAGE_KEY,
        name: "Default",
        value: lcid_decimal,
    },
    RedirectionRule {
        tier: RuleTier::Core,
        root: RegistryRoot::LocalMachine,
        key: NLS_CODEPAGE_KEY,
        name: "OEMCP",
        value: oem_code_page,
    },
    RedirectionRule {
        tier: RuleTier::Core,
        root: RegistryRoot::LocalMachine,
        key: NLS_CODEPAGE_KEY,
        name: "ACP",
        value: ansi_code_page,
    },
    RedirectionRule {
        tier: RuleTier::Advanced,
        root: RegistryRoot::CurrentUser,
        key: INTERNATIONAL_KEY,
        name: "Locale",
        value: lcid_hex,
    },
    RedirectionRule {
        tier: RuleTier::Advanced,
        root: RegistryRoot::CurrentUser,
        key: INTERNATIONAL_KEY,
        name: "LocaleName",
        value: locale_name,
    },
    RedirectionRule {
        tier: RuleTier::Advanced,
        root: RegistryRoot::CurrentUser,
        key: DESKTOP_KEY,
        name: "PreferredUILanguages",
        value: ui_languages,
    },
    RedirectionRule {
        tier: RuleTier::Advanced,
        root: RegistryRoot::CurrentUser,
        key: MUI_CACHED_KEY,
        name: "MachinePreferredUILanguages",
        value: ui_languages,
    },
];

/// Plan the built-in rules for `locale`
pub fn plan(locale: &LocaleInfo, advanced: bool) -> Vec<RegistryRedirectionEntry> {
    plan_with(REDIRECTION_RULES, locale, advanced)
}

/// Plan an arbitrary rule table, keeping registration order
pub fn plan_with(
    rules: &[RedirectionRule],
    locale: &LocaleInfo,
    advanced: bool,
) -> Vec<RegistryRedirectionEntry> {
    let entries: Vec<RegistryRedirectionEntry> = rules
        .iter()
        .filter(|rule| advanced || rule.tier == RuleTier::Core)
        .map(|rule| rule.entry(locale))
        .collect();

    for entry in &entries {
        trace!("🗝️ Redirect {}", entry);
    }
    entries
}
