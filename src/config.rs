//! Launcher configuration read from the environment
//!
//! Every setting has a default; unparseable values are logged and ignored.

use crate::exceptions::LaunchError;
use crate::exit_codes::{EXIT_INVALID_ARGS, EXIT_SUCCESS};
use log::warn;
use std::env;
use std::path::PathBuf;

// =================================
// Environment variables
// =================================
pub const PROFILE_VAR: &str = "LEPROC_PROFILE";
pub const ASSOCIATION_POLICY_VAR: &str = "LEPROC_ASSOCIATION_POLICY";
pub const EXIT_POLICY_VAR: &str = "LEPROC_EXIT_POLICY";
pub const DIAGNOSTICS_VAR: &str = "LEPROC_DIAGNOSTICS";
pub const ROOT_VAR: &str = "LEPROC_ROOT";

// =================================
// Defaults
// =================================
pub const DEFAULT_ASSOCIATION_POLICY: &str = "report";
pub const DEFAULT_EXIT_POLICY: &str = "code";
#[cfg(windows)]
pub const DEFAULT_DIAGNOSTICS: &str = "dialog";
#[cfg(not(windows))]
pub const DEFAULT_DIAGNOSTICS: &str = "console";

/// What to do when a non-executable target has no registered opener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationPolicy {
    /// Abort without starting anything and without telling the user
    Silent,
    /// Abort and show a diagnostic naming the extension
    Report,
}

impl AssociationPolicy {
    /// Parse policy from string (case insensitive)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "silent" => Some(Self::Silent),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

/// Process exit status after a native loader failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Exit with the loader's result code
    Code,
    /// Exit 0 once a diagnostic has been shown; failures are only visible
    /// through the diagnostic. Usage errors keep `EXIT_INVALID_ARGS`.
    Zero,
}

impl ExitPolicy {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "code" => Some(Self::Code),
            "zero" => Some(Self::Zero),
            _ => None,
        }
    }
}

/// Where diagnostics are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticsTarget {
    Console,
    Dialog,
}

impl DiagnosticsTarget {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" => Some(Self::Console),
            "dialog" => Some(Self::Dialog),
            _ => None,
        }
    }
}

/// Settings that shape one launcher invocation
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// JSON profile to load; the built-in default profile is used when unset
    pub profile_path: Option<PathBuf>,
    pub association_policy: AssociationPolicy,
    pub exit_policy: ExitPolicy,
    pub diagnostics: DiagnosticsTarget,
    /// Directory holding LoaderDll.dll and LocaleEmulator.dll
    pub root_dir: Option<PathBuf>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            profile_path: None,
            association_policy: parse_or_default(
                AssociationPolicy::parse,
                DEFAULT_ASSOCIATION_POLICY,
                AssociationPolicy::Report,
            ),
            exit_policy: parse_or_default(ExitPolicy::parse, DEFAULT_EXIT_POLICY, ExitPolicy::Code),
            diagnostics: parse_or_default(
                DiagnosticsTarget::parse,
                DEFAULT_DIAGNOSTICS,
                DiagnosticsTarget::Console,
            ),
            root_dir: None,
        }
    }
}

impl LauncherConfig {
    /// Build the configuration from LEPROC_* environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(PROFILE_VAR).filter(|p| !p.is_empty()) {
            config.profile_path = Some(PathBuf::from(path));
        }
        if let Some(root) = lookup(ROOT_VAR).filter(|p| !p.is_empty()) {
            config.root_dir = Some(PathBuf::from(root));
        }

        if let Some(value) = lookup(ASSOCIATION_POLICY_VAR) {
            match AssociationPolicy::parse(&value) {
                Some(policy) => config.association_policy = policy,
                None => warn!("⚠️ Ignoring {ASSOCIATION_POLICY_VAR}={value}: expected silent|report"),
            }
        }
        if let Some(value) = lookup(EXIT_POLICY_VAR) {
            match ExitPolicy::parse(&value) {
                Some(policy) => config.exit_policy = policy,
                None => warn!("⚠️ Ignoring {EXIT_POLICY_VAR}={value}: expected code|zero"),
            }
        }
        if let Some(value) = lookup(DIAGNOSTICS_VAR) {
            match DiagnosticsTarget::parse(&value) {
                Some(target) => config.diagnostics = target,
                None => warn!("⚠️ Ignoring {DIAGNOSTICS_VAR}={value}: expected console|dialog"),
            }
        }

        config
    }

    /// Exit status for a native loader result code under the configured policy
    pub fn exit_code_for(&self, loader_code: u32) -> i32 {
        self.apply_exit_policy(loader_code as i32)
    }

    /// Exit status for an error that was reported before the loader ran
    pub fn exit_code_for_error(&self, err: &LaunchError) -> i32 {
        match err {
            LaunchError::Usage => EXIT_INVALID_ARGS,
            other => self.apply_exit_policy(other.exit_code()),
        }
    }

    /// `code` under the configured policy, for exits that follow a diagnostic
    pub fn apply_exit_policy(&self, code: i32) -> i32 {
        match self.exit_policy {
            ExitPolicy::Code => code,
            ExitPolicy::Zero => EXIT_SUCCESS,
        }
    }
}

fn parse_or_default<T>(parse: fn(&str) -> Option<T>, value: &str, fallback: T) -> T {
    parse(value).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = LauncherConfig::from_lookup(|_| None);
        assert_eq!(config.association_policy, AssociationPolicy::Report);
        assert_eq!(config.exit_policy, ExitPolicy::Code);
        assert!(config.profile_path.is_none());
        assert!(config.root_dir.is_none());
    }

    #[test]
    fn test_values_are_case_insensitive() {
        let config = LauncherConfig::from_lookup(lookup_from(&[
            (ASSOCIATION_POLICY_VAR, "SILENT"),
            (EXIT_POLICY_VAR, "Zero"),
            (DIAGNOSTICS_VAR, "console"),
            (PROFILE_VAR, "C:\\profiles\\ja.json"),
        ]));
        assert_eq!(config.association_policy, AssociationPolicy::Silent);
        assert_eq!(config.exit_policy, ExitPolicy::Zero);
        assert_eq!(config.diagnostics, DiagnosticsTarget::Console);
        assert_eq!(
            config.profile_path,
            Some(PathBuf::from("C:\\profiles\\ja.json"))
        );
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = LauncherConfig::from_lookup(lookup_from(&[
            (ASSOCIATION_POLICY_VAR, "sometimes"),
            (EXIT_POLICY_VAR, "always"),
        ]));
        assert_eq!(config.association_policy, AssociationPolicy::Report);
        assert_eq!(config.exit_policy, ExitPolicy::Code);
    }

    #[test]
    fn test_exit_code_policy() {
        let mut config = LauncherConfig::from_lookup(|_| None);
        assert_eq!(config.exit_code_for(0x2e4), 0x2e4);
        config.exit_policy = ExitPolicy::Zero;
        assert_eq!(config.exit_code_for(0x2e4), 0);
    }

    #[test]
    fn test_zero_policy_covers_reported_errors() {
        let missing = LaunchError::MissingDependency(vec!["LoaderDll.dll".to_string()]);
        let mut config = LauncherConfig::from_lookup(|_| None);
        assert_eq!(
            config.exit_code_for_error(&missing),
            crate::exit_codes::EXIT_DEPENDENCY_ERROR
        );

        config.exit_policy = ExitPolicy::Zero;
        assert_eq!(config.exit_code_for_error(&missing), EXIT_SUCCESS);
        assert_eq!(
            config.exit_code_for_error(&LaunchError::PathNotFound("game".to_string())),
            EXIT_SUCCESS
        );
        assert_eq!(config.exit_code_for_error(&LaunchError::Usage), EXIT_INVALID_ARGS);
    }
}
