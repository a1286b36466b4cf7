//! Launch descriptor composition
//!
//! [`LaunchDescriptorBuilder::build`] is the only place a [`LaunchDescriptor`]
//! is created. Every lookup happens before the value is assembled, so a failed
//! build leaves nothing behind.

use super::association::{AssociationStore, FileAssociationResolver};
use super::charset::charset_for;
use super::command::build_executable_command_line;
use super::leb;
use super::locale::LocaleService;
use super::paths::{PathResolver, SearchPath, has_exe_extension};
use super::registry::{self, RegistryRedirectionEntry};
use crate::exceptions::Result;
use crate::profile::LocaleProfile;
use crate::utils::absolutize;
use log::{debug, info};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Target and trailing arguments as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub target: String,
    pub args: Vec<String>,
}

impl LaunchRequest {
    pub fn new(target: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            target: target.into(),
            args,
        }
    }
}

/// Snapshot of the outside world a build reads from
#[derive(Debug)]
pub struct LaunchContext<'a> {
    pub current_dir: PathBuf,
    pub search_path: SearchPath,
    pub locales: &'a dyn LocaleService,
    pub associations: &'a dyn AssociationStore,
}

/// Everything the native loader needs to start one emulated process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDescriptor {
    application_name: PathBuf,
    command_line: String,
    current_directory: PathBuf,
    ansi_code_page: u32,
    oem_code_page: u32,
    locale_id: u32,
    default_charset: u32,
    hook_ui_language_api: bool,
    timezone: String,
    registry_redirection_entries: Vec<RegistryRedirectionEntry>,
    debug_mode: bool,
}

impl LaunchDescriptor {
    pub fn application_name(&self) -> &Path {
        &self.application_name
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn current_directory(&self) -> &Path {
        &self.current_directory
    }

    pub fn ansi_code_page(&self) -> u32 {
        self.ansi_code_page
    }

    pub fn oem_code_page(&self) -> u32 {
        self.oem_code_page
    }

    pub fn locale_id(&self) -> u32 {
        self.locale_id
    }

    pub fn default_charset(&self) -> u32 {
        self.default_charset
    }

    pub fn hook_ui_language_api(&self) -> bool {
        self.hook_ui_language_api
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// Entries in the order the loader must apply them
    pub fn registry_redirection_entries(&self) -> &[RegistryRedirectionEntry] {
        &self.registry_redirection_entries
    }

    /// Start the child suspended
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }
}

/// How the target gets started
#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetKind {
    Executable,
    /// Existing document opened through the association for this extension
    Document { extension: String, path: PathBuf },
}

/// Composes path resolution, associations, locale data and the registry plan
#[derive(Debug)]
pub struct LaunchDescriptorBuilder<'a> {
    context: &'a LaunchContext<'a>,
}

impl<'a> LaunchDescriptorBuilder<'a> {
    pub fn new(context: &'a LaunchContext<'a>) -> Self {
        Self { context }
    }

    /// Build the descriptor for `request` under `profile`
    pub fn build(&self, request: &LaunchRequest, profile: &LocaleProfile) -> Result<LaunchDescriptor> {
        let context = self.context;
        debug!("🧩 Building launch descriptor for '{}'", request.target);

        let (application_name, command_line) = match self.classify(&request.target) {
            TargetKind::Executable => {
                let resolver = PathResolver::new(&context.current_dir, &context.search_path);
                let application_name = resolver.resolve(&request.target)?;
                let command_line = build_executable_command_line(
                    &application_name,
                    &profile.parameter,
                    &request.args,
                );
                (application_name, command_line)
            }
            TargetKind::Document { extension, path } => {
                let resolver = FileAssociationResolver::new(
                    context.associations,
                    &context.search_path,
                    &context.current_dir,
                );
                let opener = resolver.resolve(&extension, &path, &profile.parameter)?;
                (opener.application_name, opener.command_line)
            }
        };

        let locale = context.locales.lookup(&profile.location)?;
        let default_charset = charset_for(locale.ansi_code_page);
        debug!(
            "🌐 Locale {}: ACP {} OEMCP {} LCID 0x{:04X} charset {}",
            locale.name,
            locale.ansi_code_page,
            locale.oem_code_page,
            locale.locale_id,
            default_charset
        );

        let registry_redirection_entries = if profile.redirect_registry {
            let entries = registry::plan(&locale, profile.is_advanced_redirection);
            for entry in &entries {
                leb::check_entry(entry)?;
            }
            entries
        } else {
            debug!("🗝️ Registry redirection disabled by profile");
            Vec::new()
        };

        let descriptor = LaunchDescriptor {
            application_name,
            command_line,
            current_directory: context.current_dir.clone(),
            ansi_code_page: locale.ansi_code_page,
            oem_code_page: locale.oem_code_page,
            locale_id: locale.locale_id,
            default_charset,
            hook_ui_language_api: profile.is_advanced_redirection,
            timezone: profile.timezone.clone(),
            registry_redirection_entries,
            debug_mode: profile.run_with_suspend,
        };
        info!("🎯 Command: {}", descriptor.command_line);
        Ok(descriptor)
    }

    /// `.exe` and extension-less targets are executables. Any other extension
    /// names a document when such a file exists; otherwise `.exe` is appended
    /// as for `python3.11`.
    fn classify(&self, target: &str) -> TargetKind {
        let path = Path::new(target);
        if has_exe_extension(path) {
            return TargetKind::Executable;
        }
        let Some(extension) = path.extension().and_then(OsStr::to_str) else {
            return TargetKind::Executable;
        };

        let absolute = absolutize(&self.context.current_dir, path);
        if absolute.is_file() {
            TargetKind::Document {
                extension: format!(".{extension}"),
                path: absolute,
            }
        } else {
            TargetKind::Executable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::LaunchError;
    use crate::launch::association::{FileAssociation, StaticAssociations};
    use crate::launch::locale::BuiltinLocales;
    use crate::launch::registry::RegistryRoot;
    use std::fs;
    use tempfile::TempDir;

    fn context<'a>(
        dir: &TempDir,
        associations: &'a StaticAssociations,
    ) -> LaunchContext<'a> {
        LaunchContext {
            current_dir: dir.path().to_path_buf(),
            search_path: SearchPath::default(),
            locales: &BuiltinLocales,
            associations,
        }
    }

    fn notepad() -> StaticAssociations {
        StaticAssociations::new().with(".txt", FileAssociation::new("C:\\Prog\\notepad.exe", "%1"))
    }

    #[test]
    fn test_executable_descriptor() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("game.exe"), b"MZ").unwrap();
        let associations = StaticAssociations::new();
        let ctx = context(&dir, &associations);

        let request = LaunchRequest::new("game", vec!["-w".to_string()]);
        let descriptor = LaunchDescriptorBuilder::new(&ctx)
            .build(&request, &LocaleProfile::default())
            .unwrap();

        let expected = dir.path().join("game.exe");
        assert_eq!(descriptor.application_name(), expected.as_path());
        assert_eq!(
            descriptor.command_line(),
            format!("\"{}\" -w", expected.display())
        );
        assert_eq!(descriptor.current_directory(), dir.path());
        assert_eq!(descriptor.ansi_code_page(), 932);
        assert_eq!(descriptor.oem_code_page(), 932);
        assert_eq!(descriptor.locale_id(), 0x0411);
        assert_eq!(descriptor.default_charset(), 128);
        assert_eq!(descriptor.timezone(), "Tokyo Standard Time");
        assert_eq!(descriptor.registry_redirection_entries().len(), 4);
        assert!(!descriptor.hook_ui_language_api());
        assert!(!descriptor.debug_mode());
    }

    #[test]
    fn test_document_descriptor() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        let associations = notepad();
        let ctx = context(&dir, &associations);

        let request = LaunchRequest::new("notes.txt", vec![]);
        let descriptor = LaunchDescriptorBuilder::new(&ctx)
            .build(&request, &LocaleProfile::default())
            .unwrap();

        assert_eq!(
            descriptor.application_name(),
            Path::new("C:\\Prog\\notepad.exe")
        );
        assert_eq!(
            descriptor.command_line(),
            format!(
                "\"C:\\Prog\\notepad.exe\" {}",
                dir.path().join("notes.txt").display()
            )
        );
    }

    #[test]
    fn test_redirection_disabled_ignores_advanced_flag() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("game.exe"), b"MZ").unwrap();
        let associations = StaticAssociations::new();
        let ctx = context(&dir, &associations);

        let profile = LocaleProfile {
            redirect_registry: false,
            is_advanced_redirection: true,
            ..LocaleProfile::default()
        };
        let descriptor = LaunchDescriptorBuilder::new(&ctx)
            .build(&LaunchRequest::new("game.exe", vec![]), &profile)
            .unwrap();

        assert!(descriptor.registry_redirection_entries().is_empty());
        assert!(descriptor.hook_ui_language_api());
    }

    #[test]
    fn test_advanced_profile() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("game.exe"), b"MZ").unwrap();
        let associations = StaticAssociations::new();
        let ctx = context(&dir, &associations);

        let profile = LocaleProfile {
            location: "zh-CN".to_string(),
            timezone: "China Standard Time".to_string(),
            parameter: "-safe".to_string(),
            is_advanced_redirection: true,
            run_with_suspend: true,
            ..LocaleProfile::default()
        };
        let request = LaunchRequest::new("game", vec!["-ignored".to_string()]);
        let descriptor = LaunchDescriptorBuilder::new(&ctx)
            .build(&request, &profile)
            .unwrap();

        assert!(descriptor.command_line().ends_with("\" -safe"));
        assert_eq!(descriptor.ansi_code_page(), 936);
        assert_eq!(descriptor.default_charset(), 134);
        assert_eq!(descriptor.timezone(), "China Standard Time");
        assert!(descriptor.hook_ui_language_api());
        assert!(descriptor.debug_mode());

        let entries = descriptor.registry_redirection_entries();
        assert_eq!(entries.len(), 8);
        assert!(entries[4..].iter().all(|e| e.root == RegistryRoot::CurrentUser));
    }

    #[test]
    fn test_missing_executable_fails_whole_build() {
        let dir = TempDir::new().unwrap();
        let associations = StaticAssociations::new();
        let ctx = context(&dir, &associations);

        let err = LaunchDescriptorBuilder::new(&ctx)
            .build(&LaunchRequest::new("nothing", vec![]), &LocaleProfile::default())
            .unwrap_err();
        assert!(matches!(err, LaunchError::PathNotFound(_)));
    }

    #[test]
    fn test_unassociated_document_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data.bin"), b"\0").unwrap();
        let associations = notepad();
        let ctx = context(&dir, &associations);

        let err = LaunchDescriptorBuilder::new(&ctx)
            .build(&LaunchRequest::new("data.bin", vec![]), &LocaleProfile::default())
            .unwrap_err();
        assert!(matches!(err, LaunchError::AssociationNotFound(ref ext) if ext == ".bin"));
    }

    #[test]
    fn test_unknown_locale_fails_after_path_resolution() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("game.exe"), b"MZ").unwrap();
        let associations = StaticAssociations::new();
        let ctx = context(&dir, &associations);

        let profile = LocaleProfile {
            location: "tlh-QO".to_string(),
            ..LocaleProfile::default()
        };
        let err = LaunchDescriptorBuilder::new(&ctx)
            .build(&LaunchRequest::new("game", vec![]), &profile)
            .unwrap_err();
        assert!(matches!(err, LaunchError::UnknownLocale(_)));
    }

    #[test]
    fn test_dotted_name_without_file_is_treated_as_executable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("python3.11.exe"), b"MZ").unwrap();
        let associations = StaticAssociations::new();
        let ctx = context(&dir, &associations);

        let descriptor = LaunchDescriptorBuilder::new(&ctx)
            .build(&LaunchRequest::new("python3.11", vec![]), &LocaleProfile::default())
            .unwrap();
        assert!(descriptor.application_name().ends_with("python3.11.exe"));
    }
}
