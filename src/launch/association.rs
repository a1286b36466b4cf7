//! File association lookup and opener command lines
//!
//! A target that is not an executable is opened by the program registered for
//! its extension. The registered argument template may contain `%1` (the
//! absolute target path) and `%*` (the profile parameter string).

use super::command::quote_path;
use super::paths::SearchPath;
use crate::exceptions::{LaunchError, Result};
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Opener registered for an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAssociation {
    pub program_path: String,
    pub argument_template: String,
}

impl FileAssociation {
    pub fn new(program_path: impl Into<String>, argument_template: impl Into<String>) -> Self {
        Self {
            program_path: program_path.into(),
            argument_template: argument_template.into(),
        }
    }
}

/// Source of extension → opener mappings
pub trait AssociationStore: fmt::Debug {
    /// Look up `extension` (with leading dot, lower case)
    fn lookup(&self, extension: &str) -> Option<FileAssociation>;
}

/// In-memory association table
#[derive(Debug, Clone, Default)]
pub struct StaticAssociations {
    entries: HashMap<String, FileAssociation>,
}

impl StaticAssociations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an opener; the extension may be given with or without a dot
    pub fn with(mut self, extension: &str, association: FileAssociation) -> Self {
        self.entries
            .insert(normalize_extension(extension), association);
        self
    }
}

impl AssociationStore for StaticAssociations {
    fn lookup(&self, extension: &str) -> Option<FileAssociation> {
        self.entries.get(&normalize_extension(extension)).cloned()
    }
}

/// `.TXT`, `txt` and `.txt` all become `.txt`
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim_start_matches('.');
    format!(".{}", trimmed.to_lowercase())
}

/// Application name and command line for opening a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOpener {
    pub application_name: PathBuf,
    pub command_line: String,
}

/// Builds opener command lines from an association store
#[derive(Debug)]
pub struct FileAssociationResolver<'a> {
    store: &'a dyn AssociationStore,
    search_path: &'a SearchPath,
    current_dir: &'a Path,
}

impl<'a> FileAssociationResolver<'a> {
    pub fn new(
        store: &'a dyn AssociationStore,
        search_path: &'a SearchPath,
        current_dir: &'a Path,
    ) -> Self {
        Self {
            store,
            search_path,
            current_dir,
        }
    }

    /// Resolve the opener for `target` (already absolute) with `parameter`
    /// substituted for `%*`.
    pub fn resolve(&self, extension: &str, target: &Path, parameter: &str) -> Result<ResolvedOpener> {
        let extension = normalize_extension(extension);
        let association = self
            .store
            .lookup(&extension)
            .ok_or_else(|| LaunchError::AssociationNotFound(extension.clone()))?;
        debug!(
            "🔗 {} opens with {} {}",
            extension, association.program_path, association.argument_template
        );

        let program = association.program_path.trim();
        let command_line = build_opener_command_line(
            program,
            &association.argument_template,
            target,
            parameter,
        );
        let application_name = self.locate_program(program.trim_matches('"'));

        Ok(ResolvedOpener {
            application_name,
            command_line,
        })
    }

    /// Bare program names ("notepad.exe") are looked up on the search path
    fn locate_program(&self, program: &str) -> PathBuf {
        if program.contains(['\\', '/']) {
            return PathBuf::from(program);
        }
        match which::which_in(program, Some(self.search_path_os()), self.current_dir) {
            Ok(found) => {
                trace!("🔍 Opener '{}' found at {:?}", program, found);
                found
            }
            Err(e) => {
                trace!("⚠️ Opener '{}' not on search path ({}), keeping as is", program, e);
                PathBuf::from(program)
            }
        }
    }

    fn search_path_os(&self) -> std::ffi::OsString {
        std::env::join_paths(self.search_path.dirs()).unwrap_or_default()
    }
}

/// `"<program>" <template>` with `%1` and `%*` substituted
pub fn build_opener_command_line(
    program: &str,
    template: &str,
    target: &Path,
    parameter: &str,
) -> String {
    let target = target.to_string_lossy();
    let arguments = template.replace("%1", &target).replace("%*", parameter);
    let command_line = format!("{} {}", quote_path(program), arguments);
    command_line.trim_end().to_string()
}

/// Split a registered shell command into its program and argument template.
///
/// `executable` is the program the shell reports for the extension; it is
/// used to find the end of an unquoted program path that contains spaces.
pub fn split_command_template(command: &str, executable: &str) -> String {
    let command = command.trim();

    if let Some(rest) = command.strip_prefix('"') {
        return match rest.find('"') {
            Some(end) => rest[end + 1..].trim_start().to_string(),
            None => String::new(),
        };
    }

    if !executable.is_empty()
        && command.len() >= executable.len()
        && command.is_char_boundary(executable.len())
        && command[..executable.len()].eq_ignore_ascii_case(executable)
    {
        return command[executable.len()..].trim_start().to_string();
    }

    match command.find(char::is_whitespace) {
        Some(end) => command[end..].trim_start().to_string(),
        None => String::new(),
    }
}

/// Template used when the shell command does not place the document itself
pub const DEFAULT_ARGUMENT_TEMPLATE: &str = "\"%1\"";

/// Association built from the shell's executable and open command.
///
/// Like the shell, a command that never mentions `%1` gets the document
/// appended.
pub fn shell_association(executable: String, command: Option<&str>) -> FileAssociation {
    // %L is the long-path form of %1
    let template = command
        .map(|command| split_command_template(command, &executable))
        .unwrap_or_default()
        .replace("%L", "%1")
        .replace("%l", "%1");
    let template = if template.contains("%1") {
        template
    } else {
        trace!("🔗 Appending {} to '{}'", DEFAULT_ARGUMENT_TEMPLATE, template);
        format!("{template} {DEFAULT_ARGUMENT_TEMPLATE}")
            .trim_start()
            .to_string()
    };
    FileAssociation::new(executable, template)
}

/// Association store used by the launcher on this platform
pub fn default_association_store() -> Box<dyn AssociationStore> {
    #[cfg(windows)]
    {
        Box::new(SystemAssociations)
    }
    #[cfg(not(windows))]
    {
        Box::new(StaticAssociations::new())
    }
}

#[cfg(windows)]
pub use system::SystemAssociations;

#[cfg(windows)]
mod system {
    use super::{AssociationStore, FileAssociation, shell_association};
    use anyhow::{Context, Result};
    use log::debug;
    use windows::Win32::UI::Shell::{
        ASSOCF_NONE, ASSOCSTR, ASSOCSTR_COMMAND, ASSOCSTR_EXECUTABLE, AssocQueryStringW,
    };
    use windows::core::{HSTRING, PCWSTR, PWSTR};

    /// Associations registered with the Windows shell
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemAssociations;

    impl AssociationStore for SystemAssociations {
        fn lookup(&self, extension: &str) -> Option<FileAssociation> {
            let executable = match query(extension, ASSOCSTR_EXECUTABLE) {
                Ok(value) => value,
                Err(e) => {
                    debug!("🔗 No executable associated with {}: {:#}", extension, e);
                    return None;
                }
            };
            let command = match query(extension, ASSOCSTR_COMMAND) {
                Ok(command) => Some(command),
                Err(e) => {
                    debug!("🔗 No open command for {}: {:#}", extension, e);
                    None
                }
            };
            Some(shell_association(executable, command.as_deref()))
        }
    }

    #[allow(unsafe_code)] // Required for Windows API FFI calls
    fn query(extension: &str, kind: ASSOCSTR) -> Result<String> {
        let assoc = HSTRING::from(extension);
        let mut len: u32 = 0;

        unsafe {
            // First call reports the required buffer length (S_FALSE)
            let _ = AssocQueryStringW(
                ASSOCF_NONE,
                kind,
                &assoc,
                PCWSTR::null(),
                PWSTR::null(),
                &mut len,
            );
            if len == 0 {
                anyhow::bail!("AssocQueryStringW returned no data for {extension}");
            }

            let mut buffer = vec![0u16; len as usize];
            AssocQueryStringW(
                ASSOCF_NONE,
                kind,
                &assoc,
                PCWSTR::null(),
                PWSTR(buffer.as_mut_ptr()),
                &mut len,
            )
            .ok()
            .with_context(|| format!("AssocQueryStringW failed for {extension}"))?;

            let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
            Ok(String::from_utf16_lossy(&buffer[..end]))
        }
    }
}
