//! High-level API for leproc launches

use crate::config::{AssociationPolicy, LauncherConfig};
use crate::exceptions::{LaunchError, Result};
use crate::exit_codes::{EXIT_EXECUTION_ERROR, EXIT_SUCCESS};
use crate::launch::descriptor::{LaunchContext, LaunchDescriptorBuilder, LaunchRequest};
use crate::launch::elevation::Relauncher;
use crate::launch::gateway::{
    ERROR_ELEVATION_REQUIRED, NativeLoaderGateway, check_native_components,
};
use crate::launch::report::{DIAGNOSTIC_TITLE, Reporter, report_error, report_result};
use crate::profile::LocaleProfile;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Collaborators and identity of one launcher invocation
#[derive(Debug)]
pub struct LaunchOptions<'a> {
    pub gateway: &'a dyn NativeLoaderGateway,
    pub reporter: &'a dyn Reporter,
    pub relauncher: &'a dyn Relauncher,
    /// Launcher executable, restarted when the target needs elevation
    pub launcher_exe: PathBuf,
    /// Launcher arguments, passed unchanged to the elevated copy
    pub launcher_args: Vec<String>,
}

/// How a launch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The loader created the target process
    Started,
    /// The loader returned a non-zero code; a diagnostic has been shown
    Failed { code: u32 },
    /// No opener for a document target; nothing was started
    Unassociated { extension: String },
    /// An elevated copy of the launcher took over
    Relaunched,
}

impl LaunchOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self, config: &LauncherConfig) -> i32 {
        match self {
            LaunchOutcome::Started | LaunchOutcome::Relaunched => EXIT_SUCCESS,
            LaunchOutcome::Failed { code } => config.exit_code_for(*code),
            LaunchOutcome::Unassociated { .. } => match config.association_policy {
                AssociationPolicy::Silent => EXIT_SUCCESS,
                AssociationPolicy::Report => config.apply_exit_policy(EXIT_EXECUTION_ERROR),
            },
        }
    }
}

/// Validated command line and profile, ready for `launch_target`
#[derive(Debug, Clone)]
pub struct PreparedLaunch {
    pub request: LaunchRequest,
    pub profile: LocaleProfile,
}

/// Check the installation, then parse the command and load the profile.
///
/// A missing native component wins over a usage error or a broken profile:
/// without the loader nothing else can succeed.
pub fn prepare_launch(
    root: &Path,
    command: &[String],
    config: &LauncherConfig,
) -> Result<PreparedLaunch> {
    check_native_components(root)?;

    let Some((target, target_args)) = command.split_first() else {
        return Err(LaunchError::Usage);
    };

    let profile = match config.profile_path {
        Some(ref path) => LocaleProfile::load(path)?,
        None => LocaleProfile::default(),
    };

    Ok(PreparedLaunch {
        request: LaunchRequest::new(target.clone(), target_args.to_vec()),
        profile,
    })
}

/// Build the descriptor for `request` and hand it to the native loader.
///
/// Errors that occur before the loader is called are returned unreported,
/// except a missing file association which is handled per
/// `config.association_policy`. A non-zero loader code is reported exactly
/// once through `options.reporter`.
pub fn launch_target(
    request: &LaunchRequest,
    profile: &LocaleProfile,
    context: &LaunchContext<'_>,
    options: &LaunchOptions<'_>,
    config: &LauncherConfig,
) -> Result<LaunchOutcome> {
    debug!(
        "🚀 Launching '{}' with profile '{}' ({})",
        request.target, profile.name, profile.location
    );

    let descriptor = match LaunchDescriptorBuilder::new(context).build(request, profile) {
        Ok(descriptor) => descriptor,
        Err(LaunchError::AssociationNotFound(extension)) => {
            match config.association_policy {
                AssociationPolicy::Silent => {
                    info!("🔗 No program is associated with {extension}, nothing to start");
                }
                AssociationPolicy::Report => {
                    let err = LaunchError::AssociationNotFound(extension.clone());
                    options
                        .reporter
                        .show(DIAGNOSTIC_TITLE, &format!("{}: {}", request.target, err));
                }
            }
            return Ok(LaunchOutcome::Unassociated { extension });
        }
        Err(e) => return Err(e),
    };

    let code = options.gateway.start(&descriptor);
    if code == 0 {
        info!("✅ Started {}", descriptor.application_name().display());
        return Ok(LaunchOutcome::Started);
    }

    if code == ERROR_ELEVATION_REQUIRED {
        warn!("🛡️ Target requires elevation");
        match options
            .relauncher
            .relaunch_elevated(
                &options.launcher_exe,
                &options.launcher_args,
                &context.current_dir,
            )
        {
            Ok(()) => return Ok(LaunchOutcome::Relaunched),
            Err(e) => {
                report_error(options.reporter, &e);
                return Ok(LaunchOutcome::Failed { code });
            }
        }
    }

    report_result(options.reporter, code, descriptor.command_line());
    Ok(LaunchOutcome::Failed { code })
}
