//! leproc launcher binary

use clap::Parser;
use leproc::exit_codes::*;
use leproc::launch::association::default_association_store;
use leproc::launch::elevation::default_relauncher;
use leproc::launch::gateway::default_gateway;
use leproc::launch::locale::default_locale_service;
use leproc::launch::report::{Reporter, report_error, reporter_for};
use leproc::launch::{LaunchContext, SearchPath};
use leproc::utils::launcher_dir;
use leproc::{
    LaunchError, LaunchOptions, LaunchOutcome, LauncherConfig, launch_target, prepare_launch,
};
use std::{env, panic, path::PathBuf, process};

const VERSION: &str = leproc::version::VERSION;

#[derive(Parser, Debug)]
#[command(
    version = VERSION,
    about = "Run a program under an emulated locale",
    override_usage = "leproc [OPTIONS] <TARGET> [ARGS]..."
)]
struct Args {
    /// Locale profile (JSON); overrides LEPROC_PROFILE
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, json:<level>)
    #[arg(long)]
    log_level: Option<String>,

    /// Target program or document, followed by its arguments
    #[arg(
        value_name = "TARGET",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    command: Vec<String>,
}

fn main() {
    // Set up panic handler to return specific exit code
    panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        process::exit(EXIT_PANIC);
    }));

    let result = panic::catch_unwind(run);

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(_) => {
            eprintln!("Fatal: Unhandled panic in leproc");
            process::exit(EXIT_PANIC);
        }
    }
}

fn run() -> i32 {
    let args = Args::parse();

    if let Some(ref level) = args.log_level {
        leproc::logger::JsonLogger::init_with_level(level, "CLI --log-level");
    } else {
        leproc::logger::JsonLogger::init();
    }

    log::debug!("🚀 leproc {} started", leproc::version::full_version());
    log::trace!("📋 Arguments: {:?}", args);

    let mut config = LauncherConfig::from_env();
    if let Some(profile) = args.profile.clone() {
        config.profile_path = Some(profile);
    }
    log::trace!("⚙️ Configuration: {:?}", config);

    let reporter = reporter_for(config.diagnostics);
    match launch(&args, &config, reporter.as_ref()) {
        Ok(outcome) => {
            log::debug!("🏁 Outcome: {:?}", outcome);
            outcome.exit_code(&config)
        }
        Err(LaunchError::Usage) => {
            eprintln!("{}", LaunchError::Usage);
            EXIT_INVALID_ARGS
        }
        Err(e) => {
            report_error(reporter.as_ref(), &e);
            config.exit_code_for_error(&e)
        }
    }
}

fn launch(
    args: &Args,
    config: &LauncherConfig,
    reporter: &dyn Reporter,
) -> leproc::Result<LaunchOutcome> {
    let root = match config.root_dir {
        Some(ref dir) => dir.clone(),
        None => launcher_dir()?,
    };
    let prepared = prepare_launch(&root, &args.command, config)?;
    let gateway = default_gateway(&root)?;

    let locales = default_locale_service();
    let associations = default_association_store();
    let context = LaunchContext {
        current_dir: env::current_dir()?,
        search_path: SearchPath::from_env(),
        locales: locales.as_ref(),
        associations: associations.as_ref(),
    };

    let relauncher = default_relauncher();
    let options = LaunchOptions {
        gateway: gateway.as_ref(),
        reporter,
        relauncher: relauncher.as_ref(),
        launcher_exe: env::current_exe()?,
        launcher_args: env::args().skip(1).collect(),
    };

    launch_target(
        &prepared.request,
        &prepared.profile,
        &context,
        &options,
        config,
    )
}
