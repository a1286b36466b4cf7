//! leproc - launch Windows programs under an emulated locale
//!
//! This crate turns a target path plus a locale profile into an immutable
//! launch descriptor and hands it to the Locale Emulator native loader.

// Enforce strict code quality and reliability
#![deny(
    // Safety
    unsafe_code,

    // Correctness
    missing_debug_implementations,

    // Future compatibility
    future_incompatible,

    // Rust 2018 idioms
    rust_2018_idioms,
)]
#![warn(
    // Error handling best practices
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo,

    // Performance
    clippy::inefficient_to_string,
    clippy::large_enum_variant,

    // Code clarity and maintainability
    clippy::cognitive_complexity,
    clippy::type_complexity,

    // Best practices
    clippy::clone_on_ref_ptr,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::if_not_else,
    clippy::needless_continue,
    clippy::explicit_iter_loop,
    clippy::explicit_into_iter_loop,
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod api;
pub mod config;
pub mod exceptions;
pub mod exit_codes;
pub mod launch;
pub mod logger;
pub mod profile;
pub mod utils;
pub mod version;

// Re-export main API
pub use api::{LaunchOptions, LaunchOutcome, PreparedLaunch, launch_target, prepare_launch};
pub use config::LauncherConfig;
pub use exceptions::{LaunchError, Result};
pub use profile::LocaleProfile;
