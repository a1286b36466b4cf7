//! Launch configuration and native loader handoff
//!
//! Leaves first: `charset`, `paths`, `command`, `association`, `locale`,
//! `registry`; then `descriptor` composes them into a [`LaunchDescriptor`]
//! that a [`NativeLoaderGateway`] turns into a running process.

pub mod association;
pub mod charset;
pub mod command;
pub mod descriptor;
pub mod elevation;
pub mod gateway;
pub mod leb;
pub mod locale;
pub mod paths;
pub mod registry;
pub mod report;
pub mod timezone;

pub use association::{AssociationStore, FileAssociation, StaticAssociations};
pub use descriptor::{LaunchContext, LaunchDescriptor, LaunchDescriptorBuilder, LaunchRequest};
pub use elevation::Relauncher;
pub use gateway::NativeLoaderGateway;
pub use locale::{BuiltinLocales, LocaleInfo, LocaleService};
pub use paths::SearchPath;
pub use registry::{RegistryRedirectionEntry, RegistryRoot, RegistryValue};
pub use report::Reporter;
