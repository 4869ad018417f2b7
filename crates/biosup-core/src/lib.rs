//! biosup Core - Catalog resolution and firmware version comparison
//!
//! This crate decides whether a BIOS update applies to the local machine:
//! - Version parsing for dotted and compact vendor labels
//! - Model code extraction and system id resolution
//! - Root catalog lookup of the per-model manifest
//! - Two-tier BIOS package selection within a manifest
//! - The final update decision
//!
//! Everything here is synchronous and performs no I/O; documents are passed
//! in already fetched.

pub mod catalog;
pub mod context;
pub mod decision;
pub mod document;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod model_token;
pub mod version;

pub use catalog::{CatalogIndex, GroupManifest};
pub use context::RunContext;
pub use decision::{IndeterminateReason, PackageRef, UpdateDecision};
pub use document::DocumentError;
pub use error::UpdateError;
pub use identity::{resolve_system_id, HardwareIdentity, IdentityError};
pub use manifest::{
    select_latest_bios_package, select_latest_package, ComponentKind, MatchTier, ModelManifest,
    PackageCandidate, Selection,
};
pub use model_token::{ModelToken, ModelTokenError};
pub use version::{compare, ParsedVersion, VersionCode, VersionError};
