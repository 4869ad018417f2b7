//! Update decision: combines catalog lookup, package selection and version
//! comparison into a single terminal outcome
//!
//! ```text
//! Resolving -> UpToDate | UpdateAvailable | Unsupported | Indeterminate
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::{info, warn};

use crate::catalog::CatalogIndex;
use crate::context::RunContext;
use crate::error::UpdateError;
use crate::manifest::{select_latest_bios_package, MatchTier, PackageCandidate};
use crate::version::{ParsedVersion, VersionError};

/// Package chosen for installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRef {
    pub version: String,
    pub download_path: String,
    pub tier: MatchTier,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl PackageRef {
    fn new(package: &PackageCandidate, tier: MatchTier) -> Self {
        Self {
            version: package.version_raw.clone(),
            download_path: package.download_path.clone(),
            tier,
            name: package.name.clone(),
            release_date: package.release_date.clone(),
        }
    }

    /// File name component of the download path
    pub fn file_name(&self) -> &str {
        self.download_path
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(self.download_path.as_str())
    }
}

/// Why freshness could not be determined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IndeterminateReason {
    /// Manifest parsed but no BIOS package matched the model
    NoCandidatePackage { model_token: String },
    /// Installed version string could not be parsed
    InstalledVersion { raw: String },
    /// Catalog version string could not be parsed
    CandidateVersion { raw: String, package: PackageRef },
}

/// Terminal outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateDecision {
    /// Installed version is at least the catalog version
    UpToDate { installed: String, latest: String },
    /// A newer package is available
    UpdateAvailable { installed: String, package: PackageRef },
    /// System id is not in the catalog
    Unsupported { system_id: String },
    /// Freshness cannot be determined
    Indeterminate(IndeterminateReason),
}

impl UpdateDecision {
    /// Locate the manifest path for the run's system id
    ///
    /// Err carries the terminal `Unsupported` decision.
    pub fn locate_manifest<'c>(
        ctx: &RunContext,
        catalog: &'c CatalogIndex,
    ) -> Result<&'c str, UpdateDecision> {
        catalog.find_manifest_path(&ctx.system_id).ok_or_else(|| {
            info!(system_id = %ctx.system_id, "System not found in catalog");
            UpdateDecision::Unsupported {
                system_id: ctx.system_id.clone(),
            }
        })
    }

    /// Decide from the candidates of the model's manifest
    pub fn evaluate(ctx: &RunContext, candidates: &[PackageCandidate]) -> Self {
        match select_latest_bios_package(candidates, &ctx.model_token) {
            Some(selection) => Self::compare(
                &ctx.installed_version,
                PackageRef::new(selection.package, selection.tier),
            ),
            None => {
                warn!(model_token = %ctx.model_token, "No BIOS package matched this model");
                UpdateDecision::Indeterminate(IndeterminateReason::NoCandidatePackage {
                    model_token: ctx.model_token.to_string(),
                })
            }
        }
    }

    /// Compare the installed version against a selected package
    pub fn compare(installed: &ParsedVersion, package: PackageRef) -> Self {
        let candidate = ParsedVersion::parse(&package.version);

        let Some(installed_code) = installed.code() else {
            warn!(raw = %installed.raw(), "Cannot compare: installed version unrecognized");
            return UpdateDecision::Indeterminate(IndeterminateReason::InstalledVersion {
                raw: installed.raw().to_string(),
            });
        };
        let Some(candidate_code) = candidate.code() else {
            warn!(raw = %package.version, "Cannot compare: catalog version unrecognized");
            return UpdateDecision::Indeterminate(IndeterminateReason::CandidateVersion {
                raw: package.version.clone(),
                package,
            });
        };

        match installed_code.cmp(candidate_code) {
            Ordering::Less => UpdateDecision::UpdateAvailable {
                installed: installed.raw().to_string(),
                package,
            },
            Ordering::Equal | Ordering::Greater => UpdateDecision::UpToDate {
                installed: installed.raw().to_string(),
                latest: package.version,
            },
        }
    }

    /// Full decision over already-loaded documents
    ///
    /// `load_manifest` is only called when the catalog lists the system.
    pub fn resolve<F>(
        ctx: &RunContext,
        catalog: &CatalogIndex,
        load_manifest: F,
    ) -> Result<Self, UpdateError>
    where
        F: FnOnce(&str) -> Result<Vec<PackageCandidate>, UpdateError>,
    {
        match Self::locate_manifest(ctx, catalog) {
            Ok(path) => {
                let candidates = load_manifest(path)?;
                Ok(Self::evaluate(ctx, &candidates))
            }
            Err(unsupported) => Ok(unsupported),
        }
    }

    pub fn package(&self) -> Option<&PackageRef> {
        match self {
            UpdateDecision::UpdateAvailable { package, .. } => Some(package),
            UpdateDecision::Indeterminate(IndeterminateReason::CandidateVersion {
                package, ..
            }) => Some(package),
            _ => None,
        }
    }

    pub fn is_update_available(&self) -> bool {
        matches!(self, UpdateDecision::UpdateAvailable { .. })
    }

    /// Non-fatal error equivalent of this outcome, if it is not a success
    pub fn as_error(&self) -> Option<UpdateError> {
        match self {
            UpdateDecision::Unsupported { system_id } => Some(UpdateError::UnsupportedSystem {
                system_id: system_id.clone(),
            }),
            UpdateDecision::Indeterminate(IndeterminateReason::NoCandidatePackage {
                model_token,
            }) => Some(UpdateError::NoCandidatePackage {
                kind: "BIOS".to_string(),
                model: model_token.clone(),
            }),
            UpdateDecision::Indeterminate(IndeterminateReason::InstalledVersion { raw })
            | UpdateDecision::Indeterminate(IndeterminateReason::CandidateVersion { raw, .. }) => {
                Some(UpdateError::VersionFormat(VersionError::Format(raw.clone())))
            }
            UpdateDecision::UpToDate { .. } | UpdateDecision::UpdateAvailable { .. } => None,
        }
    }
}

impl fmt::Display for UpdateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateDecision::UpToDate { installed, latest } => {
                write!(f, "BIOS is up to date (installed {}, latest {})", installed, latest)
            }
            UpdateDecision::UpdateAvailable { installed, package } => write!(
                f,
                "BIOS update available: {} -> {} ({})",
                installed,
                package.version,
                package.file_name()
            ),
            UpdateDecision::Unsupported { system_id } => {
                write!(f, "System {} is not supported by the vendor catalog", system_id)
            }
            UpdateDecision::Indeterminate(IndeterminateReason::NoCandidatePackage {
                model_token,
            }) => write!(f, "No BIOS package found for model {:?}", model_token),
            UpdateDecision::Indeterminate(IndeterminateReason::InstalledVersion { raw }) => {
                write!(f, "Cannot determine freshness: installed version {:?} is unrecognized", raw)
            }
            UpdateDecision::Indeterminate(IndeterminateReason::CandidateVersion { raw, .. }) => {
                write!(f, "Cannot determine freshness: catalog version {:?} is unrecognized", raw)
            }
        }
    }
}
