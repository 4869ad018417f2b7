//! Per-model manifest parsing and package selection
//!
//! Selection uses two tiers, stopping at the first one that matches anything:
//! 1. Supported device display strings containing the model token
//! 2. Supported model display strings containing the model token
//!
//! Within the winning tier the last candidate in document order is taken as
//! the latest. The vendor lists packages oldest first, so this is positional
//! and intentionally not a numeric maximum.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::document::{parse_xml, Display, DocumentError, SupportedSystems};
use crate::model_token::ModelToken;

/// Vendor component type code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Bios,
    Driver,
    Firmware,
    Application,
    Other(String),
}

impl ComponentKind {
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        if code.eq_ignore_ascii_case("BIOS") {
            Self::Bios
        } else if code.eq_ignore_ascii_case("DRVR") {
            Self::Driver
        } else if code.eq_ignore_ascii_case("FRMW") {
            Self::Firmware
        } else if code.eq_ignore_ascii_case("APAC") {
            Self::Application
        } else {
            Self::Other(code.to_string())
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Bios => "BIOS",
            Self::Driver => "DRVR",
            Self::Firmware => "FRMW",
            Self::Application => "APAC",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Element carrying a single `value` attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueElement {
    #[serde(rename = "@value", default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Named {
    #[serde(rename = "Display", default)]
    pub display: Option<Display>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "@componentID", default)]
    pub component_id: Option<String>,
    #[serde(rename = "Display", default)]
    pub display: Option<Display>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportedDevices {
    #[serde(rename = "Device", default)]
    pub devices: Vec<Device>,
}

/// `<SoftwareComponent>` element of a per-model manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftwareComponent {
    #[serde(rename = "@dellVersion", default)]
    pub dell_version: String,
    #[serde(rename = "@path", default)]
    pub path: String,
    #[serde(rename = "@releaseDate", default)]
    pub release_date: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<Named>,
    #[serde(rename = "ComponentType", default)]
    pub component_type: Option<ValueElement>,
    #[serde(rename = "SupportedDevices", default)]
    pub supported_devices: Option<SupportedDevices>,
    #[serde(rename = "SupportedSystems", default)]
    pub supported_systems: Option<SupportedSystems>,
    #[serde(rename = "Criticality", default)]
    pub criticality: Option<ValueElement>,
}

/// Parsed per-model manifest (`Manifest`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    #[serde(rename = "SoftwareComponent", default)]
    pub components: Vec<SoftwareComponent>,
}

impl ModelManifest {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        parse_xml(bytes)
    }

    pub fn from_xml(xml: &str) -> Result<Self, DocumentError> {
        Self::from_bytes(xml.as_bytes())
    }

    /// Flattened package candidates, in document order
    pub fn candidates(&self) -> Vec<PackageCandidate> {
        self.components.iter().map(PackageCandidate::from).collect()
    }
}

/// Update package as seen by the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageCandidate {
    pub component_type: ComponentKind,
    pub supported_device_displays: Vec<String>,
    pub supported_model_displays: Vec<String>,
    pub version_raw: String,
    pub download_path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub criticality: Option<String>,
}

impl From<&SoftwareComponent> for PackageCandidate {
    fn from(c: &SoftwareComponent) -> Self {
        Self {
            component_type: c
                .component_type
                .as_ref()
                .map(|t| ComponentKind::from_code(&t.value))
                .unwrap_or_else(|| ComponentKind::Other(String::new())),
            supported_device_displays: c
                .supported_devices
                .iter()
                .flat_map(|d| d.devices.iter())
                .filter_map(|d| d.display.as_ref())
                .map(|d| d.text.clone())
                .collect(),
            supported_model_displays: c
                .supported_systems
                .iter()
                .flat_map(|s| s.model_displays())
                .map(str::to_string)
                .collect(),
            version_raw: c.dell_version.clone(),
            download_path: c.path.clone(),
            name: c
                .name
                .as_ref()
                .and_then(|n| n.display.as_ref())
                .map(|d| d.text.clone()),
            release_date: c.release_date.clone(),
            criticality: c.criticality.as_ref().map(|v| v.value.clone()),
        }
    }
}

/// Which matching tier produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    SupportedDevice,
    SupportedModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub package: &'a PackageCandidate,
    pub tier: MatchTier,
    /// Number of candidates that matched in the winning tier
    pub matched: usize,
}

/// Tier 1: device display strings
pub fn device_tier<'a>(
    candidates: &'a [PackageCandidate],
    token: &ModelToken,
    kind: &ComponentKind,
) -> Vec<&'a PackageCandidate> {
    candidates
        .iter()
        .filter(|c| &c.component_type == kind)
        .filter(|c| c.supported_device_displays.iter().any(|d| token.matches(d)))
        .collect()
}

/// Tier 2: model display strings
pub fn model_tier<'a>(
    candidates: &'a [PackageCandidate],
    token: &ModelToken,
    kind: &ComponentKind,
) -> Vec<&'a PackageCandidate> {
    candidates
        .iter()
        .filter(|c| &c.component_type == kind)
        .filter(|c| c.supported_model_displays.iter().any(|d| token.matches(d)))
        .collect()
}

/// Select the latest package of `kind` for the model token
pub fn select_latest_package<'a>(
    candidates: &'a [PackageCandidate],
    token: &ModelToken,
    kind: &ComponentKind,
) -> Option<Selection<'a>> {
    let (tier, matches) = {
        let primary = device_tier(candidates, token, kind);
        if primary.is_empty() {
            (MatchTier::SupportedModel, model_tier(candidates, token, kind))
        } else {
            (MatchTier::SupportedDevice, primary)
        }
    };

    debug!(
        token = %token,
        kind = %kind,
        tier = ?tier,
        matched = matches.len(),
        "Manifest package filter"
    );

    matches.last().copied().map(|package| Selection {
        package,
        tier,
        matched: matches.len(),
    })
}

pub fn select_latest_bios_package<'a>(
    candidates: &'a [PackageCandidate],
    token: &ModelToken,
) -> Option<Selection<'a>> {
    select_latest_package(candidates, token, &ComponentKind::Bios)
}
