//! Root catalog index: system id -> per-model manifest path
//!
//! Document shape:
//! ```text
//! ManifestIndex
//!   GroupManifest*
//!     SupportedSystems/Brand*/Model*[@systemID]
//!     ManifestInformation[@path]
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{parse_xml, DocumentError, SupportedSystems};

/// Location of a per-model manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestInformation {
    #[serde(rename = "@path", default)]
    pub path: String,
    #[serde(rename = "@version", default)]
    pub version: Option<String>,
}

/// One model family entry of the root catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupManifest {
    #[serde(rename = "SupportedSystems", default)]
    pub supported_systems: SupportedSystems,
    #[serde(rename = "ManifestInformation", default)]
    pub manifest_information: ManifestInformation,
}

impl GroupManifest {
    /// System ids are hex codes; compared without regard to case
    pub fn supports(&self, system_id: &str) -> bool {
        self.supported_systems
            .system_ids()
            .any(|id| id.trim().eq_ignore_ascii_case(system_id))
    }
}

/// Parsed root catalog (`ManifestIndex`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogIndex {
    #[serde(rename = "GroupManifest", default)]
    pub groups: Vec<GroupManifest>,
}

impl CatalogIndex {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        parse_xml(bytes)
    }

    pub fn from_xml(xml: &str) -> Result<Self, DocumentError> {
        Self::from_bytes(xml.as_bytes())
    }

    /// Manifest path of the first group listing `system_id`
    ///
    /// Groups without a manifest path are skipped. None means the machine is
    /// not in this catalog.
    pub fn find_manifest_path(&self, system_id: &str) -> Option<&str> {
        let found = self
            .groups
            .iter()
            .filter(|g| !g.manifest_information.path.is_empty())
            .find(|g| g.supports(system_id))
            .map(|g| g.manifest_information.path.as_str());
        debug!(
            system_id = %system_id,
            groups = self.groups.len(),
            path = ?found,
            "Catalog index lookup"
        );
        found
    }
}
