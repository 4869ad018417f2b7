//! System identifier resolution from raw hardware identity fields

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position in the OEM string table that carries the bracketed system id
const OEM_SYSTEM_ID_INDEX: usize = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("No SKU number and only {0} OEM string(s); need at least 2")]
    MissingOemString(usize),
    #[error("OEM string {0:?} has no [..] delimited system id")]
    MissingDelimiters(String),
    #[error("OEM string {0:?} has an empty system id")]
    EmptyIdentifier(String),
}

/// Raw identity read from the local machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareIdentity {
    /// Full vendor model string (e.g. "Latitude 5490")
    pub model: String,
    /// Vendor SKU field, authoritative when present
    #[serde(default)]
    pub sku_number: Option<String>,
    /// SMBIOS OEM strings, in table order
    #[serde(default)]
    pub oem_strings: Vec<String>,
    /// Currently installed BIOS version, vendor format
    pub installed_version: String,
}

impl HardwareIdentity {
    pub fn system_id(&self) -> Result<String, IdentityError> {
        resolve_system_id(self.sku_number.as_deref(), &self.oem_strings)
    }
}

/// Resolve the vendor system identifier
///
/// A non-blank SKU number wins and is returned as given. Otherwise the id is
/// read from between the first `[` and the following `]` of the second OEM
/// string.
pub fn resolve_system_id(
    sku_number: Option<&str>,
    oem_strings: &[String],
) -> Result<String, IdentityError> {
    if let Some(sku) = sku_number.filter(|s| !s.trim().is_empty()) {
        return Ok(sku.to_string());
    }

    let entry = oem_strings
        .get(OEM_SYSTEM_ID_INDEX)
        .ok_or(IdentityError::MissingOemString(oem_strings.len()))?;

    let open = entry
        .find('[')
        .ok_or_else(|| IdentityError::MissingDelimiters(entry.clone()))?;
    let rest = &entry[open + 1..];
    let close = rest
        .find(']')
        .ok_or_else(|| IdentityError::MissingDelimiters(entry.clone()))?;

    let id = rest[..close].trim();
    if id.is_empty() {
        return Err(IdentityError::EmptyIdentifier(entry.clone()));
    }
    Ok(id.to_string())
}
