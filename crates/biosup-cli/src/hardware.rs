//! Local hardware identity readers
//!
//! - `FileIdentitySource`: TOML file, for tests and unsupported hosts
//! - `SysfsIdentitySource`: Linux DMI sysfs plus the raw SMBIOS OEM strings table
//! - `CimIdentitySource`: Windows CIM classes queried through PowerShell

use anyhow::{bail, Context, Result};
use biosup_core::HardwareIdentity;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// SMBIOS structure type for OEM strings
const SMBIOS_OEM_STRINGS: u8 = 11;

pub trait IdentitySource {
    fn read(&self) -> Result<HardwareIdentity>;
}

/// Identity described by a TOML file
pub struct FileIdentitySource {
    path: PathBuf,
}

impl FileIdentitySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IdentitySource for FileIdentitySource {
    fn read(&self) -> Result<HardwareIdentity> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read identity file {}", self.path.display()))?;
        let identity: HardwareIdentity = toml::from_str(&content)
            .with_context(|| format!("Invalid identity file {}", self.path.display()))?;
        debug!(path = %self.path.display(), model = %identity.model, "Loaded identity file");
        Ok(identity)
    }
}

/// Linux DMI reader
pub struct SysfsIdentitySource {
    dmi_dir: PathBuf,
    oem_entry: PathBuf,
}

impl Default for SysfsIdentitySource {
    fn default() -> Self {
        Self::with_paths("/sys/class/dmi/id", "/sys/firmware/dmi/entries/11-0/raw")
    }
}

impl SysfsIdentitySource {
    pub fn with_paths(dmi_dir: impl Into<PathBuf>, oem_entry: impl Into<PathBuf>) -> Self {
        Self {
            dmi_dir: dmi_dir.into(),
            oem_entry: oem_entry.into(),
        }
    }

    fn attribute(&self, name: &str) -> Result<Option<String>> {
        let path = self.dmi_dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(value) => {
                let value = value.trim().to_string();
                Ok((!value.is_empty()).then_some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

impl IdentitySource for SysfsIdentitySource {
    fn read(&self) -> Result<HardwareIdentity> {
        let model = self
            .attribute("product_name")?
            .context("DMI product_name is not available")?;
        let installed_version = self
            .attribute("bios_version")?
            .context("DMI bios_version is not available")?;
        let sku_number = self.attribute("product_sku")?;

        let oem_strings = match std::fs::read(&self.oem_entry) {
            Ok(raw) => parse_oem_strings(&raw)?,
            Err(e) => {
                debug!(path = %self.oem_entry.display(), error = %e, "No OEM strings entry");
                Vec::new()
            }
        };

        Ok(HardwareIdentity {
            model,
            sku_number,
            oem_strings,
            installed_version,
        })
    }
}

/// Parse a raw SMBIOS type 11 structure into its string table
///
/// Layout: type (1), length (1), handle (2), count (1), then the
/// NUL-terminated string set ending with a double NUL.
pub fn parse_oem_strings(raw: &[u8]) -> Result<Vec<String>> {
    if raw.len() < 5 {
        bail!("SMBIOS OEM strings entry too short ({} bytes)", raw.len());
    }
    if raw[0] != SMBIOS_OEM_STRINGS {
        bail!("SMBIOS entry has type {}, expected {}", raw[0], SMBIOS_OEM_STRINGS);
    }
    let formatted_len = raw[1] as usize;
    let count = raw[4] as usize;
    if raw.len() < formatted_len {
        bail!("SMBIOS OEM strings entry truncated");
    }

    let strings: Vec<String> = raw[formatted_len..]
        .split(|b| *b == 0)
        .take_while(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .take(count)
        .collect();

    if strings.len() != count {
        debug!(expected = count, found = strings.len(), "OEM string count mismatch");
    }
    Ok(strings)
}

/// Windows CIM reader
#[derive(Default)]
pub struct CimIdentitySource;

const CIM_QUERY: &str = "$cs = Get-CimInstance Win32_ComputerSystem; \
$bios = Get-CimInstance Win32_BIOS; \
[pscustomobject]@{ Model = $cs.Model; SystemSKUNumber = $cs.SystemSKUNumber; \
OEMStringArray = $cs.OEMStringArray; SMBIOSBIOSVersion = $bios.SMBIOSBIOSVersion } \
| ConvertTo-Json -Compress";

/// PowerShell's ConvertTo-Json emits a bare string for one-element arrays
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CimIdentity {
    model: Option<String>,
    #[serde(rename = "SystemSKUNumber")]
    system_sku_number: Option<String>,
    #[serde(rename = "OEMStringArray")]
    oem_string_array: Option<OneOrMany>,
    #[serde(rename = "SMBIOSBIOSVersion")]
    smbios_bios_version: Option<String>,
}

/// Parse the JSON emitted by [`CIM_QUERY`]
pub fn parse_cim_json(json: &str) -> Result<HardwareIdentity> {
    let cim: CimIdentity = serde_json::from_str(json.trim()).context("Invalid CIM output")?;
    let model = cim
        .model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .context("Win32_ComputerSystem.Model is empty")?;
    let installed_version = cim
        .smbios_bios_version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .context("Win32_BIOS.SMBIOSBIOSVersion is empty")?;
    let oem_strings = match cim.oem_string_array {
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    };

    Ok(HardwareIdentity {
        model,
        sku_number: cim.system_sku_number.filter(|s| !s.trim().is_empty()),
        oem_strings,
        installed_version,
    })
}

impl IdentitySource for CimIdentitySource {
    fn read(&self) -> Result<HardwareIdentity> {
        let output = std::process::Command::new("powershell.exe")
            .args(["-NoProfile", "-NonInteractive", "-Command", CIM_QUERY])
            .output()
            .context("Failed to run PowerShell")?;
        if !output.status.success() {
            bail!(
                "CIM query failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        parse_cim_json(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Pick the identity source for this host
pub fn source_for(identity_file: Option<&Path>) -> Box<dyn IdentitySource> {
    match identity_file {
        Some(path) => Box::new(FileIdentitySource::new(path)),
        None if cfg!(windows) => Box::new(CimIdentitySource),
        None => Box::new(SysfsIdentitySource::default()),
    }
}
