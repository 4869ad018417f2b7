//! Vendor catalog XML decoding and shared element types
//!
//! Catalog files are published either as UTF-8 or as UTF-16 with a byte
//! order mark. Both are decoded to a `String` before being handed to
//! quick-xml's serde deserializer.

use quick_xml::de::from_str;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Document is not valid UTF-16: {0}")]
    Utf16(#[from] std::string::FromUtf16Error),
    #[error("UTF-16 document has an odd byte length ({0})")]
    OddLength(usize),
    #[error("Failed to parse XML: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// Decode raw document bytes to text, honoring a UTF-8 or UTF-16 BOM
pub fn decode_text(bytes: &[u8]) -> Result<String, DocumentError> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => Ok(String::from_utf8(rest.to_vec())?),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => Ok(String::from_utf8(bytes.to_vec())?),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, DocumentError> {
    if bytes.len() % 2 != 0 {
        return Err(DocumentError::OddLength(bytes.len()));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16(&units)?)
}

/// Drop a leading `<?xml ... ?>` declaration.
///
/// The declared encoding no longer applies once the text has been decoded.
fn strip_declaration(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return &trimmed[end + 2..];
        }
    }
    trimmed
}

/// Decode and deserialize an XML document
pub fn parse_xml<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DocumentError> {
    let text = decode_text(bytes)?;
    Ok(from_str(strip_declaration(&text))?)
}

/// Localized display text, usually wrapped in CDATA
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Display {
    #[serde(rename = "@lang", default)]
    pub lang: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: String,
}

/// `<Model systemID=".."><Display>5490</Display></Model>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "@systemID", default)]
    pub system_id: Option<String>,
    #[serde(rename = "Display", default)]
    pub display: Option<Display>,
}

/// Product line grouping of models
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(rename = "@prefix", default)]
    pub prefix: Option<String>,
    #[serde(rename = "Display", default)]
    pub display: Option<Display>,
    #[serde(rename = "Model", default)]
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportedSystems {
    #[serde(rename = "Brand", default)]
    pub brands: Vec<Brand>,
}

impl SupportedSystems {
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.brands.iter().flat_map(|b| b.models.iter())
    }

    pub fn system_ids(&self) -> impl Iterator<Item = &str> {
        self.models().filter_map(|m| m.system_id.as_deref())
    }

    pub fn model_displays(&self) -> impl Iterator<Item = &str> {
        self.models()
            .filter_map(|m| m.display.as_ref())
            .map(|d| d.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le_with_bom(s: &str) -> Vec<u8> {
        let mut out = vec![0xFF, 0xFE];
        for unit in s.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_plain_utf8() {
        assert_eq!(decode_text(b"<a/>").unwrap(), "<a/>");
    }

    #[test]
    fn test_decode_utf8_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBF<a/>").unwrap(), "<a/>");
    }

    #[test]
    fn test_decode_utf16le_bom() {
        let bytes = utf16le_with_bom("<a>Latitude</a>");
        assert_eq!(decode_text(&bytes).unwrap(), "<a>Latitude</a>");
    }

    #[test]
    fn test_decode_utf16_odd_length() {
        let result = decode_text(&[0xFF, 0xFE, 0x3C]);
        assert!(matches!(result, Err(DocumentError::OddLength(1))));
    }

    #[test]
    fn test_parse_supported_systems_with_cdata() {
        let xml = r#"<?xml version="1.0" encoding="utf-16"?>
<SupportedSystems>
    <Brand key="4" prefix="LAT">
        <Display lang="en"><![CDATA[Latitude]]></Display>
        <Model systemID="07A8" systemIDType="BIOS">
            <Display lang="en"><![CDATA[5490]]></Display>
        </Model>
        <Model systemID="07A9">
            <Display lang="en"><![CDATA[5590]]></Display>
        </Model>
    </Brand>
</SupportedSystems>"#;

        let systems: SupportedSystems = parse_xml(&utf16le_with_bom(xml)).unwrap();
        assert_eq!(systems.brands.len(), 1);
        assert_eq!(systems.brands[0].prefix.as_deref(), Some("LAT"));
        assert_eq!(systems.system_ids().collect::<Vec<_>>(), vec!["07A8", "07A9"]);
        assert_eq!(systems.model_displays().collect::<Vec<_>>(), vec!["5490", "5590"]);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result: Result<SupportedSystems, _> = parse_xml(b"<SupportedSystems><Brand>");
        assert!(matches!(result, Err(DocumentError::Xml(_))));
    }
}
