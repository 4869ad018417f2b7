//! Cabinet archive extraction
//!
//! The vendor publishes catalog documents as single-file cabinets. Payloads
//! without the cabinet signature are passed through unchanged.

use biosup_core::UpdateError;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

const CAB_SIGNATURE: &[u8; 4] = b"MSCF";

pub fn is_cabinet(bytes: &[u8]) -> bool {
    bytes.starts_with(CAB_SIGNATURE)
}

/// Name of the XML member inside a manifest cabinet
///
/// `FOLDER01/1/Latitude_07A8.cab` -> `Latitude_07A8.xml`
pub fn member_name_for(path: &str) -> String {
    let file = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
    Path::new(file)
        .with_extension("xml")
        .to_string_lossy()
        .into_owned()
}

/// Extract `member` from a cabinet, matching the name case-insensitively
pub fn extract_member(bytes: &[u8], member: &str) -> Result<Vec<u8>, UpdateError> {
    if !is_cabinet(bytes) {
        debug!(member = %member, "Payload is not a cabinet, using it as-is");
        return Ok(bytes.to_vec());
    }

    let mut cabinet =
        cab::Cabinet::new(Cursor::new(bytes)).map_err(|e| UpdateError::archive(member, e))?;

    let stored_name = cabinet
        .folder_entries()
        .flat_map(|folder| folder.file_entries())
        .map(|file| file.name().to_string())
        .find(|name| name.eq_ignore_ascii_case(member))
        .ok_or_else(|| UpdateError::archive(member, "member not present in cabinet"))?;

    let mut reader = cabinet
        .read_file(&stored_name)
        .map_err(|e| UpdateError::archive(member, e))?;
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|e| UpdateError::archive(member, e))?;

    debug!(member = %stored_name, size = out.len(), "Extracted cabinet member");
    Ok(out)
}
