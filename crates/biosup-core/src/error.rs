//! Error taxonomy for a resolution run

use thiserror::Error;

use crate::document::DocumentError;
use crate::identity::IdentityError;
use crate::version::VersionError;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Cannot resolve system identifier: {0}")]
    UnresolvableIdentity(#[from] IdentityError),
    #[error("System {system_id} is not listed in the vendor catalog")]
    UnsupportedSystem { system_id: String },
    #[error("No {kind} package found for model {model:?}")]
    NoCandidatePackage { kind: String, model: String },
    #[error("Version format error: {0}")]
    VersionFormat(#[from] VersionError),
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },
    #[error("Failed to extract {member} from archive: {message}")]
    ArchiveExtraction { member: String, message: String },
    #[error("Failed to parse {document}: {source}")]
    DocumentParse {
        document: String,
        #[source]
        source: DocumentError,
    },
}

impl UpdateError {
    pub fn network(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn archive(member: impl Into<String>, message: impl ToString) -> Self {
        Self::ArchiveExtraction {
            member: member.into(),
            message: message.to_string(),
        }
    }

    pub fn document(document: impl Into<String>, source: DocumentError) -> Self {
        Self::DocumentParse {
            document: document.into(),
            source,
        }
    }

    /// Whether the run must abort rather than report an outcome
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::UnresolvableIdentity(_)
            | Self::Network { .. }
            | Self::ArchiveExtraction { .. }
            | Self::DocumentParse { .. } => true,
            Self::UnsupportedSystem { .. }
            | Self::NoCandidatePackage { .. }
            | Self::VersionFormat(_) => false,
        }
    }
}
