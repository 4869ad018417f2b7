//! Immutable per-run context threaded through catalog lookup and decision

use serde::Serialize;
use tracing::{debug, warn};

use crate::identity::{HardwareIdentity, IdentityError};
use crate::model_token::ModelToken;
use crate::version::ParsedVersion;

/// Everything derived from the local machine once per run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunContext {
    pub identity: HardwareIdentity,
    pub system_id: String,
    /// Empty when the model string carries no recognizable code
    pub model_token: ModelToken,
    pub installed_version: ParsedVersion,
}

impl RunContext {
    /// Derive the run context from a raw hardware identity
    ///
    /// Only an unresolvable system id is an error. A missing model token or
    /// an unrecognized installed version are logged and carried along.
    pub fn resolve(identity: HardwareIdentity) -> Result<Self, IdentityError> {
        let system_id = identity.system_id()?;

        let tokens = ModelToken::find_all(&identity.model);
        let model_token = match tokens.as_slice() {
            [] => {
                warn!(
                    model = %identity.model,
                    "No model code in model string, package matching will find nothing"
                );
                ModelToken::empty()
            }
            [only] => only.clone(),
            [first, rest @ ..] => {
                warn!(
                    model = %identity.model,
                    using = %first,
                    ignored = ?rest.iter().map(ModelToken::as_str).collect::<Vec<_>>(),
                    "Model string has several model codes, using the first"
                );
                first.clone()
            }
        };

        let installed_version = ParsedVersion::parse(&identity.installed_version);
        if !installed_version.is_valid() {
            warn!(
                version = %identity.installed_version,
                "Installed BIOS version is not in a recognized format"
            );
        }

        debug!(
            system_id = %system_id,
            model_token = %model_token,
            installed = %installed_version,
            "Resolved run context"
        );

        Ok(Self {
            identity,
            system_id,
            model_token,
            installed_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(model: &str, sku: Option<&str>, version: &str) -> HardwareIdentity {
        HardwareIdentity {
            model: model.to_string(),
            sku_number: sku.map(str::to_string),
            oem_strings: vec!["Dell System".to_string(), "1[081C]".to_string()],
            installed_version: version.to_string(),
        }
    }

    #[test]
    fn test_resolve_full_identity() {
        let ctx = RunContext::resolve(identity("Latitude 7490", Some("081C"), "1.10.0")).unwrap();
        assert_eq!(ctx.system_id, "081C");
        assert_eq!(ctx.model_token.as_str(), "7490");
        assert!(ctx.installed_version.is_valid());
    }

    #[test]
    fn test_resolve_without_sku_uses_oem_strings() {
        let ctx = RunContext::resolve(identity("Latitude 7490", None, "A08")).unwrap();
        assert_eq!(ctx.system_id, "081C");
        assert!(matches!(ctx.installed_version, ParsedVersion::Compact { .. }));
    }

    #[test]
    fn test_missing_token_is_not_fatal() {
        let ctx = RunContext::resolve(identity("XPS 13", Some("081C"), "1.0.0")).unwrap();
        assert!(ctx.model_token.is_empty());
    }

    #[test]
    fn test_several_tokens_uses_first() {
        let ctx =
            RunContext::resolve(identity("Latitude 7490 / 7290 Combo", Some("081C"), "1.0.0"))
                .unwrap();
        assert_eq!(ctx.model_token.as_str(), "7490");
        assert!(ctx.model_token.matches("Latitude 7490 System BIOS"));
        assert!(!ctx.model_token.matches("Latitude 7290 System BIOS"));
    }

    #[test]
    fn test_unresolvable_identity_is_fatal() {
        let mut raw = identity("Latitude 7490", None, "1.0.0");
        raw.oem_strings.truncate(1);
        assert_eq!(
            RunContext::resolve(raw),
            Err(IdentityError::MissingOemString(1))
        );
    }
}
