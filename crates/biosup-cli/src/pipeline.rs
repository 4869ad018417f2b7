//! Check and update orchestration
//!
//! The run:
//! 1. Read the local hardware identity and resolve the run context
//! 2. Fetch and parse the root catalog
//! 3. Locate, fetch and parse the model's manifest
//! 4. Decide, and for `update` download the package and launch the installer

use anyhow::{Context, Result};
use biosup_core::{
    CatalogIndex, HardwareIdentity, ModelManifest, PackageRef, RunContext, UpdateDecision,
    UpdateError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use crate::archive::{extract_member, member_name_for};
use crate::config::Config;
use crate::fetch::{join_url, Fetcher};
use crate::hardware::source_for;
use crate::installer::InstallerCommand;

/// Machine-readable result of a check
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub run_id: Uuid,
    pub checked_at: DateTime<Utc>,
    pub system_id: String,
    pub model: String,
    pub model_token: String,
    pub installed_version: String,
    pub decision: UpdateDecision,
}

impl CheckReport {
    pub fn new(run_id: Uuid, ctx: &RunContext, decision: UpdateDecision) -> Self {
        Self {
            run_id,
            checked_at: Utc::now(),
            system_id: ctx.system_id.clone(),
            model: ctx.identity.model.clone(),
            model_token: ctx.model_token.to_string(),
            installed_version: ctx.identity.installed_version.clone(),
            decision,
        }
    }
}

pub struct Pipeline {
    config: Config,
    fetcher: Fetcher,
    run_id: Uuid,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = Fetcher::new(&config.http)?;
        Ok(Self {
            config,
            fetcher,
            run_id: Uuid::new_v4(),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Read the raw hardware identity from the configured source
    pub fn read_identity(&self) -> Result<HardwareIdentity> {
        source_for(self.config.identity.file.as_deref())
            .read()
            .context("Failed to read hardware identity")
    }

    /// Read the identity and derive the run context
    pub fn context(&self) -> Result<RunContext> {
        let identity = self.read_identity()?;
        let ctx = RunContext::resolve(identity).map_err(UpdateError::from)?;
        info!(
            system_id = %ctx.system_id,
            model = %ctx.identity.model,
            installed = %ctx.identity.installed_version,
            "Hardware identity resolved"
        );
        Ok(ctx)
    }

    async fn fetch_catalog(&self) -> Result<CatalogIndex> {
        let catalog = &self.config.catalog;
        let bytes = self.fetcher.fetch_document(&catalog.index_url).await?;
        let xml = extract_member(&bytes, &catalog.index_file)?;
        let index = CatalogIndex::from_bytes(&xml)
            .map_err(|e| UpdateError::document(&catalog.index_file, e))?;
        info!(groups = index.groups.len(), "Catalog index loaded");
        Ok(index)
    }

    async fn fetch_manifest(&self, path: &str) -> Result<ModelManifest> {
        let url = join_url(&self.config.catalog.base_url, path);
        let member = member_name_for(path);
        let bytes = self.fetcher.fetch_document(&url).await?;
        let xml = extract_member(&bytes, &member)?;
        let manifest =
            ModelManifest::from_bytes(&xml).map_err(|e| UpdateError::document(&member, e))?;
        info!(
            path = %path,
            components = manifest.components.len(),
            "Model manifest loaded"
        );
        Ok(manifest)
    }

    /// Run the pipeline up to the decision
    pub async fn check(&self, ctx: &RunContext) -> Result<UpdateDecision> {
        let catalog = self.fetch_catalog().await?;
        let path = match UpdateDecision::locate_manifest(ctx, &catalog) {
            Ok(path) => path.to_string(),
            Err(unsupported) => return Ok(unsupported),
        };
        let manifest = self.fetch_manifest(&path).await?;
        let decision = UpdateDecision::evaluate(ctx, &manifest.candidates());
        info!(decision = %decision, "Update decision");
        Ok(decision)
    }

    /// Per-run staging directory
    pub fn staging_dir(&self) -> PathBuf {
        self.config.download.dir.join(self.run_id.to_string())
    }

    /// Download the package into the staging directory
    pub async fn download(&self, package: &PackageRef) -> Result<PathBuf> {
        let dir = self.staging_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let dest = dir.join(package.file_name());
        let url = join_url(&self.config.catalog.base_url, &package.download_path);
        self.fetcher.download_to(&url, &dest).await?;
        Ok(dest)
    }

    pub fn installer_for(&self, package_file: &std::path::Path, no_restart: bool) -> InstallerCommand {
        let mut command = InstallerCommand::from_config(package_file, &self.config.installer);
        if no_restart {
            command.args.retain(|a| a != "/r");
        }
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biosup_core::MatchTier;
    use std::io::{Cursor, Write};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CATALOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ManifestIndex baseLocation="downloads.dell.com">
    <GroupManifest>
        <SupportedSystems>
            <Brand key="4" prefix="LAT">
                <Display lang="en"><![CDATA[Latitude]]></Display>
                <Model systemID="081C"><Display lang="en"><![CDATA[7490]]></Display></Model>
            </Brand>
        </SupportedSystems>
        <ManifestInformation path="FOLDER01/1/Latitude_081C.cab"/>
    </GroupManifest>
</ManifestIndex>"#;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Manifest>
    <SoftwareComponent dellVersion="1.1.0" path="FOLDER9/Latitude_7490_1.1.0.exe">
        <ComponentType value="BIOS"/>
        <SupportedDevices>
            <Device><Display lang="en"><![CDATA[Latitude 7490 System BIOS]]></Display></Device>
        </SupportedDevices>
    </SoftwareComponent>
    <SoftwareComponent dellVersion="1.2.0" path="FOLDER9/Latitude_7490_1.2.0.exe">
        <ComponentType value="BIOS"/>
        <SupportedDevices>
            <Device><Display lang="en"><![CDATA[Latitude 7490 System BIOS]]></Display></Device>
        </SupportedDevices>
    </SoftwareComponent>
</Manifest>"#;

    fn single_file_cabinet(name: &str, data: &[u8]) -> Vec<u8> {
        let mut builder = cab::CabinetBuilder::new();
        builder
            .add_folder(cab::CompressionType::None)
            .add_file(name);
        let mut writer = builder.build(Cursor::new(Vec::new())).unwrap();
        while let Some(mut file) = writer.next_file().unwrap() {
            file.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    async fn serve(server: &MockServer, route: &str, body: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(server)
            .await;
    }

    /// Pipeline pointed at `server` with an identity file for a Latitude 7490
    fn mirror_pipeline(server: &MockServer, dir: &std::path::Path, sku: &str) -> Pipeline {
        let identity = dir.join("machine.toml");
        std::fs::write(
            &identity,
            format!(
                "model = \"Latitude 7490\"\nsku_number = \"{sku}\"\noem_strings = []\ninstalled_version = \"1.1.0\"\n"
            ),
        )
        .unwrap();

        let mut config = Config::default();
        config.catalog.index_url = format!("{}/catalog/CatalogIndexPC.cab", server.uri());
        config.catalog.base_url = server.uri();
        config.download.dir = dir.join("staging");
        config.identity.file = Some(identity);
        Pipeline::new(config).unwrap()
    }

    fn pipeline_in(dir: &std::path::Path) -> Pipeline {
        let mut config = Config::default();
        config.download.dir = dir.to_path_buf();
        config.installer.auto_restart = true;
        Pipeline::new(config).unwrap()
    }

    #[test]
    fn test_staging_dir_is_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let a = pipeline_in(dir.path());
        let b = pipeline_in(dir.path());
        assert_ne!(a.staging_dir(), b.staging_dir());
        assert!(a.staging_dir().starts_with(dir.path()));
        assert!(a.staging_dir().ends_with(a.run_id().to_string()));
    }

    #[test]
    fn test_installer_no_restart_override() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(dir.path());
        let pkg = dir.path().join("bios.exe");
        assert_eq!(pipeline.installer_for(&pkg, false).args, vec!["/s", "/r"]);
        assert_eq!(pipeline.installer_for(&pkg, true).args, vec!["/s"]);
    }

    #[test]
    fn test_context_from_identity_file() {
        let dir = tempfile::tempdir().unwrap();
        let identity = dir.path().join("machine.toml");
        std::fs::write(
            &identity,
            "model = \"Latitude 7490\"\noem_strings = [\"x\"]\ninstalled_version = \"1.0.0\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.identity.file = Some(identity);
        let pipeline = Pipeline::new(config).unwrap();
        let err = pipeline.context().unwrap_err();
        let update_err = err.downcast_ref::<UpdateError>().unwrap();
        assert!(matches!(update_err, UpdateError::UnresolvableIdentity(_)));

        // The raw identity stays readable for diagnostics
        let raw = pipeline.read_identity().unwrap();
        assert_eq!(raw.model, "Latitude 7490");
        assert_eq!(raw.oem_strings, vec!["x"]);
    }

    #[test]
    fn test_report_serialization() {
        let ctx = RunContext::resolve(HardwareIdentity {
            model: "Latitude 7490".to_string(),
            sku_number: Some("081C".to_string()),
            oem_strings: Vec::new(),
            installed_version: "A08".to_string(),
        })
        .unwrap();
        let decision = UpdateDecision::UpdateAvailable {
            installed: "A08".to_string(),
            package: PackageRef {
                version: "1.2.0".to_string(),
                download_path: "FOLDER9/Latitude_7490_1.2.0.exe".to_string(),
                tier: MatchTier::SupportedDevice,
                name: None,
                release_date: None,
            },
        };
        let report = CheckReport::new(Uuid::nil(), &ctx, decision);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["system_id"], "081C");
        assert_eq!(json["model_token"], "7490");
        assert_eq!(json["decision"]["status"], "update_available");
        assert_eq!(json["decision"]["package"]["tier"], "supported_device");
    }

    #[tokio::test]
    async fn test_check_against_mirror() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/catalog/CatalogIndexPC.cab",
            single_file_cabinet("CatalogIndexPC.xml", CATALOG.as_bytes()),
        )
        .await;
        serve(&server, "/FOLDER01/1/Latitude_081C.cab", MANIFEST.as_bytes().to_vec()).await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = mirror_pipeline(&server, dir.path(), "081C");
        let ctx = pipeline.context().unwrap();
        let decision = pipeline.check(&ctx).await.unwrap();

        let package = match &decision {
            UpdateDecision::UpdateAvailable { installed, package } => {
                assert_eq!(installed, "1.1.0");
                package
            }
            other => panic!("unexpected decision: {other}"),
        };
        assert_eq!(package.version, "1.2.0");
        assert_eq!(package.download_path, "FOLDER9/Latitude_7490_1.2.0.exe");
        assert_eq!(package.tier, MatchTier::SupportedDevice);
    }

    #[tokio::test]
    async fn test_check_unsupported_system_skips_manifest() {
        let server = MockServer::start().await;
        serve(&server, "/catalog/CatalogIndexPC.cab", CATALOG.as_bytes().to_vec()).await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = mirror_pipeline(&server, dir.path(), "FFFF");
        let ctx = pipeline.context().unwrap();
        let decision = pipeline.check(&ctx).await.unwrap();

        assert_eq!(
            decision,
            UpdateDecision::Unsupported {
                system_id: "FFFF".to_string()
            }
        );
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_check_missing_manifest_is_fatal() {
        let server = MockServer::start().await;
        serve(&server, "/catalog/CatalogIndexPC.cab", CATALOG.as_bytes().to_vec()).await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = mirror_pipeline(&server, dir.path(), "081C");
        let ctx = pipeline.context().unwrap();
        let err = pipeline.check(&ctx).await.unwrap_err();

        let update_err = err.downcast_ref::<UpdateError>().unwrap();
        assert!(matches!(update_err, UpdateError::Network { .. }));
        assert!(update_err.is_fatal());
    }

    #[tokio::test]
    async fn test_download_into_staging_dir() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/FOLDER9/Latitude_7490_1.2.0.exe",
            b"MZ bios payload".to_vec(),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let pipeline = mirror_pipeline(&server, dir.path(), "081C");
        let package = PackageRef {
            version: "1.2.0".to_string(),
            download_path: "FOLDER9/Latitude_7490_1.2.0.exe".to_string(),
            tier: MatchTier::SupportedDevice,
            name: None,
            release_date: None,
        };
        let file = pipeline.download(&package).await.unwrap();

        assert_eq!(file, pipeline.staging_dir().join("Latitude_7490_1.2.0.exe"));
        assert_eq!(std::fs::read(&file).unwrap(), b"MZ bios payload");
    }
}
