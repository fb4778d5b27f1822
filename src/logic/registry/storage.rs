//! File-backed registry
//!
//! Layout under the model directory:
//!   champion-v1.0.json, champion-v2.0.json, ...   (artifact bundles)
//!   candidate-random_forest-v1.0.json, ...         (every fitted candidate)
//!   model_registry.json                            (pointer + metrics)
//!
//! Publishing never rewrites an existing bundle. The pointer file is
//! replaced by write-to-temp + rename, so readers see the old or the new
//! registry, never a partial one.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::types::{format_version, parse_version, ArtifactBundle, Publication, Registry};
use crate::config::Config;
use crate::error::RegistryError;
use crate::logic::model::CandidateKind;

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn bundle_file_name(version: &str) -> String {
    format!("champion-{}.json", version)
}

pub fn candidate_file_name(kind: CandidateKind, version: &str) -> String {
    format!("candidate-{}-{}.json", kind.slug(), version)
}

/// Write `bytes` next to `path` then rename over it
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RegistryError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RegistryStore {
    model_dir: PathBuf,
    registry_path: PathBuf,
}

impl RegistryStore {
    pub fn new(model_dir: impl Into<PathBuf>, registry_path: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            registry_path: registry_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.model_dir, &config.registry_path)
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    /// `Ok(None)` when nothing has been published yet
    pub fn load(&self) -> Result<Option<Registry>, RegistryError> {
        if !self.registry_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.registry_path)?;
        let registry: Registry = serde_json::from_slice(&data)?;
        Ok(Some(registry))
    }

    /// Like `load`, but absence is an error
    pub fn require(&self) -> Result<Registry, RegistryError> {
        self.load()?
            .ok_or_else(|| RegistryError::NotFound(self.registry_path.display().to_string()))
    }

    /// Version the next publish will get
    pub fn next_version(&self) -> Result<String, RegistryError> {
        let current = self
            .load()?
            .and_then(|r| parse_version(&r.champion.model_version))
            .unwrap_or(0);

        // Skip past any bundle left on disk by an interrupted publish
        let mut next = current + 1;
        while self.model_dir.join(bundle_file_name(&format_version(next))).exists() {
            next += 1;
        }
        Ok(format_version(next))
    }

    /// Write every candidate bundle, then the champion bundle, then swing
    /// the registry pointer to them. Fills in `artifact` and `checksum` on
    /// the champion record and on each candidate entry.
    pub fn publish(&self, publication: Publication) -> Result<Registry, RegistryError> {
        let Publication { champion, candidates, mut registry } = publication;

        fs::create_dir_all(&self.model_dir)?;
        if let Some(parent) = self.registry_path.parent() {
            fs::create_dir_all(parent)?;
        }

        for bundle in &candidates {
            let kind = bundle.model.kind();
            let file_name = candidate_file_name(kind, &bundle.model_version);
            let checksum = self.write_bundle(&file_name, bundle)?;

            if let Some(entry) = registry.all_models.iter_mut().find(|m| m.candidate == kind) {
                entry.artifact = file_name;
                entry.checksum = checksum;
            }
        }

        let file_name = bundle_file_name(&champion.model_version);
        registry.champion.checksum = self.write_bundle(&file_name, &champion)?;
        registry.champion.artifact = file_name;

        let json = serde_json::to_vec_pretty(&registry)?;
        write_atomic(&self.registry_path, &json)?;

        log::info!(
            "Published {} {} ({}, {} candidate bundles)",
            registry.champion.model_name,
            registry.champion.model_version,
            registry.champion.artifact,
            candidates.len()
        );
        Ok(registry)
    }

    /// Returns the SHA-256 of the written bytes
    fn write_bundle(&self, file_name: &str, bundle: &ArtifactBundle) -> Result<String, RegistryError> {
        let bytes = serde_json::to_vec(bundle)?;
        write_atomic(&self.model_dir.join(file_name), &bytes)?;
        Ok(sha256_hex(&bytes))
    }

    /// Read a bundle file and check it against its recorded checksum
    fn read_verified(&self, file_name: &str, checksum: &str) -> Result<ArtifactBundle, RegistryError> {
        let path = self.model_dir.join(file_name);
        if file_name.is_empty() || !path.exists() {
            return Err(RegistryError::NotFound(path.display().to_string()));
        }

        let bytes = fs::read(&path)?;
        let actual = sha256_hex(&bytes);
        if actual != checksum {
            return Err(RegistryError::ChecksumMismatch {
                file: file_name.to_string(),
                expected: checksum.to_string(),
                actual,
            });
        }

        let bundle: ArtifactBundle = serde_json::from_slice(&bytes)?;
        bundle.encoder.order.validate()?;
        Ok(bundle)
    }

    /// Read a non-serving candidate bundle recorded in `registry`
    pub fn load_candidate(&self, registry: &Registry, kind: CandidateKind) -> Result<ArtifactBundle, RegistryError> {
        let entry = registry
            .all_models
            .iter()
            .find(|m| m.candidate == kind)
            .ok_or_else(|| RegistryError::NotFound(format!("candidate {}", kind.as_str())))?;
        self.read_verified(&entry.artifact, &entry.checksum)
    }

    /// Read the champion bundle, verify checksum and feature layout
    pub fn load_bundle(&self, registry: &Registry) -> Result<ArtifactBundle, RegistryError> {
        let champion = &registry.champion;
        let bundle = self.read_verified(&champion.artifact, &champion.checksum)?;
        champion.feature_order.validate()?;
        if bundle.encoder.order != champion.feature_order {
            return Err(RegistryError::Layout(
                crate::logic::features::layout::LayoutMismatchError::Hash {
                    expected_version: champion.feature_order.version,
                    expected_hash: champion.feature_order.hash,
                    actual_version: bundle.encoder.order.version,
                    actual_hash: bundle.encoder.order.hash,
                },
            ));
        }

        Ok(bundle)
    }
}
