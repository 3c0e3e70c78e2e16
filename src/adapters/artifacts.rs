//! Artifact loader: reads the classifier and scaler from the model directory.
//!
//! Both artifacts are read, verified and cross-checked before anything is
//! returned, so callers either get a complete `ModelArtifacts` or a
//! `LoadError`, never one half of the pair.
//!
//! # Integrity
//!
//! - `manifest.json` binds the artifact files by SHA-256. When present, every
//!   bound hash must match the bytes that are actually parsed.
//! - `model.sig` is an Ed25519 signature over the manifest bytes. When a
//!   trusted verifying key is configured, manifest and signature are both
//!   mandatory.
//! - Without a manifest and without a trusted key the artifacts load
//!   unverified and a warning is logged.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::gbdt::GbdtClassifier;
use super::scaler::StandardScaler;
use crate::domain::FEATURE_NAMES;
use crate::ports::{Classifier, Normalizer};

/// Classifier file name inside the model directory.
pub const CLASSIFIER_FILE: &str = "gbdt_model.json";

/// Normalizer file name inside the model directory.
pub const NORMALIZER_FILE: &str = "scaler.json";

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

/// Supported manifest version.
pub const MANIFEST_VERSION: u32 = 1;

/// Artifact loading failure. Fatal for inference until an operator fixes it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("model artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("model artifact {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("model artifacts are incompatible: {0}")]
    Incompatible(String),

    #[error("model integrity check failed: {0}")]
    Integrity(String),
}

/// Signed list of artifact hashes, written by the `sign_model` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was written.
    pub created_at: i64,
    /// Random 16-byte nonce (base64) so re-signing identical files differs.
    pub nonce_b64: String,
    /// File name -> lowercase SHA-256 hex.
    pub files: BTreeMap<String, String>,
}

/// A classifier and the normalizer it was trained behind.
///
/// Immutable once built; shared across requests through `Arc`.
#[derive(Debug)]
pub struct ModelArtifacts<C = GbdtClassifier, N = StandardScaler> {
    classifier: C,
    normalizer: N,
}

impl<C: Classifier, N: Normalizer> ModelArtifacts<C, N> {
    /// Pair a classifier with its normalizer.
    ///
    /// Both must have been fitted on `FEATURE_NAMES`, in that order.
    ///
    /// # Errors
    /// Returns `LoadError::Incompatible` if the feature lists disagree.
    pub fn new(classifier: C, normalizer: N) -> Result<Self, LoadError> {
        check_feature_names("classifier", classifier.feature_names())?;
        check_feature_names("scaler", normalizer.feature_names())?;

        if classifier.n_features() != normalizer.n_features() {
            return Err(LoadError::Incompatible(format!(
                "classifier expects {} features, scaler produces {}",
                classifier.n_features(),
                normalizer.n_features()
            )));
        }

        Ok(Self {
            classifier,
            normalizer,
        })
    }

    #[must_use]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    #[must_use]
    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }
}

fn check_feature_names(artifact: &str, names: &[String]) -> Result<(), LoadError> {
    let matches = names.len() == FEATURE_NAMES.len()
        && names.iter().zip(FEATURE_NAMES.iter()).all(|(a, b)| a == b);
    if matches {
        Ok(())
    } else {
        Err(LoadError::Incompatible(format!(
            "{artifact} features {names:?} do not match expected order {FEATURE_NAMES:?}"
        )))
    }
}

/// Loads `ModelArtifacts` from a fixed directory layout.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    model_dir: PathBuf,
    trusted_key: Option<VerifyingKey>,
}

impl ArtifactLoader {
    #[must_use]
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            trusted_key: None,
        }
    }

    /// Require a manifest signed by `key`.
    #[must_use]
    pub fn with_trusted_key(mut self, key: VerifyingKey) -> Self {
        self.trusted_key = Some(key);
        self
    }

    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    #[must_use]
    pub fn requires_signature(&self) -> bool {
        self.trusted_key.is_some()
    }

    /// Read, verify and cross-check both artifacts.
    ///
    /// # Errors
    /// Returns `LoadError` if either artifact is missing or corrupt, the
    /// manifest or signature does not verify, or the pair is incompatible.
    pub fn load(&self) -> Result<ModelArtifacts, LoadError> {
        tracing::info!(
            model_dir = %self.model_dir.display(),
            signed = self.requires_signature(),
            "Loading model artifacts"
        );

        let classifier_path = self.model_dir.join(CLASSIFIER_FILE);
        let normalizer_path = self.model_dir.join(NORMALIZER_FILE);

        let classifier_bytes = read_artifact(&classifier_path)?;
        let normalizer_bytes = read_artifact(&normalizer_path)?;

        // Hash the same bytes that get parsed below.
        self.verify_integrity(&[
            (CLASSIFIER_FILE, classifier_bytes.as_slice()),
            (NORMALIZER_FILE, normalizer_bytes.as_slice()),
        ])?;

        let classifier = GbdtClassifier::from_json_str(as_utf8(&classifier_path, &classifier_bytes)?)
            .map_err(|e| LoadError::Corrupt {
                path: classifier_path.clone(),
                reason: e.to_string(),
            })?;
        let normalizer = StandardScaler::from_json_str(as_utf8(&normalizer_path, &normalizer_bytes)?)
            .map_err(|e| LoadError::Corrupt {
                path: normalizer_path.clone(),
                reason: e.to_string(),
            })?;

        if classifier.format_version() != normalizer.format_version() {
            return Err(LoadError::Incompatible(format!(
                "classifier format_version {} != scaler format_version {}",
                classifier.format_version(),
                normalizer.format_version()
            )));
        }

        let artifacts = ModelArtifacts::new(classifier, normalizer)?;

        tracing::info!(
            trees = artifacts.classifier().tree_count(),
            n_features = artifacts.classifier().n_features(),
            "Model artifacts loaded"
        );

        Ok(artifacts)
    }

    fn verify_integrity(&self, files: &[(&str, &[u8])]) -> Result<(), LoadError> {
        let manifest_path = self.model_dir.join(MANIFEST_FILE);

        let manifest_bytes = match fs::read(&manifest_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.trusted_key.is_some() {
                    return Err(LoadError::Integrity(format!(
                        "{MANIFEST_FILE} is required when a trusted key is configured"
                    )));
                }
                tracing::warn!(
                    "No {MANIFEST_FILE} in model directory; loading UNVERIFIED artifacts"
                );
                return Ok(());
            }
            Err(e) => {
                return Err(LoadError::Integrity(format!(
                    "failed to read {MANIFEST_FILE}: {e}"
                )))
            }
        };

        if let Some(key) = &self.trusted_key {
            let sig_bytes = fs::read(self.model_dir.join(SIGNATURE_FILE)).map_err(|e| {
                LoadError::Integrity(format!("failed to read {SIGNATURE_FILE}: {e}"))
            })?;
            let sig_array: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
                LoadError::Integrity("invalid signature length (expected 64 bytes)".into())
            })?;
            key.verify(&manifest_bytes, &Signature::from_bytes(&sig_array))
                .map_err(|_| LoadError::Integrity("invalid manifest signature".into()))?;
        }

        let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| LoadError::Integrity(format!("invalid {MANIFEST_FILE}: {e}")))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(LoadError::Integrity(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }

        for (name, bytes) in files {
            let expected = manifest.files.get(*name).ok_or_else(|| {
                LoadError::Integrity(format!("{MANIFEST_FILE} does not bind {name}"))
            })?;
            let actual = sha256_hex(bytes);
            if !constant_time_eq_str(&actual, &expected.to_ascii_lowercase()) {
                return Err(LoadError::Integrity(format!("hash mismatch for {name}")));
            }
        }

        tracing::info!(
            signed = self.trusted_key.is_some(),
            created_at = manifest.created_at,
            "Model manifest verified"
        );
        Ok(())
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            LoadError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })
}

fn as_utf8<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str, LoadError> {
    std::str::from_utf8(bytes).map_err(|e| LoadError::Corrupt {
        path: path.to_path_buf(),
        reason: format!("not UTF-8: {e}"),
    })
}

/// Lowercase SHA-256 hex digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `LoadError::Integrity` if the key is not 32 valid bytes.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, LoadError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| LoadError::Integrity("invalid public key base64".into()))?;
    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        LoadError::Integrity("invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&key).map_err(|_| LoadError::Integrity("invalid verifying key".into()))
}

// Constant-time compare for ASCII strings (SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gbdt::{ExportedGbdt, Node, Tree};
    use crate::adapters::scaler::ExportedScaler;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    fn names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect()
    }

    fn write_classifier(dir: &Path, feature_names: Vec<String>) -> Vec<u8> {
        let model = ExportedGbdt {
            format_version: 1,
            feature_names,
            learning_rate: 0.1,
            init_score: -0.3,
            trees: vec![Tree::new(vec![
                Node::split(0, 0.0, 1, 2),
                Node::leaf(-0.6),
                Node::leaf(1.1),
            ])],
        };
        let bytes = serde_json::to_vec(&model).expect("serialize model");
        fs::write(dir.join(CLASSIFIER_FILE), &bytes).expect("write model");
        bytes
    }

    fn write_scaler(dir: &Path, feature_names: Vec<String>) -> Vec<u8> {
        let n = feature_names.len();
        let scaler = ExportedScaler {
            format_version: 1,
            feature_names,
            mean: vec![1.0; n],
            scale: vec![2.0; n],
        };
        let bytes = serde_json::to_vec(&scaler).expect("serialize scaler");
        fs::write(dir.join(NORMALIZER_FILE), &bytes).expect("write scaler");
        bytes
    }

    fn write_manifest(dir: &Path, files: &[(&str, &[u8])]) -> Vec<u8> {
        let manifest = ModelManifest {
            version: MANIFEST_VERSION,
            created_at: 1_700_000_000,
            nonce_b64: base64::engine::general_purpose::STANDARD.encode([0u8; 16]),
            files: files
                .iter()
                .map(|(name, bytes)| ((*name).to_string(), sha256_hex(bytes)))
                .collect(),
        };
        let bytes = serde_json::to_vec(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        bytes
    }

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    #[test]
    fn test_load_unsigned_artifacts() {
        let temp = tempdir().expect("tempdir");
        write_classifier(temp.path(), names());
        write_scaler(temp.path(), names());

        let artifacts = ArtifactLoader::new(temp.path()).load().expect("load");
        assert_eq!(artifacts.classifier().tree_count(), 1);
        assert_eq!(artifacts.normalizer().n_features(), 5);
    }

    #[test]
    fn test_missing_scaler_fails_whole_load() {
        let temp = tempdir().expect("tempdir");
        write_classifier(temp.path(), names());

        let err = ArtifactLoader::new(temp.path()).load().unwrap_err();
        assert_eq!(
            err,
            LoadError::Missing {
                path: temp.path().join(NORMALIZER_FILE)
            }
        );
    }

    #[test]
    fn test_corrupt_classifier_fails_whole_load() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(CLASSIFIER_FILE), b"{\"trees\": ").expect("write");
        write_scaler(temp.path(), names());

        let err = ArtifactLoader::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, LoadError::Corrupt { .. }), "got {err:?}");
    }

    #[test]
    fn test_feature_order_mismatch_is_incompatible() {
        let temp = tempdir().expect("tempdir");
        let mut swapped = names();
        swapped.swap(1, 3);
        write_classifier(temp.path(), names());
        write_scaler(temp.path(), swapped);

        let err = ArtifactLoader::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, LoadError::Incompatible(_)), "got {err:?}");
    }

    #[test]
    fn test_manifest_hash_mismatch() {
        let temp = tempdir().expect("tempdir");
        let model = write_classifier(temp.path(), names());
        write_scaler(temp.path(), names());
        write_manifest(
            temp.path(),
            &[
                (CLASSIFIER_FILE, model.as_slice()),
                (NORMALIZER_FILE, b"something else".as_slice()),
            ],
        );

        let err = ArtifactLoader::new(temp.path()).load().unwrap_err();
        assert_eq!(
            err,
            LoadError::Integrity(format!("hash mismatch for {NORMALIZER_FILE}"))
        );
    }

    #[test]
    fn test_manifest_must_bind_both_files() {
        let temp = tempdir().expect("tempdir");
        let model = write_classifier(temp.path(), names());
        write_scaler(temp.path(), names());
        write_manifest(temp.path(), &[(CLASSIFIER_FILE, model.as_slice())]);

        let err = ArtifactLoader::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, LoadError::Integrity(_)));
    }

    #[test]
    fn test_signed_manifest_verifies() {
        let temp = tempdir().expect("tempdir");
        let model = write_classifier(temp.path(), names());
        let scaler = write_scaler(temp.path(), names());
        let manifest = write_manifest(
            temp.path(),
            &[
                (CLASSIFIER_FILE, model.as_slice()),
                (NORMALIZER_FILE, scaler.as_slice()),
            ],
        );

        let key = signing_key();
        let signature: Signature = key.sign(&manifest);
        fs::write(temp.path().join(SIGNATURE_FILE), signature.to_bytes()).expect("write sig");

        let loader = ArtifactLoader::new(temp.path()).with_trusted_key(key.verifying_key());
        assert!(loader.load().is_ok());
    }

    #[test]
    fn test_signature_from_other_key_rejected() {
        let temp = tempdir().expect("tempdir");
        let model = write_classifier(temp.path(), names());
        let scaler = write_scaler(temp.path(), names());
        let manifest = write_manifest(
            temp.path(),
            &[
                (CLASSIFIER_FILE, model.as_slice()),
                (NORMALIZER_FILE, scaler.as_slice()),
            ],
        );

        let signature: Signature = signing_key().sign(&manifest);
        fs::write(temp.path().join(SIGNATURE_FILE), signature.to_bytes()).expect("write sig");

        let loader = ArtifactLoader::new(temp.path()).with_trusted_key(signing_key().verifying_key());
        assert_eq!(
            loader.load().unwrap_err(),
            LoadError::Integrity("invalid manifest signature".into())
        );
    }

    #[test]
    fn test_trusted_key_requires_manifest() {
        let temp = tempdir().expect("tempdir");
        write_classifier(temp.path(), names());
        write_scaler(temp.path(), names());

        let loader = ArtifactLoader::new(temp.path()).with_trusted_key(signing_key().verifying_key());
        assert!(matches!(loader.load(), Err(LoadError::Integrity(_))));
    }

    #[test]
    fn test_verifying_key_from_b64() {
        let key = signing_key().verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.as_bytes());
        assert_eq!(verifying_key_from_b64(&format!("{b64}\n")).expect("decode"), key);
        assert!(verifying_key_from_b64("AAAA").is_err());
    }
}
