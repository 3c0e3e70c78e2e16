//! Model signing utility for RenalGuard artifacts.
//!
//! Writes a manifest (`manifest.json`) binding the classifier and scaler by
//! SHA-256, and an Ed25519 signature over it (`model.sig`). The loader
//! verifies both when `RENALGUARD_MODEL_PUBKEY_B64` is set.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_model -- <model_dir> [--nonce-b64 <b64>]
//! ```
//!
//! # Security
//!
//! - Signing seed sourced from an FD, a file or a Docker secret
//! - Random nonce so re-signing identical files yields a new manifest
//! - Seed material zeroized after use

use std::collections::BTreeMap;
use std::env;
use std::fs;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::RngCore;
use zeroize::Zeroizing;
use zeroize::{Zeroize, ZeroizeOnDrop};

use renalguard::adapters::artifacts::{
    sha256_hex, ModelManifest, CLASSIFIER_FILE, MANIFEST_FILE, MANIFEST_VERSION, NORMALIZER_FILE,
    SIGNATURE_FILE,
};

const KEY_FD_ENV: &str = "RENALGUARD_MODEL_SIGNING_KEY_B64_FD";
const KEY_FILE_ENV: &str = "RENALGUARD_MODEL_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "RENALGUARD_MODEL_SIGNING_KEY_B64";
const DOCKER_SECRET_PATH: &str = "/run/secrets/renalguard_model_signing_key_b64";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn non_empty_secret(raw: &str) -> Result<Zeroizing<String>> {
    let secret = Zeroizing::new(raw.trim_end_matches(['\n', '\r']).to_string());
    if secret.is_empty() {
        bail!("Empty signing key");
    }
    Ok(secret)
}

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    #[cfg(unix)]
    if let Ok(fd_str) = env::var(KEY_FD_ENV) {
        let fd: i32 = fd_str.trim().parse().context("Invalid key FD")?;
        if fd <= 2 {
            bail!("Refusing to read signing key from stdio FD");
        }
        // SAFETY: take ownership of FD for one-time secret read.
        let mut file = unsafe { std::fs::File::from_raw_fd(fd) };
        let mut buf = Zeroizing::new(String::new());
        use std::io::Read;
        file.read_to_string(&mut buf)
            .context("Failed reading signing key from FD")?;
        return non_empty_secret(&buf);
    }

    if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = Zeroizing::new(
            fs::read_to_string(path.trim()).context("Failed reading signing key file")?,
        );
        return non_empty_secret(&content);
    }

    if Path::new(DOCKER_SECRET_PATH).exists() {
        let content = Zeroizing::new(
            fs::read_to_string(DOCKER_SECRET_PATH).context("Failed reading docker secret")?,
        );
        return non_empty_secret(&content);
    }

    // Dev-only fallback for convenience.
    if cfg!(debug_assertions) {
        if let Ok(v) = env::var(KEY_ENV) {
            let v = Zeroizing::new(v);
            return non_empty_secret(&v);
        }
    }

    Err(anyhow!(
        "Missing signing key. Provide one of: {KEY_FD_ENV}, {KEY_FILE_ENV}, or {DOCKER_SECRET_PATH} ({KEY_ENV} only in debug builds)."
    ))
}

fn read_signing_seed() -> Result<Seed> {
    let v = read_signing_seed_b64()?;

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(v.trim())
            .context("Invalid base64 in signing key")?,
    );

    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn usage() -> anyhow::Error {
    anyhow!("Usage: sign_model <model_dir> [--nonce-b64 <b64_16_bytes>]")
}

fn parse_args() -> Result<(PathBuf, Option<String>)> {
    let mut args = env::args().skip(1);
    let mut model_dir: Option<PathBuf> = None;
    let mut nonce_b64: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--nonce-b64" => {
                nonce_b64 = Some(args.next().ok_or_else(usage)?);
            }
            "-h" | "--help" => return Err(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(&arg)),
            _ => return Err(usage()),
        }
    }

    let model_dir = model_dir.ok_or_else(usage)?;
    Ok((model_dir, nonce_b64))
}

fn make_nonce_b64() -> String {
    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    general_purpose::STANDARD.encode(nonce)
}

fn validate_nonce_b64(nonce_b64: &str) -> Result<()> {
    let raw = general_purpose::STANDARD
        .decode(nonce_b64.trim())
        .context("Invalid base64 nonce")?;
    if raw.len() != 16 {
        bail!("nonce must decode to exactly 16 bytes");
    }
    Ok(())
}

fn main() -> Result<()> {
    let (model_dir, nonce_arg) = parse_args()?;

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);
    let verifying_key = signing_key.verifying_key();

    let mut files: BTreeMap<String, String> = BTreeMap::new();
    for name in [CLASSIFIER_FILE, NORMALIZER_FILE] {
        let path = model_dir.join(name);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {path:?}"))?;
        files.insert(name.to_string(), sha256_hex(&bytes));
    }

    let nonce_b64 = match nonce_arg {
        Some(v) => {
            validate_nonce_b64(&v)?;
            v
        }
        None => make_nonce_b64(),
    };

    let manifest = ModelManifest {
        version: MANIFEST_VERSION,
        created_at: chrono::Utc::now().timestamp(),
        nonce_b64,
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest.json")?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes())
        .with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "RENALGUARD_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(verifying_key.as_bytes())
    );

    Ok(())
}
