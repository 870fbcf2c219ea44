//! VAPID key files.
//!
//! Keys are kept in two interchangeable forms side by side:
//!
//! ```text
//! ~/.config/webpush/
//!     vapid_private.pem   # PKCS#8 "PRIVATE KEY" (openssl / other servers)
//!     vapid.json          # {"publicKey": "...", "privateKey": "..."}
//! ```
//!
//! Both are written owner-only (`0600`). [`load_or_generate`] only trusts
//! them when they agree.

// Rust guideline compliant 2026-10

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::notifications::vapid::VapidKeys;

/// Where the keys returned by [`load_or_generate`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Both files existed and held the same key.
    Loaded,
    /// A fresh key was generated and written to both files.
    Generated,
}

/// Load keys from a PKCS#8 PEM file.
///
/// Returns `None` if the file does not exist.
pub fn load_keys_pem(path: &Path) -> Result<Option<VapidKeys>> {
    if !path.exists() {
        return Ok(None);
    }
    let pem = zeroize::Zeroizing::new(
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read VAPID PEM {}", path.display()))?,
    );
    let keys = VapidKeys::from_pkcs8_pem(&pem)
        .with_context(|| format!("Failed to parse VAPID PEM {}", path.display()))?;
    Ok(Some(keys))
}

/// Load keys from a web-push style JSON file.
///
/// Returns `None` if the file does not exist.
pub fn load_keys_json(path: &Path) -> Result<Option<VapidKeys>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = zeroize::Zeroizing::new(
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read VAPID JSON {}", path.display()))?,
    );
    let keys = VapidKeys::from_json(&json)
        .with_context(|| format!("Failed to parse VAPID JSON {}", path.display()))?;
    Ok(Some(keys))
}

/// Write keys as a PKCS#8 PEM file.
pub fn save_keys_pem(path: &Path, keys: &VapidKeys) -> Result<()> {
    let pem = keys.to_pkcs8_pem().context("Failed to encode VAPID PEM")?;
    write_private(path, pem.as_bytes())?;
    log::debug!("Saved VAPID PEM to {}", path.display());
    Ok(())
}

/// Write keys as web-push style JSON.
pub fn save_keys_json(path: &Path, keys: &VapidKeys) -> Result<()> {
    let json = zeroize::Zeroizing::new(keys.to_json().context("Failed to encode VAPID JSON")?);
    write_private(path, json.as_bytes())?;
    log::debug!("Saved VAPID JSON to {}", path.display());
    Ok(())
}

/// Reuse the key stored in both files, or generate and store a new one.
///
/// A missing, unreadable or disagreeing pair is replaced, so the two files
/// always end up holding the same key.
pub fn load_or_generate(pem_path: &Path, json_path: &Path) -> Result<(VapidKeys, KeyOrigin)> {
    let from_pem = load_keys_pem(pem_path).unwrap_or_else(|e| {
        log::warn!("Could not load VAPID keys from PEM: {e:#}");
        None
    });
    let from_json = load_keys_json(json_path).unwrap_or_else(|e| {
        log::warn!("Could not load VAPID keys from JSON: {e:#}");
        None
    });

    if let (Some(pem), Some(json)) = (&from_pem, &from_json) {
        if pem == json {
            log::info!("Using stored VAPID keys");
            return Ok((pem.clone(), KeyOrigin::Loaded));
        }
        log::warn!("Stored VAPID PEM and JSON keys differ; regenerating");
    }

    log::info!("Generating new VAPID keys");
    let keys = VapidKeys::generate().context("Failed to generate VAPID keys")?;
    save_keys_pem(pem_path, &keys)?;
    save_keys_json(json_path, &keys)?;
    Ok((keys, KeyOrigin::Generated))
}

fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}
