// src/hostname.rs

//! Onion address read-back
//!
//! Tor writes each service's address to `<hidden_service_dir>/hostname` the
//! first time it starts with that service configured. The file is owned by
//! Tor; this module only reads it.

use tracing::warn;

use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::reconcile::DerivedSite;

/// Length of a v3 address without the `.onion` suffix
pub const ONION_V3_LEN: usize = 56;

/// Read the onion address Tor generated for a site
///
/// Returns `None` while Tor has not created the service yet.
pub fn read_hostname<F: Filesystem>(fs: &F, site: &DerivedSite) -> Result<Option<String>> {
    let path = site.hostname_path();
    let Some(content) = fs.read_to_string(&path)? else {
        return Ok(None);
    };

    let address = content.trim();
    if address.is_empty() {
        return Ok(None);
    }
    if !is_onion_v3_address(address) {
        warn!(
            "{} does not contain a v3 onion address: {:?}",
            path.display(),
            address
        );
    }

    Ok(Some(address.to_string()))
}

/// Check for `<56 base32 chars>.onion`
pub fn is_onion_v3_address(address: &str) -> bool {
    match address.strip_suffix(".onion") {
        Some(label) => {
            label.len() == ONION_V3_LEN
                && label
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || (b'2'..=b'7').contains(&b))
        }
        None => false,
    }
}
