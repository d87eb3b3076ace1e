//! Signed URLs.
//!
//! A signed URL carries a `signature` query parameter holding the hex
//! HMAC-SHA256 of the rest of the URL, and optionally an `expires` unix
//! timestamp covered by that signature.
//!
//! # Design Decisions
//! - The MAC input is the absolute URL with `signature` removed and the
//!   query re-serialized, so equivalent encodings verify the same way
//! - Signature comparison is constant-time (`Mac::verify_slice`)
//! - The signature is checked before expiry so a forged `expires` is reported as invalid

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_PARAM: &str = "signature";
pub const EXPIRES_PARAM: &str = "expires";

/// Why a signed URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature is missing")]
    Missing,
    #[error("signature is malformed")]
    Malformed,
    #[error("signature does not match")]
    Invalid,
    #[error("signed link has expired")]
    Expired,
}

/// Signs and verifies URLs with the application key.
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(key: &[u8]) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(key)?,
        })
    }

    /// Return a copy of `url` with `expires` (if given) and `signature` appended.
    pub fn sign(&self, url: &Url, expires_at: Option<u64>) -> Url {
        let mut signed = url.clone();
        if let Some(expires) = expires_at {
            signed
                .query_pairs_mut()
                .append_pair(EXPIRES_PARAM, &expires.to_string());
        }

        let signature = hex::encode(self.digest(&canonical(&signed)));
        signed
            .query_pairs_mut()
            .append_pair(SIGNATURE_PARAM, &signature);
        signed
    }

    /// Check the signature of `url` against the current clock.
    pub fn verify(&self, url: &Url) -> Result<(), SignatureError> {
        self.verify_at(url, unix_now())
    }

    pub fn verify_at(&self, url: &Url, now: u64) -> Result<(), SignatureError> {
        let provided = url
            .query_pairs()
            .find(|(name, _)| name == SIGNATURE_PARAM)
            .map(|(_, value)| value.into_owned())
            .ok_or(SignatureError::Missing)?;
        let provided = hex::decode(provided).map_err(|_| SignatureError::Malformed)?;

        let mut mac = self.mac.clone();
        mac.update(canonical(url).as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        let expires = url
            .query_pairs()
            .find(|(name, _)| name == EXPIRES_PARAM)
            .map(|(_, value)| value.parse::<u64>());
        match expires {
            Some(Ok(expires)) if now > expires => Err(SignatureError::Expired),
            Some(Err(_)) => Err(SignatureError::Malformed),
            _ => Ok(()),
        }
    }

    fn digest(&self, payload: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// The URL as it is fed to the MAC: `signature` stripped, query re-encoded.
fn canonical(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != SIGNATURE_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped.set_query(None);
    if !pairs.is_empty() {
        stripped.query_pairs_mut().extend_pairs(pairs);
    }
    stripped.into()
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
