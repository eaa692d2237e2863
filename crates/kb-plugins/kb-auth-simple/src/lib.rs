//! # kb-auth-simple
//!
//! HMAC-SHA256 bearer tokens implementing `AuthProvider`.
//! A token is `base64url(uid).hex(hmac(secret, uid))`; anything that does
//! not verify is treated as an anonymous caller.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use kb_core::traits::AuthProvider;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct SimpleAuthProvider {
    /// Server-side signing key (e.g., from an environment variable)
    secret: Vec<u8>,
}

impl SimpleAuthProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> Option<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).ok()
    }

    /// Signs a uid into a bearer token.
    pub fn issue_token(&self, uid: &str) -> Option<String> {
        let mut mac = self.mac()?;
        mac.update(uid.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        Some(format!("{}.{}", URL_SAFE_NO_PAD.encode(uid), sig))
    }
}

impl AuthProvider for SimpleAuthProvider {
    fn verify_token(&self, token: &str) -> Option<String> {
        let (encoded_uid, sig) = token.split_once('.')?;
        let uid = String::from_utf8(URL_SAFE_NO_PAD.decode(encoded_uid).ok()?).ok()?;
        if uid.is_empty() {
            return None;
        }
        let sig = hex::decode(sig).ok()?;
        let mut mac = self.mac()?;
        mac.update(uid.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&sig).ok()?;
        Some(uid)
    }
}
