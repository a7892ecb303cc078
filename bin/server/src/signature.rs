//! Webhook payload signatures.
//!
//! Messenger signs every event delivery with the app secret and sends the
//! result as `X-Hub-Signature: sha1=<hex digest>` over the raw request body.

use ring::hmac;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

const SIGNATURE_PREFIX: &str = "sha1=";

/// Verifies payload signatures with an app secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    key: hmac::Key,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    #[must_use]
    pub fn new(app_secret: &str) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, app_secret.as_bytes()),
        }
    }

    /// Signs `body`, producing a header value.
    #[must_use]
    pub fn sign(&self, body: &[u8]) -> String {
        let tag = hmac::sign(&self.key, body);
        format!("{SIGNATURE_PREFIX}{}", hex::encode(tag.as_ref()))
    }

    /// Returns true if `header` is a valid signature of `body`.
    #[must_use]
    pub fn verify(&self, header: &str, body: &[u8]) -> bool {
        let Some(digest) = header.trim().strip_prefix(SIGNATURE_PREFIX) else {
            return false;
        };
        let Ok(expected) = hex::decode(digest) else {
            return false;
        };
        hmac::verify(&self.key, body, &expected).is_ok()
    }
}
