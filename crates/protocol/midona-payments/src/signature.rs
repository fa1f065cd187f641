//! HTTP message signatures for client authentication.
//!
//! Open Payments servers identify the client by its wallet address and
//! verify every grant and resource request against the client's published
//! Ed25519 key. Requests are signed per RFC 9421:
//!
//! ```text
//! Content-Digest:  sha-512=:<base64(SHA-512(body))>:
//! Signature-Input: sig1=("@method" "@target-uri" ...);keyid="<key id>";created=<unix secs>
//! Signature:       sig1=:<base64(Ed25519_Sign(key, signature base))>:
//! ```
//!
//! The signature base lists each covered component on its own line,
//! followed by the `@signature-params` line.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use sha2::{Digest, Sha512};

use crate::error::{PaymentError, PaymentResult};

/// Label of the single signature this client produces.
const SIGNATURE_LABEL: &str = "sig1";

/// Headers to attach to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    /// `Content-Digest`, present when the request has a body.
    pub content_digest: Option<String>,
    /// `Signature-Input`.
    pub signature_input: String,
    /// `Signature`.
    pub signature: String,
}

/// The parts of a request a signature covers.
#[derive(Debug, Clone, Copy)]
pub struct SignableRequest<'a> {
    /// HTTP method, upper case.
    pub method: &'a str,
    /// Full target URI as sent.
    pub target_uri: &'a str,
    /// `Authorization` header value, if any.
    pub authorization: Option<&'a str>,
    /// JSON body, if any.
    pub body: Option<&'a [u8]>,
}

/// Signs outgoing requests with the client's Ed25519 key.
#[derive(Clone)]
pub struct RequestSigner {
    key_id: String,
    signing_key: SigningKey,
}

impl RequestSigner {
    /// Create a signer from an existing key.
    pub fn new(key_id: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            key_id: key_id.into(),
            signing_key,
        }
    }

    /// Load a PKCS#8 private key from a PEM string.
    ///
    /// The PEM may also be given base64-encoded as a whole, which is how
    /// wallet providers commonly hand out developer keys.
    pub fn from_pem(key_id: impl Into<String>, pem: &str) -> PaymentResult<Self> {
        let pem = pem.trim();
        let decoded;
        let pem = if pem.starts_with("-----BEGIN") {
            pem
        } else {
            let bytes = BASE64
                .decode(pem.as_bytes())
                .map_err(|e| PaymentError::Signing(format!("key is neither PEM nor base64 PEM: {}", e)))?;
            decoded = String::from_utf8(bytes)
                .map_err(|_| PaymentError::Signing("decoded key is not UTF-8 PEM".to_string()))?;
            decoded.trim()
        };

        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| PaymentError::Signing(format!("invalid Ed25519 PKCS#8 key: {}", e)))?;
        Ok(Self::new(key_id, signing_key))
    }

    /// Load a PKCS#8 private key from a PEM file.
    pub fn from_pem_file(key_id: impl Into<String>, path: impl AsRef<Path>) -> PaymentResult<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|e| {
            PaymentError::config(format!("cannot read private key {}: {}", path.display(), e))
        })?;
        Self::from_pem(key_id, &pem)
    }

    /// The key id advertised in `Signature-Input`.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Public half of the signing key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign `request` as of `created` (unix seconds).
    pub fn sign(&self, request: &SignableRequest<'_>, created: i64) -> SignatureHeaders {
        let content_digest = request.body.map(content_digest);

        let mut components: Vec<(&str, String)> = vec![
            ("@method", request.method.to_ascii_uppercase()),
            ("@target-uri", request.target_uri.to_string()),
        ];
        if let Some(authorization) = request.authorization {
            components.push(("authorization", authorization.to_string()));
        }
        if let (Some(body), Some(digest)) = (request.body, content_digest.as_ref()) {
            components.push(("content-digest", digest.clone()));
            components.push(("content-length", body.len().to_string()));
            components.push(("content-type", "application/json".to_string()));
        }

        let covered = components
            .iter()
            .map(|(name, _)| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(" ");
        let params = format!("({});keyid=\"{}\";created={}", covered, self.key_id, created);

        let base = signature_base(&components, &params);
        let signature = self.signing_key.sign(base.as_bytes());

        SignatureHeaders {
            content_digest,
            signature_input: format!("{}={}", SIGNATURE_LABEL, params),
            signature: format!("{}=:{}:", SIGNATURE_LABEL, BASE64.encode(signature.to_bytes())),
        }
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// `Content-Digest` header value for `body`.
pub fn content_digest(body: &[u8]) -> String {
    let digest = Sha512::digest(body);
    format!("sha-512=:{}:", BASE64.encode(digest))
}

/// Build the RFC 9421 signature base.
pub fn signature_base(components: &[(&str, String)], params: &str) -> String {
    let mut base = String::new();
    for (name, value) in components {
        base.push_str(&format!("\"{}\": {}\n", name, value));
    }
    base.push_str(&format!("\"@signature-params\": {}", params));
    base
}
