//! TLS 1.3 HKDF constructions (RFC 8446 Section 7.1).
//!
//! Thin layer over `keel-crypto`'s HKDF: the HkdfLabel encoding and the
//! Derive-Secret shorthand.

use keel_crypto::provider::Digest;
use keel_types::CryptoError;

type Factory = dyn Fn() -> Box<dyn Digest> + Send + Sync;

/// One-shot HMAC with the factory's hash.
pub(crate) fn hmac_hash(
    factory: &Factory,
    key: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    keel_crypto::hmac::hmac(factory, key, data)
}

/// HKDF-Extract(salt, IKM) -> PRK.
pub fn hkdf_extract(factory: &Factory, salt: &[u8], ikm: &[u8]) -> Result<Vec<u8>, CryptoError> {
    keel_crypto::hkdf::hkdf_extract(factory, salt, ikm)
}

/// Encode the HkdfLabel structure:
///
/// ```text
/// struct {
///     uint16 length;
///     opaque label<7..255>;   // "tls13 " + label
///     opaque context<0..255>;
/// } HkdfLabel;
/// ```
fn encode_hkdf_label(length: u16, label: &[u8], context: &[u8]) -> Vec<u8> {
    let full_label_len = 6 + label.len();
    let mut buf = Vec::with_capacity(2 + 1 + full_label_len + 1 + context.len());
    buf.extend_from_slice(&length.to_be_bytes());
    buf.push(full_label_len as u8);
    buf.extend_from_slice(b"tls13 ");
    buf.extend_from_slice(label);
    buf.push(context.len() as u8);
    buf.extend_from_slice(context);
    buf
}

/// HKDF-Expand-Label(Secret, Label, Context, Length).
pub fn hkdf_expand_label(
    factory: &Factory,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
    length: usize,
) -> Result<Vec<u8>, CryptoError> {
    let info = encode_hkdf_label(length as u16, label, context);
    keel_crypto::hkdf::hkdf_expand(factory, secret, &info, length)
}

/// Derive-Secret(Secret, Label, TranscriptHash).
///
/// `transcript_hash` is the already-computed hash of the messages; the
/// output length equals the hash length.
pub fn derive_secret(
    factory: &Factory,
    secret: &[u8],
    label: &[u8],
    transcript_hash: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    hkdf_expand_label(factory, secret, label, transcript_hash, transcript_hash.len())
}
