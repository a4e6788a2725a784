//! Cipher-suite parameters and identifier types.
//!
//! Bridges the protocol engine to the `keel-crypto` primitives.

pub mod aead;
pub mod hkdf;
pub mod key_schedule;
pub mod keylog;
pub mod transcript;

use crate::alert::AlertDescription;
use crate::{CipherSuite, TlsError};
use keel_crypto::provider::Digest;
use keel_crypto::sha2::{Sha256, Sha384};

/// A factory closure that creates fresh digest instances.
pub type HashFactory = Box<dyn Fn() -> Box<dyn Digest> + Send + Sync>;

/// Parameters associated with a TLS 1.3 cipher suite.
#[derive(Debug, Clone)]
pub struct CipherSuiteParams {
    /// The cipher suite identifier.
    pub suite: CipherSuite,
    /// Hash output size in bytes (32 for SHA-256, 48 for SHA-384).
    pub hash_len: usize,
    /// AEAD key length in bytes.
    pub key_len: usize,
    /// AEAD IV/nonce length in bytes (always 12 for TLS 1.3).
    pub iv_len: usize,
    /// AEAD tag length in bytes (always 16).
    pub tag_len: usize,
}

impl CipherSuiteParams {
    /// Look up parameters for a TLS 1.3 cipher suite.
    pub fn from_suite(suite: CipherSuite) -> Result<Self, TlsError> {
        match suite {
            CipherSuite::TLS_AES_128_GCM_SHA256 => Ok(Self {
                suite,
                hash_len: 32,
                key_len: 16,
                iv_len: 12,
                tag_len: 16,
            }),
            CipherSuite::TLS_AES_256_GCM_SHA384 => Ok(Self {
                suite,
                hash_len: 48,
                key_len: 32,
                iv_len: 12,
                tag_len: 16,
            }),
            _ => Err(TlsError::fatal(AlertDescription::HandshakeFailure)),
        }
    }

    /// Create a `HashFactory` for this cipher suite's hash algorithm.
    pub fn hash_factory(&self) -> HashFactory {
        match self.hash_len {
            48 => Box::new(|| Box::new(Sha384::new()) as Box<dyn Digest>),
            _ => Box::new(|| Box::new(Sha256::new()) as Box<dyn Digest>),
        }
    }
}

/// TLS named group identifiers (key exchange).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedGroup(pub u16);

impl NamedGroup {
    pub const X25519: Self = Self(0x001D);
    pub const FFDHE2048: Self = Self(0x0100);
    pub const FFDHE3072: Self = Self(0x0101);
}

/// TLS signature scheme identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureScheme(pub u16);

impl SignatureScheme {
    pub const RSA_PKCS1_SHA256: Self = Self(0x0401);
    pub const ECDSA_SECP256R1_SHA256: Self = Self(0x0403);
    pub const RSA_PSS_RSAE_SHA256: Self = Self(0x0804);
    pub const RSA_PSS_RSAE_SHA384: Self = Self(0x0805);
    pub const RSA_PSS_RSAE_SHA512: Self = Self(0x0806);
    pub const ED25519: Self = Self(0x0807);
}
