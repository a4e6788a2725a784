//! AEAD seam for record protection.

use crate::alert::AlertDescription;
use crate::{CipherSuite, TlsError};
use keel_types::CryptoError;
use zeroize::Zeroize;

/// Record-layer AEAD operations.
pub trait TlsAead: Send + Sync {
    /// Encrypt plaintext. Returns `ciphertext || tag`.
    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TlsError>;

    /// Decrypt `ciphertext || tag`. Returns the plaintext.
    fn decrypt(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext_with_tag: &[u8],
    ) -> Result<Vec<u8>, TlsError>;

    /// Tag size in bytes.
    fn tag_size(&self) -> usize;
}

/// AES-GCM AEAD (128- or 256-bit key).
pub struct AesGcmAead {
    key: Vec<u8>,
}

impl AesGcmAead {
    pub fn new(key: &[u8]) -> Result<Self, TlsError> {
        if key.len() != 16 && key.len() != 32 {
            return Err(TlsError::Crypto(CryptoError::InvalidKeyLength {
                expected: 16,
                got: key.len(),
            }));
        }
        Ok(Self { key: key.to_vec() })
    }
}

impl Drop for AesGcmAead {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl TlsAead for AesGcmAead {
    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TlsError> {
        keel_crypto::gcm::gcm_encrypt(&self.key, nonce, aad, plaintext).map_err(TlsError::Crypto)
    }

    fn decrypt(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext_with_tag: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        keel_crypto::gcm::gcm_decrypt(&self.key, nonce, aad, ciphertext_with_tag).map_err(|e| {
            match e {
                CryptoError::AeadTagVerifyFail => {
                    TlsError::fatal(AlertDescription::BadRecordMac)
                }
                other => TlsError::Crypto(other),
            }
        })
    }

    fn tag_size(&self) -> usize {
        16
    }
}

/// Create the AEAD instance for a cipher suite and key.
pub fn create_aead(suite: CipherSuite, key: &[u8]) -> Result<Box<dyn TlsAead>, TlsError> {
    match suite {
        CipherSuite::TLS_AES_128_GCM_SHA256 | CipherSuite::TLS_AES_256_GCM_SHA384 => {
            Ok(Box::new(AesGcmAead::new(key)?))
        }
        _ => Err(TlsError::fatal(AlertDescription::HandshakeFailure)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes_gcm_roundtrip() {
        let aead = create_aead(CipherSuite::TLS_AES_128_GCM_SHA256, &[0x42; 16]).unwrap();
        let nonce = [0x01; 12];
        let ct = aead.encrypt(&nonce, b"aad", b"payload").unwrap();
        assert_eq!(ct.len(), 7 + aead.tag_size());
        assert_eq!(aead.decrypt(&nonce, b"aad", &ct).unwrap(), b"payload");
    }

    #[test]
    fn test_tamper_yields_bad_record_mac() {
        let aead = create_aead(CipherSuite::TLS_AES_256_GCM_SHA384, &[0x42; 32]).unwrap();
        let nonce = [0x01; 12];
        let mut ct = aead.encrypt(&nonce, b"", b"payload").unwrap();
        ct[0] ^= 1;
        match aead.decrypt(&nonce, b"", &ct) {
            Err(TlsError::Fatal(AlertDescription::BadRecordMac)) => {}
            other => panic!("expected BadRecordMac, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_key_length_rejected() {
        assert!(AesGcmAead::new(&[0u8; 24]).is_err());
    }
}
