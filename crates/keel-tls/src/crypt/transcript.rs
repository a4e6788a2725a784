//! Handshake transcript hash.
//!
//! Buffers the raw handshake message bytes and replays them through a fresh
//! hasher on demand, so intermediate hashes can be taken at any point and
//! the HelloRetryRequest reset can rewrite history deterministically.

use super::HashFactory;
use crate::TlsError;
use crate::handshake::HandshakeType;

/// Append-only transcript of handshake message bytes.
pub struct TranscriptHash {
    factory: HashFactory,
    buffer: Vec<u8>,
    hash_len: usize,
}

impl TranscriptHash {
    /// Create a transcript using the given hash factory.
    pub fn new(factory: HashFactory) -> Self {
        let hash_len = factory().output_size();
        Self {
            factory,
            buffer: Vec::new(),
            hash_len,
        }
    }

    /// Append handshake message bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Hash of everything appended so far. Non-destructive.
    pub fn current_hash(&self) -> Result<Vec<u8>, TlsError> {
        let mut hasher = (self.factory)();
        hasher.update(&self.buffer).map_err(TlsError::Crypto)?;
        let mut out = vec![0u8; self.hash_len];
        hasher.finish(&mut out).map_err(TlsError::Crypto)?;
        Ok(out)
    }

    /// Hash of the empty message sequence, for Derive-Secret(_, _, "").
    pub fn empty_hash(&self) -> Result<Vec<u8>, TlsError> {
        let mut hasher = (self.factory)();
        let mut out = vec![0u8; self.hash_len];
        hasher.finish(&mut out).map_err(TlsError::Crypto)?;
        Ok(out)
    }

    /// Hash output size in bytes.
    pub fn hash_len(&self) -> usize {
        self.hash_len
    }

    /// The raw buffered transcript bytes.
    pub fn transcript_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Replace the buffered transcript with the synthetic `message_hash`
    /// construct of RFC 8446 §4.4.1:
    /// `message_hash(254) || 0 || 0 || Hash.length || Hash(buffer)`.
    ///
    /// Used when a HelloRetryRequest is received.
    pub fn replace_with_message_hash(&mut self) -> Result<(), TlsError> {
        let hash = self.current_hash()?;
        let mut synthetic = Vec::with_capacity(4 + hash.len());
        synthetic.push(HandshakeType::MessageHash as u8);
        synthetic.push(0);
        synthetic.push(0);
        synthetic.push(hash.len() as u8);
        synthetic.extend_from_slice(&hash);
        self.buffer = synthetic;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_crypto::provider::Digest;
    use keel_crypto::sha2::{Sha256, Sha384};

    fn sha256_transcript() -> TranscriptHash {
        TranscriptHash::new(Box::new(|| Box::new(Sha256::new()) as Box<dyn Digest>))
    }

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_empty_hash() {
        let th = sha256_transcript();
        assert_eq!(
            to_hex(&th.empty_hash().unwrap()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        // A fresh transcript's current hash equals the empty hash
        assert_eq!(th.current_hash().unwrap(), th.empty_hash().unwrap());
    }

    #[test]
    fn test_incremental_nondestructive() {
        let mut th = sha256_transcript();
        th.update(b"hello");
        let h1 = th.current_hash().unwrap();
        assert_eq!(h1, th.current_hash().unwrap());

        th.update(b" world");
        let h2 = th.current_hash().unwrap();
        assert_ne!(h1, h2);
        assert_eq!(h2, Sha256::digest(b"hello world").unwrap().to_vec());
    }

    #[test]
    fn test_message_hash_replacement() {
        let mut th = sha256_transcript();
        th.update(b"first ClientHello bytes");
        let ch1_hash = th.current_hash().unwrap();

        th.replace_with_message_hash().unwrap();

        // Buffer is now exactly the synthetic message_hash message
        let mut expected = vec![254u8, 0, 0, 32];
        expected.extend_from_slice(&ch1_hash);
        assert_eq!(th.transcript_bytes(), expected.as_slice());

        // Appending continues after the synthetic message
        th.update(b"HRR");
        assert!(th.transcript_bytes().ends_with(b"HRR"));
    }

    #[test]
    fn test_sha384_transcript() {
        let th = TranscriptHash::new(Box::new(|| Box::new(Sha384::new()) as Box<dyn Digest>));
        assert_eq!(th.hash_len(), 48);
        assert_eq!(
            to_hex(&th.empty_hash().unwrap()),
            "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da274edebfe76f65fbd51ad2f14898b95b"
        );
    }
}
