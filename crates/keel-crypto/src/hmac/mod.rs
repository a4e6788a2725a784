//! HMAC (RFC 2104) over any `Digest`.
//!
//! HMAC(K, m) = H((K' XOR opad) || H((K' XOR ipad) || m))
//! where K' is the key padded/hashed to block size, ipad = 0x36, opad = 0x5c.

use crate::provider::{Digest, HashFactory};
use keel_types::CryptoError;
use zeroize::Zeroize;

/// Prepare the HMAC key block: hash if longer than the block size, else zero-pad.
fn prepare_key_block(factory: &HashFactory, key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let sample = factory();
    let block_size = sample.block_size();
    let output_size = sample.output_size();
    drop(sample);

    let mut key_block = vec![0u8; block_size];
    if key.len() > block_size {
        let mut hasher = factory();
        hasher.update(key)?;
        let mut hashed = vec![0u8; output_size];
        hasher.finish(&mut hashed)?;
        key_block[..output_size].copy_from_slice(&hashed);
        hashed.zeroize();
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }
    Ok(key_block)
}

/// One-shot HMAC: `HMAC(key, data)`.
pub fn hmac(factory: &HashFactory, key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut ctx = Hmac::new(factory, key)?;
    ctx.update(data)?;
    ctx.finish()
}

/// Streaming HMAC context.
///
/// The outer hash pass reuses the inner digest after `reset()`, so only one
/// digest instance is held.
pub struct Hmac {
    inner: Box<dyn Digest>,
    /// Key block XOR opad, kept for the final outer hash.
    opad_key: Vec<u8>,
    output_size: usize,
}

impl Drop for Hmac {
    fn drop(&mut self) {
        self.opad_key.zeroize();
    }
}

impl Hmac {
    /// Create an HMAC context keyed with `key`.
    pub fn new(factory: &HashFactory, key: &[u8]) -> Result<Self, CryptoError> {
        let mut key_block = prepare_key_block(factory, key)?;

        let mut inner = factory();
        let output_size = inner.output_size();
        let mut ipad_key: Vec<u8> = key_block.iter().map(|b| b ^ 0x36).collect();
        inner.update(&ipad_key)?;
        ipad_key.zeroize();

        let opad_key: Vec<u8> = key_block.iter().map(|b| b ^ 0x5c).collect();
        key_block.zeroize();

        Ok(Self {
            inner,
            opad_key,
            output_size,
        })
    }

    /// Feed message data.
    pub fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.inner.update(data)
    }

    /// Finalize and return the MAC.
    pub fn finish(&mut self) -> Result<Vec<u8>, CryptoError> {
        let mut inner_hash = vec![0u8; self.output_size];
        self.inner.finish(&mut inner_hash)?;

        // Outer pass reuses the digest after reset.
        self.inner.reset();
        self.inner.update(&self.opad_key)?;
        self.inner.update(&inner_hash)?;
        inner_hash.zeroize();

        let mut out = vec![0u8; self.output_size];
        self.inner.finish(&mut out)?;
        Ok(out)
    }
}
