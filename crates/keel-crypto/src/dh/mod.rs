//! Finite-field Diffie-Hellman over RFC 7919 FFDHE groups.

mod groups;

pub use groups::FfdheGroup;

use keel_bignum::{BigNum, MontgomeryCtx};
use keel_types::CryptoError;
use zeroize::Zeroize;

/// DH domain parameters (p, g).
pub struct DhParams {
    p: BigNum,
    g: BigNum,
    mont: MontgomeryCtx,
}

impl DhParams {
    /// Parameters for a predefined RFC 7919 group.
    pub fn from_group(group: FfdheGroup) -> Result<Self, CryptoError> {
        let (p, g) = groups::group_params(group);
        let mont = MontgomeryCtx::new(&p)?;
        Ok(DhParams { p, g, mont })
    }

    /// The prime size in bytes (shared secrets and public values are padded
    /// to this length).
    pub fn prime_size(&self) -> usize {
        self.p.bit_len().div_ceil(8)
    }
}

/// An ephemeral DH key pair.
pub struct DhKeyPair {
    /// Private exponent x.
    private_key: BigNum,
    /// Public value y = g^x mod p.
    public_key: BigNum,
}

impl Drop for DhKeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl DhKeyPair {
    /// Generate a key pair: x random in [2, p-2], y = g^x mod p.
    pub fn generate(params: &DhParams) -> Result<Self, CryptoError> {
        let p_minus_2 = params.p.sub(&BigNum::from_u64(2));
        let mut x = BigNum::random_below(&p_minus_2)?;
        if x < BigNum::from_u64(2) {
            x = BigNum::from_u64(2);
        }
        let y = params.mont.mod_exp(&params.g, &x)?;
        Ok(DhKeyPair {
            private_key: x,
            public_key: y,
        })
    }

    /// The public value in big-endian bytes, padded to the prime size.
    pub fn public_key_bytes(&self, params: &DhParams) -> Result<Vec<u8>, CryptoError> {
        self.public_key.to_bytes_be_padded(params.prime_size())
    }

    /// Shared secret y_peer^x mod p, padded to the prime size.
    ///
    /// The peer value must satisfy 2 <= y <= p-2 (RFC 7919 §5.1).
    pub fn compute_shared_secret(
        &self,
        params: &DhParams,
        peer_public_key: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let peer = BigNum::from_bytes_be(peer_public_key);
        if peer <= BigNum::from_u64(1) || peer >= params.p.sub(&BigNum::from_u64(1)) {
            return Err(CryptoError::KxInvalidPublicKey);
        }
        let shared = params.mont.mod_exp(&peer, &self.private_key)?;
        shared.to_bytes_be_padded(params.prime_size())
    }
}
