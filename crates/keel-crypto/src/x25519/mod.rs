//! X25519 Diffie-Hellman key exchange (RFC 7748).

mod field;

use field::Fe25519;
use keel_types::CryptoError;
use zeroize::Zeroize;

/// X25519 key size in bytes.
pub const X25519_KEY_SIZE: usize = 32;

/// The u-coordinate of the base point (9).
const BASEPOINT_U: [u8; 32] = [
    9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// An X25519 private key (clamped scalar).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct X25519PrivateKey {
    key: [u8; X25519_KEY_SIZE],
}

/// An X25519 public key (u-coordinate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X25519PublicKey {
    key: [u8; X25519_KEY_SIZE],
}

impl X25519PrivateKey {
    /// Generate a fresh random private key.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut key = [0u8; X25519_KEY_SIZE];
        getrandom::getrandom(&mut key).map_err(|_| CryptoError::BnRandGenFail)?;
        clamp_scalar(&mut key);
        Ok(Self { key })
    }

    /// Build a private key from 32 raw bytes (clamped per RFC 7748 §5).
    pub fn new(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut key: [u8; X25519_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidArg)?;
        clamp_scalar(&mut key);
        Ok(Self { key })
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey {
            key: scalar_mul(&self.key, &BASEPOINT_U),
        }
    }

    /// The X25519 function with a peer's public key.
    ///
    /// Rejects the all-zero output produced by small-order peer points.
    pub fn diffie_hellman(&self, peer_public: &X25519PublicKey) -> Result<Vec<u8>, CryptoError> {
        let shared = scalar_mul(&self.key, &peer_public.key);
        if shared.iter().all(|&b| b == 0) {
            return Err(CryptoError::KxDegenerateSecret);
        }
        Ok(shared.to_vec())
    }
}

impl X25519PublicKey {
    /// Build a public key from 32 raw bytes.
    pub fn new(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; X25519_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::KxInvalidPublicKey)?;
        Ok(Self { key })
    }

    /// The raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.key
    }
}

/// Clamp a scalar per RFC 7748 §5.
fn clamp_scalar(k: &mut [u8; 32]) {
    k[0] &= 248;
    k[31] &= 127;
    k[31] |= 64;
}

/// Montgomery-ladder scalar multiplication (RFC 7748 §5).
fn scalar_mul(scalar: &[u8; 32], u_bytes: &[u8; 32]) -> [u8; 32] {
    // Mask the top bit of the u-coordinate before decoding
    let mut u_in = *u_bytes;
    u_in[31] &= 0x7f;
    let u = Fe25519::from_bytes(&u_in);

    let mut x_2 = Fe25519::one();
    let mut z_2 = Fe25519::zero();
    let mut x_3 = u;
    let mut z_3 = Fe25519::one();
    let mut swap: u8 = 0;

    for t in (0..=254).rev() {
        let k_t = (scalar[t / 8] >> (t % 8)) & 1;
        swap ^= k_t;
        x_2.conditional_swap(&mut x_3, swap);
        z_2.conditional_swap(&mut z_3, swap);
        swap = k_t;

        let a = x_2.add(&z_2);
        let aa = a.square();
        let b = x_2.sub(&z_2);
        let bb = b.square();
        let e = aa.sub(&bb);
        let c = x_3.add(&z_3);
        let d = x_3.sub(&z_3);
        let da = d.mul(&a);
        let cb = c.mul(&b);
        x_3 = da.add(&cb).square();
        z_3 = u.mul(&da.sub(&cb).square());
        x_2 = aa.mul(&bb);
        z_2 = e.mul(&bb.add(&e.mul121666()));
    }

    x_2.conditional_swap(&mut x_3, swap);
    z_2.conditional_swap(&mut z_3, swap);

    x_2.mul(&z_2.invert()).to_bytes()
}
