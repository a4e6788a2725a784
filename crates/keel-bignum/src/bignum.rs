//! Big number type: representation and conversions.

use zeroize::Zeroize;

/// Limb type (64-bit).
pub(crate) type Limb = u64;
/// Double-width type for multiplication intermediates.
pub(crate) type DoubleLimb = u128;

/// Bits per limb.
pub(crate) const LIMB_BITS: usize = 64;

/// An unsigned heap-allocated big number, zeroized on drop.
///
/// Little-endian limb order: `limbs[0]` is the least significant.
/// Only the operations finite-field Diffie-Hellman needs are provided;
/// there is no signed arithmetic.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct BigNum {
    pub(crate) limbs: Vec<Limb>,
}

impl BigNum {
    /// The value zero.
    pub fn zero() -> Self {
        Self { limbs: vec![0] }
    }

    /// Construct from a `u64`.
    pub fn from_u64(value: u64) -> Self {
        Self { limbs: vec![value] }
    }

    /// Construct from big-endian bytes.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::zero();
        }
        let mut limbs = vec![0u64; bytes.len().div_ceil(8)];
        for (i, &byte) in bytes.iter().rev().enumerate() {
            limbs[i / 8] |= (byte as u64) << ((i % 8) * 8);
        }
        let mut bn = Self { limbs };
        bn.normalize();
        bn
    }

    /// Export as big-endian bytes without leading zeros (zero encodes as one byte).
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let bits = self.bit_len();
        if bits == 0 {
            return vec![0];
        }
        let num_bytes = bits.div_ceil(8);
        let mut bytes = vec![0u8; num_bytes];
        for i in 0..num_bytes {
            bytes[num_bytes - 1 - i] = (self.limbs[i / 8] >> ((i % 8) * 8)) as u8;
        }
        bytes
    }

    /// Export as big-endian bytes left-padded with zeros to exactly `len` bytes.
    pub fn to_bytes_be_padded(&self, len: usize) -> Result<Vec<u8>, keel_types::CryptoError> {
        let raw = self.to_bytes_be();
        let raw = if raw == [0] { Vec::new() } else { raw };
        if raw.len() > len {
            return Err(keel_types::CryptoError::InvalidArg);
        }
        let mut out = vec![0u8; len];
        out[len - raw.len()..].copy_from_slice(&raw);
        Ok(out)
    }

    /// Number of significant bits.
    pub fn bit_len(&self) -> usize {
        for i in (0..self.limbs.len()).rev() {
            if self.limbs[i] != 0 {
                return i * LIMB_BITS + (LIMB_BITS - self.limbs[i].leading_zeros() as usize);
            }
        }
        0
    }

    /// True if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&l| l == 0)
    }

    /// True if the value is one.
    pub fn is_one(&self) -> bool {
        self.limbs[0] == 1 && self.limbs[1..].iter().all(|&l| l == 0)
    }

    /// True if the value is odd.
    pub fn is_odd(&self) -> bool {
        self.limbs[0] & 1 == 1
    }

    /// Bit at position `idx` (0 = least significant).
    pub fn get_bit(&self, idx: usize) -> u64 {
        let limb_idx = idx / LIMB_BITS;
        if limb_idx >= self.limbs.len() {
            0
        } else {
            (self.limbs[limb_idx] >> (idx % LIMB_BITS)) & 1
        }
    }

    /// Number of limbs.
    pub(crate) fn num_limbs(&self) -> usize {
        self.limbs.len()
    }

    /// Drop leading zero limbs (always keeps at least one limb).
    pub(crate) fn normalize(&mut self) {
        while self.limbs.len() > 1 && *self.limbs.last().unwrap() == 0 {
            self.limbs.pop();
        }
    }
}

impl std::fmt::Debug for BigNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex: String = self
            .to_bytes_be()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        write!(f, "BigNum(0x{hex})")
    }
}

impl PartialEq for BigNum {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for BigNum {}

impl PartialOrd for BigNum {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigNum {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let a_bits = self.bit_len();
        let b_bits = other.bit_len();
        if a_bits != b_bits {
            return a_bits.cmp(&b_bits);
        }
        for i in (0..self.limbs.len().max(other.limbs.len())).rev() {
            let a = self.limbs.get(i).copied().unwrap_or(0);
            let b = other.limbs.get(i).copied().unwrap_or(0);
            if a != b {
                return a.cmp(&b);
            }
        }
        std::cmp::Ordering::Equal
    }
}
