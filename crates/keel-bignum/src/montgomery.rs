//! Montgomery modular exponentiation.
//!
//! Division-free: R² mod N is built by repeated doubling with conditional
//! subtraction, and reduction inside the exponentiation loop is Montgomery
//! REDC (HAC 14.32).

use crate::bignum::{BigNum, DoubleLimb, Limb, LIMB_BITS};
use keel_types::CryptoError;

/// Montgomery context for a fixed odd modulus, R = 2^(m_size * 64).
pub struct MontgomeryCtx {
    modulus: BigNum,
    m_size: usize,
    /// N' with N[0] * N' ≡ -1 (mod 2^64).
    n_prime: u64,
    /// R² mod N, for encoding into Montgomery form.
    r_squared: BigNum,
}

impl MontgomeryCtx {
    /// Create a context for the given modulus. The modulus must be odd.
    pub fn new(modulus: &BigNum) -> Result<Self, CryptoError> {
        if modulus.is_zero() {
            return Err(CryptoError::BnDivisionByZero);
        }
        if !modulus.is_odd() {
            return Err(CryptoError::InvalidArg);
        }
        let m_size = modulus.num_limbs();
        let n_prime = compute_n_prime(modulus.limbs[0]);
        let r_squared = compute_r_squared(modulus, m_size);
        Ok(MontgomeryCtx {
            modulus: modulus.clone(),
            m_size,
            n_prime,
            r_squared,
        })
    }

    /// base^exp mod N, with base already reduced below N.
    ///
    /// Left-to-right square-and-multiply over the Montgomery domain.
    pub fn mod_exp(&self, base: &BigNum, exp: &BigNum) -> Result<BigNum, CryptoError> {
        if base >= &self.modulus {
            return Err(CryptoError::InvalidArg);
        }
        if exp.is_zero() {
            return Ok(if self.modulus.is_one() {
                BigNum::zero()
            } else {
                BigNum::from_u64(1)
            });
        }

        let base_mont = self.to_mont(base);
        let one_mont = self.to_mont(&BigNum::from_u64(1));
        let mut acc = one_mont;
        for i in (0..exp.bit_len()).rev() {
            acc = self.mont_mul(&acc, &acc);
            if exp.get_bit(i) == 1 {
                acc = self.mont_mul(&acc, &base_mont);
            }
        }
        Ok(self.from_mont(&acc))
    }

    /// Convert into Montgomery form: aR mod N (a must be < N).
    fn to_mont(&self, a: &BigNum) -> BigNum {
        self.mont_reduce(&a.mul(&self.r_squared))
    }

    /// Convert out of Montgomery form: a·R⁻¹ mod N.
    fn from_mont(&self, a_mont: &BigNum) -> BigNum {
        self.mont_reduce(a_mont)
    }

    /// Montgomery multiplication: a·b·R⁻¹ mod N (operands in Montgomery form).
    fn mont_mul(&self, a: &BigNum, b: &BigNum) -> BigNum {
        self.mont_reduce(&a.mul(b))
    }

    /// Montgomery REDC: T → T·R⁻¹ mod N.
    fn mont_reduce(&self, t: &BigNum) -> BigNum {
        let m = self.m_size;
        let mod_limbs = &self.modulus.limbs;

        let mut work = vec![0u64; 2 * m + 2];
        let copy_len = t.limbs.len().min(work.len());
        work[..copy_len].copy_from_slice(&t.limbs[..copy_len]);

        for i in 0..m {
            let q = work[i].wrapping_mul(self.n_prime);
            let mut carry: u64 = 0;
            for j in 0..m {
                let prod = q as DoubleLimb * mod_limbs[j] as DoubleLimb
                    + work[i + j] as DoubleLimb
                    + carry as DoubleLimb;
                work[i + j] = prod as Limb;
                carry = (prod >> LIMB_BITS) as u64;
            }
            let mut k = i + m;
            while carry != 0 && k < work.len() {
                let sum = work[k] as DoubleLimb + carry as DoubleLimb;
                work[k] = sum as Limb;
                carry = (sum >> LIMB_BITS) as u64;
                k += 1;
            }
        }

        let mut result = BigNum {
            limbs: work[m..2 * m + 1].to_vec(),
        };
        result.normalize();
        if result >= self.modulus {
            result = result.sub(&self.modulus);
        }
        result
    }
}

/// R² mod N by repeated doubling: start at 1, double 2·m_size·64 times,
/// conditionally subtracting N. Avoids implementing long division.
fn compute_r_squared(modulus: &BigNum, m_size: usize) -> BigNum {
    let mut r = BigNum::from_u64(1);
    for _ in 0..(2 * m_size * LIMB_BITS) {
        r.shl1();
        if r >= *modulus {
            r = r.sub(modulus);
        }
    }
    r
}

/// N' with N[0]·N' ≡ -1 (mod 2^64), by Newton iteration on the inverse.
fn compute_n_prime(n0: u64) -> u64 {
    let mut x: u64 = 1;
    for _ in 0..6 {
        x = x.wrapping_mul(2u64.wrapping_sub(n0.wrapping_mul(x)));
    }
    x.wrapping_neg()
}
