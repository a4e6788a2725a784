//! Random big number generation from OS randomness.

use crate::bignum::BigNum;
use keel_types::CryptoError;

impl BigNum {
    /// Uniform random value in [1, upper), by rejection sampling.
    pub fn random_below(upper: &BigNum) -> Result<BigNum, CryptoError> {
        if upper.is_zero() || upper.is_one() {
            return Err(CryptoError::InvalidArg);
        }
        let bits = upper.bit_len();
        let num_bytes = bits.div_ceil(8);
        loop {
            let mut buf = vec![0u8; num_bytes];
            getrandom::getrandom(&mut buf).map_err(|_| CryptoError::BnRandGenFail)?;
            let excess = num_bytes * 8 - bits;
            if excess > 0 {
                buf[0] &= 0xFF >> excess;
            }
            let candidate = BigNum::from_bytes_be(&buf);
            if !candidate.is_zero() && candidate < *upper {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_below_range() {
        let upper = BigNum::from_u64(1000);
        for _ in 0..50 {
            let r = BigNum::random_below(&upper).unwrap();
            assert!(!r.is_zero());
            assert!(r < upper);
        }
    }

    #[test]
    fn test_random_below_rejects_trivial_bounds() {
        assert!(BigNum::random_below(&BigNum::zero()).is_err());
        assert!(BigNum::random_below(&BigNum::from_u64(1)).is_err());
    }

    #[test]
    fn test_random_below_large_bound() {
        let upper = BigNum::from_bytes_be(&[0xFF; 32]);
        let r = BigNum::random_below(&upper).unwrap();
        assert!(r < upper);
    }
}
