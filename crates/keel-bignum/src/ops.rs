//! Schoolbook arithmetic on unsigned limb arrays.

use crate::bignum::{BigNum, DoubleLimb, Limb, LIMB_BITS};

impl BigNum {
    /// Addition: self + other.
    pub fn add(&self, other: &BigNum) -> BigNum {
        let max_len = self.limbs.len().max(other.limbs.len());
        let mut limbs = vec![0u64; max_len + 1];
        let mut carry: u64 = 0;
        for (i, limb) in limbs.iter_mut().take(max_len).enumerate() {
            let a = self.limbs.get(i).copied().unwrap_or(0);
            let b = other.limbs.get(i).copied().unwrap_or(0);
            let sum = a as DoubleLimb + b as DoubleLimb + carry as DoubleLimb;
            *limb = sum as Limb;
            carry = (sum >> LIMB_BITS) as u64;
        }
        limbs[max_len] = carry;
        let mut bn = BigNum { limbs };
        bn.normalize();
        bn
    }

    /// Subtraction: self - other. Requires self >= other.
    pub fn sub(&self, other: &BigNum) -> BigNum {
        debug_assert!(self >= other, "BigNum::sub underflow");
        let mut limbs = vec![0u64; self.limbs.len()];
        let mut borrow: u64 = 0;
        for (i, limb) in limbs.iter_mut().enumerate() {
            let a = self.limbs[i];
            let b = other.limbs.get(i).copied().unwrap_or(0);
            let (d1, b1) = a.overflowing_sub(b);
            let (d2, b2) = d1.overflowing_sub(borrow);
            *limb = d2;
            borrow = (b1 as u64) + (b2 as u64);
        }
        let mut bn = BigNum { limbs };
        bn.normalize();
        bn
    }

    /// Multiplication: self * other.
    pub fn mul(&self, other: &BigNum) -> BigNum {
        if self.is_zero() || other.is_zero() {
            return BigNum::zero();
        }
        let mut limbs = vec![0u64; self.limbs.len() + other.limbs.len()];
        for i in 0..self.limbs.len() {
            let mut carry: u64 = 0;
            for j in 0..other.limbs.len() {
                let prod = self.limbs[i] as DoubleLimb * other.limbs[j] as DoubleLimb
                    + limbs[i + j] as DoubleLimb
                    + carry as DoubleLimb;
                limbs[i + j] = prod as Limb;
                carry = (prod >> LIMB_BITS) as u64;
            }
            limbs[i + other.limbs.len()] = carry;
        }
        let mut bn = BigNum { limbs };
        bn.normalize();
        bn
    }

    /// Shift left by one bit, in place.
    pub(crate) fn shl1(&mut self) {
        let mut carry = 0u64;
        for limb in self.limbs.iter_mut() {
            let new_carry = *limb >> 63;
            *limb = (*limb << 1) | carry;
            carry = new_carry;
        }
        if carry != 0 {
            self.limbs.push(carry);
        }
    }
}
