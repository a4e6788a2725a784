//! GCM (Galois/Counter Mode) authenticated encryption (NIST SP 800-38D).
//!
//! GHASH uses a 16-entry table for 4-bit multiplication in GF(2^128).
//! Driven through the `BlockCipher` trait; AES-GCM entry points below.

use crate::aes::AesKey;
use crate::provider::BlockCipher;
use keel_types::CryptoError;
use subtle::ConstantTimeEq;

/// GCM authentication tag size in bytes.
pub const GCM_TAG_SIZE: usize = 16;

// Reduction table for 4-bit GHASH: TABLE_P4[i] = (i * R) >> 120, R = 0xE1 << 120.
const TABLE_P4: [u64; 16] = [
    0x0000000000000000,
    0x1c20000000000000,
    0x3840000000000000,
    0x2460000000000000,
    0x7080000000000000,
    0x6ca0000000000000,
    0x48c0000000000000,
    0x54e0000000000000,
    0xe100000000000000,
    0xfd20000000000000,
    0xd940000000000000,
    0xc560000000000000,
    0x9180000000000000,
    0x8da0000000000000,
    0xa9c0000000000000,
    0xb5e0000000000000,
];

/// GF(2^128) element as a (high, low) u64 pair.
#[derive(Clone, Copy, Default)]
struct Gf128 {
    h: u64,
    l: u64,
}

impl Gf128 {
    fn from_bytes(b: &[u8; 16]) -> Self {
        Self {
            h: u64::from_be_bytes(b[..8].try_into().unwrap()),
            l: u64::from_be_bytes(b[8..].try_into().unwrap()),
        }
    }

    fn to_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.h.to_be_bytes());
        out[8..].copy_from_slice(&self.l.to_be_bytes());
        out
    }

    fn xor(self, other: Self) -> Self {
        Self {
            h: self.h ^ other.h,
            l: self.l ^ other.l,
        }
    }

    /// Right shift by 4 bits.
    fn shr4(self) -> Self {
        Self {
            h: self.h >> 4,
            l: (self.l >> 4) | (self.h << 60),
        }
    }
}

/// Precomputed GHASH multiplication table for the hash subkey H.
struct GhashKey {
    table: [Gf128; 16],
}

impl GhashKey {
    fn new(h: &[u8; 16]) -> Self {
        let mut table = [Gf128::default(); 16];
        table[8] = Gf128::from_bytes(h);

        // table[4], table[2], table[1] by successive halving in GF(2^128)
        let mut cur = table[8];
        for &idx in &[4usize, 2, 1] {
            let carry = (cur.l & 1) != 0;
            cur = Gf128 {
                h: cur.h >> 1,
                l: (cur.l >> 1) | (cur.h << 63),
            };
            if carry {
                cur.h ^= 0xe100000000000000;
            }
            table[idx] = cur;
        }

        // Remaining entries by XOR of the power-of-two entries
        for i in 2..16u8 {
            if i.count_ones() > 1 {
                let msb = 1u8 << (7 - i.leading_zeros());
                table[i as usize] = table[msb as usize].xor(table[(i ^ msb) as usize]);
            }
        }

        Self { table }
    }

    /// state = (state XOR block) * H.
    fn absorb_block(&self, state: &mut Gf128, block: &[u8; 16]) {
        let x = state.xor(Gf128::from_bytes(block));
        let mut z = Gf128::default();

        let x_bytes = x.to_bytes();
        for &byte in x_bytes.iter().rev() {
            for nibble in [byte & 0x0f, byte >> 4] {
                let rem = (z.l & 0x0f) as usize;
                z = z.shr4();
                z.h ^= TABLE_P4[rem];
                z = z.xor(self.table[nibble as usize]);
            }
        }

        *state = z;
    }

    /// Absorb variable-length data, zero-padded to the block boundary.
    fn absorb(&self, state: &mut Gf128, data: &[u8]) {
        for chunk in data.chunks(16) {
            let mut block = [0u8; 16];
            block[..chunk.len()].copy_from_slice(chunk);
            self.absorb_block(state, &block);
        }
    }
}

/// Increment the last 4 bytes of the counter block (INC32).
fn inc32(counter: &mut [u8; 16]) {
    let ctr =
        u32::from_be_bytes([counter[12], counter[13], counter[14], counter[15]]).wrapping_add(1);
    counter[12..16].copy_from_slice(&ctr.to_be_bytes());
}

/// CTR keystream application plus GHASH tag computation.
fn gcm_crypt(
    cipher: &dyn BlockCipher,
    nonce: &[u8],
    aad: &[u8],
    input: &[u8],
    encrypting: bool,
) -> Result<(Vec<u8>, [u8; GCM_TAG_SIZE]), CryptoError> {
    if nonce.is_empty() {
        return Err(CryptoError::InvalidIvLength);
    }

    // H = E_K(0^128)
    let mut h = [0u8; 16];
    cipher.encrypt_block(&mut h)?;
    let ghash = GhashKey::new(&h);

    // J0: 96-bit nonce gets counter 1 appended, others go through GHASH
    let mut j0 = [0u8; 16];
    if nonce.len() == 12 {
        j0[..12].copy_from_slice(nonce);
        j0[15] = 1;
    } else {
        let mut state = Gf128::default();
        ghash.absorb(&mut state, nonce);
        let mut len_block = [0u8; 16];
        len_block[8..16].copy_from_slice(&((nonce.len() as u64 * 8).to_be_bytes()));
        ghash.absorb_block(&mut state, &len_block);
        j0 = state.to_bytes();
    }

    let mut ek0 = j0;
    cipher.encrypt_block(&mut ek0)?;

    let mut counter = j0;
    inc32(&mut counter);

    let mut output = input.to_vec();
    for chunk in output.chunks_mut(16) {
        let mut keystream = counter;
        cipher.encrypt_block(&mut keystream)?;
        for (d, &k) in chunk.iter_mut().zip(keystream.iter()) {
            *d ^= k;
        }
        inc32(&mut counter);
    }

    // Tag = GHASH(AAD || C || len(AAD) || len(C)) XOR E_K(J0)
    let mut state = Gf128::default();
    ghash.absorb(&mut state, aad);
    let ciphertext = if encrypting { &output } else { input };
    ghash.absorb(&mut state, ciphertext);

    let mut len_block = [0u8; 16];
    len_block[..8].copy_from_slice(&((aad.len() as u64 * 8).to_be_bytes()));
    len_block[8..16].copy_from_slice(&((ciphertext.len() as u64 * 8).to_be_bytes()));
    ghash.absorb_block(&mut state, &len_block);

    let mut tag = state.to_bytes();
    for (t, &e) in tag.iter_mut().zip(ek0.iter()) {
        *t ^= e;
    }

    Ok((output, tag))
}

/// AES-GCM encryption. Returns `ciphertext || tag`.
pub fn gcm_encrypt(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = AesKey::new(key)?;
    let (mut ct, tag) = gcm_crypt(&cipher, nonce, aad, plaintext, true)?;
    ct.extend_from_slice(&tag);
    Ok(ct)
}

/// AES-GCM decryption of `ciphertext || tag`.
///
/// Returns the plaintext, or `AeadTagVerifyFail` without any partial output
/// if authentication fails. The tag comparison is constant time.
pub fn gcm_decrypt(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < GCM_TAG_SIZE {
        return Err(CryptoError::InvalidArg);
    }
    let (ct_data, received_tag) = ciphertext.split_at(ciphertext.len() - GCM_TAG_SIZE);

    let cipher = AesKey::new(key)?;
    let (plaintext, computed_tag) = gcm_crypt(&cipher, nonce, aad, ct_data, false)?;

    if computed_tag.ct_eq(received_tag).unwrap_u8() != 1 {
        return Err(CryptoError::AeadTagVerifyFail);
    }
    Ok(plaintext)
}
