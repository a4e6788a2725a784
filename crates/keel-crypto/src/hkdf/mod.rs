//! HKDF (RFC 5869): HMAC-based extract-and-expand key derivation.

use crate::hmac::hmac;
use crate::provider::HashFactory;
use keel_types::CryptoError;
use zeroize::Zeroize;

/// HKDF-Extract(salt, IKM) -> PRK.
///
/// `HMAC-Hash(salt, IKM)`; an empty salt means `hash_len` zero bytes.
pub fn hkdf_extract(factory: &HashFactory, salt: &[u8], ikm: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if salt.is_empty() {
        let hash_len = factory().output_size();
        let zero_salt = vec![0u8; hash_len];
        hmac(factory, &zero_salt, ikm)
    } else {
        hmac(factory, salt, ikm)
    }
}

/// HKDF-Expand(PRK, info, length) -> OKM.
///
/// Iterative HMAC expansion; `length` must not exceed 255 * hash_len.
pub fn hkdf_expand(
    factory: &HashFactory,
    prk: &[u8],
    info: &[u8],
    length: usize,
) -> Result<Vec<u8>, CryptoError> {
    let hash_len = factory().output_size();
    let n = length.div_ceil(hash_len);
    if n > 255 {
        return Err(CryptoError::KdfDkLenOverflow);
    }

    let mut okm = Vec::with_capacity(length);
    let mut t_prev: Vec<u8> = Vec::new();

    for i in 1..=n {
        let mut block_input = Vec::with_capacity(t_prev.len() + info.len() + 1);
        block_input.extend_from_slice(&t_prev);
        block_input.extend_from_slice(info);
        block_input.push(i as u8);
        let t = hmac(factory, prk, &block_input)?;
        block_input.zeroize();
        okm.extend_from_slice(&t);
        t_prev = t;
    }

    t_prev.zeroize();
    okm.truncate(length);
    Ok(okm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Digest;
    use crate::sha2::Sha256;

    fn sha256_factory() -> Box<dyn Digest> {
        Box::new(Sha256::new())
    }

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    // RFC 5869 Test Case 1
    #[test]
    fn test_hkdf_rfc5869_case1() {
        let ikm = hex("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b");
        let salt = hex("000102030405060708090a0b0c");
        let info = hex("f0f1f2f3f4f5f6f7f8f9");

        let prk = hkdf_extract(&sha256_factory, &salt, &ikm).unwrap();
        assert_eq!(
            to_hex(&prk),
            "077709362c2e32df0ddc3f0dc47bba6390b6c73bb50f9c3122ec844ad7c2b3e5"
        );

        let okm = hkdf_expand(&sha256_factory, &prk, &info, 42).unwrap();
        assert_eq!(
            to_hex(&okm),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
        );
    }

    // RFC 5869 Test Case 2: longer inputs, multi-block expand
    #[test]
    fn test_hkdf_rfc5869_case2() {
        let ikm = hex(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f\
             202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f\
             404142434445464748494a4b4c4d4e4f",
        );
        let salt = hex(
            "606162636465666768696a6b6c6d6e6f707172737475767778797a7b7c7d7e7f\
             808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f\
             a0a1a2a3a4a5a6a7a8a9aaabacadaeaf",
        );
        let info = hex(
            "b0b1b2b3b4b5b6b7b8b9babbbcbdbebfc0c1c2c3c4c5c6c7c8c9cacbcccdcecf\
             d0d1d2d3d4d5d6d7d8d9dadbdcdddedfe0e1e2e3e4e5e6e7e8e9eaebecedeeef\
             f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff",
        );

        let prk = hkdf_extract(&sha256_factory, &salt, &ikm).unwrap();
        let okm = hkdf_expand(&sha256_factory, &prk, &info, 82).unwrap();
        assert_eq!(
            to_hex(&okm),
            "b11e398dc80327a1c8e7f78c596a49344f012eda2d4efad8a050cc4c19afa97c\
             59045a99cac7827271cb41c65e590e09da3275600c2f09b8367793a9aca3db71\
             cc30c58179ec3e87c14c01d5c1f3434f1d87"
        );
    }

    // RFC 5869 Test Case 3: zero-length salt and info
    #[test]
    fn test_hkdf_rfc5869_case3() {
        let ikm = hex("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b");

        let prk = hkdf_extract(&sha256_factory, &[], &ikm).unwrap();
        assert_eq!(
            to_hex(&prk),
            "19ef24a32c717b167f33a91d6f648bdf96596776afdb6377ac434c1c293ccb04"
        );

        let okm = hkdf_expand(&sha256_factory, &prk, &[], 42).unwrap();
        assert_eq!(
            to_hex(&okm),
            "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d9d201395faa4b61a96c8"
        );
    }

    #[test]
    fn test_hkdf_expand_too_large() {
        let prk = vec![0x42; 32];
        assert!(hkdf_expand(&sha256_factory, &prk, b"", 255 * 32 + 1).is_err());
    }

    #[test]
    fn test_hkdf_expand_prefix_property() {
        // A shorter expansion is a prefix of a longer one with the same info
        let prk = vec![0x42; 32];
        let long = hkdf_expand(&sha256_factory, &prk, b"info", 80).unwrap();
        let short = hkdf_expand(&sha256_factory, &prk, b"info", 32).unwrap();
        assert_eq!(&long[..32], &short[..]);
    }
}
