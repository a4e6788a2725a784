//! Cross-crate integration tests for the keel TLS stack.
//! Exercises the crypto primitives through the protocol engine's seams.

#[cfg(test)]
mod tests {
    use keel_crypto::provider::Digest;
    use keel_crypto::sha2::Sha256;
    use keel_tls::crypt::key_schedule::KeySchedule;
    use keel_tls::crypt::CipherSuiteParams;
    use keel_tls::crypt::NamedGroup;
    use keel_tls::handshake::key_exchange::create_key_exchange;
    use keel_tls::record::{ContentType, RecordLayer};
    use keel_tls::{CipherSuite, TlsRole};
    use std::io::Cursor;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    // -------------------------------------------------------
    // 1. AES-GCM zero-vector through the crypto crate
    // -------------------------------------------------------
    #[test]
    fn test_aes128_gcm_zero_vector() {
        let key = [0u8; 16];
        let nonce = [0u8; 12];
        let out = keel_crypto::gcm::gcm_encrypt(&key, &nonce, &[], &[]).unwrap();
        assert_eq!(to_hex(&out), "58e2fccefa7e3061367f1d57a4e7455a");
        let pt = keel_crypto::gcm::gcm_decrypt(&key, &nonce, &[], &out).unwrap();
        assert!(pt.is_empty());
    }

    // -------------------------------------------------------
    // 2. Key exchange → key schedule → record layer, both suites
    // -------------------------------------------------------
    fn run_exchange_and_echo(group: NamedGroup, suite: CipherSuite) {
        // Ephemeral exchange between two endpoints
        let client_kx = create_key_exchange(group).unwrap();
        let server_kx = create_key_exchange(group).unwrap();
        let client_shared = client_kx
            .compute_shared_secret(server_kx.public_key_bytes())
            .unwrap();
        let server_shared = server_kx
            .compute_shared_secret(client_kx.public_key_bytes())
            .unwrap();
        assert_eq!(client_shared, server_shared);

        // Both sides run the schedule to handshake keys
        let params = CipherSuiteParams::from_suite(suite).unwrap();
        let transcript_hash = vec![0x5Au8; params.hash_len];
        let mut client = KeySchedule::new(params.clone(), TlsRole::Client);
        let mut server = KeySchedule::new(params, TlsRole::Server);
        for ks in [&mut client, &mut server] {
            ks.advance(None).unwrap();
            ks.advance(Some(&client_shared)).unwrap();
            ks.install_handshake_keys(&transcript_hash).unwrap();
        }

        // Records flow in both directions through the shared schedule
        let rl = RecordLayer::new();
        let wire = rl
            .encode(ContentType::Handshake, b"interop payload", Some(&mut client))
            .unwrap();
        let record = rl
            .extract(&mut Cursor::new(wire), Some(&mut server))
            .unwrap();
        assert_eq!(record.content_type, ContentType::Handshake);
        assert_eq!(record.fragment, b"interop payload");

        let wire = rl
            .encode(ContentType::ApplicationData, b"reply", Some(&mut server))
            .unwrap();
        let record = rl
            .extract(&mut Cursor::new(wire), Some(&mut client))
            .unwrap();
        assert_eq!(record.fragment, b"reply");
    }

    #[test]
    fn test_x25519_aes128_end_to_end() {
        run_exchange_and_echo(NamedGroup::X25519, CipherSuite::TLS_AES_128_GCM_SHA256);
    }

    #[test]
    fn test_x25519_aes256_end_to_end() {
        run_exchange_and_echo(NamedGroup::X25519, CipherSuite::TLS_AES_256_GCM_SHA384);
    }

    #[test]
    fn test_ffdhe2048_aes128_end_to_end() {
        run_exchange_and_echo(NamedGroup::FFDHE2048, CipherSuite::TLS_AES_128_GCM_SHA256);
    }

    // -------------------------------------------------------
    // 3. TLS HKDF labels over the raw HKDF primitives
    // -------------------------------------------------------
    #[test]
    fn test_expand_label_is_hkdf_expand_with_label_info() {
        let factory = || Box::new(Sha256::new()) as Box<dyn Digest>;
        let secret = hex("33ad0a1c607ec03b09e6cd9893680ce210adf300aa1f2660e1b22e10f170f92a");

        let via_label =
            keel_tls::crypt::hkdf::hkdf_expand_label(&factory, &secret, b"key", b"", 16).unwrap();

        // Hand-build the HkdfLabel info and call raw HKDF-Expand
        let mut info = Vec::new();
        info.extend_from_slice(&16u16.to_be_bytes());
        info.push(9);
        info.extend_from_slice(b"tls13 key");
        info.push(0);
        let via_raw = keel_crypto::hkdf::hkdf_expand(&factory, &secret, &info, 16).unwrap();

        assert_eq!(via_label, via_raw);
    }

    // -------------------------------------------------------
    // 4. Bignum exponentiation commutativity (the DH group law)
    // -------------------------------------------------------
    #[test]
    fn test_mod_exp_commutativity() {
        use keel_bignum::{BigNum, MontgomeryCtx};

        // (g^a)^b == (g^b)^a in a small prime field
        let p = BigNum::from_u64(0xFFFF_FFFF_FFFF_FFC5);
        let ctx = MontgomeryCtx::new(&p).unwrap();
        let g = BigNum::from_u64(2);
        let a = BigNum::from_u64(0x1234_5678);
        let b = BigNum::from_u64(0x9ABC_DEF0);

        let ga = ctx.mod_exp(&g, &a).unwrap();
        let gb = ctx.mod_exp(&g, &b).unwrap();
        let gab = ctx.mod_exp(&ga, &b).unwrap();
        let gba = ctx.mod_exp(&gb, &a).unwrap();
        assert_eq!(gab, gba);
    }

    // -------------------------------------------------------
    // 5. Transcript hash agrees with the bare digest
    // -------------------------------------------------------
    #[test]
    fn test_transcript_matches_digest() {
        use keel_tls::crypt::transcript::TranscriptHash;

        let mut th = TranscriptHash::new(Box::new(|| Box::new(Sha256::new()) as Box<dyn Digest>));
        th.update(b"ClientHello bytes");
        th.update(b"ServerHello bytes");
        let expected = Sha256::digest(b"ClientHello bytesServerHello bytes").unwrap();
        assert_eq!(th.current_hash().unwrap(), expected.to_vec());
    }
}
