#![no_main]
use keel_tls::handshake::codec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((msg_type, body, _)) = codec::parse_handshake_header(data) {
        use keel_tls::handshake::HandshakeType::*;
        let _ = match msg_type {
            ClientHello => codec::decode_client_hello(body).map(|_| ()),
            ServerHello => codec::decode_server_hello(body).map(|_| ()),
            EncryptedExtensions => codec::decode_encrypted_extensions(body).map(|_| ()),
            Certificate => codec::decode_certificate(body).map(|_| ()),
            CertificateRequest => codec::decode_certificate_request(body).map(|_| ()),
            CertificateVerify => codec::decode_certificate_verify(body).map(|_| ()),
            Finished => codec::decode_finished(body, 32).map(|_| ()),
            NewSessionTicket => codec::decode_new_session_ticket(body).map(|_| ()),
            KeyUpdate => codec::decode_key_update(body).map(|_| ()),
            MessageHash => Ok(()),
        };
    }
});
