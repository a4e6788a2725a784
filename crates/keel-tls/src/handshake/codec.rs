//! Handshake message encoding and decoding (RFC 8446 Section 4).

use crate::alert::AlertDescription;
use crate::crypt::SignatureScheme;
use crate::extensions::{ExtensionBlock, MessageContext};
use crate::{CipherSuite, TlsError};

use super::HandshakeType;

/// The fixed ServerHello.random value that marks a HelloRetryRequest
/// (RFC 8446 §4.1.3): SHA-256 of "HelloRetryRequest".
pub const HELLO_RETRY_REQUEST_RANDOM: [u8; 32] = [
    0xCF, 0x21, 0xAD, 0x74, 0xE5, 0x9A, 0x61, 0x11, 0xBE, 0x1D, 0x8C, 0x02, 0x1E, 0x65, 0xB8,
    0x91, 0xC2, 0xA2, 0x11, 0x16, 0x7A, 0xBB, 0x8C, 0x5E, 0x07, 0x9E, 0x09, 0xE2, 0xC8, 0xA8,
    0x33, 0x9C,
];

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// ClientHello message.
#[derive(Debug, Clone)]
pub struct ClientHello {
    pub random: [u8; 32],
    pub legacy_session_id: Vec<u8>,
    pub cipher_suites: Vec<CipherSuite>,
    pub extensions: ExtensionBlock,
}

/// ServerHello message. The same wire shape doubles as HelloRetryRequest,
/// distinguished by the fixed random value.
#[derive(Debug, Clone)]
pub struct ServerHello {
    pub random: [u8; 32],
    pub legacy_session_id_echo: Vec<u8>,
    pub cipher_suite: CipherSuite,
    pub extensions: ExtensionBlock,
}

impl ServerHello {
    /// True when this ServerHello is a HelloRetryRequest.
    pub fn is_hello_retry_request(&self) -> bool {
        self.random == HELLO_RETRY_REQUEST_RANDOM
    }
}

/// EncryptedExtensions message.
#[derive(Debug, Clone)]
pub struct EncryptedExtensions {
    pub extensions: ExtensionBlock,
}

/// A single entry in a Certificate message.
#[derive(Debug, Clone)]
pub struct CertificateEntry {
    pub cert_data: Vec<u8>,
    pub extensions: ExtensionBlock,
}

/// Certificate message.
#[derive(Debug, Clone)]
pub struct CertificateMsg {
    pub certificate_request_context: Vec<u8>,
    pub certificate_list: Vec<CertificateEntry>,
}

/// CertificateRequest message.
#[derive(Debug, Clone)]
pub struct CertificateRequestMsg {
    pub certificate_request_context: Vec<u8>,
    pub extensions: ExtensionBlock,
}

/// CertificateVerify message.
#[derive(Debug, Clone)]
pub struct CertificateVerifyMsg {
    pub algorithm: SignatureScheme,
    pub signature: Vec<u8>,
}

/// Finished message.
#[derive(Debug, Clone)]
pub struct FinishedMsg {
    pub verify_data: Vec<u8>,
}

/// NewSessionTicket message.
#[derive(Debug, Clone)]
pub struct NewSessionTicketMsg {
    pub ticket_lifetime: u32,
    pub ticket_age_add: u32,
    pub ticket_nonce: Vec<u8>,
    pub ticket: Vec<u8>,
    pub extensions: ExtensionBlock,
}

/// KeyUpdate request flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUpdateRequest {
    UpdateNotRequested,
    UpdateRequested,
}

/// KeyUpdate message.
#[derive(Debug, Clone)]
pub struct KeyUpdateMsg {
    pub request_update: KeyUpdateRequest,
}

// ---------------------------------------------------------------------------
// Handshake header
// ---------------------------------------------------------------------------

/// Parse a handshake header: `msg_type(1) || length(3)`.
/// Returns (type, body, total bytes consumed).
pub fn parse_handshake_header(data: &[u8]) -> Result<(HandshakeType, &[u8], usize), TlsError> {
    if data.len() < 4 {
        return Err(TlsError::fatal(AlertDescription::DecodeError));
    }
    let msg_type = match data[0] {
        1 => HandshakeType::ClientHello,
        2 => HandshakeType::ServerHello,
        4 => HandshakeType::NewSessionTicket,
        8 => HandshakeType::EncryptedExtensions,
        11 => HandshakeType::Certificate,
        13 => HandshakeType::CertificateRequest,
        15 => HandshakeType::CertificateVerify,
        20 => HandshakeType::Finished,
        24 => HandshakeType::KeyUpdate,
        254 => HandshakeType::MessageHash,
        _ => return Err(TlsError::fatal(AlertDescription::UnexpectedMessage)),
    };
    let length = read_u24(&data[1..]) as usize;
    let total = 4 + length;
    if data.len() < total {
        return Err(TlsError::fatal(AlertDescription::DecodeError));
    }
    Ok((msg_type, &data[4..total], total))
}

/// Peek the total length of the handshake message at the start of `data`,
/// if the 4-byte header is present.
pub fn peek_handshake_len(data: &[u8]) -> Option<usize> {
    (data.len() >= 4).then(|| 4 + read_u24(&data[1..]) as usize)
}

/// Wrap a handshake body with the 4-byte header.
pub fn wrap_handshake(msg_type: HandshakeType, body: &[u8]) -> Vec<u8> {
    let len = body.len();
    let mut out = Vec::with_capacity(4 + len);
    out.push(msg_type as u8);
    out.push((len >> 16) as u8);
    out.push((len >> 8) as u8);
    out.push(len as u8);
    out.extend_from_slice(body);
    out
}

// ---------------------------------------------------------------------------
// ClientHello
// ---------------------------------------------------------------------------

/// Encode a ClientHello as a complete handshake message (header + body).
pub fn encode_client_hello(ch: &ClientHello) -> Vec<u8> {
    let mut body = Vec::with_capacity(256);

    body.extend_from_slice(&0x0303u16.to_be_bytes()); // legacy_version
    body.extend_from_slice(&ch.random);

    body.push(ch.legacy_session_id.len() as u8);
    body.extend_from_slice(&ch.legacy_session_id);

    body.extend_from_slice(&((ch.cipher_suites.len() * 2) as u16).to_be_bytes());
    for s in &ch.cipher_suites {
        body.extend_from_slice(&s.0.to_be_bytes());
    }

    // legacy_compression_methods = {0}
    body.push(1);
    body.push(0);

    let ext_data = ch.extensions.encode();
    body.extend_from_slice(&(ext_data.len() as u16).to_be_bytes());
    body.extend_from_slice(&ext_data);

    wrap_handshake(HandshakeType::ClientHello, &body)
}

/// Decode a ClientHello from handshake body bytes.
pub fn decode_client_hello(data: &[u8]) -> Result<ClientHello, TlsError> {
    let mut r = Reader::new(data);

    let _version = r.u16()?;
    let random: [u8; 32] = r.bytes(32)?.try_into().unwrap();
    let sid_len = r.u8()? as usize;
    let legacy_session_id = r.bytes(sid_len)?.to_vec();

    let suites_len = r.u16()? as usize;
    if suites_len % 2 != 0 {
        return Err(TlsError::fatal(AlertDescription::DecodeError));
    }
    let cipher_suites = r
        .bytes(suites_len)?
        .chunks_exact(2)
        .map(|c| CipherSuite(u16::from_be_bytes([c[0], c[1]])))
        .collect();

    let comp_len = r.u8()? as usize;
    r.bytes(comp_len)?;

    let ext_len = r.u16()? as usize;
    let extensions = ExtensionBlock::parse(r.bytes(ext_len)?, MessageContext::ClientHello)?;
    r.expect_done()?;

    Ok(ClientHello {
        random,
        legacy_session_id,
        cipher_suites,
        extensions,
    })
}

// ---------------------------------------------------------------------------
// ServerHello
// ---------------------------------------------------------------------------

/// Decode a ServerHello from handshake body bytes.
///
/// The extension context is chosen by the HelloRetryRequest marker random,
/// since key_share has a different shape in the two uses.
pub fn decode_server_hello(data: &[u8]) -> Result<ServerHello, TlsError> {
    let mut r = Reader::new(data);

    let _version = r.u16()?;
    let random: [u8; 32] = r.bytes(32)?.try_into().unwrap();
    let sid_len = r.u8()? as usize;
    let legacy_session_id_echo = r.bytes(sid_len)?.to_vec();
    let cipher_suite = CipherSuite(r.u16()?);
    let compression = r.u8()?;
    if compression != 0 {
        return Err(TlsError::fatal(AlertDescription::IllegalParameter));
    }

    let ctx = if random == HELLO_RETRY_REQUEST_RANDOM {
        MessageContext::HelloRetryRequest
    } else {
        MessageContext::ServerHello
    };
    let ext_len = r.u16()? as usize;
    let extensions = ExtensionBlock::parse(r.bytes(ext_len)?, ctx)?;
    r.expect_done()?;

    Ok(ServerHello {
        random,
        legacy_session_id_echo,
        cipher_suite,
        extensions,
    })
}

/// Encode a ServerHello as a complete handshake message.
pub fn encode_server_hello(sh: &ServerHello) -> Vec<u8> {
    let mut body = Vec::with_capacity(128);
    body.extend_from_slice(&0x0303u16.to_be_bytes());
    body.extend_from_slice(&sh.random);
    body.push(sh.legacy_session_id_echo.len() as u8);
    body.extend_from_slice(&sh.legacy_session_id_echo);
    body.extend_from_slice(&sh.cipher_suite.0.to_be_bytes());
    body.push(0); // compression
    let ext_data = sh.extensions.encode();
    body.extend_from_slice(&(ext_data.len() as u16).to_be_bytes());
    body.extend_from_slice(&ext_data);
    wrap_handshake(HandshakeType::ServerHello, &body)
}

// ---------------------------------------------------------------------------
// EncryptedExtensions
// ---------------------------------------------------------------------------

/// Decode an EncryptedExtensions message from handshake body bytes.
pub fn decode_encrypted_extensions(data: &[u8]) -> Result<EncryptedExtensions, TlsError> {
    let mut r = Reader::new(data);
    let ext_len = r.u16()? as usize;
    let extensions =
        ExtensionBlock::parse(r.bytes(ext_len)?, MessageContext::EncryptedExtensions)?;
    r.expect_done()?;
    Ok(EncryptedExtensions { extensions })
}

/// Encode an EncryptedExtensions message.
pub fn encode_encrypted_extensions(ee: &EncryptedExtensions) -> Vec<u8> {
    let ext_data = ee.extensions.encode();
    let mut body = Vec::with_capacity(2 + ext_data.len());
    body.extend_from_slice(&(ext_data.len() as u16).to_be_bytes());
    body.extend_from_slice(&ext_data);
    wrap_handshake(HandshakeType::EncryptedExtensions, &body)
}

// ---------------------------------------------------------------------------
// Certificate
// ---------------------------------------------------------------------------

/// Decode a Certificate message from handshake body bytes.
pub fn decode_certificate(data: &[u8]) -> Result<CertificateMsg, TlsError> {
    let mut r = Reader::new(data);

    let ctx_len = r.u8()? as usize;
    let certificate_request_context = r.bytes(ctx_len)?.to_vec();

    let list_len = r.u24()? as usize;
    let mut list = Reader::new(r.bytes(list_len)?);
    r.expect_done()?;

    let mut certificate_list = Vec::new();
    while !list.is_done() {
        let cert_len = list.u24()? as usize;
        let cert_data = list.bytes(cert_len)?.to_vec();
        let ext_len = list.u16()? as usize;
        let extensions = ExtensionBlock::parse(list.bytes(ext_len)?, MessageContext::Certificate)?;
        certificate_list.push(CertificateEntry {
            cert_data,
            extensions,
        });
    }

    Ok(CertificateMsg {
        certificate_request_context,
        certificate_list,
    })
}

/// Encode a Certificate message.
pub fn encode_certificate(msg: &CertificateMsg) -> Vec<u8> {
    let mut list = Vec::new();
    for entry in &msg.certificate_list {
        let len = entry.cert_data.len();
        list.push((len >> 16) as u8);
        list.push((len >> 8) as u8);
        list.push(len as u8);
        list.extend_from_slice(&entry.cert_data);
        let ext_data = entry.extensions.encode();
        list.extend_from_slice(&(ext_data.len() as u16).to_be_bytes());
        list.extend_from_slice(&ext_data);
    }

    let mut body = Vec::with_capacity(4 + list.len());
    body.push(msg.certificate_request_context.len() as u8);
    body.extend_from_slice(&msg.certificate_request_context);
    body.push((list.len() >> 16) as u8);
    body.push((list.len() >> 8) as u8);
    body.push(list.len() as u8);
    body.extend_from_slice(&list);
    wrap_handshake(HandshakeType::Certificate, &body)
}

// ---------------------------------------------------------------------------
// CertificateRequest
// ---------------------------------------------------------------------------

/// Decode a CertificateRequest message from handshake body bytes.
pub fn decode_certificate_request(data: &[u8]) -> Result<CertificateRequestMsg, TlsError> {
    let mut r = Reader::new(data);
    let ctx_len = r.u8()? as usize;
    let certificate_request_context = r.bytes(ctx_len)?.to_vec();
    let ext_len = r.u16()? as usize;
    let extensions =
        ExtensionBlock::parse(r.bytes(ext_len)?, MessageContext::CertificateRequest)?;
    r.expect_done()?;
    Ok(CertificateRequestMsg {
        certificate_request_context,
        extensions,
    })
}

/// Encode a CertificateRequest message.
pub fn encode_certificate_request(msg: &CertificateRequestMsg) -> Vec<u8> {
    let ext_data = msg.extensions.encode();
    let mut body = Vec::with_capacity(3 + msg.certificate_request_context.len() + ext_data.len());
    body.push(msg.certificate_request_context.len() as u8);
    body.extend_from_slice(&msg.certificate_request_context);
    body.extend_from_slice(&(ext_data.len() as u16).to_be_bytes());
    body.extend_from_slice(&ext_data);
    wrap_handshake(HandshakeType::CertificateRequest, &body)
}

// ---------------------------------------------------------------------------
// CertificateVerify
// ---------------------------------------------------------------------------

/// Decode a CertificateVerify message from handshake body bytes.
pub fn decode_certificate_verify(data: &[u8]) -> Result<CertificateVerifyMsg, TlsError> {
    let mut r = Reader::new(data);
    let algorithm = SignatureScheme(r.u16()?);
    let sig_len = r.u16()? as usize;
    let signature = r.bytes(sig_len)?.to_vec();
    r.expect_done()?;
    Ok(CertificateVerifyMsg {
        algorithm,
        signature,
    })
}

/// Encode a CertificateVerify message.
pub fn encode_certificate_verify(msg: &CertificateVerifyMsg) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + msg.signature.len());
    body.extend_from_slice(&msg.algorithm.0.to_be_bytes());
    body.extend_from_slice(&(msg.signature.len() as u16).to_be_bytes());
    body.extend_from_slice(&msg.signature);
    wrap_handshake(HandshakeType::CertificateVerify, &body)
}

// ---------------------------------------------------------------------------
// Finished
// ---------------------------------------------------------------------------

/// Decode a Finished message. `verify_data` is exactly the hash length.
pub fn decode_finished(data: &[u8], hash_len: usize) -> Result<FinishedMsg, TlsError> {
    if data.len() != hash_len {
        return Err(TlsError::fatal(AlertDescription::DecodeError));
    }
    Ok(FinishedMsg {
        verify_data: data.to_vec(),
    })
}

/// Encode a Finished message as a complete handshake message.
pub fn encode_finished(verify_data: &[u8]) -> Vec<u8> {
    wrap_handshake(HandshakeType::Finished, verify_data)
}

// ---------------------------------------------------------------------------
// NewSessionTicket
// ---------------------------------------------------------------------------

/// Decode a NewSessionTicket message from handshake body bytes.
pub fn decode_new_session_ticket(data: &[u8]) -> Result<NewSessionTicketMsg, TlsError> {
    let mut r = Reader::new(data);
    let ticket_lifetime = r.u32()?;
    let ticket_age_add = r.u32()?;
    let nonce_len = r.u8()? as usize;
    let ticket_nonce = r.bytes(nonce_len)?.to_vec();
    let ticket_len = r.u16()? as usize;
    let ticket = r.bytes(ticket_len)?.to_vec();
    let ext_len = r.u16()? as usize;
    let extensions =
        ExtensionBlock::parse(r.bytes(ext_len)?, MessageContext::NewSessionTicket)?;
    r.expect_done()?;
    Ok(NewSessionTicketMsg {
        ticket_lifetime,
        ticket_age_add,
        ticket_nonce,
        ticket,
        extensions,
    })
}

// ---------------------------------------------------------------------------
// KeyUpdate
// ---------------------------------------------------------------------------

/// Decode a KeyUpdate message from handshake body bytes.
pub fn decode_key_update(data: &[u8]) -> Result<KeyUpdateMsg, TlsError> {
    if data.len() != 1 {
        return Err(TlsError::fatal(AlertDescription::DecodeError));
    }
    let request_update = match data[0] {
        0 => KeyUpdateRequest::UpdateNotRequested,
        1 => KeyUpdateRequest::UpdateRequested,
        _ => return Err(TlsError::fatal(AlertDescription::IllegalParameter)),
    };
    Ok(KeyUpdateMsg { request_update })
}

/// Encode a KeyUpdate message.
pub fn encode_key_update(msg: &KeyUpdateMsg) -> Vec<u8> {
    let flag = match msg.request_update {
        KeyUpdateRequest::UpdateNotRequested => 0u8,
        KeyUpdateRequest::UpdateRequested => 1u8,
    };
    wrap_handshake(HandshakeType::KeyUpdate, &[flag])
}

// ---------------------------------------------------------------------------
// Byte reader
// ---------------------------------------------------------------------------

/// Bounds-checked big-endian reader over a handshake body.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], TlsError> {
        if self.data.len() - self.pos < n {
            return Err(TlsError::fatal(AlertDescription::DecodeError));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, TlsError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, TlsError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u24(&mut self) -> Result<u32, TlsError> {
        Ok(read_u24(self.bytes(3)?))
    }

    fn u32(&mut self) -> Result<u32, TlsError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn is_done(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Trailing bytes after a message are a decode error.
    fn expect_done(&self) -> Result<(), TlsError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(TlsError::fatal(AlertDescription::DecodeError))
        }
    }
}

fn read_u24(data: &[u8]) -> u32 {
    ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | (data[2] as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypt::NamedGroup;
    use crate::extensions::{ExtensionValue, KeyShareEntry};

    fn sample_client_hello() -> ClientHello {
        let mut extensions = ExtensionBlock::new();
        extensions.add(ExtensionValue::SupportedVersionsClient(vec![0x0304]));
        extensions.add(ExtensionValue::SupportedGroups(vec![NamedGroup::X25519]));
        extensions.add(ExtensionValue::KeyShareClient(vec![KeyShareEntry {
            group: NamedGroup::X25519,
            key_exchange: vec![0x42; 32],
        }]));
        ClientHello {
            random: [0xAA; 32],
            legacy_session_id: vec![0x01, 0x02, 0x03],
            cipher_suites: vec![
                CipherSuite::TLS_AES_128_GCM_SHA256,
                CipherSuite::TLS_AES_256_GCM_SHA384,
            ],
            extensions,
        }
    }

    #[test]
    fn test_client_hello_roundtrip() {
        let ch = sample_client_hello();
        let msg = encode_client_hello(&ch);

        let (msg_type, body, total) = parse_handshake_header(&msg).unwrap();
        assert_eq!(msg_type, HandshakeType::ClientHello);
        assert_eq!(total, msg.len());

        // Body layout: version, random, session id, suites, compression
        assert_eq!(&body[0..2], &[0x03, 0x03]);
        assert_eq!(&body[2..34], &[0xAA; 32]);
        assert_eq!(body[34], 3);
        assert_eq!(&body[38..40], &[0x00, 0x04]); // 2 suites
        assert_eq!(&body[44..46], &[0x01, 0x00]); // compression {0}

        let decoded = decode_client_hello(body).unwrap();
        assert_eq!(decoded.random, ch.random);
        assert_eq!(decoded.legacy_session_id, ch.legacy_session_id);
        assert_eq!(decoded.cipher_suites, ch.cipher_suites);
        assert_eq!(decoded.extensions.encode(), ch.extensions.encode());
    }

    #[test]
    fn test_server_hello_roundtrip() {
        let mut extensions = ExtensionBlock::new();
        extensions.add(ExtensionValue::SupportedVersionsServer(0x0304));
        extensions.add(ExtensionValue::KeyShareServer(KeyShareEntry {
            group: NamedGroup::X25519,
            key_exchange: vec![0xBB; 32],
        }));
        let sh = ServerHello {
            random: [0x5A; 32],
            legacy_session_id_echo: vec![0x01],
            cipher_suite: CipherSuite::TLS_AES_128_GCM_SHA256,
            extensions,
        };
        let msg = encode_server_hello(&sh);
        let (msg_type, body, _) = parse_handshake_header(&msg).unwrap();
        assert_eq!(msg_type, HandshakeType::ServerHello);

        let decoded = decode_server_hello(body).unwrap();
        assert!(!decoded.is_hello_retry_request());
        assert_eq!(decoded.cipher_suite, sh.cipher_suite);
        assert_eq!(decoded.extensions.key_share_server().unwrap().key_exchange, vec![0xBB; 32]);
    }

    #[test]
    fn test_hello_retry_request_detection() {
        let mut extensions = ExtensionBlock::new();
        extensions.add(ExtensionValue::SupportedVersionsServer(0x0304));
        extensions.add(ExtensionValue::KeyShareRetry(NamedGroup::FFDHE2048));
        let hrr = ServerHello {
            random: HELLO_RETRY_REQUEST_RANDOM,
            legacy_session_id_echo: vec![],
            cipher_suite: CipherSuite::TLS_AES_128_GCM_SHA256,
            extensions,
        };
        let msg = encode_server_hello(&hrr);
        let (_, body, _) = parse_handshake_header(&msg).unwrap();
        let decoded = decode_server_hello(body).unwrap();
        assert!(decoded.is_hello_retry_request());
        assert_eq!(
            decoded.extensions.key_share_retry_group().unwrap(),
            NamedGroup::FFDHE2048
        );
    }

    #[test]
    fn test_certificate_roundtrip() {
        let msg = CertificateMsg {
            certificate_request_context: vec![],
            certificate_list: vec![CertificateEntry {
                cert_data: vec![0x30, 0x82, 0x01, 0x00],
                extensions: ExtensionBlock::new(),
            }],
        };
        let wire = encode_certificate(&msg);
        let (msg_type, body, _) = parse_handshake_header(&wire).unwrap();
        assert_eq!(msg_type, HandshakeType::Certificate);

        let decoded = decode_certificate(body).unwrap();
        assert!(decoded.certificate_request_context.is_empty());
        assert_eq!(decoded.certificate_list.len(), 1);
        assert_eq!(decoded.certificate_list[0].cert_data, vec![0x30, 0x82, 0x01, 0x00]);
    }

    #[test]
    fn test_empty_certificate_roundtrip() {
        // A client answering CertificateRequest with no certificate
        let msg = CertificateMsg {
            certificate_request_context: vec![0xAB],
            certificate_list: vec![],
        };
        let wire = encode_certificate(&msg);
        let (_, body, _) = parse_handshake_header(&wire).unwrap();
        let decoded = decode_certificate(body).unwrap();
        assert_eq!(decoded.certificate_request_context, vec![0xAB]);
        assert!(decoded.certificate_list.is_empty());
    }

    #[test]
    fn test_certificate_verify_roundtrip() {
        let msg = CertificateVerifyMsg {
            algorithm: SignatureScheme::RSA_PSS_RSAE_SHA256,
            signature: vec![0x01; 64],
        };
        let wire = encode_certificate_verify(&msg);
        let (_, body, _) = parse_handshake_header(&wire).unwrap();
        let decoded = decode_certificate_verify(body).unwrap();
        assert_eq!(decoded.algorithm, SignatureScheme::RSA_PSS_RSAE_SHA256);
        assert_eq!(decoded.signature.len(), 64);
    }

    #[test]
    fn test_finished_exact_length() {
        let vd = vec![0xAB; 32];
        let decoded = decode_finished(&vd, 32).unwrap();
        assert_eq!(decoded.verify_data, vd);

        // Too short and too long both rejected
        assert!(decode_finished(&[0u8; 16], 32).is_err());
        assert!(decode_finished(&[0u8; 48], 32).is_err());
    }

    #[test]
    fn test_new_session_ticket_decode() {
        let mut body = Vec::new();
        body.extend_from_slice(&7200u32.to_be_bytes());
        body.extend_from_slice(&0xDEADBEEFu32.to_be_bytes());
        body.push(2); // nonce
        body.extend_from_slice(&[0x00, 0x01]);
        body.extend_from_slice(&4u16.to_be_bytes()); // ticket
        body.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        body.extend_from_slice(&0u16.to_be_bytes()); // extensions

        let nst = decode_new_session_ticket(&body).unwrap();
        assert_eq!(nst.ticket_lifetime, 7200);
        assert_eq!(nst.ticket_age_add, 0xDEADBEEF);
        assert_eq!(nst.ticket_nonce, vec![0x00, 0x01]);
        assert_eq!(nst.ticket, vec![0xAA, 0xBB, 0xCC, 0xDD]);
        assert!(nst.extensions.is_empty());
    }

    #[test]
    fn test_key_update_roundtrip() {
        for (flag, wire) in [
            (KeyUpdateRequest::UpdateNotRequested, 0u8),
            (KeyUpdateRequest::UpdateRequested, 1u8),
        ] {
            let msg = encode_key_update(&KeyUpdateMsg {
                request_update: flag,
            });
            let (msg_type, body, _) = parse_handshake_header(&msg).unwrap();
            assert_eq!(msg_type, HandshakeType::KeyUpdate);
            assert_eq!(body, &[wire]);
            assert_eq!(decode_key_update(body).unwrap().request_update, flag);
        }
        assert!(decode_key_update(&[2]).is_err());
        assert!(decode_key_update(&[]).is_err());
    }

    #[test]
    fn test_header_roundtrip_and_truncation() {
        let body = vec![1, 2, 3, 4, 5];
        let msg = wrap_handshake(HandshakeType::Finished, &body);
        let (ty, parsed, consumed) = parse_handshake_header(&msg).unwrap();
        assert_eq!(ty, HandshakeType::Finished);
        assert_eq!(parsed, body.as_slice());
        assert_eq!(consumed, msg.len());

        assert!(parse_handshake_header(&msg[..msg.len() - 1]).is_err());
        assert_eq!(peek_handshake_len(&msg), Some(msg.len()));
        assert_eq!(peek_handshake_len(&msg[..3]), None);
    }

    #[test]
    fn test_unknown_handshake_type_rejected() {
        let msg = [99u8, 0, 0, 0];
        assert!(parse_handshake_header(&msg).is_err());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let ch = sample_client_hello();
        let msg = encode_client_hello(&ch);
        let (_, body, _) = parse_handshake_header(&msg).unwrap();
        let mut with_garbage = body.to_vec();
        with_garbage.push(0xFF);
        assert!(decode_client_hello(&with_garbage).is_err());
    }
}
