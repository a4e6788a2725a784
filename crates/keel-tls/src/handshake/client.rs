//! TLS 1.3 client handshake state machine.
//!
//! Drives the 1-RTT client conversation:
//! ClientHello → ServerHello (with one sanctioned HelloRetryRequest loop) →
//! EncryptedExtensions → [CertificateRequest] → Certificate →
//! CertificateVerify → Finished → client flight.
//!
//! The connection owns the key schedule; this machine creates it when the
//! ServerHello fixes the cipher suite and borrows it at the later derivation
//! points, so record protection and handshake logic share one instance.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::alert::AlertDescription;
use crate::config::TlsConfig;
use crate::crypt::key_schedule::KeySchedule;
use crate::crypt::transcript::TranscriptHash;
use crate::crypt::{keylog, CipherSuiteParams, NamedGroup};
use crate::extensions::{ExtensionBlock, ExtensionValue, KeyShareEntry};
use crate::{CipherSuite, TlsError, TlsRole, TLS13_VERSION};

use super::codec::{
    decode_certificate, decode_certificate_request, decode_certificate_verify,
    decode_encrypted_extensions, decode_finished, decode_server_hello, encode_certificate,
    encode_client_hello, encode_finished, CertificateMsg, ClientHello, ServerHello,
};
use super::key_exchange::{create_key_exchange, KeyExchange};
use super::HandshakeState;

/// Result of processing a ServerHello-shaped message.
pub enum ServerHelloOutcome {
    /// HelloRetryRequest: send this regenerated ClientHello and keep
    /// waiting for the real ServerHello.
    Retry { client_hello: Vec<u8> },
    /// Genuine ServerHello: handshake traffic keys are installed on the
    /// returned schedule; the connection takes ownership of it.
    Proceed { key_schedule: KeySchedule },
}

/// Client handshake state machine.
pub struct ClientHandshake {
    config: TlsConfig,
    state: HandshakeState,
    /// One ephemeral key exchange per offered group.
    key_exchanges: Vec<Box<dyn KeyExchange>>,
    /// Created once the (HelloRetry-)ServerHello fixes the hash algorithm.
    transcript: Option<TranscriptHash>,
    client_random: [u8; 32],
    session_id: Vec<u8>,
    /// Raw bytes of the most recent ClientHello (for the transcript).
    client_hello_msg: Vec<u8>,
    negotiated_suite: Option<CipherSuite>,
    negotiated_group: Option<NamedGroup>,
    hello_retry_seen: bool,
    server_certificates: Vec<Vec<u8>>,
    certificate_request_context: Option<Vec<u8>>,
    negotiated_alpn: Option<Vec<u8>>,
    client_hs_secret: Vec<u8>,
    server_hs_secret: Vec<u8>,
    /// Transcript hash at the server Finished (context for the application
    /// secrets and the client Finished).
    transcript_hash_server_finished: Vec<u8>,
    /// Transcript hash just before CertificateVerify, retained so a caller
    /// can verify the server signature externally.
    transcript_hash_certificate_verify: Vec<u8>,
}

impl Drop for ClientHandshake {
    fn drop(&mut self) {
        self.client_hs_secret.zeroize();
        self.server_hs_secret.zeroize();
    }
}

impl ClientHandshake {
    /// Create a new client handshake from the configuration.
    pub fn new(config: TlsConfig) -> Self {
        Self {
            config,
            state: HandshakeState::Start,
            key_exchanges: Vec::new(),
            transcript: None,
            client_random: [0u8; 32],
            session_id: Vec::new(),
            client_hello_msg: Vec::new(),
            negotiated_suite: None,
            negotiated_group: None,
            hello_retry_seen: false,
            server_certificates: Vec::new(),
            certificate_request_context: None,
            negotiated_alpn: None,
            client_hs_secret: Vec::new(),
            server_hs_secret: Vec::new(),
            transcript_hash_server_finished: Vec::new(),
            transcript_hash_certificate_verify: Vec::new(),
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Mark the handshake failed; the state machine accepts nothing further.
    pub fn close(&mut self) {
        self.state = HandshakeState::Closed;
    }

    /// The negotiated cipher suite, once the ServerHello selected one.
    pub fn negotiated_suite(&self) -> Option<CipherSuite> {
        self.negotiated_suite
    }

    /// The negotiated key exchange group.
    pub fn negotiated_group(&self) -> Option<NamedGroup> {
        self.negotiated_group
    }

    /// The ALPN protocol the server selected, if any.
    pub fn negotiated_alpn(&self) -> Option<&[u8]> {
        self.negotiated_alpn.as_deref()
    }

    /// The server certificate chain (DER, leaf first), unverified.
    pub fn server_certificates(&self) -> &[Vec<u8>] {
        &self.server_certificates
    }

    /// Transcript hash covering everything up to (excluding)
    /// CertificateVerify, the input an external signature check needs.
    pub fn certificate_verify_transcript_hash(&self) -> &[u8] {
        &self.transcript_hash_certificate_verify
    }

    /// Build and record the ClientHello. Moves to WaitServerHello.
    pub fn build_client_hello(&mut self) -> Result<Vec<u8>, TlsError> {
        if self.state != HandshakeState::Start {
            return Err(TlsError::WrongStage("build_client_hello"));
        }
        if self.config.cipher_suites.is_empty() || self.config.supported_groups.is_empty() {
            return Err(TlsError::Internal("no cipher suites or groups configured"));
        }

        getrandom::getrandom(&mut self.client_random)
            .map_err(|_| TlsError::Internal("random generation failed"))?;
        let mut session_id = [0u8; 32];
        getrandom::getrandom(&mut session_id)
            .map_err(|_| TlsError::Internal("random generation failed"))?;
        self.session_id = session_id.to_vec();

        self.key_exchanges = self
            .config
            .supported_groups
            .iter()
            .map(|&g| create_key_exchange(g))
            .collect::<Result<_, _>>()?;

        let msg = self.encode_hello()?;
        self.client_hello_msg = msg.clone();
        self.state = HandshakeState::WaitServerHello;
        Ok(msg)
    }

    /// Encode a ClientHello from the current randoms and key exchanges.
    fn encode_hello(&self) -> Result<Vec<u8>, TlsError> {
        let mut extensions = ExtensionBlock::new();
        if let Some(name) = &self.config.server_name {
            extensions.add(ExtensionValue::ServerName(name.clone()));
        }
        extensions.add(ExtensionValue::SupportedGroups(
            self.config.supported_groups.clone(),
        ));
        extensions.add(ExtensionValue::SignatureAlgorithms(
            self.config.signature_algorithms.clone(),
        ));
        if !self.config.alpn_protocols.is_empty() {
            extensions.add(ExtensionValue::Alpn(self.config.alpn_protocols.clone()));
        }
        extensions.add(ExtensionValue::SupportedVersionsClient(vec![TLS13_VERSION]));
        // psk_dhe_ke, so a server issuing tickets can pair them with (EC)DHE
        extensions.add(ExtensionValue::PskKeyExchangeModes(vec![1]));
        extensions.add(ExtensionValue::KeyShareClient(
            self.key_exchanges
                .iter()
                .map(|kx| KeyShareEntry {
                    group: kx.group(),
                    key_exchange: kx.public_key_bytes().to_vec(),
                })
                .collect(),
        ));

        let ch = ClientHello {
            random: self.client_random,
            legacy_session_id: self.session_id.clone(),
            cipher_suites: self.config.cipher_suites.clone(),
            extensions,
        };
        Ok(encode_client_hello(&ch))
    }

    /// Process a ServerHello or HelloRetryRequest.
    ///
    /// `msg_data` is the full handshake message including the 4-byte header.
    pub fn process_server_hello(
        &mut self,
        msg_data: &[u8],
    ) -> Result<ServerHelloOutcome, TlsError> {
        if self.state != HandshakeState::WaitServerHello {
            return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
        }

        let sh = decode_server_hello(message_body(msg_data)?)?;

        // Selected version must be TLS 1.3 in both uses of the message
        let version = sh
            .extensions
            .supported_versions_server()
            .map_err(|_| TlsError::fatal(AlertDescription::MissingExtension))?;
        if version != TLS13_VERSION {
            return Err(TlsError::fatal(AlertDescription::ProtocolVersion));
        }

        if !self.config.cipher_suites.contains(&sh.cipher_suite) {
            return Err(TlsError::fatal(AlertDescription::IllegalParameter));
        }
        if sh.legacy_session_id_echo != self.session_id {
            return Err(TlsError::fatal(AlertDescription::IllegalParameter));
        }

        if sh.is_hello_retry_request() {
            let client_hello = self.process_hello_retry(&sh, msg_data)?;
            return Ok(ServerHelloOutcome::Retry { client_hello });
        }

        let params = CipherSuiteParams::from_suite(sh.cipher_suite)?;
        if self.hello_retry_seen {
            // The retry already pinned the suite (via the transcript hash)
            if Some(sh.cipher_suite) != self.negotiated_suite {
                return Err(TlsError::fatal(AlertDescription::IllegalParameter));
            }
        } else {
            self.transcript = Some(TranscriptHash::new(params.hash_factory()));
            let transcript = self.transcript.as_mut().unwrap();
            transcript.update(&self.client_hello_msg);
        }
        let transcript = self
            .transcript
            .as_mut()
            .ok_or(TlsError::Internal("transcript missing"))?;
        transcript.update(msg_data);

        // The server's share must answer one of the groups we offered
        let server_share = sh
            .extensions
            .key_share_server()
            .map_err(|_| TlsError::fatal(AlertDescription::MissingExtension))?;
        let kx = self
            .key_exchanges
            .iter()
            .find(|kx| kx.group() == server_share.group)
            .ok_or_else(|| TlsError::fatal(AlertDescription::IllegalParameter))?;

        let mut shared_secret = kx.compute_shared_secret(&server_share.key_exchange)?;

        // Early Secret → Handshake Secret → handshake traffic keys
        let mut ks = KeySchedule::new(params.clone(), TlsRole::Client);
        ks.advance(None)?;
        ks.advance(Some(&shared_secret))?;
        shared_secret.zeroize();
        ks.install_handshake_keys(&transcript.current_hash()?)?;

        self.client_hs_secret = ks
            .client_traffic_secret()
            .ok_or(TlsError::Internal("client handshake secret missing"))?
            .to_vec();
        self.server_hs_secret = ks
            .server_traffic_secret()
            .ok_or(TlsError::Internal("server handshake secret missing"))?
            .to_vec();
        keylog::log_key(
            &self.config,
            "CLIENT_HANDSHAKE_TRAFFIC_SECRET",
            &self.client_random,
            &self.client_hs_secret,
        );
        keylog::log_key(
            &self.config,
            "SERVER_HANDSHAKE_TRAFFIC_SECRET",
            &self.client_random,
            &self.server_hs_secret,
        );

        self.negotiated_suite = Some(sh.cipher_suite);
        self.negotiated_group = Some(server_share.group);
        self.state = HandshakeState::WaitEncryptedExtensions;

        Ok(ServerHelloOutcome::Proceed { key_schedule: ks })
    }

    /// Handle the single sanctioned HelloRetryRequest round.
    ///
    /// Rebuilds the transcript as `message_hash(CH1) || HRR || CH2` and
    /// regenerates the ClientHello with only the requested group's share.
    fn process_hello_retry(
        &mut self,
        hrr: &ServerHello,
        msg_data: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        if self.hello_retry_seen {
            return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
        }
        self.hello_retry_seen = true;

        let requested = hrr
            .extensions
            .key_share_retry_group()
            .map_err(|_| TlsError::fatal(AlertDescription::MissingExtension))?;
        if !self.config.supported_groups.contains(&requested) {
            return Err(TlsError::fatal(AlertDescription::IllegalParameter));
        }

        // The HRR fixes the hash for the whole transcript
        let params = CipherSuiteParams::from_suite(hrr.cipher_suite)?;
        let mut transcript = TranscriptHash::new(params.hash_factory());
        transcript.update(&self.client_hello_msg);
        transcript.replace_with_message_hash()?;
        transcript.update(msg_data);

        // Regenerate: exactly one share, for the requested group
        self.key_exchanges = vec![create_key_exchange(requested)?];
        let mut msg = self.encode_hello()?;

        // Echo the cookie if the server sent one
        if let Ok(cookie) = hrr.extensions.cookie() {
            let cookie = cookie.to_vec();
            msg = self.encode_hello_with_cookie(cookie)?;
        }

        transcript.update(&msg);
        self.transcript = Some(transcript);
        self.client_hello_msg = msg.clone();
        self.negotiated_suite = Some(hrr.cipher_suite);
        Ok(msg)
    }

    fn encode_hello_with_cookie(&self, cookie: Vec<u8>) -> Result<Vec<u8>, TlsError> {
        let msg = self.encode_hello()?;
        let body = message_body(&msg)?;
        let mut ch = super::codec::decode_client_hello(body)?;
        ch.extensions.add(ExtensionValue::Cookie(cookie));
        Ok(encode_client_hello(&ch))
    }

    /// Process an EncryptedExtensions message.
    pub fn process_encrypted_extensions(&mut self, msg_data: &[u8]) -> Result<(), TlsError> {
        if self.state != HandshakeState::WaitEncryptedExtensions {
            return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
        }
        let ee = decode_encrypted_extensions(message_body(msg_data)?)?;

        if let Ok(protocol) = ee.extensions.alpn_selected() {
            if !self.config.alpn_protocols.iter().any(|p| p == protocol) {
                return Err(TlsError::fatal(AlertDescription::NoApplicationProtocol));
            }
            self.negotiated_alpn = Some(protocol.to_vec());
        }

        self.transcript_mut()?.update(msg_data);
        self.state = HandshakeState::WaitCertOrCertRequest;
        Ok(())
    }

    /// Process a CertificateRequest message.
    pub fn process_certificate_request(&mut self, msg_data: &[u8]) -> Result<(), TlsError> {
        if self.state != HandshakeState::WaitCertOrCertRequest {
            return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
        }
        let cr = decode_certificate_request(message_body(msg_data)?)?;
        self.certificate_request_context = Some(cr.certificate_request_context);
        self.transcript_mut()?.update(msg_data);
        self.state = HandshakeState::WaitCert;
        Ok(())
    }

    /// Process a Certificate message.
    pub fn process_certificate(&mut self, msg_data: &[u8]) -> Result<(), TlsError> {
        if self.state != HandshakeState::WaitCertOrCertRequest
            && self.state != HandshakeState::WaitCert
        {
            return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
        }
        let cert_msg = decode_certificate(message_body(msg_data)?)?;
        if cert_msg.certificate_list.is_empty() {
            return Err(TlsError::fatal(AlertDescription::DecodeError));
        }
        self.server_certificates = cert_msg
            .certificate_list
            .into_iter()
            .map(|e| e.cert_data)
            .collect();

        self.transcript_mut()?.update(msg_data);
        self.state = HandshakeState::WaitCertVerify;
        Ok(())
    }

    /// Process a CertificateVerify message.
    ///
    /// The signature is parsed and retained with the transcript hash it
    /// covers; cryptographic verification against the certificate is left
    /// to the caller.
    pub fn process_certificate_verify(&mut self, msg_data: &[u8]) -> Result<(), TlsError> {
        if self.state != HandshakeState::WaitCertVerify {
            return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
        }
        let _cv = decode_certificate_verify(message_body(msg_data)?)?;

        self.transcript_hash_certificate_verify = self.transcript_mut()?.current_hash()?;
        self.transcript_mut()?.update(msg_data);
        self.state = HandshakeState::WaitFinished;
        Ok(())
    }

    /// Process the server Finished message.
    ///
    /// Verifies the verify_data in constant time, then builds the client's
    /// answering flight: an empty Certificate when the server requested
    /// client auth, and the client Finished. The connection must send the
    /// flight under the handshake keys and then call
    /// `install_application_keys`.
    pub fn process_finished(
        &mut self,
        msg_data: &[u8],
        ks: &mut KeySchedule,
    ) -> Result<Vec<Vec<u8>>, TlsError> {
        if self.state != HandshakeState::WaitFinished {
            return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
        }
        let hash_len = ks.hash_len();
        let fin = decode_finished(message_body(msg_data)?, hash_len)?;

        let server_finished_key = ks.finished_key(&self.server_hs_secret)?;
        let transcript_hash = self.transcript_mut()?.current_hash()?;
        let expected = ks.finished_verify_data(&server_finished_key, &transcript_hash)?;
        if !bool::from(fin.verify_data.ct_eq(&expected)) {
            return Err(TlsError::fatal(AlertDescription::DecryptError));
        }

        self.transcript_mut()?.update(msg_data);
        // Application secrets derive from the transcript at the server
        // Finished, before any client flight
        self.transcript_hash_server_finished = self.transcript_mut()?.current_hash()?;

        let mut flight = Vec::new();
        if let Some(context) = self.certificate_request_context.take() {
            // Respond with an empty certificate list: client auth keys are
            // not part of this engine's configuration surface
            let empty = encode_certificate(&CertificateMsg {
                certificate_request_context: context,
                certificate_list: vec![],
            });
            self.transcript_mut()?.update(&empty);
            flight.push(empty);
        }

        let client_finished_key = ks.finished_key(&self.client_hs_secret)?;
        let flight_hash = self.transcript_mut()?.current_hash()?;
        let client_verify_data = ks.finished_verify_data(&client_finished_key, &flight_hash)?;
        let client_finished = encode_finished(&client_verify_data);
        self.transcript_mut()?.update(&client_finished);
        flight.push(client_finished);

        self.state = HandshakeState::Connected;
        Ok(flight)
    }

    /// Advance the schedule to the master secret and install the
    /// application traffic keys.
    ///
    /// Call after the client flight from `process_finished` has been sent:
    /// the flight itself is protected by the handshake keys.
    pub fn install_application_keys(&mut self, ks: &mut KeySchedule) -> Result<(), TlsError> {
        if self.state != HandshakeState::Connected {
            return Err(TlsError::WrongStage("install_application_keys"));
        }
        ks.advance(None)?;
        ks.install_application_keys(&self.transcript_hash_server_finished)?;

        if let (Some(client), Some(server)) =
            (ks.client_traffic_secret(), ks.server_traffic_secret())
        {
            keylog::log_key(
                &self.config,
                "CLIENT_TRAFFIC_SECRET_0",
                &self.client_random,
                client,
            );
            keylog::log_key(
                &self.config,
                "SERVER_TRAFFIC_SECRET_0",
                &self.client_random,
                server,
            );
        }
        Ok(())
    }

    /// The transcript's raw buffered bytes (exposed for inspection).
    pub fn transcript_bytes(&self) -> Option<&[u8]> {
        self.transcript.as_ref().map(|t| t.transcript_bytes())
    }

    fn transcript_mut(&mut self) -> Result<&mut TranscriptHash, TlsError> {
        self.transcript
            .as_mut()
            .ok_or(TlsError::Internal("transcript missing"))
    }
}

/// Strip the 4-byte handshake header.
fn message_body(msg_data: &[u8]) -> Result<&[u8], TlsError> {
    if msg_data.len() < 4 {
        return Err(TlsError::fatal(AlertDescription::DecodeError));
    }
    Ok(&msg_data[4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::codec::parse_handshake_header;
    use crate::handshake::HandshakeType;

    fn test_config() -> TlsConfig {
        TlsConfig::builder().server_name("test.example").build()
    }

    #[test]
    fn test_initial_state() {
        let hs = ClientHandshake::new(test_config());
        assert_eq!(hs.state(), HandshakeState::Start);
        assert!(hs.negotiated_suite().is_none());
    }

    #[test]
    fn test_build_client_hello_shape() {
        let config = TlsConfig::builder()
            .server_name("test.example")
            .supported_groups(vec![NamedGroup::X25519, NamedGroup::FFDHE2048])
            .build();
        let mut hs = ClientHandshake::new(config);
        let msg = hs.build_client_hello().unwrap();
        assert_eq!(hs.state(), HandshakeState::WaitServerHello);

        let (msg_type, body, total) = parse_handshake_header(&msg).unwrap();
        assert_eq!(msg_type, HandshakeType::ClientHello);
        assert_eq!(total, msg.len());

        let ch = super::super::codec::decode_client_hello(body).unwrap();
        assert_eq!(ch.legacy_session_id.len(), 32);
        assert_eq!(ch.cipher_suites.len(), 2);
        // One key share per configured group
        match ch.extensions.get(crate::extensions::ExtensionType::KEY_SHARE) {
            Some(ExtensionValue::KeyShareClient(entries)) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].group, NamedGroup::X25519);
                assert_eq!(entries[0].key_exchange.len(), 32);
                assert_eq!(entries[1].group, NamedGroup::FFDHE2048);
                assert_eq!(entries[1].key_exchange.len(), 256);
            }
            other => panic!("bad key_share: {other:?}"),
        }
        match ch
            .extensions
            .get(crate::extensions::ExtensionType::SERVER_NAME)
        {
            Some(ExtensionValue::ServerName(name)) => assert_eq!(name, "test.example"),
            other => panic!("bad server_name: {other:?}"),
        }
    }

    #[test]
    fn test_cannot_build_twice() {
        let mut hs = ClientHandshake::new(test_config());
        hs.build_client_hello().unwrap();
        assert!(hs.build_client_hello().is_err());
    }

    #[test]
    fn test_out_of_order_messages_rejected() {
        let mut hs = ClientHandshake::new(test_config());

        // ServerHello before ClientHello
        assert!(matches!(
            hs.process_server_hello(&[2, 0, 0, 0]),
            Err(TlsError::Fatal(AlertDescription::UnexpectedMessage))
        ));

        hs.build_client_hello().unwrap();
        // EncryptedExtensions while waiting for ServerHello
        assert!(matches!(
            hs.process_encrypted_extensions(&[8, 0, 0, 2, 0, 0]),
            Err(TlsError::Fatal(AlertDescription::UnexpectedMessage))
        ));
        assert!(matches!(
            hs.process_certificate(&[11, 0, 0, 0]),
            Err(TlsError::Fatal(AlertDescription::UnexpectedMessage))
        ));
    }

    #[test]
    fn test_empty_config_rejected() {
        let config = TlsConfig::builder().cipher_suites(vec![]).build();
        let mut hs = ClientHandshake::new(config);
        assert!(hs.build_client_hello().is_err());
    }

    fn make_hrr(session_id: &[u8], requested: NamedGroup) -> Vec<u8> {
        use crate::handshake::codec::{
            encode_server_hello, ServerHello, HELLO_RETRY_REQUEST_RANDOM,
        };
        let mut extensions = ExtensionBlock::new();
        extensions.add(ExtensionValue::SupportedVersionsServer(crate::TLS13_VERSION));
        extensions.add(ExtensionValue::KeyShareRetry(requested));
        encode_server_hello(&ServerHello {
            random: HELLO_RETRY_REQUEST_RANDOM,
            legacy_session_id_echo: session_id.to_vec(),
            cipher_suite: CipherSuite::TLS_AES_128_GCM_SHA256,
            extensions,
        })
    }

    #[test]
    fn test_hello_retry_transcript_reset() {
        use keel_crypto::sha2::Sha256;

        let config = TlsConfig::builder()
            .supported_groups(vec![NamedGroup::X25519, NamedGroup::FFDHE2048])
            .build();
        let mut hs = ClientHandshake::new(config);
        let ch1 = hs.build_client_hello().unwrap();
        let session_id = hs.session_id.clone();

        let hrr = make_hrr(&session_id, NamedGroup::FFDHE2048);
        let ch2 = match hs.process_server_hello(&hrr).unwrap() {
            ServerHelloOutcome::Retry { client_hello } => client_hello,
            _ => panic!("expected Retry"),
        };
        assert_eq!(hs.state(), HandshakeState::WaitServerHello);

        // The transcript must be message_hash(CH1) || HRR || CH2, not the
        // naive CH1 || HRR || CH2
        let ch1_hash = Sha256::digest(&ch1).unwrap();
        let mut expected = vec![254u8, 0, 0, 32];
        expected.extend_from_slice(&ch1_hash);
        expected.extend_from_slice(&hrr);
        expected.extend_from_slice(&ch2);
        assert_eq!(hs.transcript_bytes().unwrap(), expected.as_slice());

        // The regenerated hello offers exactly the requested group
        let (_, body, _) = parse_handshake_header(&ch2).unwrap();
        let parsed = super::super::codec::decode_client_hello(body).unwrap();
        match parsed.extensions.get(crate::extensions::ExtensionType::KEY_SHARE) {
            Some(ExtensionValue::KeyShareClient(entries)) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].group, NamedGroup::FFDHE2048);
            }
            other => panic!("bad retry key_share: {other:?}"),
        }
    }

    #[test]
    fn test_second_hello_retry_is_fatal() {
        let config = TlsConfig::builder()
            .supported_groups(vec![NamedGroup::X25519, NamedGroup::FFDHE2048])
            .build();
        let mut hs = ClientHandshake::new(config);
        hs.build_client_hello().unwrap();
        let session_id = hs.session_id.clone();

        let hrr = make_hrr(&session_id, NamedGroup::FFDHE2048);
        assert!(matches!(
            hs.process_server_hello(&hrr).unwrap(),
            ServerHelloOutcome::Retry { .. }
        ));

        let hrr2 = make_hrr(&session_id, NamedGroup::X25519);
        assert!(matches!(
            hs.process_server_hello(&hrr2),
            Err(TlsError::Fatal(AlertDescription::UnexpectedMessage))
        ));
    }

    #[test]
    fn test_hello_retry_for_unoffered_group_rejected() {
        // Only X25519 configured: a retry asking for FFDHE3072 is invalid
        let mut hs = ClientHandshake::new(TlsConfig::builder().build());
        hs.build_client_hello().unwrap();
        let session_id = hs.session_id.clone();

        let hrr = make_hrr(&session_id, NamedGroup::FFDHE3072);
        assert!(matches!(
            hs.process_server_hello(&hrr),
            Err(TlsError::Fatal(AlertDescription::IllegalParameter))
        ));
    }
}
