//! Blocking TLS 1.3 client connection.
//!
//! Single-threaded, synchronous: the handshake loop blocks on transport
//! reads and processes records strictly in arrival order (sequence numbers,
//! hence nonces, are positional). All fatal errors funnel through one
//! "send alert, close" exit.

use std::io::{Read, Write};

use super::ConnectionState;
use crate::alert::{Alert, AlertDescription, AlertLevel};
use crate::config::TlsConfig;
use crate::crypt::key_schedule::KeySchedule;
use crate::crypt::NamedGroup;
use crate::handshake::client::{ClientHandshake, ServerHelloOutcome};
use crate::handshake::codec::{
    decode_key_update, decode_new_session_ticket, encode_key_update, parse_handshake_header,
    peek_handshake_len, KeyUpdateMsg, KeyUpdateRequest,
};
use crate::handshake::{HandshakeState, HandshakeType};
use crate::record::{ContentType, RecordLayer};
use crate::{CipherSuite, TlsConnection, TlsError};

/// Upper bound on KeyUpdate messages between application data records;
/// past this the peer is looping and the connection is torn down.
const MAX_KEY_UPDATES: u32 = 32;

/// A synchronous TLS 1.3 client connection over a byte stream.
pub struct TlsClientConnection<S: Read + Write> {
    stream: S,
    record_layer: RecordLayer,
    state: ConnectionState,
    handshake: ClientHandshake,
    /// The connection's single key schedule, created at ServerHello.
    key_schedule: Option<KeySchedule>,
    /// Reassembly buffer: handshake messages may span record boundaries.
    hs_buf: Vec<u8>,
    /// Decrypted application data not yet handed to the caller.
    app_data_buf: Vec<u8>,
    sent_close_notify: bool,
    received_close_notify: bool,
    key_update_count: u32,
}

impl<S: Read + Write> TlsClientConnection<S> {
    /// Wrap a connected stream. The handshake starts on `handshake()`.
    pub fn new(stream: S, config: TlsConfig) -> Self {
        Self {
            stream,
            record_layer: RecordLayer::new(),
            state: ConnectionState::Handshaking,
            handshake: ClientHandshake::new(config),
            key_schedule: None,
            hs_buf: Vec::new(),
            app_data_buf: Vec::new(),
            sent_close_notify: false,
            received_close_notify: false,
            key_update_count: 0,
        }
    }

    /// The server certificate chain (DER, leaf first), unverified.
    pub fn server_certificates(&self) -> &[Vec<u8>] {
        self.handshake.server_certificates()
    }

    /// The ALPN protocol the server selected, if any.
    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        self.handshake.negotiated_alpn()
    }

    /// The negotiated key exchange group.
    pub fn negotiated_group(&self) -> Option<NamedGroup> {
        self.handshake.negotiated_group()
    }

    /// Transcript hash covering the handshake up to (excluding) the
    /// server's CertificateVerify: the input an external verifier needs to
    /// check the server signature against the certificate.
    pub fn certificate_verify_transcript_hash(&self) -> &[u8] {
        self.handshake.certificate_verify_transcript_hash()
    }

    /// Drive the handshake to completion.
    fn run_handshake(&mut self) -> Result<(), TlsError> {
        let client_hello = self.handshake.build_client_hello()?;
        let wire = self
            .record_layer
            .encode(ContentType::Handshake, &client_hello, None)?;
        self.stream.write_all(&wire)?;
        self.stream.flush()?;

        while self.state == ConnectionState::Handshaking {
            let record = self
                .record_layer
                .extract(&mut self.stream, self.key_schedule.as_mut())?;
            match record.content_type {
                ContentType::Handshake => {
                    self.hs_buf.extend_from_slice(&record.fragment);
                    self.drain_handshake_messages()?;
                }
                // Middlebox-compatibility CCS; content already validated
                ContentType::ChangeCipherSpec => {}
                ContentType::Alert => {
                    self.process_alert(&record.fragment)?;
                }
                ContentType::ApplicationData => {
                    return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
                }
            }
        }
        Ok(())
    }

    /// Dispatch every complete handshake message in the reassembly buffer.
    fn drain_handshake_messages(&mut self) -> Result<(), TlsError> {
        while let Some(total) = peek_handshake_len(&self.hs_buf) {
            if self.hs_buf.len() < total {
                break;
            }
            let msg: Vec<u8> = self.hs_buf.drain(..total).collect();
            if self.state == ConnectionState::Handshaking {
                self.dispatch_handshake_message(&msg)?;
            } else {
                self.dispatch_post_handshake_message(&msg)?;
            }
        }
        Ok(())
    }

    fn dispatch_handshake_message(&mut self, msg: &[u8]) -> Result<(), TlsError> {
        let (msg_type, _, _) = parse_handshake_header(msg)?;
        match msg_type {
            HandshakeType::ServerHello => match self.handshake.process_server_hello(msg)? {
                ServerHelloOutcome::Retry { client_hello } => {
                    let wire =
                        self.record_layer
                            .encode(ContentType::Handshake, &client_hello, None)?;
                    self.stream.write_all(&wire)?;
                    self.stream.flush()?;
                }
                ServerHelloOutcome::Proceed { key_schedule } => {
                    self.key_schedule = Some(key_schedule);
                }
            },
            HandshakeType::EncryptedExtensions => {
                self.handshake.process_encrypted_extensions(msg)?;
            }
            HandshakeType::CertificateRequest => {
                self.handshake.process_certificate_request(msg)?;
            }
            HandshakeType::Certificate => {
                self.handshake.process_certificate(msg)?;
            }
            HandshakeType::CertificateVerify => {
                self.handshake.process_certificate_verify(msg)?;
            }
            HandshakeType::Finished => {
                let ks = self
                    .key_schedule
                    .as_mut()
                    .ok_or(TlsError::Internal("no key schedule at Finished"))?;
                let flight = self.handshake.process_finished(msg, ks)?;
                for hs_msg in flight {
                    let wire = self.record_layer.encode(
                        ContentType::Handshake,
                        &hs_msg,
                        Some(&mut *ks),
                    )?;
                    self.stream.write_all(&wire)?;
                }
                self.stream.flush()?;
                self.handshake.install_application_keys(ks)?;
                self.state = ConnectionState::Connected;
            }
            _ => return Err(TlsError::fatal(AlertDescription::UnexpectedMessage)),
        }
        Ok(())
    }

    fn dispatch_post_handshake_message(&mut self, msg: &[u8]) -> Result<(), TlsError> {
        let (msg_type, body, _) = parse_handshake_header(msg)?;
        match msg_type {
            HandshakeType::NewSessionTicket => {
                // Parsed for validity; resumption is not supported, so the
                // ticket is dropped
                decode_new_session_ticket(body)?;
                Ok(())
            }
            HandshakeType::KeyUpdate => self.process_key_update(body),
            _ => Err(TlsError::fatal(AlertDescription::UnexpectedMessage)),
        }
    }

    /// Handle a peer KeyUpdate: rotate the read secret, and answer with our
    /// own KeyUpdate when a response was requested (RFC 8446 §4.6.3).
    fn process_key_update(&mut self, body: &[u8]) -> Result<(), TlsError> {
        self.key_update_count += 1;
        if self.key_update_count > MAX_KEY_UPDATES {
            return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
        }
        let ku = decode_key_update(body)?;
        let ks = self
            .key_schedule
            .as_mut()
            .ok_or(TlsError::Internal("no key schedule for KeyUpdate"))?;
        ks.update_read_secret()?;

        if ku.request_update == KeyUpdateRequest::UpdateRequested {
            let reply = encode_key_update(&KeyUpdateMsg {
                request_update: KeyUpdateRequest::UpdateNotRequested,
            });
            let wire =
                self.record_layer
                    .encode(ContentType::Handshake, &reply, Some(&mut *ks))?;
            self.stream.write_all(&wire)?;
            self.stream.flush()?;
            ks.update_write_secret()?;
        }
        Ok(())
    }

    fn process_alert(&mut self, fragment: &[u8]) -> Result<(), TlsError> {
        let alert = Alert::decode(fragment)?;
        match alert.description {
            AlertDescription::CloseNotify => {
                self.received_close_notify = true;
                self.state = ConnectionState::Closed;
                Err(TlsError::ConnectionClosed)
            }
            // user_canceled is informational and followed by close_notify
            AlertDescription::UserCanceled if alert.level == AlertLevel::Warning => Ok(()),
            _ => Err(TlsError::PeerAlert(alert)),
        }
    }

    /// Send the alert for `err` (when one applies) and tear the connection
    /// down. Returns the error for propagation.
    fn fail(&mut self, err: TlsError) -> TlsError {
        if let Some(alert) = err.alert_to_send() {
            let payload = alert.encode();
            if let Ok(wire) = self.record_layer.encode(
                ContentType::Alert,
                &payload,
                self.key_schedule.as_mut(),
            ) {
                let _ = self.stream.write_all(&wire);
                let _ = self.stream.flush();
            }
        }
        self.state = ConnectionState::Closed;
        self.handshake.close();
        err
    }
}

impl<S: Read + Write> TlsConnection for TlsClientConnection<S> {
    fn handshake(&mut self) -> Result<(), TlsError> {
        match self.state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Closed => Err(TlsError::ConnectionClosed),
            ConnectionState::Handshaking => match self.run_handshake() {
                Ok(()) => Ok(()),
                Err(err) => Err(self.fail(err)),
            },
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TlsError> {
        if self.state != ConnectionState::Connected {
            return Err(TlsError::ConnectionClosed);
        }
        while self.app_data_buf.is_empty() {
            if self.received_close_notify {
                return Ok(0);
            }
            let record = match self
                .record_layer
                .extract(&mut self.stream, self.key_schedule.as_mut())
            {
                Ok(record) => record,
                Err(err) => return Err(self.fail(err)),
            };
            let result = match record.content_type {
                ContentType::ApplicationData => {
                    self.key_update_count = 0;
                    self.app_data_buf.extend_from_slice(&record.fragment);
                    Ok(())
                }
                ContentType::Handshake => {
                    self.hs_buf.extend_from_slice(&record.fragment);
                    self.drain_handshake_messages()
                }
                ContentType::Alert => match self.process_alert(&record.fragment) {
                    Err(TlsError::ConnectionClosed) => return Ok(0),
                    other => other,
                },
                ContentType::ChangeCipherSpec => {
                    Err(TlsError::fatal(AlertDescription::UnexpectedMessage))
                }
            };
            if let Err(err) = result {
                return Err(self.fail(err));
            }
        }

        let n = buf.len().min(self.app_data_buf.len());
        buf[..n].copy_from_slice(&self.app_data_buf[..n]);
        self.app_data_buf.drain(..n);
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TlsError> {
        if self.state != ConnectionState::Connected || self.sent_close_notify {
            return Err(TlsError::ConnectionClosed);
        }
        let ks = self
            .key_schedule
            .as_mut()
            .ok_or(TlsError::Internal("no key schedule"))?;
        let wire = self
            .record_layer
            .encode(ContentType::ApplicationData, buf, Some(ks))?;
        self.stream.write_all(&wire)?;
        self.stream.flush()?;
        Ok(buf.len())
    }

    fn shutdown(&mut self) -> Result<(), TlsError> {
        if self.sent_close_notify || self.state == ConnectionState::Closed {
            self.state = ConnectionState::Closed;
            return Ok(());
        }
        let payload = Alert::close_notify().encode();
        let wire = self.record_layer.encode(
            ContentType::Alert,
            &payload,
            self.key_schedule.as_mut(),
        )?;
        self.stream.write_all(&wire)?;
        self.stream.flush()?;
        self.sent_close_notify = true;
        self.state = ConnectionState::Closed;
        Ok(())
    }

    fn cipher_suite(&self) -> Option<CipherSuite> {
        self.handshake.negotiated_suite()
    }
}

impl<S: Read + Write> TlsClientConnection<S> {
    /// Whether the handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
            && self.handshake.state() == HandshakeState::Connected
    }

    /// Connection lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }
}
