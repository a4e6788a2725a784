//! TLS 1.3 key schedule and traffic-secret manager (RFC 8446 Section 7).
//!
//! One instance per connection. Owns the running extract-chain secret, the
//! per-direction traffic secrets, keys, IVs, and sequence numbers, and
//! performs the record AEAD calls. The handshake state machine drives the
//! stage transitions; the record layer borrows the schedule per record.

use super::aead::{create_aead, TlsAead};
use super::hkdf::{derive_secret, hkdf_expand_label, hkdf_extract, hmac_hash};
use super::{CipherSuiteParams, HashFactory};
use crate::{TlsError, TlsRole};
use zeroize::Zeroize;

/// Nonce length for TLS 1.3 AEADs.
const NONCE_LEN: usize = 12;

/// Stage of the secret derivation chain. Strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheduleStage {
    Initial,
    EarlySecret,
    HandshakeSecret,
    MasterSecret,
    ApplicationSecret,
}

/// Traffic state for one direction (client-write or server-write).
struct DirectionKeys {
    /// The traffic secret the key and IV were expanded from.
    secret: Vec<u8>,
    iv: Vec<u8>,
    aead: Option<Box<dyn TlsAead>>,
}

impl DirectionKeys {
    fn empty() -> Self {
        Self {
            secret: Vec::new(),
            iv: Vec::new(),
            aead: None,
        }
    }
}

impl Drop for DirectionKeys {
    fn drop(&mut self) {
        self.secret.zeroize();
        self.iv.zeroize();
    }
}

/// Per-record nonce: IV XOR pad_left(sequence_number) (RFC 8446 §5.3).
fn build_nonce(iv: &[u8], seq: u64) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[4..12].copy_from_slice(&seq.to_be_bytes());
    for (n, &v) in nonce.iter_mut().zip(iv.iter()) {
        *n ^= v;
    }
    nonce
}

/// TLS 1.3 key schedule.
pub struct KeySchedule {
    params: CipherSuiteParams,
    factory: HashFactory,
    role: TlsRole,
    stage: KeyScheduleStage,
    /// Running secret of the extract chain.
    secret: Vec<u8>,
    client: DirectionKeys,
    server: DirectionKeys,
    write_seq: u64,
    read_seq: u64,
}

impl Drop for KeySchedule {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl KeySchedule {
    /// Create a key schedule for the given cipher suite and role.
    pub fn new(params: CipherSuiteParams, role: TlsRole) -> Self {
        let factory = params.hash_factory();
        Self {
            params,
            factory,
            role,
            stage: KeyScheduleStage::Initial,
            secret: Vec::new(),
            client: DirectionKeys::empty(),
            server: DirectionKeys::empty(),
            write_seq: 0,
            read_seq: 0,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> KeyScheduleStage {
        self.stage
    }

    /// Hash length for this cipher suite.
    pub fn hash_len(&self) -> usize {
        self.params.hash_len
    }

    /// Cipher suite parameters.
    pub fn params(&self) -> &CipherSuiteParams {
        &self.params
    }

    /// True once traffic keys have been installed on both directions.
    pub fn has_traffic_keys(&self) -> bool {
        self.client.aead.is_some() && self.server.aead.is_some()
    }

    /// Current write-direction sequence number.
    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// Current read-direction sequence number.
    pub fn read_seq(&self) -> u64 {
        self.read_seq
    }

    /// The client traffic secret for the current epoch, once installed.
    pub fn client_traffic_secret(&self) -> Option<&[u8]> {
        (!self.client.secret.is_empty()).then_some(self.client.secret.as_slice())
    }

    /// The server traffic secret for the current epoch, once installed.
    pub fn server_traffic_secret(&self) -> Option<&[u8]> {
        (!self.server.secret.is_empty()).then_some(self.server.secret.as_slice())
    }

    fn empty_hash(&self) -> Result<Vec<u8>, TlsError> {
        let mut hasher = (self.factory)();
        let mut out = vec![0u8; self.params.hash_len];
        hasher.finish(&mut out).map_err(TlsError::Crypto)?;
        Ok(out)
    }

    /// Advance the extract chain by one stage:
    /// Initial → EarlySecret → HandshakeSecret → MasterSecret.
    ///
    /// `ikm` is the PSK (Early), the (EC)DHE shared secret (Handshake), or
    /// `None` for a zero-filled input. Each transition computes
    /// `secret' = HKDF-Extract(Derive-Secret(secret, "derived", ""), ikm)`,
    /// with a zero salt for the very first transition.
    pub fn advance(&mut self, ikm: Option<&[u8]>) -> Result<(), TlsError> {
        let zero_ikm = vec![0u8; self.params.hash_len];
        let ikm = ikm.unwrap_or(&zero_ikm);

        let next = match self.stage {
            KeyScheduleStage::Initial => {
                self.secret = hkdf_extract(&*self.factory, &[], ikm).map_err(TlsError::Crypto)?;
                KeyScheduleStage::EarlySecret
            }
            KeyScheduleStage::EarlySecret | KeyScheduleStage::HandshakeSecret => {
                let empty_hash = self.empty_hash()?;
                let mut salt = derive_secret(&*self.factory, &self.secret, b"derived", &empty_hash)
                    .map_err(TlsError::Crypto)?;
                self.secret.zeroize();
                self.secret =
                    hkdf_extract(&*self.factory, &salt, ikm).map_err(TlsError::Crypto)?;
                salt.zeroize();
                if self.stage == KeyScheduleStage::EarlySecret {
                    KeyScheduleStage::HandshakeSecret
                } else {
                    KeyScheduleStage::MasterSecret
                }
            }
            _ => return Err(TlsError::WrongStage("key schedule advance")),
        };
        self.stage = next;
        Ok(())
    }

    /// Derive and install the handshake traffic keys for both directions.
    ///
    /// `transcript_hash` covers ClientHello..ServerHello. Resets both
    /// sequence numbers to zero.
    pub fn install_handshake_keys(&mut self, transcript_hash: &[u8]) -> Result<(), TlsError> {
        if self.stage != KeyScheduleStage::HandshakeSecret {
            return Err(TlsError::WrongStage("install_handshake_keys"));
        }
        self.install_both(b"c hs traffic", b"s hs traffic", transcript_hash)
    }

    /// Derive and install the application traffic keys for both directions.
    ///
    /// `transcript_hash` covers ClientHello..server Finished. Resets both
    /// sequence numbers to zero and moves the stage to ApplicationSecret.
    pub fn install_application_keys(&mut self, transcript_hash: &[u8]) -> Result<(), TlsError> {
        if self.stage != KeyScheduleStage::MasterSecret {
            return Err(TlsError::WrongStage("install_application_keys"));
        }
        self.install_both(b"c ap traffic", b"s ap traffic", transcript_hash)?;
        self.stage = KeyScheduleStage::ApplicationSecret;
        Ok(())
    }

    fn install_both(
        &mut self,
        client_label: &[u8],
        server_label: &[u8],
        transcript_hash: &[u8],
    ) -> Result<(), TlsError> {
        let client_secret =
            derive_secret(&*self.factory, &self.secret, client_label, transcript_hash)
                .map_err(TlsError::Crypto)?;
        let server_secret =
            derive_secret(&*self.factory, &self.secret, server_label, transcript_hash)
                .map_err(TlsError::Crypto)?;
        self.install_direction(true, client_secret)?;
        self.install_direction(false, server_secret)?;
        self.write_seq = 0;
        self.read_seq = 0;
        Ok(())
    }

    /// Expand key + IV from a traffic secret and install them on one direction.
    fn install_direction(&mut self, client: bool, traffic_secret: Vec<u8>) -> Result<(), TlsError> {
        let mut key = hkdf_expand_label(
            &*self.factory,
            &traffic_secret,
            b"key",
            b"",
            self.params.key_len,
        )
        .map_err(TlsError::Crypto)?;
        let iv = hkdf_expand_label(
            &*self.factory,
            &traffic_secret,
            b"iv",
            b"",
            self.params.iv_len,
        )
        .map_err(TlsError::Crypto)?;
        let aead = create_aead(self.params.suite, &key)?;
        key.zeroize();

        let dir = if client { &mut self.client } else { &mut self.server };
        dir.secret.zeroize();
        dir.iv.zeroize();
        dir.secret = traffic_secret;
        dir.iv = iv;
        dir.aead = Some(aead);
        Ok(())
    }

    /// Encrypt one record payload for this endpoint's write direction.
    ///
    /// Builds the nonce from the write sequence number and increments it.
    pub fn encrypt(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TlsError> {
        let dir = match self.role {
            TlsRole::Client => &self.client,
            TlsRole::Server => &self.server,
        };
        let aead = dir
            .aead
            .as_ref()
            .ok_or(TlsError::WrongStage("encrypt before keys installed"))?;
        if self.write_seq == u64::MAX {
            return Err(TlsError::Internal("write sequence number exhausted"));
        }
        let nonce = build_nonce(&dir.iv, self.write_seq);
        let ciphertext = aead.encrypt(&nonce, aad, plaintext)?;
        self.write_seq += 1;
        Ok(ciphertext)
    }

    /// Decrypt one record body from this endpoint's read direction.
    ///
    /// Builds the nonce from the read sequence number; the sequence number
    /// advances only on successful authentication. A tag mismatch surfaces
    /// as the `bad_record_mac` alert and yields no plaintext.
    pub fn decrypt(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, TlsError> {
        let dir = match self.role {
            TlsRole::Client => &self.server,
            TlsRole::Server => &self.client,
        };
        let aead = dir
            .aead
            .as_ref()
            .ok_or(TlsError::WrongStage("decrypt before keys installed"))?;
        if self.read_seq == u64::MAX {
            return Err(TlsError::Internal("read sequence number exhausted"));
        }
        let nonce = build_nonce(&dir.iv, self.read_seq);
        let plaintext = aead.decrypt(&nonce, aad, ciphertext)?;
        self.read_seq += 1;
        Ok(plaintext)
    }

    /// `finished_key = HKDF-Expand-Label(traffic_secret, "finished", "", Hash.length)`.
    pub fn finished_key(&self, traffic_secret: &[u8]) -> Result<Vec<u8>, TlsError> {
        hkdf_expand_label(
            &*self.factory,
            traffic_secret,
            b"finished",
            b"",
            self.params.hash_len,
        )
        .map_err(TlsError::Crypto)
    }

    /// `verify_data = HMAC(finished_key, transcript_hash)`.
    pub fn finished_verify_data(
        &self,
        finished_key: &[u8],
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        hmac_hash(&*self.factory, finished_key, transcript_hash).map_err(TlsError::Crypto)
    }

    /// Rotate the read-direction traffic secret (`"traffic upd"`, RFC 8446
    /// §7.2) and reset the read sequence number. KeyUpdate handling.
    pub fn update_read_secret(&mut self) -> Result<(), TlsError> {
        if self.stage != KeyScheduleStage::ApplicationSecret {
            return Err(TlsError::WrongStage("update_read_secret"));
        }
        let client = self.role == TlsRole::Server;
        let updated = self.next_generation_secret(client)?;
        self.install_direction(client, updated)?;
        self.read_seq = 0;
        Ok(())
    }

    /// Rotate the write-direction traffic secret and reset the write
    /// sequence number.
    pub fn update_write_secret(&mut self) -> Result<(), TlsError> {
        if self.stage != KeyScheduleStage::ApplicationSecret {
            return Err(TlsError::WrongStage("update_write_secret"));
        }
        let client = self.role == TlsRole::Client;
        let updated = self.next_generation_secret(client)?;
        self.install_direction(client, updated)?;
        self.write_seq = 0;
        Ok(())
    }

    fn next_generation_secret(&self, client: bool) -> Result<Vec<u8>, TlsError> {
        let dir = if client { &self.client } else { &self.server };
        hkdf_expand_label(
            &*self.factory,
            &dir.secret,
            b"traffic upd",
            b"",
            self.params.hash_len,
        )
        .map_err(TlsError::Crypto)
    }
}
