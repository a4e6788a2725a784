//! TLS record layer: framing, fragmentation, and AEAD protection
//! (RFC 8446 Section 5).
//!
//! The record layer owns no cryptographic state: when a key schedule is
//! supplied, protection and deprotection are delegated to it per record, so
//! sequence numbers live in exactly one place.

use std::io::Read;

use crate::alert::AlertDescription;
use crate::crypt::key_schedule::KeySchedule;
use crate::TlsError;

/// Maximum plaintext fragment size (2^14, RFC 8446 §5.1).
pub const MAX_PLAINTEXT_LENGTH: usize = 16384;

/// Maximum protected-record expansion (content type + padding + tag, §5.2).
pub const MAX_CIPHERTEXT_OVERHEAD: usize = 256;

/// Maximum ciphertext fragment size.
pub const MAX_CIPHERTEXT_LENGTH: usize = MAX_PLAINTEXT_LENGTH + MAX_CIPHERTEXT_OVERHEAD;

/// Record header size: type(1) + version(2) + length(2).
pub const RECORD_HEADER_LEN: usize = 5;

/// Legacy record version written on every TLS 1.3 record.
pub const TLS13_LEGACY_VERSION: u16 = 0x0303;

/// TLS record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    fn from_u8(v: u8) -> Result<Self, TlsError> {
        match v {
            20 => Ok(ContentType::ChangeCipherSpec),
            21 => Ok(ContentType::Alert),
            22 => Ok(ContentType::Handshake),
            23 => Ok(ContentType::ApplicationData),
            _ => Err(TlsError::fatal(AlertDescription::UnexpectedMessage)),
        }
    }
}

/// A record after framing (and deprotection, when keys are active).
#[derive(Debug, Clone)]
pub struct Record {
    pub content_type: ContentType,
    pub version: u16,
    pub fragment: Vec<u8>,
}

/// Build the 5-byte additional data for a protected record:
/// `opaque_type(23) || 0x0303 || ciphertext_length`.
fn protected_header(ciphertext_len: u16) -> [u8; RECORD_HEADER_LEN] {
    let len = ciphertext_len.to_be_bytes();
    [ContentType::ApplicationData as u8, 0x03, 0x03, len[0], len[1]]
}

/// Strip inner-plaintext framing: scan from the end for the last non-zero
/// byte (the true content type), discarding the zero padding after it.
fn parse_inner_plaintext(inner: &[u8]) -> Result<(ContentType, &[u8]), TlsError> {
    for i in (0..inner.len()).rev() {
        if inner[i] != 0 {
            let ct = ContentType::from_u8(inner[i])?;
            return Ok((ct, &inner[..i]));
        }
    }
    // All zero: no content type byte
    Err(TlsError::fatal(AlertDescription::UnexpectedMessage))
}

/// Record layer for one connection.
pub struct RecordLayer {
    /// Maximum plaintext fragment per record.
    max_fragment_size: usize,
}

impl RecordLayer {
    pub fn new() -> Self {
        Self {
            max_fragment_size: MAX_PLAINTEXT_LENGTH,
        }
    }

    /// Frame `payload` into one or more records, splitting at the fragment
    /// limit. With a key schedule, each fragment is wrapped as a protected
    /// ApplicationData record: the true content type is appended to the
    /// fragment, the 5-byte header over the ciphertext length is the AAD,
    /// and the schedule's `encrypt` produces the body.
    pub fn encode(
        &self,
        content_type: ContentType,
        payload: &[u8],
        mut key_schedule: Option<&mut KeySchedule>,
    ) -> Result<Vec<u8>, TlsError> {
        let mut out = Vec::with_capacity(payload.len() + RECORD_HEADER_LEN);

        let chunks: Vec<&[u8]> = if payload.is_empty() {
            vec![&[]]
        } else {
            payload.chunks(self.max_fragment_size).collect()
        };

        for chunk in chunks {
            match key_schedule.as_deref_mut() {
                Some(ks) => {
                    let mut inner = Vec::with_capacity(chunk.len() + 1);
                    inner.extend_from_slice(chunk);
                    inner.push(content_type as u8);

                    let ciphertext_len = inner.len() + ks.params().tag_len;
                    if ciphertext_len > MAX_CIPHERTEXT_LENGTH {
                        return Err(TlsError::fatal(AlertDescription::RecordOverflow));
                    }
                    let header = protected_header(ciphertext_len as u16);
                    let ciphertext = ks.encrypt(&header, &inner)?;
                    debug_assert_eq!(ciphertext.len(), ciphertext_len);

                    out.extend_from_slice(&header);
                    out.extend_from_slice(&ciphertext);
                }
                None => {
                    out.push(content_type as u8);
                    out.extend_from_slice(&TLS13_LEGACY_VERSION.to_be_bytes());
                    out.extend_from_slice(&(chunk.len() as u16).to_be_bytes());
                    out.extend_from_slice(chunk);
                }
            }
        }
        Ok(out)
    }

    /// Read one record from the stream, deprotecting it through the key
    /// schedule when the outer type is ApplicationData and keys are active.
    ///
    /// An unprotected change_cipher_spec record must carry exactly the
    /// single byte 0x01; anything else is a protocol violation.
    pub fn extract<R: Read>(
        &self,
        stream: &mut R,
        key_schedule: Option<&mut KeySchedule>,
    ) -> Result<Record, TlsError> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        read_exact(stream, &mut header)?;

        let content_type = ContentType::from_u8(header[0])?;
        let version = u16::from_be_bytes([header[1], header[2]]);
        let length = u16::from_be_bytes([header[3], header[4]]) as usize;
        if length > MAX_CIPHERTEXT_LENGTH {
            return Err(TlsError::fatal(AlertDescription::RecordOverflow));
        }

        let mut fragment = vec![0u8; length];
        read_exact(stream, &mut fragment)?;

        if content_type == ContentType::ChangeCipherSpec {
            if fragment.as_slice() != [0x01] {
                return Err(TlsError::fatal(AlertDescription::UnexpectedMessage));
            }
            return Ok(Record {
                content_type,
                version,
                fragment,
            });
        }

        match key_schedule {
            Some(ks) if content_type == ContentType::ApplicationData && ks.has_traffic_keys() => {
                let inner = ks.decrypt(&header, &fragment)?;
                let (true_type, plaintext) = parse_inner_plaintext(&inner)?;
                if plaintext.len() > MAX_PLAINTEXT_LENGTH {
                    return Err(TlsError::fatal(AlertDescription::RecordOverflow));
                }
                Ok(Record {
                    content_type: true_type,
                    version,
                    fragment: plaintext.to_vec(),
                })
            }
            _ => Ok(Record {
                content_type,
                version,
                fragment,
            }),
        }
    }

    /// Parse a single record header+body from a byte slice without any
    /// deprotection. Returns the record and the bytes consumed.
    pub fn parse(&self, data: &[u8]) -> Result<(Record, usize), TlsError> {
        if data.len() < RECORD_HEADER_LEN {
            return Err(TlsError::fatal(AlertDescription::DecodeError));
        }
        let content_type = ContentType::from_u8(data[0])?;
        let version = u16::from_be_bytes([data[1], data[2]]);
        let length = u16::from_be_bytes([data[3], data[4]]) as usize;
        if length > MAX_CIPHERTEXT_LENGTH {
            return Err(TlsError::fatal(AlertDescription::RecordOverflow));
        }
        if data.len() < RECORD_HEADER_LEN + length {
            return Err(TlsError::fatal(AlertDescription::DecodeError));
        }
        Ok((
            Record {
                content_type,
                version,
                fragment: data[RECORD_HEADER_LEN..RECORD_HEADER_LEN + length].to_vec(),
            },
            RECORD_HEADER_LEN + length,
        ))
    }
}

impl Default for RecordLayer {
    fn default() -> Self {
        Self::new()
    }
}

fn read_exact<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<(), TlsError> {
    stream.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            TlsError::ConnectionClosed
        } else {
            TlsError::Io(e)
        }
    })
}
