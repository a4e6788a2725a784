//! TLS extension container.
//!
//! `ExtensionBlock` is an order-preserving keyed store: values are looked up
//! by extension type, but serialization replays the first-insertion order,
//! and re-adding a type overwrites the value without moving its position.
//! Extension types without a registered parser for the current message
//! context are preserved verbatim as `Opaque` so they survive
//! re-serialization byte-exact.

use std::collections::HashMap;

use crate::alert::AlertDescription;
use crate::crypt::{NamedGroup, SignatureScheme};
use crate::TlsError;

/// TLS extension type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionType(pub u16);

impl ExtensionType {
    pub const SERVER_NAME: Self = Self(0);
    pub const SUPPORTED_GROUPS: Self = Self(10);
    pub const SIGNATURE_ALGORITHMS: Self = Self(13);
    pub const APPLICATION_LAYER_PROTOCOL_NEGOTIATION: Self = Self(16);
    pub const PRE_SHARED_KEY: Self = Self(41);
    pub const EARLY_DATA: Self = Self(42);
    pub const SUPPORTED_VERSIONS: Self = Self(43);
    pub const COOKIE: Self = Self(44);
    pub const PSK_KEY_EXCHANGE_MODES: Self = Self(45);
    pub const SIGNATURE_ALGORITHMS_CERT: Self = Self(50);
    pub const KEY_SHARE: Self = Self(51);
}

/// The handshake message an extensions block belongs to.
///
/// Parsing is context-sensitive: the same extension type has different wire
/// shapes in different messages (key_share most notably).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageContext {
    ClientHello,
    ServerHello,
    HelloRetryRequest,
    EncryptedExtensions,
    CertificateRequest,
    NewSessionTicket,
    Certificate,
}

/// One key-share entry: a named group and its public key bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyShareEntry {
    pub group: NamedGroup,
    pub key_exchange: Vec<u8>,
}

/// A decoded extension value, or the raw bytes when the type is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionValue {
    /// supported_versions in ClientHello: offered version list.
    SupportedVersionsClient(Vec<u16>),
    /// supported_versions in ServerHello/HelloRetryRequest: selected version.
    SupportedVersionsServer(u16),
    /// supported_groups: offered named groups.
    SupportedGroups(Vec<NamedGroup>),
    /// signature_algorithms: offered signature schemes.
    SignatureAlgorithms(Vec<SignatureScheme>),
    /// key_share in ClientHello: one entry per offered group.
    KeyShareClient(Vec<KeyShareEntry>),
    /// key_share in ServerHello: the server's single entry.
    KeyShareServer(KeyShareEntry),
    /// key_share in HelloRetryRequest: the group the server wants.
    KeyShareRetry(NamedGroup),
    /// server_name in ClientHello: one host_name entry.
    ServerName(String),
    /// ALPN in ClientHello: offered protocols.
    Alpn(Vec<Vec<u8>>),
    /// ALPN in EncryptedExtensions: the selected protocol.
    AlpnSelected(Vec<u8>),
    /// psk_key_exchange_modes: offered modes.
    PskKeyExchangeModes(Vec<u8>),
    /// cookie (HelloRetryRequest round trips).
    Cookie(Vec<u8>),
    /// Any type without a registered parser for the context. The payload is
    /// carried unchanged so re-serialization is byte-exact.
    Opaque {
        extension_type: ExtensionType,
        data: Vec<u8>,
    },
}

impl ExtensionValue {
    /// The wire type code this value serializes under.
    pub fn extension_type(&self) -> ExtensionType {
        match self {
            ExtensionValue::SupportedVersionsClient(_)
            | ExtensionValue::SupportedVersionsServer(_) => ExtensionType::SUPPORTED_VERSIONS,
            ExtensionValue::SupportedGroups(_) => ExtensionType::SUPPORTED_GROUPS,
            ExtensionValue::SignatureAlgorithms(_) => ExtensionType::SIGNATURE_ALGORITHMS,
            ExtensionValue::KeyShareClient(_)
            | ExtensionValue::KeyShareServer(_)
            | ExtensionValue::KeyShareRetry(_) => ExtensionType::KEY_SHARE,
            ExtensionValue::ServerName(_) => ExtensionType::SERVER_NAME,
            ExtensionValue::Alpn(_) | ExtensionValue::AlpnSelected(_) => {
                ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION
            }
            ExtensionValue::PskKeyExchangeModes(_) => ExtensionType::PSK_KEY_EXCHANGE_MODES,
            ExtensionValue::Cookie(_) => ExtensionType::COOKIE,
            ExtensionValue::Opaque { extension_type, .. } => *extension_type,
        }
    }

    /// Serialize the extension payload (without the type/length header).
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            ExtensionValue::SupportedVersionsClient(versions) => {
                out.push((versions.len() * 2) as u8);
                for v in versions {
                    out.extend_from_slice(&v.to_be_bytes());
                }
            }
            ExtensionValue::SupportedVersionsServer(version) => {
                out.extend_from_slice(&version.to_be_bytes());
            }
            ExtensionValue::SupportedGroups(groups) => {
                out.extend_from_slice(&((groups.len() * 2) as u16).to_be_bytes());
                for g in groups {
                    out.extend_from_slice(&g.0.to_be_bytes());
                }
            }
            ExtensionValue::SignatureAlgorithms(schemes) => {
                out.extend_from_slice(&((schemes.len() * 2) as u16).to_be_bytes());
                for s in schemes {
                    out.extend_from_slice(&s.0.to_be_bytes());
                }
            }
            ExtensionValue::KeyShareClient(entries) => {
                let mut list = Vec::new();
                for e in entries {
                    list.extend_from_slice(&e.group.0.to_be_bytes());
                    list.extend_from_slice(&(e.key_exchange.len() as u16).to_be_bytes());
                    list.extend_from_slice(&e.key_exchange);
                }
                out.extend_from_slice(&(list.len() as u16).to_be_bytes());
                out.extend_from_slice(&list);
            }
            ExtensionValue::KeyShareServer(entry) => {
                out.extend_from_slice(&entry.group.0.to_be_bytes());
                out.extend_from_slice(&(entry.key_exchange.len() as u16).to_be_bytes());
                out.extend_from_slice(&entry.key_exchange);
            }
            ExtensionValue::KeyShareRetry(group) => {
                out.extend_from_slice(&group.0.to_be_bytes());
            }
            ExtensionValue::ServerName(name) => {
                let name_bytes = name.as_bytes();
                out.extend_from_slice(&((name_bytes.len() + 3) as u16).to_be_bytes());
                out.push(0); // name_type host_name
                out.extend_from_slice(&(name_bytes.len() as u16).to_be_bytes());
                out.extend_from_slice(name_bytes);
            }
            ExtensionValue::Alpn(protocols) => {
                let mut list = Vec::new();
                for p in protocols {
                    list.push(p.len() as u8);
                    list.extend_from_slice(p);
                }
                out.extend_from_slice(&(list.len() as u16).to_be_bytes());
                out.extend_from_slice(&list);
            }
            ExtensionValue::AlpnSelected(protocol) => {
                out.extend_from_slice(&((protocol.len() + 1) as u16).to_be_bytes());
                out.push(protocol.len() as u8);
                out.extend_from_slice(protocol);
            }
            ExtensionValue::PskKeyExchangeModes(modes) => {
                out.push(modes.len() as u8);
                out.extend_from_slice(modes);
            }
            ExtensionValue::Cookie(cookie) => {
                out.extend_from_slice(&(cookie.len() as u16).to_be_bytes());
                out.extend_from_slice(cookie);
            }
            ExtensionValue::Opaque { data, .. } => {
                out.extend_from_slice(data);
            }
        }
        out
    }

    /// Parse one extension payload for the given message context.
    ///
    /// Types without a parser registered for `ctx` come back as `Opaque`.
    fn parse(
        ext_type: ExtensionType,
        data: &[u8],
        ctx: MessageContext,
    ) -> Result<ExtensionValue, TlsError> {
        use MessageContext::*;
        let decode_err = || TlsError::fatal(AlertDescription::DecodeError);

        let value = match (ext_type, ctx) {
            (ExtensionType::SUPPORTED_VERSIONS, ClientHello) => {
                let len = *data.first().ok_or_else(decode_err)? as usize;
                if data.len() != 1 + len || len % 2 != 0 {
                    return Err(decode_err());
                }
                let versions = data[1..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                ExtensionValue::SupportedVersionsClient(versions)
            }
            (ExtensionType::SUPPORTED_VERSIONS, ServerHello | HelloRetryRequest) => {
                if data.len() != 2 {
                    return Err(decode_err());
                }
                ExtensionValue::SupportedVersionsServer(u16::from_be_bytes([data[0], data[1]]))
            }
            (ExtensionType::SUPPORTED_GROUPS, ClientHello | EncryptedExtensions) => {
                let list = read_u16_prefixed(data).ok_or_else(decode_err)?;
                if list.len() % 2 != 0 {
                    return Err(decode_err());
                }
                let groups = list
                    .chunks_exact(2)
                    .map(|c| NamedGroup(u16::from_be_bytes([c[0], c[1]])))
                    .collect();
                ExtensionValue::SupportedGroups(groups)
            }
            (ExtensionType::SIGNATURE_ALGORITHMS, ClientHello | CertificateRequest) => {
                let list = read_u16_prefixed(data).ok_or_else(decode_err)?;
                if list.len() % 2 != 0 {
                    return Err(decode_err());
                }
                let schemes = list
                    .chunks_exact(2)
                    .map(|c| SignatureScheme(u16::from_be_bytes([c[0], c[1]])))
                    .collect();
                ExtensionValue::SignatureAlgorithms(schemes)
            }
            (ExtensionType::KEY_SHARE, ClientHello) => {
                let mut list = read_u16_prefixed(data).ok_or_else(decode_err)?;
                let mut entries = Vec::new();
                while !list.is_empty() {
                    if list.len() < 4 {
                        return Err(decode_err());
                    }
                    let group = NamedGroup(u16::from_be_bytes([list[0], list[1]]));
                    let klen = u16::from_be_bytes([list[2], list[3]]) as usize;
                    if list.len() < 4 + klen {
                        return Err(decode_err());
                    }
                    entries.push(KeyShareEntry {
                        group,
                        key_exchange: list[4..4 + klen].to_vec(),
                    });
                    list = &list[4 + klen..];
                }
                ExtensionValue::KeyShareClient(entries)
            }
            (ExtensionType::KEY_SHARE, ServerHello) => {
                if data.len() < 4 {
                    return Err(decode_err());
                }
                let group = NamedGroup(u16::from_be_bytes([data[0], data[1]]));
                let klen = u16::from_be_bytes([data[2], data[3]]) as usize;
                if data.len() != 4 + klen {
                    return Err(decode_err());
                }
                ExtensionValue::KeyShareServer(KeyShareEntry {
                    group,
                    key_exchange: data[4..].to_vec(),
                })
            }
            (ExtensionType::KEY_SHARE, HelloRetryRequest) => {
                if data.len() != 2 {
                    return Err(decode_err());
                }
                ExtensionValue::KeyShareRetry(NamedGroup(u16::from_be_bytes([data[0], data[1]])))
            }
            (ExtensionType::SERVER_NAME, ClientHello) => {
                let list = read_u16_prefixed(data).ok_or_else(decode_err)?;
                if list.len() < 3 || list[0] != 0 {
                    return Err(decode_err());
                }
                let nlen = u16::from_be_bytes([list[1], list[2]]) as usize;
                if list.len() != 3 + nlen {
                    return Err(decode_err());
                }
                let name = std::str::from_utf8(&list[3..]).map_err(|_| decode_err())?;
                ExtensionValue::ServerName(name.to_string())
            }
            (ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION, ClientHello) => {
                let mut list = read_u16_prefixed(data).ok_or_else(decode_err)?;
                let mut protocols = Vec::new();
                while !list.is_empty() {
                    let plen = list[0] as usize;
                    if plen == 0 || list.len() < 1 + plen {
                        return Err(decode_err());
                    }
                    protocols.push(list[1..1 + plen].to_vec());
                    list = &list[1 + plen..];
                }
                ExtensionValue::Alpn(protocols)
            }
            (ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION, EncryptedExtensions) => {
                let list = read_u16_prefixed(data).ok_or_else(decode_err)?;
                if list.is_empty() {
                    return Err(decode_err());
                }
                let plen = list[0] as usize;
                if plen == 0 || list.len() != 1 + plen {
                    return Err(decode_err());
                }
                ExtensionValue::AlpnSelected(list[1..].to_vec())
            }
            (ExtensionType::PSK_KEY_EXCHANGE_MODES, ClientHello) => {
                let len = *data.first().ok_or_else(decode_err)? as usize;
                if data.len() != 1 + len {
                    return Err(decode_err());
                }
                ExtensionValue::PskKeyExchangeModes(data[1..].to_vec())
            }
            (ExtensionType::COOKIE, ClientHello | HelloRetryRequest) => {
                let cookie = read_u16_prefixed(data).ok_or_else(decode_err)?;
                ExtensionValue::Cookie(cookie.to_vec())
            }
            _ => ExtensionValue::Opaque {
                extension_type: ext_type,
                data: data.to_vec(),
            },
        };
        Ok(value)
    }
}

/// Slice off a u16 length prefix; the prefix must cover the rest exactly.
fn read_u16_prefixed(data: &[u8]) -> Option<&[u8]> {
    if data.len() < 2 {
        return None;
    }
    let len = u16::from_be_bytes([data[0], data[1]]) as usize;
    (data.len() == 2 + len).then(|| &data[2..])
}

/// Order-preserving keyed extension store.
#[derive(Debug, Clone, Default)]
pub struct ExtensionBlock {
    /// Extension type codes in first-insertion order.
    order: Vec<u16>,
    values: HashMap<u16, ExtensionValue>,
}

impl ExtensionBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, or overwrite the value for its type while keeping the
    /// type's original position in the serialization order.
    pub fn add(&mut self, value: ExtensionValue) {
        let code = value.extension_type().0;
        if self.values.insert(code, value).is_none() {
            self.order.push(code);
        }
    }

    /// The raw value for a type, if present.
    pub fn get(&self, ext_type: ExtensionType) -> Option<&ExtensionValue> {
        self.values.get(&ext_type.0)
    }

    pub fn contains(&self, ext_type: ExtensionType) -> bool {
        self.values.contains_key(&ext_type.0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Values in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionValue> {
        self.order.iter().map(|code| &self.values[code])
    }

    /// Parse a raw extension list (no outer length prefix) for a context.
    pub fn parse(data: &[u8], ctx: MessageContext) -> Result<Self, TlsError> {
        let mut block = ExtensionBlock::new();
        let mut pos = 0;
        while pos < data.len() {
            if data.len() - pos < 4 {
                return Err(TlsError::fatal(AlertDescription::DecodeError));
            }
            let ext_type = ExtensionType(u16::from_be_bytes([data[pos], data[pos + 1]]));
            let ext_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            pos += 4;
            if data.len() - pos < ext_len {
                return Err(TlsError::fatal(AlertDescription::DecodeError));
            }
            let value = ExtensionValue::parse(ext_type, &data[pos..pos + ext_len], ctx)?;
            block.add(value);
            pos += ext_len;
        }
        Ok(block)
    }

    /// Serialize all extensions in insertion order (no outer length prefix).
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for value in self.iter() {
            let payload = value.encode_payload();
            out.extend_from_slice(&value.extension_type().0.to_be_bytes());
            out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            out.extend_from_slice(&payload);
        }
        out
    }

    // --- Typed accessors. Absence or a different variant is a local error,
    // --- never a protocol alert.

    /// The selected version from a ServerHello/HelloRetryRequest.
    pub fn supported_versions_server(&self) -> Result<u16, TlsError> {
        match self.get(ExtensionType::SUPPORTED_VERSIONS) {
            Some(ExtensionValue::SupportedVersionsServer(v)) => Ok(*v),
            Some(_) => Err(TlsError::ExtensionTypeMismatch(
                ExtensionType::SUPPORTED_VERSIONS,
            )),
            None => Err(TlsError::MissingExtension(ExtensionType::SUPPORTED_VERSIONS)),
        }
    }

    /// The server's key share from a ServerHello.
    pub fn key_share_server(&self) -> Result<&KeyShareEntry, TlsError> {
        match self.get(ExtensionType::KEY_SHARE) {
            Some(ExtensionValue::KeyShareServer(entry)) => Ok(entry),
            Some(_) => Err(TlsError::ExtensionTypeMismatch(ExtensionType::KEY_SHARE)),
            None => Err(TlsError::MissingExtension(ExtensionType::KEY_SHARE)),
        }
    }

    /// The requested group from a HelloRetryRequest key share.
    pub fn key_share_retry_group(&self) -> Result<NamedGroup, TlsError> {
        match self.get(ExtensionType::KEY_SHARE) {
            Some(ExtensionValue::KeyShareRetry(group)) => Ok(*group),
            Some(_) => Err(TlsError::ExtensionTypeMismatch(ExtensionType::KEY_SHARE)),
            None => Err(TlsError::MissingExtension(ExtensionType::KEY_SHARE)),
        }
    }

    /// The cookie value, if any.
    pub fn cookie(&self) -> Result<&[u8], TlsError> {
        match self.get(ExtensionType::COOKIE) {
            Some(ExtensionValue::Cookie(c)) => Ok(c),
            Some(_) => Err(TlsError::ExtensionTypeMismatch(ExtensionType::COOKIE)),
            None => Err(TlsError::MissingExtension(ExtensionType::COOKIE)),
        }
    }

    /// The protocol the server selected via ALPN.
    pub fn alpn_selected(&self) -> Result<&[u8], TlsError> {
        match self.get(ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION) {
            Some(ExtensionValue::AlpnSelected(p)) => Ok(p),
            Some(_) => Err(TlsError::ExtensionTypeMismatch(
                ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION,
            )),
            None => Err(TlsError::MissingExtension(
                ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_get() {
        let mut block = ExtensionBlock::new();
        block.add(ExtensionValue::SupportedVersionsServer(0x0304));
        assert!(block.contains(ExtensionType::SUPPORTED_VERSIONS));
        assert_eq!(block.supported_versions_server().unwrap(), 0x0304);
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn test_duplicate_add_overwrites_value_keeps_position() {
        let mut block = ExtensionBlock::new();
        block.add(ExtensionValue::Cookie(vec![1]));
        block.add(ExtensionValue::SupportedVersionsServer(0x0304));
        block.add(ExtensionValue::Cookie(vec![2, 3]));

        assert_eq!(block.len(), 2);
        assert_eq!(block.cookie().unwrap(), &[2, 3]);
        // Cookie still serializes first
        let types: Vec<u16> = block.iter().map(|v| v.extension_type().0).collect();
        assert_eq!(types, vec![ExtensionType::COOKIE.0, ExtensionType::SUPPORTED_VERSIONS.0]);
    }

    #[test]
    fn test_typed_accessor_errors_are_local() {
        let block = ExtensionBlock::new();
        match block.key_share_server() {
            Err(TlsError::MissingExtension(t)) => assert_eq!(t, ExtensionType::KEY_SHARE),
            other => panic!("expected MissingExtension, got {other:?}"),
        }

        let mut block = ExtensionBlock::new();
        block.add(ExtensionValue::KeyShareRetry(NamedGroup::X25519));
        match block.key_share_server() {
            Err(TlsError::ExtensionTypeMismatch(t)) => assert_eq!(t, ExtensionType::KEY_SHARE),
            other => panic!("expected ExtensionTypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_server_hello_extensions() {
        // supported_versions(0x0304) + key_share(x25519, 4-byte key)
        let data = [
            0x00, 0x2b, 0x00, 0x02, 0x03, 0x04, // supported_versions
            0x00, 0x33, 0x00, 0x08, 0x00, 0x1d, 0x00, 0x04, 0xAA, 0xBB, 0xCC, 0xDD,
        ];
        let block = ExtensionBlock::parse(&data, MessageContext::ServerHello).unwrap();
        assert_eq!(block.supported_versions_server().unwrap(), 0x0304);
        let ks = block.key_share_server().unwrap();
        assert_eq!(ks.group, NamedGroup::X25519);
        assert_eq!(ks.key_exchange, vec![0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn test_unknown_extension_roundtrips_byte_exact() {
        // A recognized extension surrounded by two unknown types
        let data = [
            0xFF, 0x01, 0x00, 0x03, 0x01, 0x02, 0x03, // unknown 0xFF01
            0x00, 0x2b, 0x00, 0x02, 0x03, 0x04, // supported_versions
            0xAB, 0xCD, 0x00, 0x00, // unknown 0xABCD, empty payload
        ];
        let block = ExtensionBlock::parse(&data, MessageContext::ServerHello).unwrap();
        assert_eq!(block.len(), 3);
        match block.get(ExtensionType(0xFF01)) {
            Some(ExtensionValue::Opaque { data, .. }) => assert_eq!(data, &[1, 2, 3]),
            other => panic!("expected Opaque, got {other:?}"),
        }
        assert_eq!(block.encode(), data);
    }

    #[test]
    fn test_known_extensions_roundtrip() {
        let mut block = ExtensionBlock::new();
        block.add(ExtensionValue::SupportedVersionsClient(vec![0x0304]));
        block.add(ExtensionValue::SupportedGroups(vec![
            NamedGroup::X25519,
            NamedGroup::FFDHE2048,
        ]));
        block.add(ExtensionValue::SignatureAlgorithms(vec![
            SignatureScheme::RSA_PSS_RSAE_SHA256,
            SignatureScheme::ED25519,
        ]));
        block.add(ExtensionValue::KeyShareClient(vec![KeyShareEntry {
            group: NamedGroup::X25519,
            key_exchange: vec![0x42; 32],
        }]));
        block.add(ExtensionValue::ServerName("example.com".into()));
        block.add(ExtensionValue::Alpn(vec![b"h2".to_vec(), b"http/1.1".to_vec()]));
        block.add(ExtensionValue::PskKeyExchangeModes(vec![1]));

        let wire = block.encode();
        let parsed = ExtensionBlock::parse(&wire, MessageContext::ClientHello).unwrap();
        assert_eq!(parsed.encode(), wire);

        match parsed.get(ExtensionType::SERVER_NAME) {
            Some(ExtensionValue::ServerName(n)) => assert_eq!(n, "example.com"),
            other => panic!("bad server_name: {other:?}"),
        }
        match parsed.get(ExtensionType::KEY_SHARE) {
            Some(ExtensionValue::KeyShareClient(entries)) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].key_exchange.len(), 32);
            }
            other => panic!("bad key_share: {other:?}"),
        }
    }

    #[test]
    fn test_context_sensitivity() {
        // The same key_share bytes parse differently per context
        let hrr_share = [0x00, 0x33, 0x00, 0x02, 0x01, 0x00];
        let block = ExtensionBlock::parse(&hrr_share, MessageContext::HelloRetryRequest).unwrap();
        assert_eq!(block.key_share_retry_group().unwrap(), NamedGroup::FFDHE2048);

        // server_name in EncryptedExtensions has no registered parser: Opaque
        let sn_echo = [0x00, 0x00, 0x00, 0x00];
        let block = ExtensionBlock::parse(&sn_echo, MessageContext::EncryptedExtensions).unwrap();
        assert!(matches!(
            block.get(ExtensionType::SERVER_NAME),
            Some(ExtensionValue::Opaque { .. })
        ));
        assert_eq!(block.encode(), sn_echo);
    }

    #[test]
    fn test_truncated_extension_rejected() {
        // Header claims 5 bytes of payload, only 2 present
        let data = [0x00, 0x2b, 0x00, 0x05, 0x03, 0x04];
        assert!(ExtensionBlock::parse(&data, MessageContext::ServerHello).is_err());
        // Dangling partial header
        let data = [0x00, 0x2b, 0x00];
        assert!(ExtensionBlock::parse(&data, MessageContext::ServerHello).is_err());
    }

    #[test]
    fn test_malformed_known_extension_rejected() {
        // supported_versions in SH must be exactly 2 bytes
        let data = [0x00, 0x2b, 0x00, 0x03, 0x03, 0x04, 0x00];
        assert!(ExtensionBlock::parse(&data, MessageContext::ServerHello).is_err());
        // key_share entry length overruns the payload
        let data = [0x00, 0x33, 0x00, 0x06, 0x00, 0x1d, 0x00, 0x20, 0xAA, 0xBB];
        assert!(ExtensionBlock::parse(&data, MessageContext::ServerHello).is_err());
    }

    #[test]
    fn test_alpn_selected_roundtrip() {
        let mut block = ExtensionBlock::new();
        block.add(ExtensionValue::AlpnSelected(b"h2".to_vec()));
        let wire = block.encode();
        let parsed = ExtensionBlock::parse(&wire, MessageContext::EncryptedExtensions).unwrap();
        assert_eq!(parsed.alpn_selected().unwrap(), b"h2");
    }
}
