//! Client configuration with builder.

use std::fmt;
use std::sync::Arc;

use crate::crypt::{NamedGroup, SignatureScheme};
use crate::CipherSuite;

/// Callback receiving NSS Key Log Format lines.
pub type KeyLogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// TLS client configuration.
#[derive(Clone)]
pub struct TlsConfig {
    /// Enabled cipher suites, in preference order.
    pub cipher_suites: Vec<CipherSuite>,
    /// Named groups offered for key exchange; a key share is sent for each.
    pub supported_groups: Vec<NamedGroup>,
    /// Signature schemes offered in signature_algorithms.
    pub signature_algorithms: Vec<SignatureScheme>,
    /// Server name for the SNI extension.
    pub server_name: Option<String>,
    /// ALPN protocols, in preference order. Empty disables ALPN.
    pub alpn_protocols: Vec<Vec<u8>>,
    /// Key log callback (SSLKEYLOGFILE-style lines).
    pub key_log_callback: Option<KeyLogCallback>,
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cipher_suites", &self.cipher_suites)
            .field("supported_groups", &self.supported_groups)
            .field("server_name", &self.server_name)
            .field("alpn_protocols", &self.alpn_protocols)
            .field(
                "key_log_callback",
                &self.key_log_callback.as_ref().map(|_| "<callback>"),
            )
            .finish_non_exhaustive()
    }
}

impl TlsConfig {
    /// Create a builder with the default suites and groups.
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }
}

/// Builder for `TlsConfig`.
pub struct TlsConfigBuilder {
    cipher_suites: Vec<CipherSuite>,
    supported_groups: Vec<NamedGroup>,
    signature_algorithms: Vec<SignatureScheme>,
    server_name: Option<String>,
    alpn_protocols: Vec<Vec<u8>>,
    key_log_callback: Option<KeyLogCallback>,
}

impl Default for TlsConfigBuilder {
    fn default() -> Self {
        Self {
            cipher_suites: vec![
                CipherSuite::TLS_AES_256_GCM_SHA384,
                CipherSuite::TLS_AES_128_GCM_SHA256,
            ],
            supported_groups: vec![NamedGroup::X25519],
            signature_algorithms: vec![
                SignatureScheme::RSA_PSS_RSAE_SHA256,
                SignatureScheme::ECDSA_SECP256R1_SHA256,
                SignatureScheme::ED25519,
                SignatureScheme::RSA_PKCS1_SHA256,
            ],
            server_name: None,
            alpn_protocols: Vec::new(),
            key_log_callback: None,
        }
    }
}

impl fmt::Debug for TlsConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfigBuilder")
            .field("cipher_suites", &self.cipher_suites)
            .field("supported_groups", &self.supported_groups)
            .finish_non_exhaustive()
    }
}

impl TlsConfigBuilder {
    pub fn cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.cipher_suites = suites;
        self
    }

    pub fn supported_groups(mut self, groups: Vec<NamedGroup>) -> Self {
        self.supported_groups = groups;
        self
    }

    pub fn signature_algorithms(mut self, schemes: Vec<SignatureScheme>) -> Self {
        self.signature_algorithms = schemes;
        self
    }

    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub fn alpn_protocols(mut self, protocols: Vec<Vec<u8>>) -> Self {
        self.alpn_protocols = protocols;
        self
    }

    pub fn key_log(mut self, callback: KeyLogCallback) -> Self {
        self.key_log_callback = Some(callback);
        self
    }

    pub fn build(self) -> TlsConfig {
        TlsConfig {
            cipher_suites: self.cipher_suites,
            supported_groups: self.supported_groups,
            signature_algorithms: self.signature_algorithms,
            server_name: self.server_name,
            alpn_protocols: self.alpn_protocols,
            key_log_callback: self.key_log_callback,
        }
    }
}
