//! Error taxonomy for the TLS engine.
//!
//! Alerts double as error values: a protocol or cryptographic failure is
//! represented as the fatal alert the connection must send before closing.
//! Local misuse (absent extension, key schedule driven out of order) gets
//! distinct variants that are never written to the wire.

use crate::alert::{Alert, AlertDescription};
use crate::extensions::ExtensionType;
use keel_types::CryptoError;

/// TLS engine errors.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// A violation detected locally; the connection sends this alert and closes.
    #[error("fatal alert: {0:?}")]
    Fatal(AlertDescription),

    /// The peer sent an alert.
    #[error("alert received: {0:?}")]
    PeerAlert(Alert),

    /// The transport reached EOF or the peer closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Transport I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // --- Local misuse, never sent on the wire ---
    /// Requested extension is not present in the container.
    #[error("extension {0:?} not present")]
    MissingExtension(ExtensionType),

    /// Extension is present but holds a different variant than requested.
    #[error("extension {0:?} holds a different variant")]
    ExtensionTypeMismatch(ExtensionType),

    /// A state machine or key schedule operation was invoked out of order.
    #[error("{0}: wrong stage")]
    WrongStage(&'static str),

    /// Internal invariant failure.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// Failure inside a cryptographic primitive.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl TlsError {
    /// Shorthand for a fatal-alert error.
    pub fn fatal(description: AlertDescription) -> Self {
        TlsError::Fatal(description)
    }

    /// The alert the connection should send for this error, if any.
    ///
    /// Only protocol and cryptographic violations carry an alert. Local
    /// misuse, internal faults, and transport failures put nothing on the
    /// wire; the connection just closes.
    pub fn alert_to_send(&self) -> Option<Alert> {
        match self {
            TlsError::Fatal(desc) => Some(Alert::fatal(*desc)),
            TlsError::MissingExtension(_)
            | TlsError::ExtensionTypeMismatch(_)
            | TlsError::WrongStage(_)
            | TlsError::Internal(_)
            | TlsError::Crypto(_)
            | TlsError::PeerAlert(_)
            | TlsError::ConnectionClosed
            | TlsError::Io(_) => None,
        }
    }
}
