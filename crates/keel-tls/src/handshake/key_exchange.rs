//! Ephemeral key exchange seam (X25519, FFDHE).
//!
//! The state machine depends only on this trait; one concrete
//! implementation exists per supported named group.

use crate::alert::AlertDescription;
use crate::crypt::NamedGroup;
use crate::TlsError;
use keel_crypto::dh::{DhKeyPair, DhParams, FfdheGroup};
use keel_crypto::x25519::{X25519PrivateKey, X25519PublicKey};

/// An ephemeral key-exchange instance for one named group.
pub trait KeyExchange: Send {
    /// The named group this instance belongs to.
    fn group(&self) -> NamedGroup;

    /// The public value for the key_share extension.
    fn public_key_bytes(&self) -> &[u8];

    /// Compute the shared secret from the peer's public value.
    fn compute_shared_secret(&self, peer_public: &[u8]) -> Result<Vec<u8>, TlsError>;
}

/// Generate a fresh key-exchange instance for the given group.
pub fn create_key_exchange(group: NamedGroup) -> Result<Box<dyn KeyExchange>, TlsError> {
    match group {
        NamedGroup::X25519 => Ok(Box::new(X25519Exchange::generate()?)),
        NamedGroup::FFDHE2048 => Ok(Box::new(FfdheExchange::generate(
            group,
            FfdheGroup::Ffdhe2048,
        )?)),
        NamedGroup::FFDHE3072 => Ok(Box::new(FfdheExchange::generate(
            group,
            FfdheGroup::Ffdhe3072,
        )?)),
        _ => Err(TlsError::fatal(AlertDescription::HandshakeFailure)),
    }
}

struct X25519Exchange {
    private_key: X25519PrivateKey,
    public_key_bytes: Vec<u8>,
}

impl X25519Exchange {
    fn generate() -> Result<Self, TlsError> {
        let private_key = X25519PrivateKey::generate().map_err(TlsError::Crypto)?;
        let public_key_bytes = private_key.public_key().as_bytes().to_vec();
        Ok(Self {
            private_key,
            public_key_bytes,
        })
    }
}

impl KeyExchange for X25519Exchange {
    fn group(&self) -> NamedGroup {
        NamedGroup::X25519
    }

    fn public_key_bytes(&self) -> &[u8] {
        &self.public_key_bytes
    }

    fn compute_shared_secret(&self, peer_public: &[u8]) -> Result<Vec<u8>, TlsError> {
        let peer = X25519PublicKey::new(peer_public)
            .map_err(|_| TlsError::fatal(AlertDescription::IllegalParameter))?;
        self.private_key
            .diffie_hellman(&peer)
            .map_err(|_| TlsError::fatal(AlertDescription::IllegalParameter))
    }
}

struct FfdheExchange {
    group: NamedGroup,
    params: DhParams,
    keypair: DhKeyPair,
    public_key_bytes: Vec<u8>,
}

impl FfdheExchange {
    fn generate(group: NamedGroup, ffdhe: FfdheGroup) -> Result<Self, TlsError> {
        let params = DhParams::from_group(ffdhe).map_err(TlsError::Crypto)?;
        let keypair = DhKeyPair::generate(&params).map_err(TlsError::Crypto)?;
        let public_key_bytes = keypair.public_key_bytes(&params).map_err(TlsError::Crypto)?;
        Ok(Self {
            group,
            params,
            keypair,
            public_key_bytes,
        })
    }
}

impl KeyExchange for FfdheExchange {
    fn group(&self) -> NamedGroup {
        self.group
    }

    fn public_key_bytes(&self) -> &[u8] {
        &self.public_key_bytes
    }

    fn compute_shared_secret(&self, peer_public: &[u8]) -> Result<Vec<u8>, TlsError> {
        // FFDHE shares must be exactly the prime size (RFC 8446 §4.2.8.1)
        if peer_public.len() != self.params.prime_size() {
            return Err(TlsError::fatal(AlertDescription::IllegalParameter));
        }
        self.keypair
            .compute_shared_secret(&self.params, peer_public)
            .map_err(|_| TlsError::fatal(AlertDescription::IllegalParameter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x25519_exchange() {
        let a = create_key_exchange(NamedGroup::X25519).unwrap();
        let b = create_key_exchange(NamedGroup::X25519).unwrap();
        assert_eq!(a.group(), NamedGroup::X25519);
        assert_eq!(a.public_key_bytes().len(), 32);

        let s1 = a.compute_shared_secret(b.public_key_bytes()).unwrap();
        let s2 = b.compute_shared_secret(a.public_key_bytes()).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s1.len(), 32);
    }

    #[test]
    fn test_ffdhe2048_exchange() {
        let a = create_key_exchange(NamedGroup::FFDHE2048).unwrap();
        let b = create_key_exchange(NamedGroup::FFDHE2048).unwrap();
        assert_eq!(a.public_key_bytes().len(), 256);

        let s1 = a.compute_shared_secret(b.public_key_bytes()).unwrap();
        let s2 = b.compute_shared_secret(a.public_key_bytes()).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s1.len(), 256);
    }

    #[test]
    fn test_ffdhe_wrong_length_share_rejected() {
        let a = create_key_exchange(NamedGroup::FFDHE2048).unwrap();
        assert!(a.compute_shared_secret(&[0x02; 255]).is_err());
    }

    #[test]
    fn test_x25519_bad_peer_key_rejected() {
        let a = create_key_exchange(NamedGroup::X25519).unwrap();
        assert!(a.compute_shared_secret(&[0u8; 31]).is_err());
        // All-zero peer key yields a degenerate secret
        assert!(a.compute_shared_secret(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_unsupported_group_rejected() {
        assert!(create_key_exchange(NamedGroup(0x9999)).is_err());
    }
}
