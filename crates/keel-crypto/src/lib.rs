#![forbid(unsafe_code)]
#![doc = "Cryptographic primitives for the keel TLS stack."]

// Core traits
pub mod provider;

// Hash algorithms
pub mod sha2;

// Symmetric ciphers and modes
pub mod aes;
pub mod gcm;

// MAC and KDF
pub mod hkdf;
pub mod hmac;

// Key exchange
pub mod dh;
pub mod x25519;
