#![forbid(unsafe_code)]
#![doc = "Shared types for the keel TLS stack."]

mod error;

pub use error::CryptoError;
