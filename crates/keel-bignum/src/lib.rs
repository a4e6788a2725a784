#![forbid(unsafe_code)]
#![doc = "Unsigned arbitrary-precision integers for the keel TLS stack."]

mod bignum;
mod montgomery;
mod ops;
mod rand;

pub use bignum::BigNum;
pub use montgomery::MontgomeryCtx;
