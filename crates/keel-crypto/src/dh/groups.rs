//! RFC 7919 FFDHE group parameters.

use keel_bignum::BigNum;

/// A named finite-field DH group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfdheGroup {
    Ffdhe2048,
    Ffdhe3072,
}

/// Return (p, g) for the group. The generator is 2 for all RFC 7919 groups.
pub(crate) fn group_params(group: FfdheGroup) -> (BigNum, BigNum) {
    let p = match group {
        FfdheGroup::Ffdhe2048 => bn(FFDHE2048_P),
        FfdheGroup::Ffdhe3072 => bn(FFDHE3072_P),
    };
    (p, BigNum::from_u64(2))
}

fn bn(hex: &str) -> BigNum {
    let bytes: Vec<u8> = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect();
    BigNum::from_bytes_be(&bytes)
}

// RFC 7919 §A.1 ffdhe2048 prime.
const FFDHE2048_P: &str = "\
FFFFFFFFFFFFFFFFADF85458A2BB4A9AAFDC5620273D3CF1\
D8B9C583CE2D3695A9E13641146433FBCC939DCE249B3EF9\
7D2FE363630C75D8F681B202AEC4617AD3DF1ED5D5FD6561\
2433F51F5F066ED0856365553DED1AF3B557135E7F57C935\
984F0C70E0E68B77E2A689DAF3EFE8721DF158A136ADE735\
30ACCA4F483A797ABC0AB182B324FB61D108A94BB2C8E3FB\
B96ADAB760D7F4681D4F42A3DE394DF4AE56EDE76372BB19\
0B07A7C8EE0A6D709E02FCE1CDF7E2ECC03404CD28342F61\
9172FE9CE98583FF8E4F1232EEF28183C3FE3B1B4C6FAD73\
3BB5FCBC2EC22005C58EF1837D1683B2C6F34A26C1B2EFFA\
886B423861285C97FFFFFFFFFFFFFFFF";

// RFC 7919 §A.2 ffdhe3072 prime.
const FFDHE3072_P: &str = "\
FFFFFFFFFFFFFFFFADF85458A2BB4A9AAFDC5620273D3CF1\
D8B9C583CE2D3695A9E13641146433FBCC939DCE249B3EF9\
7D2FE363630C75D8F681B202AEC4617AD3DF1ED5D5FD6561\
2433F51F5F066ED0856365553DED1AF3B557135E7F57C935\
984F0C70E0E68B77E2A689DAF3EFE8721DF158A136ADE735\
30ACCA4F483A797ABC0AB182B324FB61D108A94BB2C8E3FB\
B96ADAB760D7F4681D4F42A3DE394DF4AE56EDE76372BB19\
0B07A7C8EE0A6D709E02FCE1CDF7E2ECC03404CD28342F61\
9172FE9CE98583FF8E4F1232EEF28183C3FE3B1B4C6FAD73\
3BB5FCBC2EC22005C58EF1837D1683B2C6F34A26C1B2EFFA\
886B4238611FCFDCDE355B3B6519035BBC34F4DEF99C0238\
61B46FC9D6E6C9077AD91D2691F7F7EE598CB0FAC186D91C\
AEFE130985139270B4130C93BC437944F4FD4452E2D74DD3\
64F2E21E71F54BFF5CAE82AB9C9DF69EE86D2BC522363A0D\
ABC521979B0DEADA1DBF9A42D5C4484E0ABCD06BFA53DDEF\
3C1B20EE3FD59D7C25E41D2B66C62E37FFFFFFFFFFFFFFFF";
