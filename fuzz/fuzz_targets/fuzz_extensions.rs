#![no_main]
use keel_tls::extensions::{ExtensionBlock, MessageContext};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for ctx in [
        MessageContext::ClientHello,
        MessageContext::ServerHello,
        MessageContext::HelloRetryRequest,
        MessageContext::EncryptedExtensions,
    ] {
        if let Ok(block) = ExtensionBlock::parse(data, ctx) {
            // Serialization must be a fixpoint: parse(encode(x)) == x.
            // (Duplicate types in the input collapse by container contract,
            // so the raw input itself need not round-trip.)
            let once = block.encode();
            let reparsed = ExtensionBlock::parse(&once, ctx).expect("re-parse failed");
            assert_eq!(reparsed.encode(), once);
        }
    }
});
