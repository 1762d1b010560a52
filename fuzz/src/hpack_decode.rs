#![no_main]

#[macro_use]
extern crate libfuzzer_sys;

use hpack::NameValue;

// Fuzzer for the hpack codec. Checks that decode(encode(hdrs)) == hdrs. To
// get the initial hdrs, the fuzzer decodes the input as a field block, and
// skips inputs where decoding fails.
//
// The fuzzer could have been written to instead check encode(decode(input))
// == input. However, that transformation is not guaranteed to be the
// identity function, as there are multiple ways the same hdr list could be
// encoded.
fuzz_target!(|data: &[u8]| {
    let mut decoder = hpack::Codec::new();

    let mut buf = data.to_vec();
    let mut hdrs = Vec::new();

    while !buf.is_empty() {
        match decoder.decode_from(&mut buf) {
            Ok(h) => hdrs.push(h),

            Err(_) => return,
        }
    }

    // Decoded literals may carry names the encoder requires callers to
    // normalize first.
    if hdrs
        .iter()
        .any(|h| h.name().is_empty() || h.name().iter().any(u8::is_ascii_uppercase))
    {
        return;
    }

    let mut encoder = hpack::Codec::new();
    let mut peer = hpack::Codec::new();

    let mut encoded = vec![0; data.len() * 10 + 1000];

    for h in &hdrs {
        let len = encoder
            .encode(h, hpack::EncodeOptions::default(), &mut encoded)
            .unwrap();

        let (decoded, consumed) = peer.decode(&encoded[..len]).unwrap();

        assert_eq!(consumed, len);
        assert_eq!(&decoded, h);
    }
});
