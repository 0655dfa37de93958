#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The decoder stops at the first NUL.
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let expected = std::str::from_utf8(&data[..end]);

    let mut offset = 0;
    let mut decoded = String::new();
    loop {
        match cini::decode(data, offset) {
            Ok(rune) if rune.is_end() => break,
            Ok(rune) => {
                decoded.push(rune.ch);
                offset += rune.width as usize;
            }
            Err(_) => {
                assert!(expected.is_err(), "rejected valid utf-8 at {offset}");
                return;
            }
        }
    }
    assert_eq!(Ok(decoded.as_str()), expected);
});
