#![no_main]
use libfuzzer_sys::fuzz_target;
use ulf_log::StreamParser;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes, invalid UTF-8 included, must produce records or an
    // error but never a panic.
    let mut parser = StreamParser::new(data);
    for record in parser.records() {
        if record.is_err() {
            break;
        }
    }
    let _ = ulf_log::parse_from_bytes(data);
});
