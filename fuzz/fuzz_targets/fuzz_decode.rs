#![no_main]

use libfuzzer_sys::fuzz_target;
use quickjson::DecodeOptions;

fuzz_target!(|data: &[u8]| {
    let _ = quickjson::decode(data, &DecodeOptions::default());
});
