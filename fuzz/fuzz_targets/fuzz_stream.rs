#![no_main]
use libfuzzer_sys::fuzz_target;
use bitcursor::{BitReader, Error, StreamReader};

fuzz_target!(|data: &[u8]| {
    let mut bits = StreamReader::new(data);
    let mut consumed = 0usize;

    loop {
        match bits.read_u32(17) {
            Ok(_) => consumed += 17,
            Err(Error::UnexpectedEndOfData) => {
                assert!(consumed + 17 > data.len() * 8);
                break;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
});
