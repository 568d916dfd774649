#![no_main]
use libfuzzer_sys::fuzz_target;
use bitcursor::{BitReader, StreamReader};
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    let (mut writer, mut reader) = bitcursor::buffered();
    let mut bits = StreamReader::new(data);

    // feed the buffered reader in ragged chunks and compare against a plain
    // stream over the same bytes
    for chunk in data.chunks(3) {
        writer.write_all(chunk).unwrap();
    }
    drop(writer);

    for i in 0.. {
        let width = (i % 13) + 1;
        let expected = bits.read_u16(width);
        let actual = reader.read_u16(width);
        match (expected, actual) {
            (Ok(x), Ok(y)) => assert_eq!(x, y),
            (Err(_), Err(_)) => break,
            (x, y) => panic!("diverged: {:?} vs {:?}", x, y),
        }
    }
});
