use bitcursor::{BitReader, Error, StreamReader};
use std::io::Read;

// Decodes a stream of records: a 1 bit flag, a 27 bit length, and when the
// flag is set a trailing 10 byte payload. Records end cleanly at a byte
// boundary.
fn read_data<R: Read>(reader: &mut StreamReader<R>) -> bitcursor::Result<Option<u64>> {
    match reader.peek_bit() {
        Err(Error::EndOfData) => return Ok(None),
        res => res?,
    };

    let flag = reader.read_bit()?;
    let mut result = u64::from(reader.read_u32(27)?);
    reader.align()?;

    if flag {
        let mut buf = [0u8; 10];
        reader.read_exact(&mut buf)?;
        result += u64::from(buf[0]);
    }

    Ok(Some(result))
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let stdin = std::io::stdin();
    let mut reader = StreamReader::new(stdin.lock());
    while let Some(record) = read_data(&mut reader)? {
        println!("{}", record);
    }

    Ok(())
}
