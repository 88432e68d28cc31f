use crate::error::{ClassFileError, ClassFileResult};

/// Big-endian cursor over a byte slice.
///
/// Every read is bounds-checked; running off the end yields
/// [`ClassFileError::UnexpectedEof`] carrying the absolute offset.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// A reader whose reported offsets start at `base` (used for nested
    /// attribute payloads so errors point into the whole class file).
    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute offset of the cursor, including the base.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn bytes(&mut self, len: usize) -> ClassFileResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(ClassFileError::UnexpectedEof {
                offset: self.base + self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> ClassFileResult<()> {
        self.bytes(len).map(|_| ())
    }

    pub fn u8(&mut self) -> ClassFileResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn i8(&mut self) -> ClassFileResult<i8> {
        Ok(self.u8()? as i8)
    }

    pub fn u16(&mut self) -> ClassFileResult<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> ClassFileResult<i16> {
        Ok(self.u16()? as i16)
    }

    pub fn u32(&mut self) -> ClassFileResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> ClassFileResult<i32> {
        Ok(self.u32()? as i32)
    }

    pub fn u64(&mut self) -> ClassFileResult<u64> {
        let hi = self.u32()? as u64;
        let lo = self.u32()? as u64;
        Ok((hi << 32) | lo)
    }
}

/// Decode the JVM's "modified UTF-8" into UTF-16 code units.
///
/// Supplementary characters arrive as surrogate pairs encoded separately,
/// so the units are exactly what the JVM sees, unpaired surrogates
/// included. Returns `None` only for structurally invalid byte sequences.
pub fn decode_modified_utf8_units(bytes: &[u8]) -> Option<Vec<u16>> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let n = *bytes.get(i + 1)?;
            if n & 0xC0 != 0x80 {
                return None;
            }
            units.push((((b & 0x1F) as u16) << 6) | (n & 0x3F) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let n1 = *bytes.get(i + 1)?;
            let n2 = *bytes.get(i + 2)?;
            if n1 & 0xC0 != 0x80 || n2 & 0xC0 != 0x80 {
                return None;
            }
            units.push(
                (((b & 0x0F) as u16) << 12) | (((n1 & 0x3F) as u16) << 6) | (n2 & 0x3F) as u16,
            );
            i += 3;
        } else {
            return None;
        }
    }
    Some(units)
}

/// Whether `units` contain a surrogate without its partner.
pub fn has_unpaired_surrogate(units: &[u16]) -> bool {
    char::decode_utf16(units.iter().copied()).any(|c| c.is_err())
}

/// Recombine UTF-16 units into a Rust string. Unpaired surrogates, which
/// obfuscators emit in valid class files, become the literal escape
/// `\uXXXX` so that distinct units stay distinct.
pub fn utf16_to_string(units: &[u16]) -> String {
    let mut out = String::with_capacity(units.len());
    for c in char::decode_utf16(units.iter().copied()) {
        match c {
            Ok(c) => out.push(c),
            Err(e) => out.push_str(&format!("\\u{:04x}", e.unpaired_surrogate())),
        }
    }
    out
}

/// Decode the JVM's "modified UTF-8" into a Rust string.
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    decode_modified_utf8_units(bytes).map(|units| utf16_to_string(&units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_values() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0xFF];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.u32().unwrap(), 0xCAFEBABE);
        assert_eq!(r.u16().unwrap(), 52);
        assert_eq!(r.i8().unwrap(), -1);
        assert!(r.is_empty());
    }

    #[test]
    fn eof_reports_absolute_offset() {
        let data = [0u8; 3];
        let mut r = ByteReader::with_base(&data, 100);
        r.u16().unwrap();
        let err = r.u32().unwrap_err();
        assert_eq!(
            err,
            ClassFileError::UnexpectedEof {
                offset: 102,
                needed: 3
            }
        );
    }

    #[test]
    fn decodes_ascii_and_two_byte_null() {
        assert_eq!(decode_modified_utf8(b"metaClass").unwrap(), "metaClass");
        assert_eq!(decode_modified_utf8(&[0x61, 0xC0, 0x80, 0x62]).unwrap(), "a\0b");
    }

    #[test]
    fn decodes_three_byte_and_surrogate_pair() {
        // U+00E9 as two bytes, U+20AC as three bytes.
        assert_eq!(decode_modified_utf8(&[0xC3, 0xA9]).unwrap(), "\u{e9}");
        assert_eq!(decode_modified_utf8(&[0xE2, 0x82, 0xAC]).unwrap(), "\u{20ac}");
        // U+1F600 as a CESU-style surrogate pair.
        let pair = [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        assert_eq!(decode_modified_utf8(&pair).unwrap(), "\u{1f600}");
    }

    #[test]
    fn unpaired_surrogates_stay_distinct() {
        let high = decode_modified_utf8(&[0xED, 0xA0, 0x80]).unwrap();
        let other = decode_modified_utf8(&[0xED, 0xA0, 0x81]).unwrap();
        assert_eq!(high, "\\ud800");
        assert_eq!(other, "\\ud801");
        assert_ne!(high, other);

        let units = decode_modified_utf8_units(&[0x61, 0xED, 0xB0, 0x80]).unwrap();
        assert_eq!(units, vec![0x61, 0xDC00]);
        assert!(has_unpaired_surrogate(&units));
        assert!(!has_unpaired_surrogate(&[0xD83D, 0xDE00]));
    }

    #[test]
    fn rejects_truncated_sequence() {
        assert!(decode_modified_utf8(&[0xE2, 0x82]).is_none());
        assert!(decode_modified_utf8(&[0xF0, 0x9F, 0x98, 0x80]).is_none());
    }
}
