use std::fmt;
use std::io::{self, Read, Write};

use serde::{Serialize, Serializer};

/// Width of every on-disk resource name.
pub const RESREF_LEN: usize = 8;

/// Fixed 8-byte resource identifier, stored uppercased and NUL padded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ResRef([u8; RESREF_LEN]);

impl ResRef {
    pub const EMPTY: ResRef = ResRef([0; RESREF_LEN]);

    /// Builds a name from text, truncating to eight bytes.
    pub fn new(name: &str) -> Self {
        Self::from_raw(name.trim().as_bytes())
    }

    /// Normalises raw on-disk bytes: stops at the first NUL, drops trailing
    /// spaces and uppercases ASCII.
    pub fn from_raw(raw: &[u8]) -> Self {
        let mut bytes = [0u8; RESREF_LEN];
        let mut len = 0;
        for &b in raw.iter().take(RESREF_LEN) {
            if b == 0 {
                break;
            }
            bytes[len] = b.to_ascii_uppercase();
            len += 1;
        }
        while len > 0 && bytes[len - 1] == b' ' {
            len -= 1;
            bytes[len] = 0;
        }
        ResRef(bytes)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut raw = [0u8; RESREF_LEN];
        reader.read_exact(&mut raw)?;
        Ok(Self::from_raw(&raw))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.iter().position(|&b| b == 0).unwrap_or(RESREF_LEN)
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// Tables use a lone `*` for "no value".
    pub fn is_star(&self) -> bool {
        self.len() == 1 && self.0[0] == b'*'
    }

    /// Empty and `*` both mean "no resource".
    pub fn is_set(&self) -> bool {
        !self.is_empty() && !self.is_star()
    }

    pub fn as_bytes(&self) -> &[u8; RESREF_LEN] {
        &self.0
    }

    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.0[..self.len()]).into_owned()
    }

    pub fn matches(&self, name: &str) -> bool {
        *self == ResRef::new(name)
    }
}

impl fmt::Display for ResRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.as_str())
    }
}

impl fmt::Debug for ResRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResRef({:?})", self.as_str())
    }
}

impl From<&str> for ResRef {
    fn from(value: &str) -> Self {
        ResRef::new(value)
    }
}

impl Serialize for ResRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_padding_and_case() {
        let name = ResRef::from_raw(b"fireb\0xy");
        assert_eq!(name.as_str(), "FIREB");
        assert_eq!(name.len(), 5);

        let spaced = ResRef::from_raw(b"arrow   ");
        assert_eq!(spaced, ResRef::new("ARROW"));
        assert!(spaced.matches("arrow"));
    }

    #[test]
    fn truncates_long_names() {
        let name = ResRef::new("spwi304extra");
        assert_eq!(name.as_str(), "SPWI304E");
        assert_eq!(name.as_bytes(), b"SPWI304E");
    }

    #[test]
    fn star_and_empty_are_unset() {
        assert!(!ResRef::new("*").is_set());
        assert!(ResRef::new("*").is_star());
        assert!(!ResRef::EMPTY.is_set());
        assert!(ResRef::new("X").is_set());
    }

    #[test]
    fn reads_and_writes_raw_bytes() {
        let mut cursor = io::Cursor::new(b"dlg01\0\0\0".to_vec());
        let name = ResRef::read_from(&mut cursor).unwrap();
        assert_eq!(name.as_str(), "DLG01");

        let mut out = Vec::new();
        name.write_to(&mut out).unwrap();
        assert_eq!(out, b"DLG01\0\0\0");
    }
}
