use log::debug;

use crate::error::{FormatError, Result};

/// One `value name` line of an IDS symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub value: u32,
    pub name: String,
}

/// Parsed IDS file: an ordered list of integer/name pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
}

impl SymbolTable {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        SymbolTable {
            entries: entries
                .into_iter()
                .map(|(value, name)| SymbolEntry {
                    value,
                    name: name.into(),
                })
                .collect(),
        }
    }

    pub fn parse_bytes(input: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(input);
        Self::parse_str(&text)
    }

    pub fn parse_str(text: &str) -> Result<Self> {
        let normalized = text.replace("\r\n", "\n");
        let mut entries = Vec::new();
        let mut seen_content = false;

        for (line_no, raw_line) in normalized.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if !seen_content {
                seen_content = true;
                if line.get(..3).is_some_and(|tag| tag.eq_ignore_ascii_case("ids")) {
                    continue;
                }
            }

            let mut parts = line.split_whitespace();
            let Some(value_token) = parts.next() else {
                continue;
            };
            let name = parts.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                // Bare number: the optional entry-count line.
                if entries.is_empty() && parse_value(value_token).is_some() {
                    continue;
                }
                return Err(FormatError::MalformedTable {
                    kind: "IDS",
                    reason: format!("line {} has no symbol name: {line}", line_no + 1),
                });
            }

            match parse_value(value_token) {
                Some(value) => entries.push(SymbolEntry { value, name }),
                None => debug!("skipping IDS line {} with bad value {value_token:?}", line_no + 1),
            }
        }

        Ok(SymbolTable { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<(u32, &str)> {
        self.entries
            .get(index)
            .map(|entry| (entry.value, entry.name.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.iter()
    }

    pub fn value_of(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.value)
    }
}

fn parse_value(token: &str) -> Option<u32> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16).ok();
    }
    token
        .parse::<i64>()
        .ok()
        .map(|value| value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_count_and_hex_values() {
        let source = "IDS V1.0\r\n3\r\n0 NONE\r\n0x2 ARROW\r\n  5   FIREBALL  \r\n";
        let table = SymbolTable::parse_str(source).expect("parsed ids");
        assert_eq!(table.len(), 3);
        assert_eq!(table.entry(0), Some((0, "NONE")));
        assert_eq!(table.entry(1), Some((2, "ARROW")));
        assert_eq!(table.entry(2), Some((5, "FIREBALL")));
        assert_eq!(table.value_of("fireball"), Some(5));
    }

    #[test]
    fn accepts_tables_without_signature() {
        let table = SymbolTable::parse_str("1 MAGICMIS\n2 SKULLTRP\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.entry(1), Some((2, "SKULLTRP")));
    }

    #[test]
    fn rejects_nameless_entries_after_data() {
        let err = SymbolTable::parse_str("1 ARROW\n7\n").unwrap_err();
        assert!(matches!(err, FormatError::MalformedTable { kind: "IDS", .. }));
    }
}
