use crate::error::{FormatError, Result};

/// A parsed 2DA table: named rows of string cells with a fallback value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table2da {
    pub default_value: String,
    pub columns: Vec<String>,
    rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableRow {
    name: String,
    cells: Vec<String>,
}

impl Table2da {
    pub fn parse_bytes(input: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(input);
        Self::parse_str(&text)
    }

    pub fn parse_str(text: &str) -> Result<Self> {
        let normalized = text.replace("\r\n", "\n");
        let mut lines = normalized
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty());

        let signature = lines.next().ok_or_else(|| malformed("empty table"))?;
        if !signature
            .get(..3)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("2da"))
        {
            return Err(malformed(format!("bad signature line {signature:?}")));
        }

        let default_value = lines
            .next()
            .ok_or_else(|| malformed("missing default value line"))?
            .split_whitespace()
            .next()
            .unwrap_or("0")
            .to_string();

        let columns = lines
            .next()
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let rows = lines
            .map(|line| {
                let mut parts = line.split_whitespace().map(str::to_string);
                let name = parts.next().unwrap_or_default();
                TableRow {
                    name,
                    cells: parts.collect(),
                }
            })
            .collect();

        Ok(Table2da {
            default_value,
            columns,
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_name(&self, row: usize) -> Option<&str> {
        self.rows.get(row).map(|r| r.name.as_str())
    }

    /// Cell text, or the table default when the row or column is missing.
    pub fn query_field(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(column))
            .map(String::as_str)
            .unwrap_or(&self.default_value)
    }

    /// Cell parsed as an integer the way `atoi` would: leading digits only, 0 on failure.
    pub fn query_int(&self, row: usize, column: usize) -> i32 {
        parse_leading_int(self.query_field(row, column))
    }

    pub fn find_row(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.name.eq_ignore_ascii_case(name))
    }
}

fn parse_leading_int(cell: &str) -> i32 {
    let trimmed = cell.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().unwrap_or(0);
    let value = if negative { -value } else { value };
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn malformed(reason: impl Into<String>) -> FormatError {
    FormatError::MalformedTable {
        kind: "2DA",
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREAPRO: &str = "2DA V1.0\n*\n   SPREAD  CENTER  SECOND  SOUND  AREASND  FLAGS\n\
        FIRE  SPFIREPI  *  *  SPFIRE  SPFIRE2  3\n\
        NONE\n\
        COLD  *  ICECENT  ICESEC  *  *  12x\n";

    #[test]
    fn parses_rows_and_defaults() {
        let table = Table2da::parse_str(AREAPRO).expect("parsed 2da");
        assert_eq!(table.default_value, "*");
        assert_eq!(table.columns.len(), 6);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.row_name(0), Some("FIRE"));
        assert_eq!(table.query_field(0, 0), "SPFIREPI");
        assert_eq!(table.query_field(1, 3), "*");
        assert_eq!(table.query_field(9, 9), "*");
        assert_eq!(table.find_row("cold"), Some(2));
    }

    #[test]
    fn integer_cells_follow_atoi() {
        let table = Table2da::parse_str(AREAPRO).unwrap();
        assert_eq!(table.query_int(0, 5), 3);
        assert_eq!(table.query_int(2, 5), 12);
        assert_eq!(table.query_int(1, 5), 0);
    }

    #[test]
    fn rejects_missing_signature() {
        assert!(Table2da::parse_str("hello\n0\n").is_err());
    }
}
