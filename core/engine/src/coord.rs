//! FILENAME: core/engine/src/coord.rs
//! PURPOSE: Address codec. Converts between A1-style notation ("A1", "AA100",
//! "A1:C10") and numeric coordinates.
//! CONTEXT: Public addresses are 1-based (`CellAddress`: row 1 = "1", column
//! 1 = "A"). The calculation engine works in 0-based `CellCoord`s; the only
//! translation between the two is `CellAddress::to_engine` / `from_engine`.
//! Column letters are a bijective base-26 numbering: A=1 .. Z=26, AA=27.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

/// A zero-based (row, col) engine coordinate.
pub type CellCoord = (u32, u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid cell address '{0}': expected column letters followed by a row number >= 1")]
    InvalidAddress(String),

    #[error("Invalid range '{0}': expected two cell addresses separated by ':'")]
    InvalidRange(String),
}

// ============================================================================
// CELL ADDRESS
// ============================================================================

/// A 1-based cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub fn new(row: u32, col: u32) -> Self {
        CellAddress { row, col }
    }

    /// Engine coordinate for this address: (row - 1, col - 1).
    pub fn to_engine(self) -> CellCoord {
        (self.row.saturating_sub(1), self.col.saturating_sub(1))
    }

    pub fn from_engine(coord: CellCoord) -> Self {
        CellAddress {
            row: coord.0 + 1,
            col: coord.1 + 1,
        }
    }

    /// Returns the address shifted by the given number of rows and columns.
    pub fn offset(self, rows: u32, cols: u32) -> Option<Self> {
        Some(CellAddress {
            row: self.row.checked_add(rows)?,
            col: self.col.checked_add(cols)?,
        })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_column(self.col), self.row)
    }
}

// ============================================================================
// CELL RANGE
// ============================================================================

/// An inclusive rectangular range. `start` is always the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Builds a range from any two corners, swapping per axis as needed.
    pub fn from_corners(a: CellAddress, b: CellAddress) -> Self {
        CellRange {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn rows(&self) -> RangeInclusive<u32> {
        self.start.row..=self.end.row
    }

    pub fn cols(&self) -> RangeInclusive<u32> {
        self.start.col..=self.end.col
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

// ============================================================================
// CODEC FUNCTIONS
// ============================================================================

/// Decodes column letters (case-insensitive) to a 1-based index.
/// "A" -> 1, "Z" -> 26, "AA" -> 27. Returns None for an empty string,
/// a non-letter character, or an index that overflows u32.
pub fn col_to_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// Encodes a 1-based column index as letters. 1 -> "A", 26 -> "Z", 27 -> "AA".
/// Index 0 has no letter form and yields an empty string.
pub fn format_column(index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Formats a 1-based (row, col) pair as "B2".
pub fn format_address(row: u32, col: u32) -> String {
    CellAddress::new(row, col).to_string()
}

/// Parses "AA100" (also "$AA$100", "aa100") into a 1-based address.
pub fn parse_reference(text: &str) -> Result<CellAddress, AddressError> {
    let invalid = || AddressError::InvalidAddress(text.to_string());

    let plain: String = text.trim().chars().filter(|c| *c != '$').collect();
    let split = plain
        .find(|c: char| !c.is_ascii_alphabetic())
        .ok_or_else(invalid)?;
    let (letters, digits) = plain.split_at(split);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let col = col_to_index(letters).ok_or_else(invalid)?;
    let row: u32 = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }

    Ok(CellAddress { row, col })
}

/// Parses "A1:C10" into a normalized range. Reversed corners ("C10:A1") are
/// swapped per axis rather than rejected.
pub fn parse_range(text: &str) -> Result<CellRange, AddressError> {
    let invalid = || AddressError::InvalidRange(text.to_string());

    let mut parts = text.split(':');
    let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let start = parse_reference(first).map_err(|_| invalid())?;
    let end = parse_reference(second).map_err(|_| invalid())?;

    Ok(CellRange::from_corners(start, end))
}
