use crate::error::{Result, SheetError};

/// Convert column letters to a 0-based column index
/// A=0, B=1, ... Z=25, AA=26, AB=27, ... (case-insensitive, surrounding spaces ignored)
pub fn column_letters_to_index(letters: &str) -> Result<usize> {
    let letters = letters.trim();
    if letters.is_empty() {
        return Err(SheetError::InvalidColumn(letters.to_string()));
    }

    let mut col = 0usize;
    for b in letters.bytes() {
        let b = b.to_ascii_uppercase();
        if !b.is_ascii_uppercase() {
            return Err(SheetError::InvalidColumn(letters.to_string()));
        }
        col = col * 26 + (b - b'A') as usize + 1;
    }

    Ok(col - 1)
}
