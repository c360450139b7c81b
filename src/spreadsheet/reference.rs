//! Conversions between 0-based indexes and Excel-style references.

/// Converts a 0-based column index to its letters, e.g. 0 -> "A", 27 -> "AB".
pub fn column_name(column: usize) -> String {
    let mut column = column + 1;
    let mut name = String::new();
    while column > 0 {
        column -= 1;
        name.insert(0, char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    name
}

/// Converts 0-based row & column indexes to an Excel-style cell position.
pub fn cell_position(row: usize, column: usize) -> String {
    format!("{}{}", column_name(column), row + 1)
}

/// Converts column letters to a 0-based index, `None` for an empty, invalid
/// or out of range name.
pub fn col_to_index(name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    name.bytes()
        .try_fold(0usize, |index, letter| {
            if !letter.is_ascii_uppercase() {
                return None;
            }
            index
                .checked_mul(26)?
                .checked_add(usize::from(letter - b'A') + 1)
        })
        .map(|index| index - 1)
}

/// Converts a 1-based row number to a 0-based index, `None` for "", "0",
/// garbage or numbers that do not fit.
pub fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .map(|row| row - 1)
}
