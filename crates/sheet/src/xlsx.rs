use crate::book::Book;
use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, Worksheet};
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn workbook_err(e: impl Display) -> SheetError {
    SheetError::Workbook(e.to_string())
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Dates surface as ISO text so downstream date parsing sees one format
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => {
                CellValue::String(ndt.date().format("%Y-%m-%d").to_string())
            }
            Some(ndt) => CellValue::String(ndt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

/// Lay a calamine range onto a grid anchored at A1.
///
/// calamine trims leading empty rows and columns from a range; spreadsheet
/// row numbers must survive the round trip, so the offset is restored here.
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let (start_row, start_col) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));

    let mut data: Vec<Vec<CellValue>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![CellValue::Null; start_col];
        cells.extend(row.iter().map(data_to_cell_value));
        data.push(cells);
    }
    data
}

fn read_book(mut workbook: Xlsx<BufReader<File>>) -> Result<Book> {
    let sheet_names = workbook.sheet_names();
    let mut book = Book::new();

    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name).map_err(workbook_err)?;
        let mut sheet = Sheet::with_name(&sheet_name);
        *sheet.data_mut() = range_to_rows(&range);
        book.add_sheet(&sheet_name, sheet)?;
    }

    Ok(book)
}

impl Sheet {
    /// Write sheet data to a worksheet
    fn write_to_worksheet(&self, worksheet: &mut Worksheet) -> Result<()> {
        worksheet.set_name(self.name()).map_err(workbook_err)?;

        for (row_idx, row) in self.data().iter().enumerate() {
            let row_num = u32::try_from(row_idx).map_err(|_| workbook_err("Row index overflow"))?;
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num =
                    u16::try_from(col_idx).map_err(|_| workbook_err("Column index overflow"))?;

                match cell {
                    CellValue::Null => {}
                    CellValue::Bool(b) => {
                        worksheet
                            .write_boolean(row_num, col_num, *b)
                            .map_err(workbook_err)?;
                    }
                    CellValue::Int(i) => {
                        // Excel stores numbers as f64; integers past 2^53 lose precision
                        worksheet
                            .write_number(row_num, col_num, *i as f64)
                            .map_err(workbook_err)?;
                    }
                    CellValue::Float(f) => {
                        worksheet
                            .write_number(row_num, col_num, *f)
                            .map_err(workbook_err)?;
                    }
                    CellValue::String(s) => {
                        worksheet
                            .write_string(row_num, col_num, s)
                            .map_err(workbook_err)?;
                    }
                }
            }
        }

        Ok(())
    }
}

impl Book {
    /// Load a book from an Excel file (all sheets, .xlsx or .xlsm)
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened or read.
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        let workbook: Xlsx<BufReader<File>> =
            open_workbook(path.as_ref()).map_err(workbook_err)?;
        read_book(workbook)
    }

    fn to_workbook(&self) -> Result<Workbook> {
        let mut workbook = Workbook::new();
        for (_, sheet) in self.sheets() {
            let worksheet = workbook.add_worksheet();
            sheet.write_to_worksheet(worksheet)?;
        }
        Ok(workbook)
    }

    /// Save the book to an Excel file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or written.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_workbook()?
            .save(path.as_ref())
            .map_err(workbook_err)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_book_xlsx_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut book = Book::new();
        book.add_sheet("Numbers", Sheet::from_data(vec![vec![1_i64, 2, 3]]))
            .unwrap();
        book.add_sheet("Letters", Sheet::from_data(vec![vec!["a", "b", "c"]]))
            .unwrap();
        book.save_as_xlsx(&path).unwrap();

        let loaded = Book::from_xlsx(&path).unwrap();
        assert_eq!(loaded.sheet_names(), vec!["Numbers", "Letters"]);
        let letters = loaded.get_sheet("Letters").unwrap();
        assert_eq!(letters.cell(1, 3), &CellValue::from("c"));
    }

    #[test]
    fn test_xlsx_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("types.xlsx");

        let mut book = Book::new();
        let sheet = Sheet::from_data(vec![vec![
            CellValue::String("text".to_string()),
            CellValue::Int(42),
            CellValue::Float(2.5),
            CellValue::Bool(false),
        ]]);
        book.add_sheet("Types", sheet).unwrap();
        book.save_as_xlsx(&path).unwrap();

        let loaded = Book::from_xlsx(&path).unwrap();
        let sheet = loaded.get_sheet("Types").unwrap();

        assert!(matches!(sheet.cell(1, 1), CellValue::String(s) if s == "text"));
        // Int comes back as Float from Excel
        assert_eq!(sheet.cell(1, 2).to_normalized_string(), "42");
        assert!(matches!(sheet.cell(1, 3), CellValue::Float(f) if (*f - 2.5).abs() < 1e-9));
        assert_eq!(sheet.cell(1, 4), &CellValue::Bool(false));
    }

    #[test]
    fn test_row_numbers_survive_leading_blanks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut sheet = Sheet::new();
        sheet.set_cell(17, 3, "ROLLER").unwrap();
        let mut book = Book::new();
        book.add_sheet("ROLLCB", sheet).unwrap();
        book.save_as_xlsx(&path).unwrap();

        let loaded = Book::from_xlsx(&path).unwrap();
        let sheet = loaded.get_sheet("ROLLCB").unwrap();
        assert_eq!(sheet.cell(17, 3), &CellValue::from("ROLLER"));
        assert_eq!(sheet.cell(17, 1), &CellValue::Null);
        assert_eq!(sheet.max_row(), 17);
    }

    #[test]
    fn test_missing_file_is_workbook_error() {
        let dir = tempdir().unwrap();
        let err = Book::from_xlsx(dir.path().join("absent.xlsx"));
        assert!(matches!(err, Err(SheetError::Workbook(_))));
    }
}
