use scraper::{ElementRef, Html, Selector};

use super::error::RosterError;
use super::records::RawTable;

fn selector(css: &str) -> Result<Selector, RosterError> {
    Selector::parse(css).map_err(|err| RosterError::InvalidImport(format!("{css}: {err:?}")))
}

/// Text of a cell with runs of whitespace collapsed to single spaces.
fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads the first `<table>` of an HTML roster export. The first row holds
/// the headers; short rows are padded with empty cells.
pub fn parse(html: &str) -> Result<RawTable, RosterError> {
    let document = Html::parse_document(html);
    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    let table = document.select(&table_selector).next().ok_or_else(|| {
        RosterError::InvalidImport("no table found in the HTML document".to_string())
    })?;

    let mut rows = table
        .select(&row_selector)
        .map(|row| row.select(&cell_selector).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty());

    let headers = rows
        .next()
        .ok_or_else(|| RosterError::InvalidImport("the HTML table is empty".to_string()))?;
    let width = headers.len();
    let mut parsed = RawTable::new(headers);
    for mut cells in rows {
        if cells.iter().all(String::is_empty) {
            continue;
        }
        cells.resize(width, String::new());
        parsed.rows.push(cells);
    }

    if parsed.rows.is_empty() {
        return Err(RosterError::InvalidImport(
            "the HTML table has no data rows".to_string(),
        ));
    }
    Ok(parsed)
}
