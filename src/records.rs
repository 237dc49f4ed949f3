use std::collections::HashMap;

use super::config::ColumnNames;
use super::dates::{Timestamp, parse_date};
use super::error::RosterError;

/// A CSV table kept as text: the header row plus every record's cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        RawTable {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn from_csv(text: &str) -> Result<Self, RosterError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.iter().map(str::to_string).collect::<Vec<_>>();
        let width = headers.len();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            // pandas writes blank trailing lines for some exports
            if record.iter().all(str::is_empty) {
                continue;
            }
            let mut cells = record.iter().map(str::to_string).collect::<Vec<_>>();
            cells.resize(width, String::new());
            rows.push(cells);
        }
        Ok(RawTable { headers, rows })
    }

    pub fn to_csv(&self) -> Result<String, RosterError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| RosterError::Render(err.to_string()))?;
        String::from_utf8(bytes).map_err(|err| RosterError::Render(err.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<usize, RosterError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| RosterError::MissingColumn(name.to_string()))
    }

    /// Rearranges every row to `headers`, filling columns this table lacks
    /// with empty cells and dropping the ones `headers` lacks.
    pub fn reindex(&self, headers: &[String]) -> RawTable {
        let positions: HashMap<&str, usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.as_str(), i))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|header| {
                        positions
                            .get(header.as_str())
                            .and_then(|&i| row.get(i))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        RawTable {
            headers: headers.to_vec(),
            rows,
        }
    }
}

/// Column positions of the fields a `ScheduleRow` needs.
#[derive(Clone, Debug)]
struct Columns {
    start: usize,
    /// Only the calendar reads the end, so the column may be absent.
    end: Option<usize>,
    service: usize,
    flight_number: usize,
    departure: usize,
    arrival: usize,
}

impl Columns {
    fn resolve(table: &RawTable, names: &ColumnNames) -> Result<Self, RosterError> {
        Ok(Columns {
            start: table.column(&names.start)?,
            end: table.column(&names.end).ok(),
            service: table.column(&names.service)?,
            flight_number: table.column(&names.flight_number)?,
            departure: table.column(&names.departure)?,
            arrival: table.column(&names.arrival)?,
        })
    }
}

/// Parses one date cell; `row` is 1-based.
fn cell_date(value: &str, row: usize, column: &str) -> Result<Timestamp, RosterError> {
    parse_date(value).map_err(|source| RosterError::InvalidDate {
        row,
        column: column.to_string(),
        source,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleRow {
    /// Position of the record in the `RawTable` it was read from.
    pub source_index: usize,
    pub start: Timestamp,
    pub raw_start: String,
    /// End cell as stored, `None` when the roster has no end column.
    pub raw_end: Option<String>,
    pub service: String,
    pub flight_number: Option<String>,
    pub departure: String,
    pub arrival: String,
}

impl ScheduleRow {
    pub fn route(&self) -> String {
        format!("{}-{}", self.departure, self.arrival)
    }

    /// 1-based roster row, as reported in errors.
    pub fn row_number(&self) -> usize {
        self.source_index + 1
    }
}

/// Parses the end of `row`, which must not precede its start.
pub fn end_time(row: &ScheduleRow, names: &ColumnNames) -> Result<Timestamp, RosterError> {
    let raw_end = row
        .raw_end
        .as_deref()
        .ok_or_else(|| RosterError::MissingColumn(names.end.clone()))?;
    let end = cell_date(raw_end, row.row_number(), &names.end)?;
    if end < row.start {
        return Err(RosterError::InconsistentRow {
            row: row.row_number(),
            start: row.raw_start.clone(),
            end: raw_end.to_string(),
        });
    }
    Ok(end)
}

/// Builds the schedule rows of a roster snapshot. Rows without a service
/// type are skipped; an unparseable start anywhere else fails the table.
/// End cells are kept as text for `end_time`.
pub fn parse(table: &RawTable, names: &ColumnNames) -> Result<Vec<ScheduleRow>, RosterError> {
    let columns = Columns::resolve(table, names)?;
    let mut schedule = Vec::with_capacity(table.rows.len());

    for (index, cells) in table.rows.iter().enumerate() {
        let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or_default();

        let service = cell(columns.service);
        if service.is_empty() {
            log::debug!("Skipping row {} without a service type", index + 1);
            continue;
        }
        let start = cell_date(cell(columns.start), index + 1, &names.start)?;

        let flight_number = Some(cell(columns.flight_number))
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        schedule.push(ScheduleRow {
            source_index: index,
            start,
            raw_start: cell(columns.start).to_string(),
            raw_end: columns.end.map(|i| cell(i).to_string()),
            service: service.to_string(),
            flight_number,
            departure: cell(columns.departure).to_string(),
            arrival: cell(columns.arrival).to_string(),
        });
    }

    log::debug!("Parsed {} schedule rows", schedule.len());
    Ok(schedule)
}

/// Replaces the tail of `existing` with `incoming`: stored rows starting at
/// or after the first incoming row's start are dropped, the rest keep their
/// order and are laid out under the incoming header.
pub fn merge(
    existing: Option<&RawTable>,
    incoming: &RawTable,
    start_column: &str,
) -> Result<RawTable, RosterError> {
    let incoming_start = incoming.column(start_column)?;
    let first = incoming
        .rows
        .first()
        .ok_or_else(|| RosterError::InvalidImport("the new roster has no rows".to_string()))?;
    let reference = cell_date(
        first.get(incoming_start).map(String::as_str).unwrap_or_default(),
        1,
        start_column,
    )?;

    let Some(existing) = existing else {
        return Ok(incoming.clone());
    };

    let existing_start = existing.column(start_column)?;
    let mut kept = RawTable::new(existing.headers.clone());
    for (index, row) in existing.rows.iter().enumerate() {
        let start = cell_date(
            row.get(existing_start).map(String::as_str).unwrap_or_default(),
            index + 1,
            start_column,
        )?;
        if start < reference {
            kept.rows.push(row.clone());
        }
    }
    log::info!(
        "Keeping {} of {} stored rows before {}",
        kept.rows.len(),
        existing.rows.len(),
        reference.naive().format("%d/%m/%Y %H:%M")
    );

    let mut merged = kept.reindex(&incoming.headers);
    merged.rows.extend(incoming.rows.iter().cloned());
    Ok(merged)
}
