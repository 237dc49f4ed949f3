use super::records::RawTable;

/// Header of the CDU flight-times log.
pub const CDU_COLUMNS: [&str; 6] = ["DATE", "FLT NUM", "OUT", "OFF", "ON", "IN"];

/// One block-time record: date, flight number, then the out/off/on/in times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CduRecord {
    pub date: String,
    pub flight_number: String,
    pub out: String,
    pub off: String,
    pub on: String,
    pub r#in: String,
}

impl CduRecord {
    fn cells(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.flight_number.clone(),
            self.out.clone(),
            self.off.clone(),
            self.on.clone(),
            self.r#in.clone(),
        ]
    }
}

/// The existing log laid out under the CDU columns with `record` appended.
pub fn append(existing: Option<&RawTable>, record: &CduRecord) -> RawTable {
    let headers: Vec<String> = CDU_COLUMNS.iter().map(|column| column.to_string()).collect();
    let mut log = match existing {
        Some(table) => table.reindex(&headers),
        None => RawTable::new(headers),
    };
    log.rows.push(record.cells());
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str) -> CduRecord {
        CduRecord {
            date: date.to_string(),
            flight_number: "IB3100".to_string(),
            out: "08:02".to_string(),
            off: "08:15".to_string(),
            on: "09:20".to_string(),
            r#in: "09:28".to_string(),
        }
    }

    #[test]
    fn test_append_to_new_log() {
        let log = append(None, &record("01/06/2024"));
        assert_eq!(log.headers, CDU_COLUMNS.to_vec());
        assert_eq!(
            log.rows,
            vec![vec!["01/06/2024", "IB3100", "08:02", "08:15", "09:20", "09:28"]]
        );
    }

    #[test]
    fn test_append_reindexes_existing_rows() {
        let existing = RawTable::from_csv("FLT NUM,DATE,NOTES\nIB3000,31/05/2024,late\n").unwrap();
        let log = append(Some(&existing), &record("01/06/2024"));
        assert_eq!(log.rows.len(), 2);
        assert_eq!(log.rows[0], vec!["31/05/2024", "IB3000", "", "", "", ""]);
        assert_eq!(log.rows[1][0], "01/06/2024");
    }
}
