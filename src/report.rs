use super::day_grouping::DayGroup;
use super::records::{RawTable, ScheduleRow};
use super::service_type::Month;

/// Share of the table width taken by the date, route and shift columns of
/// the simplified report.
const SIMPLE_COLUMN_FRACTIONS: [f32; 3] = [0.2, 0.6, 0.2];

/// A titled table ready to be laid out on pages of fixed width.
#[derive(Clone, Debug, PartialEq)]
pub struct TableLayout {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Fractions of the usable page width, one per column, summing to 1.
    pub column_fractions: Vec<f32>,
    pub header_font_size: f32,
    pub body_font_size: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Detailed,
    Simplified,
}

pub fn title(month: Month) -> String {
    format!("Flight schedule for {}", month.name())
}

pub fn file_name(month: Month, year: i32, kind: ReportKind) -> String {
    match kind {
        ReportKind::Detailed => format!("Schedule_{}_{}.pdf", month.name(), year),
        ReportKind::Simplified => format!("Schedule_{}_{}_simple.pdf", month.name(), year),
    }
}

/// Every roster column except `excluded`, one line per selected row.
pub fn detailed(
    table: &RawTable,
    rows: &[&ScheduleRow],
    excluded: &[String],
    month: Month,
) -> TableLayout {
    let kept: Vec<usize> = (0..table.headers.len())
        .filter(|&i| !excluded.contains(&table.headers[i]))
        .collect();

    let headers: Vec<String> = kept.iter().map(|&i| table.headers[i].clone()).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .filter_map(|row| table.rows.get(row.source_index))
        .map(|cells| {
            kept.iter()
                .map(|&i| cells.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    let column_fractions = content_fractions(&headers, &body);
    TableLayout {
        title: title(month),
        headers,
        rows: body,
        column_fractions,
        header_font_size: 12.0,
        body_font_size: 10.0,
    }
}

/// One line per day: date, route and shift.
pub fn simplified(groups: &[DayGroup], month: Month) -> TableLayout {
    let rows = groups
        .iter()
        .map(|group| {
            vec![
                group.date.format("%d/%m/%Y").to_string(),
                group.route_label(),
                group.shift.label().to_string(),
            ]
        })
        .collect();

    TableLayout {
        title: title(month),
        headers: vec!["Date".to_string(), "Route".to_string(), "Shift".to_string()],
        rows,
        column_fractions: SIMPLE_COLUMN_FRACTIONS.to_vec(),
        header_font_size: 10.0,
        body_font_size: 10.0,
    }
}

/// Splits the width in proportion to each column's longest text.
fn content_fractions(headers: &[String], rows: &[Vec<String>]) -> Vec<f32> {
    let weights: Vec<f32> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or_default();
            longest.max(1) as f32
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.iter().map(|weight| weight / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airports::AirportNames;
    use crate::config::ColumnNames;
    use crate::day_grouping;
    use crate::records;

    const ROSTER: &str = "\
Inicio,Fin,Servicio,Función,Flota,Nº Vue.,Dep.,Arr.
01/06/2024 08:00,01/06/2024 10:00,CO,CP,320,IB3100,MAD,BCN
01/06/2024 11:00,01/06/2024 13:00,CO,CP,320,IB3101,BCN,MAD
";

    #[test]
    fn test_detailed_drops_excluded_columns() {
        let table = RawTable::from_csv(ROSTER).unwrap();
        let rows = records::parse(&table, &ColumnNames::default()).unwrap();
        let refs: Vec<&ScheduleRow> = rows.iter().skip(1).collect();
        let layout = detailed(
            &table,
            &refs,
            &ColumnNames::default().excluded_from_report,
            Month::June,
        );
        assert_eq!(layout.title, "Flight schedule for June");
        assert_eq!(
            layout.headers,
            vec!["Inicio", "Fin", "Servicio", "Nº Vue.", "Dep.", "Arr."]
        );
        assert_eq!(
            layout.rows,
            vec![vec![
                "01/06/2024 11:00",
                "01/06/2024 13:00",
                "CO",
                "IB3101",
                "BCN",
                "MAD"
            ]]
        );
        let total: f32 = layout.column_fractions.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        // Dates are the widest cells.
        assert!(layout.column_fractions[0] > layout.column_fractions[2]);
    }

    #[test]
    fn test_simplified_layout() {
        let table = RawTable::from_csv(ROSTER).unwrap();
        let rows = records::parse(&table, &ColumnNames::default()).unwrap();
        let refs: Vec<&ScheduleRow> = rows.iter().collect();
        let names: AirportNames = [("MAD", "Madrid"), ("BCN", "Barcelona")].into_iter().collect();
        let groups = day_grouping::group(&refs, &names);

        let layout = simplified(&groups, Month::June);
        assert_eq!(layout.headers, vec!["Date", "Route", "Shift"]);
        assert_eq!(
            layout.rows,
            vec![vec!["01/06/2024", "Madrid - Barcelona - Madrid", "Mornings"]]
        );
        assert_eq!(layout.column_fractions, vec![0.2, 0.6, 0.2]);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            file_name(Month::June, 2024, ReportKind::Detailed),
            "Schedule_June_2024.pdf"
        );
        assert_eq!(
            file_name(Month::June, 2024, ReportKind::Simplified),
            "Schedule_June_2024_simple.pdf"
        );
    }
}
