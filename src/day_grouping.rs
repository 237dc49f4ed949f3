use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

use super::airports::AirportNames;
use super::records::ScheduleRow;

/// First hour of the day that counts as an afternoon shift.
const AFTERNOON_FROM_HOUR: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shift {
    Mornings,
    Afternoons,
}

impl Shift {
    pub fn for_hour(hour: u32) -> Self {
        if hour < AFTERNOON_FROM_HOUR {
            Shift::Mornings
        } else {
            Shift::Afternoons
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Shift::Mornings => "Mornings",
            Shift::Afternoons => "Afternoons",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// All of one day's services, reduced to the airports visited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub route: Vec<String>,
    pub shift: Shift,
}

impl DayGroup {
    pub fn route_label(&self) -> String {
        self.route.join(" - ")
    }
}

/// Groups rows by calendar date, in date order. Within a day rows are taken
/// in start order; the route lists every departure and arrival by display
/// name with repeated consecutive airports collapsed, and the shift follows
/// the day's first start.
pub fn group(rows: &[&ScheduleRow], airports: &AirportNames) -> Vec<DayGroup> {
    let mut days: BTreeMap<NaiveDate, Vec<&ScheduleRow>> = BTreeMap::new();
    for &row in rows {
        days.entry(row.start.date()).or_default().push(row);
    }

    days.into_iter()
        .filter_map(|(date, mut day_rows)| {
            day_rows.sort_by_key(|row| row.start);
            let first = day_rows.first()?;
            let shift = Shift::for_hour(first.start.hour());

            let mut route: Vec<String> = Vec::with_capacity(day_rows.len() * 2);
            for row in &day_rows {
                for code in [&row.departure, &row.arrival] {
                    push_collapsing(&mut route, airports.resolve(code));
                }
            }

            Some(DayGroup { date, route, shift })
        })
        .collect()
}

fn push_collapsing(route: &mut Vec<String>, name: &str) {
    if route.last().map(String::as_str) != Some(name) {
        route.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    fn row(start: &str, departure: &str, arrival: &str) -> ScheduleRow {
        ScheduleRow {
            source_index: 0,
            start: parse_date(start).unwrap(),
            raw_end: None,
            raw_start: start.to_string(),
            service: "CO".to_string(),
            flight_number: None,
            departure: departure.to_string(),
            arrival: arrival.to_string(),
        }
    }

    fn airports() -> AirportNames {
        [("MAD", "Madrid"), ("BCN", "Barcelona"), ("AGP", "Malaga")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_round_trip_day() {
        let rows = [
            row("01/06/2024 08:00", "MAD", "BCN"),
            row("01/06/2024 11:00", "BCN", "MAD"),
        ];
        let refs: Vec<&ScheduleRow> = rows.iter().collect();
        let groups = group(&refs, &airports());
        assert_eq!(
            groups,
            vec![DayGroup {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                route: vec![
                    "Madrid".to_string(),
                    "Barcelona".to_string(),
                    "Madrid".to_string()
                ],
                shift: Shift::Mornings,
            }]
        );
        assert_eq!(groups[0].route_label(), "Madrid - Barcelona - Madrid");
    }

    #[test]
    fn test_single_row_day_keeps_both_airports() {
        let rows = [row("05/06/2024 16:00", "AGP", "XRY")];
        let refs: Vec<&ScheduleRow> = rows.iter().collect();
        let groups = group(&refs, &airports());
        assert_eq!(groups[0].route, vec!["Malaga", "XRY"]);
        assert_eq!(groups[0].shift, Shift::Afternoons);
    }

    #[test]
    fn test_rows_are_sorted_within_the_day() {
        let rows = [
            row("01/06/2024 15:00", "BCN", "MAD"),
            row("01/06/2024 07:30", "MAD", "BCN"),
        ];
        let refs: Vec<&ScheduleRow> = rows.iter().collect();
        let groups = group(&refs, &airports());
        assert_eq!(groups[0].route, vec!["Madrid", "Barcelona", "Madrid"]);
        assert_eq!(groups[0].shift, Shift::Mornings);
    }

    #[test]
    fn test_groups_are_in_date_order() {
        let rows = [
            row("12/06/2024 08:00", "MAD", "BCN"),
            row("02/06/2024 12:00", "MAD", "AGP"),
            row("10/06/2024 09:00", "AGP", "MAD"),
        ];
        let refs: Vec<&ScheduleRow> = rows.iter().collect();
        let days: Vec<u32> = group(&refs, &airports())
            .iter()
            .map(|group| chrono::Datelike::day(&group.date))
            .collect();
        assert_eq!(days, vec![2, 10, 12]);
    }

    #[test]
    fn test_shift_boundary() {
        for (start, shift) in [
            ("01/06/2024 09:59", Shift::Mornings),
            ("01/06/2024 10:00", Shift::Afternoons),
            ("01/06/2024", Shift::Mornings),
        ] {
            let rows = [row(start, "MAD", "BCN")];
            let refs: Vec<&ScheduleRow> = rows.iter().collect();
            assert_eq!(group(&refs, &airports())[0].shift, shift, "{start}");
        }
    }

    #[test]
    fn test_no_consecutive_duplicates_in_any_order() {
        let rows = [
            row("01/06/2024 06:00", "MAD", "BCN"),
            row("01/06/2024 09:00", "BCN", "BCN"),
            row("01/06/2024 12:00", "BCN", "MAD"),
            row("01/06/2024 18:00", "AGP", "AGP"),
        ];
        // Every rotation of the input gives the same, duplicate-free route.
        for offset in 0..rows.len() {
            let refs: Vec<&ScheduleRow> = rows
                .iter()
                .cycle()
                .skip(offset)
                .take(rows.len())
                .collect();
            let groups = group(&refs, &airports());
            assert_eq!(groups.len(), 1);
            let route = &groups[0].route;
            assert!(route.windows(2).all(|pair| pair[0] != pair[1]));
            assert_eq!(route, &vec!["Madrid", "Barcelona", "Madrid", "Malaga"]);
        }
    }

    #[test]
    fn test_unknown_codes_collapse_by_code() {
        let rows = [
            row("03/06/2024 08:00", "XRY", "OPO"),
            row("03/06/2024 10:00", "OPO", "XRY"),
        ];
        let refs: Vec<&ScheduleRow> = rows.iter().collect();
        let groups = group(&refs, &AirportNames::default());
        assert_eq!(groups[0].route, vec!["XRY", "OPO", "XRY"]);
    }
}
