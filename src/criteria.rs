use std::collections::HashSet;

use super::records::ScheduleRow;
use super::service_type::ServiceType;

/// Token the simplified report looks for in the service column.
pub const FLIGHT_SERVICE_TOKEN: &str = "CO";

/// Which service types a selection accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceCriterion {
    /// Every row with a service type.
    Any,
    /// The service column equals one of the codes.
    Exact(HashSet<String>),
    /// The service column contains the token, ignoring case.
    Contains(String),
}

impl ServiceCriterion {
    pub fn from_service_types(services: &[ServiceType]) -> Self {
        ServiceCriterion::Exact(
            services
                .iter()
                .map(|service| service.code().to_string())
                .collect(),
        )
    }

    pub fn flights() -> Self {
        ServiceCriterion::Contains(FLIGHT_SERVICE_TOKEN.to_string())
    }

    pub fn accepts(&self, service: &str) -> bool {
        match self {
            ServiceCriterion::Any => true,
            ServiceCriterion::Exact(codes) => codes.contains(service),
            ServiceCriterion::Contains(token) => service
                .to_lowercase()
                .contains(&token.to_lowercase()),
        }
    }
}

/// Everything a report selects rows by.
#[derive(Clone, Debug)]
pub struct Selection {
    pub month: u32,
    pub year: i32,
    pub services: ServiceCriterion,
}

impl Selection {
    pub fn matches(&self, row: &ScheduleRow) -> bool {
        row.start.month() == self.month
            && row.start.year() == self.year
            && self.services.accepts(&row.service)
    }
}

/// Rows starting in the selected month whose service is accepted, in input
/// order.
pub fn filter<'a>(rows: &'a [ScheduleRow], selection: &Selection) -> Vec<&'a ScheduleRow> {
    rows.iter().filter(|row| selection.matches(row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    fn row(start: &str, service: &str) -> ScheduleRow {
        ScheduleRow {
            source_index: 0,
            start: parse_date(start).unwrap(),
            raw_end: None,
            raw_start: start.to_string(),
            service: service.to_string(),
            flight_number: None,
            departure: "MAD".to_string(),
            arrival: "BCN".to_string(),
        }
    }

    fn june_2024(services: ServiceCriterion) -> Selection {
        Selection {
            month: 6,
            year: 2024,
            services,
        }
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let selection = june_2024(ServiceCriterion::flights());
        assert!(filter(&[], &selection).is_empty());
    }

    #[test]
    fn test_exact_membership() {
        let rows = vec![
            row("01/06/2024 08:00", "CO"),
            row("02/06/2024 08:00", "SA"),
            row("03/06/2024 08:00", "CO - EXTRA"),
            row("04/06/2024 08:00", "SR - REF"),
        ];
        let selection = june_2024(ServiceCriterion::from_service_types(&[
            ServiceType::Flight,
            ServiceType::ReserveRef,
        ]));
        let selected: Vec<&str> = filter(&rows, &selection)
            .iter()
            .map(|row| row.raw_start.as_str())
            .collect();
        assert_eq!(selected, vec!["01/06/2024 08:00", "04/06/2024 08:00"]);
    }

    #[test]
    fn test_any_accepts_every_service() {
        let rows = vec![row("01/06/2024 08:00", "CO"), row("02/06/2024 08:00", "SA")];
        assert_eq!(filter(&rows, &june_2024(ServiceCriterion::Any)).len(), 2);
    }

    #[test]
    fn test_contains_token_ignores_case() {
        let rows = vec![
            row("01/06/2024 08:00", "co"),
            row("02/06/2024 08:00", "SA"),
            row("03/06/2024 08:00", "CO - EXTRA"),
        ];
        let selected = filter(&rows, &june_2024(ServiceCriterion::flights()));
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1].service, "CO - EXTRA");
    }

    #[test]
    fn test_month_and_year_must_both_match() {
        let rows = vec![
            row("30/05/2024 23:59", "CO"),
            row("01/06/2024 00:00", "CO"),
            row("15/06/2023 10:00", "CO"),
            row("30/06/2024 23:59", "CO"),
            row("01/07/2024 00:00", "CO"),
        ];
        let selected = filter(&rows, &june_2024(ServiceCriterion::flights()));
        let starts: Vec<&str> = selected.iter().map(|row| row.raw_start.as_str()).collect();
        assert_eq!(starts, vec!["01/06/2024 00:00", "30/06/2024 23:59"]);
    }

    #[test]
    fn test_output_keeps_input_order() {
        let rows = vec![
            row("20/06/2024 08:00", "CO"),
            row("02/06/2024 08:00", "CO"),
            row("11/06/2024 08:00", "CO"),
        ];
        let selected = filter(&rows, &june_2024(ServiceCriterion::flights()));
        let starts: Vec<&str> = selected.iter().map(|row| row.raw_start.as_str()).collect();
        assert_eq!(
            starts,
            vec!["20/06/2024 08:00", "02/06/2024 08:00", "11/06/2024 08:00"]
        );
    }
}
