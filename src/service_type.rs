use std::fmt;
use std::str::FromStr;

/// Service-type codes offered for the calendar export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Flight,
    CourseC73,
    CourseWeb,
    DayOff,
    ReserveRef,
    ReserveOpc,
    Standby,
    MedicalQuir,
    MedicalCma,
}

impl ServiceType {
    pub const ALL: [ServiceType; 9] = [
        ServiceType::Flight,
        ServiceType::CourseC73,
        ServiceType::CourseWeb,
        ServiceType::DayOff,
        ServiceType::ReserveRef,
        ServiceType::ReserveOpc,
        ServiceType::Standby,
        ServiceType::MedicalQuir,
        ServiceType::MedicalCma,
    ];

    /// The code as it appears in the roster's service column.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceType::Flight => "CO",
            ServiceType::CourseC73 => "CC - C73",
            ServiceType::CourseWeb => "CC - WEB",
            ServiceType::DayOff => "LI",
            ServiceType::ReserveRef => "SR - REF",
            ServiceType::ReserveOpc => "SR - OPC",
            ServiceType::Standby => "SA",
            ServiceType::MedicalQuir => "RM - QUIR",
            ServiceType::MedicalCma => "RM - CMA",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept "SR-REF" and "sr - ref" as well as the canonical "SR - REF".
        let wanted: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        ServiceType::ALL
            .into_iter()
            .find(|service| service.code().replace(' ', "") == wanted)
            .ok_or_else(|| format!("Invalid service type: {}", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// 1-based month number.
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn from_number(number: u32) -> Option<Month> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        Month::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}
