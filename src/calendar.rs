//! iCalendar (RFC 5545) export of roster rows.
//!
//! Every row becomes one `VEVENT` whose start and end carry the roster's
//! time zone as a `TZID` parameter, and the calendar carries the matching
//! `VTIMEZONE` for the years the events span. The `UID` only depends on the
//! row's raw start text and airports, so exporting the same roster twice
//! produces the same identifiers and calendar clients update events instead
//! of duplicating them.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::{OffsetComponents, OffsetName, Tz};
use ical::generator::{Emitter, IcalCalendarBuilder, IcalEvent, IcalEventBuilder, Property};
use ical::ical_property;
use ical::parser::ical::component::{
    IcalTimeZone, IcalTimeZoneTransition, IcalTimeZoneTransitionType,
};

use super::dates::Timestamp;
use super::error::RosterError;
use super::records::ScheduleRow;

const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
/// Onset of the observance already in force when the exported years begin.
const FIRST_ONSET: &str = "19700101T000000";
const DAY_SECONDS: i64 = 86_400;

/// Settings shared by every event of an export.
#[derive(Clone, Debug)]
pub struct CalendarSettings {
    pub tz: Tz,
    pub prod_id: String,
    pub uid_domain: String,
}

/// A selected row together with its parsed end.
#[derive(Clone, Copy, Debug)]
pub struct Booking<'a> {
    pub row: &'a ScheduleRow,
    pub end: Timestamp,
}

pub fn event_uid(row: &ScheduleRow, uid_domain: &str) -> String {
    format!(
        "flight-{}-{}-{}@{}",
        row.raw_start, row.departure, row.arrival, uid_domain
    )
}

pub fn event_summary(row: &ScheduleRow) -> String {
    format!(
        "{} {} {}",
        row.service,
        row.flight_number.as_deref().unwrap_or_default(),
        row.route()
    )
}

pub fn event_description(row: &ScheduleRow) -> String {
    format!(
        "Service: {}\nFlight number: {}\nRoute: {}",
        row.service,
        row.flight_number.as_deref().unwrap_or("N/A"),
        row.route()
    )
}

/// Serializes `bookings` into one calendar. `generated_at` becomes every
/// event's `DTSTAMP`.
pub fn to_ical(
    bookings: &[Booking],
    settings: &CalendarSettings,
    generated_at: DateTime<Utc>,
) -> Result<String, RosterError> {
    let tzid = settings.tz.name();
    let stamp = generated_at.format(UTC_FORMAT).to_string();

    let mut events: Vec<IcalEvent> = Vec::with_capacity(bookings.len());
    let mut years: Option<(i32, i32)> = None;
    for booking in bookings {
        let row = booking.row;
        let start = row.start.localize(settings.tz)?;
        let end = booking.end.localize(settings.tz)?;
        years = Some(match years {
            None => (start.year(), end.year()),
            Some((first, last)) => (first.min(start.year()), last.max(end.year())),
        });

        events.push(
            IcalEventBuilder::tzid(tzid)
                .uid(escape_text(&event_uid(row, &settings.uid_domain)))
                .changed_utc(stamp.as_str())
                .start(start.format(LOCAL_FORMAT).to_string())
                .end(end.format(LOCAL_FORMAT).to_string())
                .set(ical_property!("SUMMARY", escape_text(&event_summary(row))))
                .set(ical_property!(
                    "DESCRIPTION",
                    escape_text(&event_description(row))
                ))
                .set(ical_property!("LOCATION", escape_text(&row.route())))
                .build(),
        );
    }

    let mut calendar = IcalCalendarBuilder::version("2.0")
        .gregorian()
        .prodid(settings.prod_id.as_str())
        .build();
    if let Some((first, last)) = years {
        let zone = time_zone(settings.tz, first, last).ok_or_else(|| {
            RosterError::Render(format!("no time zone rules for {tzid} in {first}..={last}"))
        })?;
        calendar.timezones.push(zone);
    }
    calendar.events = events;
    Ok(calendar.generate())
}

/// Escapes a TEXT value; the emitter writes values as given.
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Observance {
    utc_offset: i32,
    daylight: bool,
    name: Option<String>,
}

fn observance(tz: Tz, timestamp: i64) -> Option<Observance> {
    let instant = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
    let offset = tz.offset_from_utc_datetime(&instant.naive_utc());
    Some(Observance {
        utc_offset: offset.fix().local_minus_utc(),
        daylight: offset.dst_offset() != TimeDelta::zero(),
        name: offset.abbreviation().map(str::to_string),
    })
}

fn year_start(year: i32) -> Option<i64> {
    let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
    Some(date.and_time(NaiveTime::MIN).and_utc().timestamp())
}

/// `VTIMEZONE` for `tz` listing the observance in force on 1 January of
/// `first` and every offset change up to the end of `last`.
fn time_zone(tz: Tz, first: i32, last: i32) -> Option<IcalTimeZone> {
    let from = year_start(first)?;
    let to = year_start(last.checked_add(1)?)?;

    let mut zone = IcalTimeZone::new();
    zone.properties.push(ical_property!("TZID", tz.name()));

    let mut current = observance(tz, from)?;
    zone.transitions
        .push(transition(FIRST_ONSET.to_string(), &current, &current));

    // Offsets change at most once a day; scan daily, then narrow to the second.
    let mut day = from;
    while day < to {
        let next = (day + DAY_SECONDS).min(to);
        let after = observance(tz, next)?;
        if after != current {
            let (mut before, mut changed) = (day, next);
            while changed - before > 1 {
                let middle = before + (changed - before) / 2;
                if observance(tz, middle)? == current {
                    before = middle;
                } else {
                    changed = middle;
                }
            }
            let onset = DateTime::<Utc>::from_timestamp(changed + i64::from(current.utc_offset), 0)?;
            zone.transitions.push(transition(
                onset.format(LOCAL_FORMAT).to_string(),
                &current,
                &after,
            ));
            current = after;
        }
        day = next;
    }
    Some(zone)
}

/// One `STANDARD` or `DAYLIGHT` block; `onset` is local time under `from`.
fn transition(onset: String, from: &Observance, to: &Observance) -> IcalTimeZoneTransition {
    let kind = if to.daylight {
        IcalTimeZoneTransitionType::DAYLIGHT
    } else {
        IcalTimeZoneTransitionType::STANDARD
    };
    let mut block = IcalTimeZoneTransition::new(kind);
    block.properties.push(ical_property!("DTSTART", onset));
    block.properties.push(ical_property!(
        "TZOFFSETFROM",
        format_utc_offset(from.utc_offset)
    ));
    block
        .properties
        .push(ical_property!("TZOFFSETTO", format_utc_offset(to.utc_offset)));
    if let Some(name) = &to.name {
        block.properties.push(ical_property!("TZNAME", name.as_str()));
    }
    block
}

/// `+hhmm`, with seconds appended only when the offset has them.
fn format_utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.unsigned_abs();
    let (hours, minutes, rest) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if rest == 0 {
        format!("{sign}{hours:02}{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}{rest:02}")
    }
}
