use chrono::{DateTime, Utc};

use super::airports::AirportNames;
use super::calendar::{self, Booking, CalendarSettings};
use super::cdu::{self, CduRecord};
use super::config::Config;
use super::criteria::{self, Selection, ServiceCriterion};
use super::day_grouping;
use super::error::RosterError;
use super::pdf;
use super::records::{self, RawTable, ScheduleRow};
use super::report::{self, ReportKind};
use super::service_type::{Month, ServiceType};
use super::store::{self, RemoteStore};

/// A generated document, not yet written anywhere.
#[derive(Debug)]
pub struct Generated {
    pub file_name: String,
    pub contents: Vec<u8>,
    /// Rows (calendar, detailed report) or days (simplified report) emitted.
    pub entries: usize,
}

/// One roster snapshot: the table as stored and the rows parsed from it.
struct Snapshot {
    table: RawTable,
    rows: Vec<ScheduleRow>,
}

/// Runs each user action against the configured store.
pub struct Pipeline<'a> {
    config: &'a Config,
    store: &'a dyn RemoteStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, store: &'a dyn RemoteStore) -> Self {
        Pipeline { config, store }
    }

    fn fetch_roster(&self) -> Result<Snapshot, RosterError> {
        let folder = &self.config.store.folder;
        let file_name = &self.config.store.roster_file;
        let table = store::read_table(self.store, folder, file_name)?.ok_or_else(|| {
            RosterError::SourceUnavailable {
                folder: folder.clone(),
                file_name: file_name.clone(),
            }
        })?;
        let rows = records::parse(&table, &self.config.columns)?;
        log::info!("Fetched {} roster rows from {}", rows.len(), file_name);
        Ok(Snapshot { table, rows })
    }

    fn select<'s>(
        snapshot: &'s Snapshot,
        selection: &Selection,
    ) -> Result<Vec<&'s ScheduleRow>, RosterError> {
        let selected = criteria::filter(&snapshot.rows, selection);
        if selected.is_empty() {
            return Err(RosterError::EmptyResult {
                month: selection.month,
                year: selection.year,
            });
        }
        log::info!(
            "{} rows match {}/{}",
            selected.len(),
            selection.month,
            selection.year
        );
        Ok(selected)
    }

    pub fn calendar(
        &self,
        month: Month,
        year: i32,
        services: &[ServiceType],
        generated_at: DateTime<Utc>,
    ) -> Result<Generated, RosterError> {
        let settings = CalendarSettings {
            tz: self.config.calendar.tz()?,
            prod_id: self.config.calendar.prod_id.clone(),
            uid_domain: self.config.calendar.uid_domain.clone(),
        };
        let snapshot = self.fetch_roster()?;
        let selection = Selection {
            month: month.number(),
            year,
            services: ServiceCriterion::from_service_types(services),
        };
        let selected = Self::select(&snapshot, &selection)?;
        let bookings = selected
            .iter()
            .map(|&row| {
                let end = records::end_time(row, &self.config.columns)?;
                Ok(Booking { row, end })
            })
            .collect::<Result<Vec<_>, RosterError>>()?;
        let ical = calendar::to_ical(&bookings, &settings, generated_at)?;

        Ok(Generated {
            file_name: format!("Schedule_{}_{}.ics", month.name(), year),
            contents: ical.into_bytes(),
            entries: selected.len(),
        })
    }

    /// The detailed report lists every service type unless `services` narrows
    /// it; the simplified one always covers flights and uses `airports` for
    /// the route names.
    pub fn report(
        &self,
        month: Month,
        year: i32,
        kind: ReportKind,
        services: &[ServiceType],
        airports: &AirportNames,
    ) -> Result<Generated, RosterError> {
        let snapshot = self.fetch_roster()?;
        let services = match kind {
            ReportKind::Simplified => ServiceCriterion::flights(),
            ReportKind::Detailed if services.is_empty() => ServiceCriterion::Any,
            ReportKind::Detailed => ServiceCriterion::from_service_types(services),
        };
        let selection = Selection {
            month: month.number(),
            year,
            services,
        };
        let selected = Self::select(&snapshot, &selection)?;

        let (layout, entries) = match kind {
            ReportKind::Detailed => (
                report::detailed(
                    &snapshot.table,
                    &selected,
                    &self.config.columns.excluded_from_report,
                    month,
                ),
                selected.len(),
            ),
            ReportKind::Simplified => {
                let groups = day_grouping::group(&selected, airports);
                (report::simplified(&groups, month), groups.len())
            }
        };

        Ok(Generated {
            file_name: report::file_name(month, year, kind),
            contents: pdf::render(&layout)?,
            entries,
        })
    }

    /// Merges a freshly exported roster into the stored one and returns the
    /// number of rows now stored.
    pub fn import(&self, incoming: &RawTable) -> Result<usize, RosterError> {
        let folder = &self.config.store.folder;
        let file_name = &self.config.store.roster_file;
        let existing = store::read_table(self.store, folder, file_name)?;
        if existing.is_none() {
            log::info!("No stored roster yet, creating {file_name}");
        }
        let merged = records::merge(existing.as_ref(), incoming, &self.config.columns.start)?;
        // Reject a roster that could not be reported on later.
        records::parse(&merged, &self.config.columns)?;
        store::write_table(self.store, folder, file_name, &merged)?;
        Ok(merged.rows.len())
    }

    /// Appends `record` to the CDU log and returns its new length.
    pub fn append_cdu(&self, record: &CduRecord) -> Result<usize, RosterError> {
        let folder = &self.config.store.folder;
        let file_name = &self.config.store.cdu_file;
        let existing = store::read_table(self.store, folder, file_name)?;
        let log = cdu::append(existing.as_ref(), record);
        store::write_table(self.store, folder, file_name, &log)?;
        Ok(log.rows.len())
    }
}
