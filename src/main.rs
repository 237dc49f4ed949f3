mod airports;
mod calendar;
mod cdu;
mod config;
mod criteria;
mod dates;
mod day_grouping;
mod error;
mod html_table;
mod pdf;
mod pipeline;
mod records;
mod report;
mod service_type;
mod store;
mod utils;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use airports::AirportNames;
use config::{Config, DEFAULT_CONFIG_PATH};
use pipeline::{Generated, Pipeline};
use records::RawTable;
use report::ReportKind;
use service_type::{Month, ServiceType};
use utils::write_output_file;

#[derive(Parser)]
struct Args {
    #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct Period {
    /// Defaults to the current month
    #[clap(long)]
    month: Option<Month>,
    /// Defaults to the current year
    #[clap(long, value_parser = clap::value_parser!(i32).range(2020..=2030))]
    year: Option<i32>,
    /// Service type code, e.g. "CO" or "SR - REF"; repeat for several
    #[clap(long = "service")]
    services: Vec<ServiceType>,
}

#[derive(Subcommand)]
enum Command {
    /// Export the selected services as an iCalendar file
    Calendar(Period),
    /// Render the month as a PDF table
    Report {
        #[command(flatten)]
        period: Period,
        /// One line per day with the route and shift
        #[clap(long)]
        simple: bool,
    },
    /// Merge a new roster export (.html or .csv) into the stored roster
    Import { file: PathBuf },
    /// Append block times to the CDU log
    Cdu {
        #[clap(long)]
        date: String,
        #[clap(long)]
        flight: String,
        #[clap(long)]
        out: String,
        #[clap(long)]
        off: String,
        #[clap(long)]
        on: String,
        #[clap(long = "in")]
        r#in: String,
    },
}

impl Period {
    fn month(&self) -> Result<Month> {
        match self.month {
            Some(month) => Ok(month),
            None => Month::from_number(Local::now().month())
                .context("the system clock reports an invalid month"),
        }
    }

    fn year(&self) -> i32 {
        self.year.unwrap_or_else(|| Local::now().year())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let store = store::open(&config.store)?;
    let pipeline = Pipeline::new(&config, store.as_ref());

    let outcome = match &args.command {
        Command::Calendar(period) => {
            let services = if period.services.is_empty() {
                vec![ServiceType::Flight]
            } else {
                period.services.clone()
            };
            pipeline
                .calendar(period.month()?, period.year(), &services, Utc::now())
                .map(|generated| save(&config.output_dir, generated))
        }
        Command::Report { period, simple } => {
            let kind = if *simple {
                ReportKind::Simplified
            } else {
                ReportKind::Detailed
            };
            // Only the simplified report shows city names.
            let airports = match kind {
                ReportKind::Simplified => {
                    let loaded = airports::load(&config.airports);
                    if let Some(notice) = loaded.notice() {
                        eprintln!("Warning: {notice}");
                    }
                    loaded.names
                }
                ReportKind::Detailed => AirportNames::default(),
            };
            pipeline
                .report(period.month()?, period.year(), kind, &period.services, &airports)
                .map(|generated| save(&config.output_dir, generated))
        }
        Command::Import { file } => {
            let incoming = read_import(file)?;
            pipeline.import(&incoming).map(|stored| {
                println!("Stored roster now has {stored} rows");
                Ok(())
            })
        }
        Command::Cdu {
            date,
            flight,
            out,
            off,
            on,
            r#in,
        } => {
            let record = cdu::CduRecord {
                date: date.clone(),
                flight_number: flight.clone(),
                out: out.clone(),
                off: off.clone(),
                on: on.clone(),
                r#in: r#in.clone(),
            };
            pipeline.append_cdu(&record).map(|stored| {
                println!("CDU log now has {stored} entries");
                Ok(())
            })
        }
    };

    match outcome {
        Ok(written) => written,
        Err(err) if !err.is_fatal() => {
            eprintln!("Warning: {err}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn save(output_dir: &Path, generated: Generated) -> Result<()> {
    log::info!("{} contains {} entries", generated.file_name, generated.entries);
    write_output_file(output_dir, &generated.file_name, &generated.contents)?;
    Ok(())
}

fn read_import(path: &Path) -> Result<RawTable> {
    let bytes = fs_err::read(path)?;
    let text = store::decode_table(&bytes).text;
    let is_html = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extension.eq_ignore_ascii_case("html") || extension.eq_ignore_ascii_case("htm")
        });
    let table = if is_html {
        html_table::parse(&text)
    } else {
        RawTable::from_csv(&text)
    };
    table.with_context(|| format!("reading {}", path.display()))
}
