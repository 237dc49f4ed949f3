use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::config::AirportsConfig;
use super::error::RosterError;
use super::utils::spinner;

#[derive(Debug, Deserialize)]
struct AirportEntry {
    #[serde(rename = "IATA")]
    code: String,
    #[serde(rename = "City")]
    name: String,
}

/// IATA code to display name lookup used when printing routes.
#[derive(Clone, Debug, Default)]
pub struct AirportNames(HashMap<String, String>);

impl AirportNames {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<AirportEntry> = serde_json::from_str(text)?;
        let mut names = HashMap::with_capacity(entries.len());
        for entry in entries {
            names.entry(entry.code).or_insert(entry.name);
        }
        Ok(AirportNames(names))
    }

    /// Display name for `code`, or the code itself when unknown.
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        self.0.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AirportNames {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AirportNames(
            iter.into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
        )
    }
}

/// Where the lookup table came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AirportSource {
    Remote,
    File,
    /// Nothing could be loaded; every code displays as itself.
    Unavailable { reason: String },
}

#[derive(Clone, Debug)]
pub struct LoadedAirports {
    pub names: AirportNames,
    pub source: AirportSource,
}

impl LoadedAirports {
    /// A warning for the user when routes will show codes instead of cities.
    pub fn notice(&self) -> Option<String> {
        match &self.source {
            AirportSource::Unavailable { reason } => Some(format!(
                "airport names unavailable, routes show IATA codes ({reason})"
            )),
            _ if self.names.is_empty() => {
                Some("the airport table is empty, routes show IATA codes".to_string())
            }
            _ => None,
        }
    }
}

/// Loads the lookup table from the configured file or URL. Failures only
/// affect display, so they degrade to an empty table instead of an error.
pub fn load(config: &AirportsConfig) -> LoadedAirports {
    let (attempt, source) = match &config.path {
        Some(path) => (read_file(path), AirportSource::File),
        None => (fetch(&config.url), AirportSource::Remote),
    };

    match attempt {
        Ok(names) => {
            log::info!("Loaded {} airport names", names.len());
            LoadedAirports { names, source }
        }
        Err(err) => {
            log::warn!("Airport names unavailable, showing codes instead: {err}");
            LoadedAirports {
                names: AirportNames::default(),
                source: AirportSource::Unavailable {
                    reason: err.to_string(),
                },
            }
        }
    }
}

fn read_file(path: &Path) -> Result<AirportNames, RosterError> {
    let text = fs_err::read_to_string(path)?;
    AirportNames::from_json(&text).map_err(|err| RosterError::Config(err.to_string()))
}

fn fetch(url: &str) -> Result<AirportNames, RosterError> {
    let progress = spinner("Downloading airport names...");
    let text = download(url);
    progress.finish_and_clear();
    AirportNames::from_json(&text?).map_err(|err| RosterError::RemoteAccess(err.to_string()))
}

fn download(url: &str) -> Result<String, RosterError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(response.text()?)
}
