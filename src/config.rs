use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::error::RosterError;

pub const DEFAULT_CONFIG_PATH: &str = "config/roster.toml";

const DEFAULT_AIRPORTS_URL: &str =
    "https://raw.githubusercontent.com/ElSabio97/Consulta-de-servicios/main/airports.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output_dir: PathBuf,
    pub store: StoreConfig,
    pub airports: AirportsConfig,
    pub calendar: CalendarConfig,
    pub columns: ColumnNames,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: PathBuf::from("."),
            store: StoreConfig::default(),
            airports: AirportsConfig::default(),
            calendar: CalendarConfig::default(),
            columns: ColumnNames::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Directory holding the folders of the `local` store.
    pub root: PathBuf,
    /// Environment variable carrying the Drive bearer token.
    pub token_env: String,
    /// Local directory name or Drive folder id holding the roster.
    pub folder: String,
    pub roster_file: String,
    pub cdu_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            kind: StoreKind::Local,
            root: PathBuf::from("data"),
            token_env: "ROSTER_DRIVE_TOKEN".to_string(),
            folder: "roster".to_string(),
            roster_file: "Consulta_de_servicios.csv".to_string(),
            cdu_file: "CDU.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Local,
    Drive,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AirportsConfig {
    pub url: String,
    /// Read the lookup table from disk instead of over HTTP.
    pub path: Option<PathBuf>,
}

impl Default for AirportsConfig {
    fn default() -> Self {
        AirportsConfig {
            url: DEFAULT_AIRPORTS_URL.to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub time_zone: String,
    pub uid_domain: String,
    pub prod_id: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            time_zone: "Europe/Madrid".to_string(),
            uid_domain: "prograpedrito".to_string(),
            prod_id: "-//Roster Reports//Flight Schedule//EN".to_string(),
        }
    }
}

impl CalendarConfig {
    pub fn tz(&self) -> Result<Tz, RosterError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| RosterError::Config(format!("unknown time zone `{}`", self.time_zone)))
    }
}

/// Header names of the roster export.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub start: String,
    pub end: String,
    pub service: String,
    pub flight_number: String,
    pub departure: String,
    pub arrival: String,
    pub excluded_from_report: Vec<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            start: "Inicio".to_string(),
            end: "Fin".to_string(),
            service: "Servicio".to_string(),
            flight_number: "Nº Vue.".to_string(),
            departure: "Dep.".to_string(),
            arrival: "Arr.".to_string(),
            excluded_from_report: vec!["Función".to_string(), "Flota".to_string()],
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config, RosterError> {
        let config: Config =
            toml::from_str(text).map_err(|err| RosterError::Config(err.to_string()))?;
        // Fail early rather than at the first calendar export.
        config.calendar.tz()?;
        Ok(config)
    }

    /// Loads the TOML file at `path`, falling back to defaults when it does
    /// not exist.
    pub fn load(path: &Path) -> Result<Config, RosterError> {
        if !path.exists() {
            log::info!(
                "No configuration at {}, using defaults",
                path.display()
            );
            return Ok(Config::default());
        }
        let text = fs_err::read_to_string(path)?;
        Config::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.store.roster_file, "Consulta_de_servicios.csv");
        assert_eq!(config.columns.start, "Inicio");
        assert_eq!(config.calendar.tz().unwrap(), chrono_tz::Europe::Madrid);
        assert_eq!(config.store.kind, StoreKind::Local);
    }

    #[test]
    fn test_drive_store_section() {
        let config = Config::from_toml_str(
            r#"
            output_dir = "out"

            [store]
            kind = "drive"
            token_env = "DRIVE_TOKEN"
            folder = "1B8gnCmbBaGMBT77ba4ntjpZj_NkJcvuI"

            [columns]
            flight_number = "Flight"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.kind, StoreKind::Drive);
        assert_eq!(config.store.token_env, "DRIVE_TOKEN");
        assert_eq!(config.store.folder, "1B8gnCmbBaGMBT77ba4ntjpZj_NkJcvuI");
        assert_eq!(config.store.cdu_file, "CDU.csv");
        assert_eq!(config.columns.flight_number, "Flight");
        assert_eq!(config.columns.departure, "Dep.");
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_shipped_config_parses() {
        let config = Config::from_toml_str(include_str!("../config/roster.toml")).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.columns.excluded_from_report, vec!["Función", "Flota"]);
    }

    #[test]
    fn test_unknown_time_zone_is_rejected() {
        let err = Config::from_toml_str("[calendar]\ntime_zone = \"Mars/Olympus\"\n").unwrap_err();
        assert!(matches!(err, RosterError::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.calendar.time_zone, "Europe/Madrid");
    }
}
