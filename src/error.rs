use thiserror::Error;

/// A timestamp cell that matched none of the accepted layouts, or that names
/// a local time the configured zone skips.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse date `{input}`")]
pub struct DateFormatError {
    pub input: String,
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    DateFormat(#[from] DateFormatError),

    #[error("row {row}, column `{column}`: {source}")]
    InvalidDate {
        row: usize,
        column: String,
        #[source]
        source: DateFormatError,
    },

    #[error("file `{file_name}` was not found in folder `{folder}`")]
    SourceUnavailable { folder: String, file_name: String },

    #[error("no services found for {month}/{year} with the selected criteria")]
    EmptyResult { month: u32, year: i32 },

    #[error("remote store access failed: {0}")]
    RemoteAccess(String),

    #[error("roster has no `{0}` column")]
    MissingColumn(String),

    #[error("row {row}: end `{end}` is before start `{start}`")]
    InconsistentRow {
        row: usize,
        start: String,
        end: String,
    },

    #[error("invalid roster import: {0}")]
    InvalidImport(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not render document: {0}")]
    Render(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RosterError {
    /// Missing sources and empty selections are reported to the user but do
    /// not fail the process.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RosterError::SourceUnavailable { .. } | RosterError::EmptyResult { .. }
        )
    }
}

impl From<reqwest::Error> for RosterError {
    fn from(err: reqwest::Error) -> Self {
        RosterError::RemoteAccess(err.to_string())
    }
}
