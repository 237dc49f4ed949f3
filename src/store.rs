use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::PathBuf;

use super::config::{StoreConfig, StoreKind};
use super::error::RosterError;
use super::records::RawTable;
use super::utils::spinner;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const CSV_MIME: &str = "text/csv";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A file located by `RemoteStore::find`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHandle {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub enum WriteTarget {
    Existing(FileHandle),
    New { folder: String, file_name: String },
}

/// Where the roster and CDU files live.
pub trait RemoteStore {
    fn find(&self, folder: &str, file_name: &str) -> Result<Option<FileHandle>, RosterError>;
    fn read_all(&self, handle: &FileHandle) -> Result<Vec<u8>, RosterError>;
    fn write_all(&self, target: WriteTarget, contents: &[u8]) -> Result<(), RosterError>;
}

pub fn open(config: &StoreConfig) -> Result<Box<dyn RemoteStore>, RosterError> {
    match config.kind {
        StoreKind::Local => Ok(Box::new(LocalFolderStore::new(config.root.clone()))),
        StoreKind::Drive => {
            let token = std::env::var(&config.token_env).map_err(|_| {
                RosterError::RemoteAccess(format!(
                    "credentials not found: set the {} environment variable",
                    config.token_env
                ))
            })?;
            Ok(Box::new(DriveStore::new(token)))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: SourceEncoding,
}

/// UTF-8 first; anything that is not valid UTF-8 is read as Latin-1, which
/// accepts every byte.
pub fn decode_table(bytes: &[u8]) -> DecodedText {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedText {
            text: text.to_string(),
            encoding: SourceEncoding::Utf8,
        },
        Err(err) => {
            log::warn!("File is not valid UTF-8 ({err}), decoding as Latin-1");
            DecodedText {
                text: encoding_rs::mem::decode_latin1(bytes).into_owned(),
                encoding: SourceEncoding::Latin1,
            }
        }
    }
}

/// Reads and decodes a CSV file from the store, `None` when it is absent.
pub fn read_table(
    store: &dyn RemoteStore,
    folder: &str,
    file_name: &str,
) -> Result<Option<RawTable>, RosterError> {
    let Some(handle) = store.find(folder, file_name)? else {
        return Ok(None);
    };
    let progress = spinner("Downloading from the store...");
    let bytes = store.read_all(&handle);
    progress.finish_and_clear();
    let decoded = decode_table(&bytes?);
    log::debug!("Read {} as {:?}", handle.name, decoded.encoding);
    Ok(Some(RawTable::from_csv(&decoded.text)?))
}

/// Writes `table` as UTF-8 CSV, replacing the file when it exists.
pub fn write_table(
    store: &dyn RemoteStore,
    folder: &str,
    file_name: &str,
    table: &RawTable,
) -> Result<(), RosterError> {
    let csv = table.to_csv()?;
    let target = match store.find(folder, file_name)? {
        Some(handle) => WriteTarget::Existing(handle),
        None => WriteTarget::New {
            folder: folder.to_string(),
            file_name: file_name.to_string(),
        },
    };
    let progress = spinner("Uploading to the store...");
    let written = store.write_all(target, csv.as_bytes());
    progress.finish_and_clear();
    written
}

/// Folders are directories below `root`.
pub struct LocalFolderStore {
    root: PathBuf,
}

impl LocalFolderStore {
    pub fn new(root: PathBuf) -> Self {
        LocalFolderStore { root }
    }
}

impl RemoteStore for LocalFolderStore {
    fn find(&self, folder: &str, file_name: &str) -> Result<Option<FileHandle>, RosterError> {
        let path = self.root.join(folder).join(file_name);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(FileHandle {
            id: path.to_string_lossy().into_owned(),
            name: file_name.to_string(),
        }))
    }

    fn read_all(&self, handle: &FileHandle) -> Result<Vec<u8>, RosterError> {
        Ok(fs_err::read(&handle.id)?)
    }

    fn write_all(&self, target: WriteTarget, contents: &[u8]) -> Result<(), RosterError> {
        let path = match target {
            WriteTarget::Existing(handle) => PathBuf::from(handle.id),
            WriteTarget::New { folder, file_name } => {
                let directory = self.root.join(folder);
                fs_err::create_dir_all(&directory)?;
                directory.join(file_name)
            }
        };
        fs_err::write(path, contents)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

/// Google Drive v3 over REST, authenticated with a bearer token obtained
/// elsewhere.
pub struct DriveStore {
    client: Client,
    token: String,
}

impl DriveStore {
    pub fn new(token: String) -> Self {
        DriveStore {
            client: Client::new(),
            token,
        }
    }

    fn upload_media(&self, file_id: &str, contents: &[u8]) -> Result<(), RosterError> {
        self.client
            .patch(format!("{DRIVE_UPLOAD_URL}/{file_id}"))
            .query(&[("uploadType", "media")])
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, CSV_MIME)
            .body(contents.to_vec())
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

/// Drive query string literals escape backslashes and single quotes.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn find_query(folder: &str, file_name: &str) -> String {
    format!(
        "'{}' in parents and name = '{}' and trashed = false",
        escape_query_literal(folder),
        escape_query_literal(file_name)
    )
}

impl RemoteStore for DriveStore {
    fn find(&self, folder: &str, file_name: &str) -> Result<Option<FileHandle>, RosterError> {
        let list: FileList = self
            .client
            .get(DRIVE_FILES_URL)
            .query(&[
                ("q", find_query(folder, file_name).as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name)"),
            ])
            .bearer_auth(&self.token)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(list.files.into_iter().next().map(|file| FileHandle {
            id: file.id,
            name: file.name,
        }))
    }

    fn read_all(&self, handle: &FileHandle) -> Result<Vec<u8>, RosterError> {
        let bytes = self
            .client
            .get(format!("{DRIVE_FILES_URL}/{}", handle.id))
            .query(&[("alt", "media")])
            .bearer_auth(&self.token)
            .send()?
            .error_for_status()?
            .bytes()?;
        Ok(bytes.to_vec())
    }

    fn write_all(&self, target: WriteTarget, contents: &[u8]) -> Result<(), RosterError> {
        match target {
            WriteTarget::Existing(handle) => self.upload_media(&handle.id, contents),
            WriteTarget::New { folder, file_name } => {
                let metadata = serde_json::json!({
                    "name": file_name,
                    "parents": [folder],
                    "mimeType": CSV_MIME,
                });
                let created: DriveFile = self
                    .client
                    .post(DRIVE_FILES_URL)
                    .bearer_auth(&self.token)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(metadata.to_string())
                    .send()?
                    .error_for_status()?
                    .json()?;
                log::info!("Created {} ({}) in the store", created.name, created.id);
                self.upload_media(&created.id, contents)
            }
        }
    }
}
