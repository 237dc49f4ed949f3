use anyhow::Result;
use fs_err::File;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Creates a spinner shown while a blocking remote call is in flight.
pub fn spinner(message: &'static str) -> ProgressBar {
    let progress = ProgressBar::new_spinner().with_message(message);
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {spinner:.cyan/blue} {msg}") {
        progress.set_style(style);
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

pub fn write_output_file(output_directory: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf> {
    fs_err::create_dir_all(output_directory)?;
    let path = output_directory.join(file_name);
    println!("Writing to {}", path.display());
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(data)?;
    writer.flush()?;
    Ok(path)
}
