use crate::error::{EvotraderError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Loads feature tables produced by the indicator pipeline.
pub struct FrameLoader;

impl FrameLoader {
    /// Load a CSV or Arrow IPC (Feather) file, picked by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Self::load_csv(path),
            "arrow" | "ipc" | "feather" => Self::load_ipc(path),
            other => Err(EvotraderError::DataLoading(format!(
                "Unsupported feature file extension '{}' for {}",
                other,
                path.display()
            ))),
        }
    }

    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()
            .map_err(|e| EvotraderError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    pub fn load_ipc<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        let df = IpcReader::new(file)
            .finish()
            .map_err(|e| EvotraderError::DataLoading(format!("Failed to read IPC: {}", e)))?;

        Ok(df)
    }
}
