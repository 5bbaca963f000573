use super::PolicyStore;
use crate::engines::policy::{Matrix, Policy};
use crate::error::{EvotraderError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

const HIDDEN_FILE: &str = "hidden.arrow";
const WIDTH_COLUMN: &str = "width";

/// Stores each policy as a directory of Arrow IPC frames:
///
/// ```text
/// <root>/<symbol>/<signature>/hidden.arrow      one `width` row per hidden layer
///                             weights{i}.arrow  one column per matrix column
///                             biases{i}.arrow   single column
/// ```
///
/// A save is staged in a sibling directory and swapped in afterwards, so a crash mid-write
/// leaves the previous checkpoint readable.
pub struct IpcPolicyStore {
    root: PathBuf,
}

impl IpcPolicyStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy_dir(&self, symbol: &str, signature: &str) -> PathBuf {
        self.root.join(symbol).join(signature)
    }

    fn write_frame(path: &Path, mut df: DataFrame) -> Result<()> {
        let mut file = File::create(path)?;
        IpcWriter::new(&mut file).finish(&mut df)?;
        Ok(())
    }

    fn read_frame(path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            EvotraderError::Persistence(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Ok(IpcReader::new(file).finish()?)
    }

    fn matrix_to_frame(matrix: &Matrix) -> Result<DataFrame> {
        let columns: Vec<Column> = (0..matrix.cols())
            .map(|c| {
                let values: Vec<f64> = (0..matrix.rows()).map(|r| matrix.get(r, c)).collect();
                Column::new(format!("c{}", c).into(), values)
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    fn frame_to_matrix(df: &DataFrame, path: &Path) -> Result<Matrix> {
        let rows = df.height();
        let cols = df.width();
        let mut data = vec![0.0; rows * cols];

        for c in 0..cols {
            let name = format!("c{}", c);
            let column = df.column(&name)?.cast(&DataType::Float64)?;
            let values = column.f64()?;
            for r in 0..rows {
                data[r * cols + c] = values.get(r).ok_or_else(|| {
                    EvotraderError::Persistence(format!(
                        "Null value at ({}, {}) in {}",
                        r,
                        c,
                        path.display()
                    ))
                })?;
            }
        }

        Matrix::from_vec(rows, cols, data)
    }

    fn read_architecture(dir: &Path) -> Result<Vec<usize>> {
        let path = dir.join(HIDDEN_FILE);
        let df = Self::read_frame(&path)?;
        let column = df.column(WIDTH_COLUMN)?.cast(&DataType::Int64)?;

        column
            .i64()?
            .into_iter()
            .map(|w| match w {
                Some(w) if w > 0 => Ok(w as usize),
                other => Err(EvotraderError::Persistence(format!(
                    "Invalid hidden width {:?} in {}",
                    other,
                    path.display()
                ))),
            })
            .collect()
    }

    fn write_policy(dir: &Path, policy: &Policy) -> Result<()> {
        let widths: Vec<i64> = policy.architecture().iter().map(|w| *w as i64).collect();
        let hidden = DataFrame::new(vec![Column::new(WIDTH_COLUMN.into(), widths)])?;
        Self::write_frame(&dir.join(HIDDEN_FILE), hidden)?;

        for (i, (w, b)) in policy.weights().iter().zip(policy.biases()).enumerate() {
            Self::write_frame(&dir.join(format!("weights{}.arrow", i)), Self::matrix_to_frame(w)?)?;
            Self::write_frame(&dir.join(format!("biases{}.arrow", i)), Self::matrix_to_frame(b)?)?;
        }
        Ok(())
    }
}

impl PolicyStore for IpcPolicyStore {
    fn save(&self, symbol: &str, signature: &str, policy: &Policy) -> Result<()> {
        let target = self.policy_dir(symbol, signature);
        let parent = self.root.join(symbol);
        let staging = parent.join(format!(".{}.staging", signature));
        let retired = parent.join(format!(".{}.retired", signature));

        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;
        Self::write_policy(&staging, policy)?;

        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }
        if target.exists() {
            fs::rename(&target, &retired)?;
        }
        fs::rename(&staging, &target)?;
        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }

        log::debug!("Stored policy {:?} at {}", policy.architecture(), target.display());
        Ok(())
    }

    fn load(&self, symbol: &str, signature: &str) -> Result<Option<Policy>> {
        let mut dir = self.policy_dir(symbol, signature);
        if !dir.is_dir() {
            // a crash between the two renames leaves only the retired copy
            let retired = self.root.join(symbol).join(format!(".{}.retired", signature));
            if !retired.is_dir() {
                return Ok(None);
            }
            dir = retired;
        }

        let architecture = Self::read_architecture(&dir)?;
        let layers = architecture.len() + 1;
        let mut weights = Vec::with_capacity(layers);
        let mut biases = Vec::with_capacity(layers);
        for i in 0..layers {
            let weights_path = dir.join(format!("weights{}.arrow", i));
            let biases_path = dir.join(format!("biases{}.arrow", i));
            weights.push(Self::frame_to_matrix(&Self::read_frame(&weights_path)?, &weights_path)?);
            biases.push(Self::frame_to_matrix(&Self::read_frame(&biases_path)?, &biases_path)?);
        }

        let input_size = weights.first().map(|w| w.cols()).unwrap_or(0);
        Policy::from_parts(input_size, architecture, weights, biases).map(Some)
    }
}
