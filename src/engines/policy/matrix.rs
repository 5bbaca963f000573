use crate::error::{EvotraderError, Result};
use rand::Rng;

/// Dense row-major `f64` matrix. Column vectors are matrices with one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(EvotraderError::shape(
                "matrix data",
                format!("{} values for {}x{}", rows * cols, rows, cols),
                data.len(),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Entries drawn independently from U[-1, 1].
    pub fn random_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data = (0..rows * cols).map(|_| rng.gen_range(-1.0..=1.0)).collect();
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// `self · input + bias`, where `bias` is a `(rows, 1)` column.
    pub fn affine(&self, input: &[f64], bias: &Matrix) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.cols);
        debug_assert_eq!(bias.shape(), (self.rows, 1));

        (0..self.rows)
            .map(|r| {
                let dot: f64 = self.row(r).iter().zip(input).map(|(w, x)| w * x).sum();
                dot + bias.data[r]
            })
            .collect()
    }
}
