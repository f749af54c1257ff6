// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Serpentine — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Dense CPU tensor engine consumed by the Serpentine neural crates.
//!
//! Tensors are row-major `(rows, cols)` containers of `f32` values with the
//! elementwise and matrix arithmetic the module layer needs. Random
//! constructors accept an optional seed and otherwise defer to the
//! workspace-wide determinism configuration.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand_distr::Exp;
use serpentine_config::determinism;
use std::fmt;

/// Result alias shared by every fallible tensor operation.
pub type PureResult<T> = Result<T, TensorError>;

/// Error vocabulary shared across the tensor engine and the module layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorError {
    /// A tensor constructor received an invalid shape.
    InvalidDimensions { rows: usize, cols: usize },
    /// Data provided to a constructor or operator does not match the tensor shape.
    DataLength { expected: usize, got: usize },
    /// An operator was asked to combine tensors of incompatible shapes.
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Rate parameters of sampling distributions must stay positive.
    NonPositiveRate { rate: f32 },
    /// Learning rate must be positive when applying parameter updates.
    NonPositiveLearningRate { rate: f32 },
    /// A periodic frequency entry is exactly zero; its reciprocal is undefined.
    ZeroFrequency { index: usize },
    /// Computation received an empty input which would otherwise trigger a panic.
    EmptyInput(&'static str),
    /// Attempted to load or update a parameter that was missing from the state dict.
    MissingParameter { name: String },
    /// Wrapper around I/O failures when persisting or restoring tensors.
    IoError { message: String },
    /// Wrapper around serde failures when deserialising tensors.
    SerializationError { message: String },
    /// Generic configuration violation for numeric helpers.
    InvalidValue { label: &'static str },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorError::InvalidDimensions { rows, cols } => {
                write!(
                    f,
                    "invalid tensor dimensions ({rows} x {cols}); both axes must be non-zero"
                )
            }
            TensorError::DataLength { expected, got } => {
                write!(f, "data length mismatch: expected {expected}, got {got}")
            }
            TensorError::ShapeMismatch { left, right } => {
                write!(
                    f,
                    "shape mismatch: left={left:?}, right={right:?} cannot be combined"
                )
            }
            TensorError::NonPositiveRate { rate } => {
                write!(f, "distribution rate must be positive, got {rate}")
            }
            TensorError::NonPositiveLearningRate { rate } => {
                write!(f, "learning rate must be positive, got {rate}")
            }
            TensorError::ZeroFrequency { index } => {
                write!(
                    f,
                    "frequency entry {index} is exactly zero; the periodic term divides by it"
                )
            }
            TensorError::EmptyInput(label) => {
                write!(f, "computation {label} received an empty input")
            }
            TensorError::MissingParameter { name } => {
                write!(f, "parameter {name} is missing from the state dict")
            }
            TensorError::IoError { message } => write!(f, "io failure: {message}"),
            TensorError::SerializationError { message } => {
                write!(f, "serialization failure: {message}")
            }
            TensorError::InvalidValue { label } => {
                write!(f, "invalid value for {label}")
            }
        }
    }
}

impl std::error::Error for TensorError {}

/// Row-major dense matrix of `f32` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Tensor {
    fn seedable_rng(seed: Option<u64>, label: &str) -> StdRng {
        determinism::rng_from_optional(seed, label)
    }

    fn guard_shape(rows: usize, cols: usize) -> PureResult<()> {
        if rows == 0 || cols == 0 {
            return Err(TensorError::InvalidDimensions { rows, cols });
        }
        Ok(())
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> PureResult<Self> {
        Self::guard_shape(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        })
    }

    /// Create a tensor from raw data. The provided vector must match
    /// `rows * cols` elements.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> PureResult<Self> {
        Self::guard_shape(rows, cols)?;
        if data.len() != rows * cols {
            return Err(TensorError::DataLength {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Construct a tensor by applying a generator function to each coordinate.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> PureResult<Self>
    where
        F: FnMut(usize, usize) -> f32,
    {
        Self::guard_shape(rows, cols)?;
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Ok(Self { rows, cols, data })
    }

    /// Construct a tensor by sampling a uniform distribution in `[min, max)`.
    ///
    /// When `seed` is provided the RNG becomes deterministic which makes tests
    /// and benchmarks reproducible. Otherwise entropy from the host is used.
    pub fn random_uniform(
        rows: usize,
        cols: usize,
        min: f32,
        max: f32,
        seed: Option<u64>,
    ) -> PureResult<Self> {
        Self::guard_shape(rows, cols)?;
        if !(min < max) {
            return Err(TensorError::InvalidValue {
                label: "random_uniform_bounds",
            });
        }
        let mut rng = Self::seedable_rng(seed, "serpentine-tensor/tensor/uniform");
        let distribution = Uniform::new(min, max);
        let mut data = Vec::with_capacity(rows * cols);
        for _ in 0..rows * cols {
            data.push(distribution.sample(&mut rng));
        }
        Ok(Self { rows, cols, data })
    }

    /// Construct a tensor by sampling an exponential distribution with the
    /// provided rate parameter (mean `1 / rate`).
    ///
    /// The support of the distribution is the strictly positive reals, which
    /// makes it the canonical initialiser for frequency-style parameters.
    pub fn random_exponential(
        rows: usize,
        cols: usize,
        rate: f32,
        seed: Option<u64>,
    ) -> PureResult<Self> {
        Self::guard_shape(rows, cols)?;
        if !rate.is_finite() {
            return Err(TensorError::InvalidValue {
                label: "exponential_rate",
            });
        }
        if rate <= 0.0 {
            return Err(TensorError::NonPositiveRate { rate });
        }
        let mut rng = Self::seedable_rng(seed, "serpentine-tensor/tensor/exponential");
        let distribution =
            Exp::new(rate).map_err(|_| TensorError::NonPositiveRate { rate })?;
        let mut data = Vec::with_capacity(rows * cols);
        for _ in 0..rows * cols {
            data.push(distribution.sample(&mut rng));
        }
        Ok(Self { rows, cols, data })
    }

    /// Returns the `(rows, cols)` pair of the tensor.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of stored elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Immutable view of the underlying storage.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the underlying storage.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    fn assert_same_shape(&self, other: &Tensor) -> PureResult<()> {
        if self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    /// Elementwise addition.
    pub fn add(&self, other: &Tensor) -> PureResult<Tensor> {
        self.assert_same_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a + b)
            .collect();
        Tensor::from_vec(self.rows, self.cols, data)
    }

    /// Elementwise subtraction.
    pub fn sub(&self, other: &Tensor) -> PureResult<Tensor> {
        self.assert_same_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a - b)
            .collect();
        Tensor::from_vec(self.rows, self.cols, data)
    }

    /// Multiplies every element by a scalar.
    pub fn scale(&self, value: f32) -> PureResult<Tensor> {
        let data = self.data.iter().map(|a| a * value).collect();
        Tensor::from_vec(self.rows, self.cols, data)
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, other: &Tensor) -> PureResult<Tensor> {
        self.assert_same_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .collect();
        Tensor::from_vec(self.rows, self.cols, data)
    }

    /// Adds `scale * other` into `self` in place.
    pub fn add_scaled(&mut self, other: &Tensor, scale: f32) -> PureResult<()> {
        self.assert_same_shape(other)?;
        for (dst, src) in self.data.iter_mut().zip(other.data.iter()) {
            *dst += src * scale;
        }
        Ok(())
    }

    /// Adds a per-column bias vector to every row in place.
    pub fn add_row_inplace(&mut self, bias: &[f32]) -> PureResult<()> {
        if bias.len() != self.cols {
            return Err(TensorError::DataLength {
                expected: self.cols,
                got: bias.len(),
            });
        }
        for r in 0..self.rows {
            let offset = r * self.cols;
            for c in 0..self.cols {
                self.data[offset + c] += bias[c];
            }
        }
        Ok(())
    }

    /// Dense matrix multiplication.
    pub fn matmul(&self, other: &Tensor) -> PureResult<Tensor> {
        if self.cols != other.rows {
            return Err(TensorError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let mut out = vec![0.0f32; self.rows * other.cols];
        for r in 0..self.rows {
            for k in 0..self.cols {
                let lhs = self.data[r * self.cols + k];
                if lhs == 0.0 {
                    continue;
                }
                let row_offset = k * other.cols;
                let out_offset = r * other.cols;
                for c in 0..other.cols {
                    out[out_offset + c] += lhs * other.data[row_offset + c];
                }
            }
        }
        Tensor::from_vec(self.rows, other.cols, out)
    }

    /// Returns the transposed tensor.
    pub fn transpose(&self) -> Tensor {
        let mut data = vec![0.0f32; self.rows * self.cols];
        for r in 0..self.rows {
            for c in 0..self.cols {
                data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        Tensor {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Sums every row, producing one value per column.
    pub fn sum_axis0(&self) -> Vec<f32> {
        let mut sums = vec![0.0f32; self.cols];
        for r in 0..self.rows {
            let offset = r * self.cols;
            for c in 0..self.cols {
                sums[c] += self.data[offset + c];
            }
        }
        sums
    }

    /// Squared L2 norm over every element.
    pub fn squared_l2_norm(&self) -> f32 {
        self.data.iter().map(|v| v * v).sum()
    }
}
