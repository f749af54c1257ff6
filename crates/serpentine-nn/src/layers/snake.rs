// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Serpentine — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::init::AlphaInit;
use crate::module::{Module, Parameter};
use crate::{PureResult, Tensor, TensorError};

/// Periodic activation that adds a sine-squared ripple on top of identity:
/// `x + (1/alpha) * sin^2(alpha * x)`, applied elementwise with a learnable
/// per-channel frequency `alpha`.
///
/// Higher frequencies produce tighter ripples; the default initialiser draws
/// each channel's frequency from `Exp(0.1)` so a freshly built layer covers a
/// mixture of frequencies. `alpha` trains along with the rest of the model
/// unless the layer was constructed frozen.
///
/// Zero is outside the valid frequency range because the ripple term divides
/// by `alpha`. The layer rejects a zero frequency with
/// [`TensorError::ZeroFrequency`] both at construction and at apply time
/// instead of letting `NaN`s propagate.
#[derive(Debug)]
pub struct Snake {
    in_features: usize,
    alpha: Parameter,
}

impl Snake {
    /// Creates a layer with randomly mixed frequencies, trainable by default.
    pub fn new(name: impl Into<String>, in_features: usize) -> PureResult<Self> {
        Self::with_init(name, in_features, AlphaInit::default(), true, None)
    }

    /// Creates a layer with every channel fixed to the same frequency.
    pub fn with_alpha(
        name: impl Into<String>,
        in_features: usize,
        alpha: f32,
    ) -> PureResult<Self> {
        Self::with_init(name, in_features, AlphaInit::fixed(alpha), true, None)
    }

    /// Fully-specified constructor: initialisation policy, trainability, and
    /// an optional deterministic seed for the random branch.
    pub fn with_init(
        name: impl Into<String>,
        in_features: usize,
        init: AlphaInit,
        trainable: bool,
        seed: Option<u64>,
    ) -> PureResult<Self> {
        if in_features == 0 {
            return Err(TensorError::InvalidDimensions {
                rows: 1,
                cols: in_features,
            });
        }
        let name = name.into();
        let values = init.materialise(in_features, seed)?;
        Ok(Self {
            in_features,
            alpha: Parameter::new(format!("{name}::alpha"), values).with_trainable(trainable),
        })
    }

    /// Number of channels the layer was built for.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns the frequency parameter.
    pub fn alpha(&self) -> &Parameter {
        &self.alpha
    }

    fn guard_input(&self, input: &Tensor) -> PureResult<()> {
        if input.is_empty() {
            return Err(TensorError::EmptyInput("snake_forward"));
        }
        if input.shape().1 != self.in_features {
            return Err(TensorError::ShapeMismatch {
                left: input.shape(),
                right: (1, self.in_features),
            });
        }
        Ok(())
    }

    fn guard_alpha(&self) -> PureResult<()> {
        for (index, value) in self.alpha.value().data().iter().enumerate() {
            if *value == 0.0 {
                return Err(TensorError::ZeroFrequency { index });
            }
        }
        Ok(())
    }
}

impl Module for Snake {
    fn forward(&self, input: &Tensor) -> PureResult<Tensor> {
        self.guard_input(input)?;
        self.guard_alpha()?;
        let (rows, cols) = input.shape();
        let alpha = self.alpha.value().data();
        let values = input.data();
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            let offset = r * cols;
            for c in 0..cols {
                let a = alpha[c];
                let x = values[offset + c];
                let s = (a * x).sin();
                data.push(x + s * s / a);
            }
        }
        Tensor::from_vec(rows, cols, data)
    }

    fn backward(&mut self, input: &Tensor, grad_output: &Tensor) -> PureResult<Tensor> {
        self.guard_input(input)?;
        self.guard_alpha()?;
        if input.shape() != grad_output.shape() {
            return Err(TensorError::ShapeMismatch {
                left: input.shape(),
                right: grad_output.shape(),
            });
        }
        let (rows, cols) = input.shape();
        let alpha = self.alpha.value().data().to_vec();
        let values = input.data();
        let grads = grad_output.data();

        let mut grad_input = Vec::with_capacity(rows * cols);
        let mut grad_alpha = vec![0.0f32; cols];
        for r in 0..rows {
            let offset = r * cols;
            for c in 0..cols {
                let a = alpha[c];
                let x = values[offset + c];
                let g = grads[offset + c];
                let s = (a * x).sin();
                let double = (2.0 * a * x).sin();
                grad_input.push(g * (1.0 + double));
                grad_alpha[c] += g * ((x / a) * double - s * s / (a * a));
            }
        }

        let batch = rows as f32;
        let grad_alpha_tensor = Tensor::from_vec(1, cols, grad_alpha)?.scale(1.0 / batch)?;
        self.alpha.accumulate_euclidean(&grad_alpha_tensor)?;
        Tensor::from_vec(rows, cols, grad_input)
    }

    fn visit_parameters(
        &self,
        visitor: &mut dyn FnMut(&Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        visitor(&self.alpha)?;
        Ok(())
    }

    fn visit_parameters_mut(
        &mut self,
        visitor: &mut dyn FnMut(&mut Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        visitor(&mut self.alpha)?;
        Ok(())
    }
}
