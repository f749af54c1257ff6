// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Serpentine — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::{PureResult, Tensor, TensorError};
use std::collections::HashMap;

/// Named tensor owned by a module, optionally updated by gradient steps.
///
/// Trainability is decided at construction time. A frozen parameter keeps
/// accepting visits and stays in state dicts, but gradient accumulation and
/// update steps leave its value untouched.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    value: Tensor,
    gradient: Option<Tensor>,
    trainable: bool,
}

impl Parameter {
    /// Creates a new trainable parameter with the provided tensor value.
    pub fn new(name: impl Into<String>, value: Tensor) -> Self {
        Self {
            name: name.into(),
            value,
            gradient: None,
            trainable: true,
        }
    }

    /// Consumes the parameter, overriding its trainability.
    pub fn with_trainable(mut self, trainable: bool) -> Self {
        self.trainable = trainable;
        self
    }

    /// Returns the identifier assigned to the parameter.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overrides the parameter name.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Provides an immutable view into the underlying tensor value.
    pub fn value(&self) -> &Tensor {
        &self.value
    }

    /// Provides a mutable view into the underlying tensor value.
    pub fn value_mut(&mut self) -> &mut Tensor {
        &mut self.value
    }

    /// Returns the currently cached gradient, if any update was accumulated.
    pub fn gradient(&self) -> Option<&Tensor> {
        self.gradient.as_ref()
    }

    /// Returns whether an optimizer is permitted to update this parameter.
    pub fn trainable(&self) -> bool {
        self.trainable
    }

    fn assert_shape(&self, tensor: &Tensor) -> PureResult<()> {
        if self.value.shape() != tensor.shape() {
            return Err(TensorError::ShapeMismatch {
                left: self.value.shape(),
                right: tensor.shape(),
            });
        }
        Ok(())
    }

    /// Accumulates a Euclidean gradient update into the local buffer.
    ///
    /// Frozen parameters silently drop the update so gradients never flow
    /// into them.
    pub fn accumulate_euclidean(&mut self, update: &Tensor) -> PureResult<()> {
        self.assert_shape(update)?;
        if !self.trainable {
            return Ok(());
        }
        match self.gradient.as_mut() {
            Some(existing) => existing.add_scaled(update, 1.0)?,
            None => {
                self.gradient = Some(update.clone());
            }
        }
        Ok(())
    }

    /// Clears the cached gradient buffer.
    pub fn zero_gradient(&mut self) {
        if let Some(grad) = self.gradient.as_mut() {
            for value in grad.data_mut() {
                *value = 0.0;
            }
        }
    }

    /// Applies the accumulated gradient as one SGD step and clears the buffer.
    pub fn apply_step(&mut self, learning_rate: f32) -> PureResult<()> {
        if learning_rate <= 0.0 || !learning_rate.is_finite() {
            return Err(TensorError::NonPositiveLearningRate {
                rate: learning_rate,
            });
        }
        if !self.trainable {
            return Ok(());
        }
        if let Some(grad) = self.gradient.as_mut() {
            self.value.add_scaled(grad, -learning_rate)?;
            for value in grad.data_mut() {
                *value = 0.0;
            }
        }
        Ok(())
    }

    /// Replaces the parameter value with the provided tensor.
    pub fn load_value(&mut self, value: &Tensor) -> PureResult<()> {
        self.assert_shape(value)?;
        self.value = value.clone();
        Ok(())
    }
}

/// High-level module trait inspired by PyTorch's `nn.Module` but expressed in
/// pure Rust. Layers run a forward pass, hand-write their backward pass, and
/// expose their parameters to visitors so an external optimizer can enumerate
/// and update them.
pub trait Module {
    /// Runs a forward pass.
    fn forward(&self, input: &Tensor) -> PureResult<Tensor>;

    /// Propagates a gradient backwards. Implementations should populate the
    /// relevant parameter accumulators before returning the gradient with
    /// respect to `input`.
    fn backward(&mut self, input: &Tensor, grad_output: &Tensor) -> PureResult<Tensor>;

    /// Visits immutable parameters.
    fn visit_parameters(
        &self,
        visitor: &mut dyn FnMut(&Parameter) -> PureResult<()>,
    ) -> PureResult<()>;

    /// Visits mutable parameters.
    fn visit_parameters_mut(
        &mut self,
        visitor: &mut dyn FnMut(&mut Parameter) -> PureResult<()>,
    ) -> PureResult<()>;

    /// Applies every pending parameter update with the provided learning rate.
    fn apply_step(&mut self, learning_rate: f32) -> PureResult<()> {
        self.visit_parameters_mut(&mut |param| param.apply_step(learning_rate))
    }

    /// Clears accumulators across every parameter.
    fn zero_accumulators(&mut self) -> PureResult<()> {
        self.visit_parameters_mut(&mut |param| {
            param.zero_gradient();
            Ok(())
        })
    }

    /// Counts the parameters an optimizer is allowed to update.
    fn trainable_parameters(&self) -> PureResult<usize> {
        let mut count = 0usize;
        self.visit_parameters(&mut |param| {
            if param.trainable() {
                count += 1;
            }
            Ok(())
        })?;
        Ok(count)
    }

    /// Captures a copy of every parameter tensor keyed by its canonical name.
    fn state_dict(&self) -> PureResult<HashMap<String, Tensor>> {
        let mut state = HashMap::new();
        self.visit_parameters(&mut |param| {
            state.insert(param.name().to_string(), param.value().clone());
            Ok(())
        })?;
        Ok(state)
    }

    /// Restores parameters from a state dictionary produced by [`Module::state_dict`].
    fn load_state_dict(&mut self, state: &HashMap<String, Tensor>) -> PureResult<()> {
        self.visit_parameters_mut(&mut |param| {
            let Some(value) = state.get(param.name()) else {
                return Err(TensorError::MissingParameter {
                    name: param.name().to_string(),
                });
            };
            param.load_value(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_accumulates_and_steps() {
        let mut param = Parameter::new("gate", Tensor::zeros(1, 3).unwrap());
        let update = Tensor::from_vec(1, 3, vec![1.0, -2.0, 0.5]).unwrap();
        param.accumulate_euclidean(&update).unwrap();
        param.accumulate_euclidean(&update).unwrap();
        assert_eq!(param.gradient().unwrap().data(), &[2.0, -4.0, 1.0]);

        param.apply_step(0.5).unwrap();
        assert_eq!(param.value().data(), &[-1.0, 2.0, -0.5]);
        assert_eq!(param.gradient().unwrap().squared_l2_norm(), 0.0);
    }

    #[test]
    fn frozen_parameter_ignores_updates() {
        let mut param =
            Parameter::new("gate", Tensor::from_vec(1, 2, vec![1.5, -0.5]).unwrap())
                .with_trainable(false);
        let update = Tensor::from_vec(1, 2, vec![1.0, 1.0]).unwrap();
        param.accumulate_euclidean(&update).unwrap();
        assert!(param.gradient().is_none());

        param.apply_step(0.1).unwrap();
        assert_eq!(param.value().data(), &[1.5, -0.5]);
    }

    #[test]
    fn parameter_rejects_mismatched_updates() {
        let mut param = Parameter::new("gate", Tensor::zeros(1, 2).unwrap());
        let update = Tensor::zeros(1, 3).unwrap();
        assert!(matches!(
            param.accumulate_euclidean(&update),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn apply_step_validates_learning_rate() {
        let mut param = Parameter::new("gate", Tensor::zeros(1, 2).unwrap());
        assert!(matches!(
            param.apply_step(0.0),
            Err(TensorError::NonPositiveLearningRate { .. })
        ));
        assert!(param.apply_step(f32::NAN).is_err());
    }
}
