// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Serpentine — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::{PureResult, Tensor, TensorError};

/// Rate of the exponential distribution used when no fixed frequency is
/// requested. Mean frequency is `1 / DEFAULT_FREQUENCY_RATE = 10`.
pub const DEFAULT_FREQUENCY_RATE: f32 = 0.1;

/// Initialisation policy for a per-channel frequency vector.
///
/// Replaces the optional-scalar convention where an absent value silently
/// switches to random sampling; here the choice is spelled out at the call
/// site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaInit {
    /// Every channel starts at the same fixed frequency.
    Fixed(f32),
    /// Each channel draws an independent frequency from `Exp(rate)`,
    /// yielding a mixture of frequencies across channels.
    Exponential { rate: f32 },
}

impl Default for AlphaInit {
    fn default() -> Self {
        AlphaInit::Exponential {
            rate: DEFAULT_FREQUENCY_RATE,
        }
    }
}

impl AlphaInit {
    /// Constant-fill initialisation.
    pub fn fixed(value: f32) -> Self {
        AlphaInit::Fixed(value)
    }

    /// Random initialisation with an explicit, validated rate.
    pub fn exponential(rate: f32) -> PureResult<Self> {
        if !rate.is_finite() {
            return Err(TensorError::InvalidValue {
                label: "exponential_rate",
            });
        }
        if rate <= 0.0 {
            return Err(TensorError::NonPositiveRate { rate });
        }
        Ok(AlphaInit::Exponential { rate })
    }

    /// Resolves the policy into a `(1, features)` frequency tensor.
    ///
    /// A fixed frequency of exactly zero is rejected here rather than left
    /// to blow up at apply time; the same zero guard runs again during the
    /// forward pass in case an optimizer drives a channel to zero later.
    pub fn materialise(&self, features: usize, seed: Option<u64>) -> PureResult<Tensor> {
        if features == 0 {
            return Err(TensorError::InvalidDimensions {
                rows: 1,
                cols: features,
            });
        }
        match *self {
            AlphaInit::Fixed(value) => {
                if !value.is_finite() {
                    return Err(TensorError::InvalidValue {
                        label: "fixed_frequency",
                    });
                }
                if value == 0.0 {
                    return Err(TensorError::ZeroFrequency { index: 0 });
                }
                Tensor::from_vec(1, features, vec![value; features])
            }
            AlphaInit::Exponential { rate } => {
                Tensor::random_exponential(1, features, rate, seed)
            }
        }
    }
}
