// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Serpentine — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Periodic parametric activation and the module surface around it.
//!
//! The centrepiece is [`Snake`], an elementwise activation that adds a
//! sine-squared ripple with a learnable per-channel frequency on top of
//! identity. The crate ships the `nn.Module`-style trait, parameter
//! bookkeeping with a trainability flag, a couple of supporting layers so
//! the activation can sit inside a larger differentiable graph, and
//! JSON/bincode snapshots for module state.

pub mod init;
pub mod io;
pub mod layers;
pub mod loss;
pub mod module;

pub use init::{AlphaInit, DEFAULT_FREQUENCY_RATE};
pub use io::{load_bincode, load_json, save_bincode, save_json};
pub use layers::{Linear, Sequential, Snake};
pub use loss::{Loss, MeanSquaredError};
pub use module::{Module, Parameter};

pub use serpentine_tensor::{PureResult, Tensor, TensorError};
