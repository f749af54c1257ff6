// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Serpentine — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::module::Module;
use crate::{PureResult, Tensor, TensorError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredTensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl StoredTensor {
    fn from_tensor(tensor: &Tensor) -> StoredTensor {
        StoredTensor {
            rows: tensor.shape().0,
            cols: tensor.shape().1,
            data: tensor.data().to_vec(),
        }
    }

    fn into_tensor(self) -> PureResult<Tensor> {
        Tensor::from_vec(self.rows, self.cols, self.data)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ModuleSnapshot {
    parameters: HashMap<String, StoredTensor>,
}

fn to_snapshot<M: Module + ?Sized>(module: &M) -> PureResult<ModuleSnapshot> {
    let state = module.state_dict()?;
    let mut parameters = HashMap::new();
    for (name, tensor) in state {
        parameters.insert(name, StoredTensor::from_tensor(&tensor));
    }
    Ok(ModuleSnapshot { parameters })
}

fn from_snapshot(snapshot: ModuleSnapshot) -> PureResult<HashMap<String, Tensor>> {
    let mut state = HashMap::new();
    for (name, tensor) in snapshot.parameters.into_iter() {
        state.insert(name, tensor.into_tensor()?);
    }
    Ok(state)
}

fn io_error(err: std::io::Error) -> TensorError {
    TensorError::IoError {
        message: err.to_string(),
    }
}

fn serde_error(err: impl ToString) -> TensorError {
    TensorError::SerializationError {
        message: err.to_string(),
    }
}

/// Persists every parameter of a module as pretty-printed JSON.
pub fn save_json<M: Module + ?Sized, P: AsRef<Path>>(module: &M, path: P) -> PureResult<()> {
    let snapshot = to_snapshot(module)?;
    let file = File::create(path.as_ref()).map_err(io_error)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &snapshot).map_err(serde_error)?;
    Ok(())
}

/// Restores module parameters from a JSON snapshot produced by [`save_json`].
pub fn load_json<M: Module + ?Sized, P: AsRef<Path>>(module: &mut M, path: P) -> PureResult<()> {
    let file = File::open(path.as_ref()).map_err(io_error)?;
    let reader = BufReader::new(file);
    let snapshot: ModuleSnapshot = serde_json::from_reader(reader).map_err(serde_error)?;
    let state = from_snapshot(snapshot)?;
    module.load_state_dict(&state)
}

/// Persists every parameter of a module as compact bincode.
pub fn save_bincode<M: Module + ?Sized, P: AsRef<Path>>(module: &M, path: P) -> PureResult<()> {
    let snapshot = to_snapshot(module)?;
    let file = File::create(path.as_ref()).map_err(io_error)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, &snapshot).map_err(serde_error)?;
    Ok(())
}

/// Restores module parameters from a bincode snapshot produced by
/// [`save_bincode`].
pub fn load_bincode<M: Module + ?Sized, P: AsRef<Path>>(
    module: &mut M,
    path: P,
) -> PureResult<()> {
    let file = File::open(path.as_ref()).map_err(io_error)?;
    let reader = BufReader::new(file);
    let snapshot: ModuleSnapshot = bincode::deserialize_from(reader).map_err(serde_error)?;
    let state = from_snapshot(snapshot)?;
    module.load_state_dict(&state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::snake::Snake;

    fn scratch_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "serpentine-io-{}-{}",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn json_snapshot_round_trips_alpha() {
        let source = Snake::with_alpha("act", 3, 2.25).unwrap();
        let path = scratch_path("json");
        save_json(&source, &path).unwrap();

        let mut restored = Snake::with_alpha("act", 3, 1.0).unwrap();
        load_json(&mut restored, &path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(restored.alpha().value().data(), &[2.25, 2.25, 2.25]);
    }

    #[test]
    fn bincode_snapshot_round_trips_alpha() {
        let source = Snake::with_alpha("act", 2, -0.5).unwrap();
        let path = scratch_path("bincode");
        save_bincode(&source, &path).unwrap();

        let mut restored = Snake::with_alpha("act", 2, 1.0).unwrap();
        load_bincode(&mut restored, &path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(restored.alpha().value().data(), &[-0.5, -0.5]);
    }

    #[test]
    fn loading_a_missing_parameter_fails() {
        let source = Snake::with_alpha("act", 2, 1.5).unwrap();
        let path = scratch_path("missing");
        save_json(&source, &path).unwrap();

        let mut restored = Snake::with_alpha("other", 2, 1.0).unwrap();
        let err = load_json(&mut restored, &path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            err,
            Err(TensorError::MissingParameter { .. })
        ));
    }
}
