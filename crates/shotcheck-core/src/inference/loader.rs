//! Weight loading for candle models.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use once_cell::sync::OnceCell;
use safetensors::tensor::TensorView;
use safetensors::SafeTensors;
use tracing::{debug, info};

/// Builds a model from its weights.
pub type ModelBuilder<T> = fn(VarBuilder) -> Result<T>;

/// A model whose weights are read on first use.
///
/// A failed load leaves the cell empty, so the next call retries.
pub struct LazyModel<T> {
    path: PathBuf,
    device: Device,
    builder: ModelBuilder<T>,
    model: OnceCell<T>,
}

impl<T: Send + Sync> LazyModel<T> {
    /// Creates a loader for the weights at `path`. Nothing is read yet.
    #[must_use]
    pub fn new(path: impl AsRef<Path>, device: Device, builder: ModelBuilder<T>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            device,
            builder,
            model: OnceCell::new(),
        }
    }

    /// Returns the model, loading it on first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are missing, malformed, or rejected by
    /// the builder.
    pub fn get(&self) -> Result<&T> {
        self.model.get_or_try_init(|| {
            let vb = load_safetensors(&self.path, &self.device)?;
            let model = (self.builder)(vb)?;
            info!(path = %self.path.display(), "model loaded");
            Ok(model)
        })
    }

    /// Path to the weights file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Device the weights are placed on.
    #[must_use]
    pub const fn device(&self) -> &Device {
        &self.device
    }

    /// Whether the weights have been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}

/// Reads a safetensors file into a `VarBuilder` on `device`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds an unsupported dtype.
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading safetensors");

    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read weights: {}", path.display()))?;
    let archive = SafeTensors::deserialize(&bytes)
        .with_context(|| format!("malformed safetensors: {}", path.display()))?;

    let tensors = archive
        .tensors()
        .into_iter()
        .map(|(name, view)| {
            let tensor = to_tensor(&view, device)
                .with_context(|| format!("failed to load tensor '{name}'"))?;
            Ok((name, tensor))
        })
        .collect::<Result<HashMap<String, Tensor>>>()?;
    debug!(count = tensors.len(), "tensors loaded");

    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

fn to_tensor(view: &TensorView<'_>, device: &Device) -> Result<Tensor> {
    let dtype = match view.dtype() {
        safetensors::Dtype::F32 => DType::F32,
        safetensors::Dtype::F16 => DType::F16,
        safetensors::Dtype::BF16 => DType::BF16,
        safetensors::Dtype::F64 => DType::F64,
        safetensors::Dtype::I64 => DType::I64,
        safetensors::Dtype::U32 => DType::U32,
        safetensors::Dtype::U8 => DType::U8,
        other => bail!("unsupported dtype {other:?}"),
    };
    Ok(Tensor::from_raw_buffer(
        view.data(),
        dtype,
        view.shape(),
        device,
    )?)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn weights_file(values: &[f32], shape: Vec<usize>) -> NamedTempFile {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        let view = TensorView::new(safetensors::Dtype::F32, shape, bytes).expect("tensor view");
        let serialized = safetensors::serialize([("proj.weight", view)], &None).expect("serialize");

        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&serialized).expect("write");
        file
    }

    fn sum_weights(vb: VarBuilder) -> Result<f32> {
        let t = vb.get((2, 2), "proj.weight")?;
        Ok(t.sum_all()?.to_scalar::<f32>()?)
    }

    #[test]
    fn test_load_safetensors() {
        let file = weights_file(&[1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        let vb = load_safetensors(file.path(), &Device::Cpu).expect("load");
        let sum = sum_weights(vb).expect("tensor");
        assert!((sum - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_safetensors_missing_file() {
        assert!(load_safetensors("/nonexistent/weights.safetensors", &Device::Cpu).is_err());
    }

    #[test]
    fn test_load_safetensors_garbage() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"not a safetensors file").expect("write");
        assert!(load_safetensors(file.path(), &Device::Cpu).is_err());
    }

    #[test]
    fn test_lazy_model_loads_once() {
        let file = weights_file(&[0.5; 4], vec![2, 2]);
        let lazy = LazyModel::new(file.path(), Device::Cpu, sum_weights);
        assert!(!lazy.is_loaded());

        let sum = *lazy.get().expect("first load");
        assert!((sum - 2.0).abs() < f32::EPSILON);
        assert!(lazy.is_loaded());
        assert!(lazy.get().is_ok());
    }

    #[test]
    fn test_lazy_model_failure_leaves_cell_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("late.safetensors");
        let lazy = LazyModel::new(&path, Device::Cpu, sum_weights);

        assert!(lazy.get().is_err());
        assert!(!lazy.is_loaded());

        let file = weights_file(&[1.0; 4], vec![2, 2]);
        std::fs::copy(file.path(), &path).expect("copy");
        assert!(lazy.get().is_ok(), "retry after weights appear");
    }
}
