//! Compute device selection.

use candle_core::Device;
use tracing::info;

/// Picks the device the embedding model runs on.
///
/// GPU backends are only tried when the crate is built with the `metal` or
/// `cuda` feature; otherwise, and whenever the GPU cannot be opened, the CPU
/// is used.
#[must_use]
pub fn get_device() -> Device {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!("embedding on Metal");
            return device;
        }
        Err(err) => tracing::debug!(%err, "Metal unavailable"),
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("embedding on CUDA");
            return device;
        }
        Err(err) => tracing::debug!(%err, "CUDA unavailable"),
    }

    info!("embedding on CPU");
    Device::Cpu
}
