use candle_core::Device;

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::{info, warn};

#[cfg(not(any(feature = "metal", feature = "cuda")))]
use tracing::debug;

use super::error::EmbeddingError;

/// Picks the compute device for local model inference.
///
/// Tries Metal, then CUDA, depending on which features are compiled in, and falls back to
/// the CPU. Only a CPU fallback that itself fails would surface as an error.
pub fn select_device() -> Result<Device, EmbeddingError> {
    #[cfg(any(feature = "metal", feature = "cuda"))]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!("Cross-encoder using Metal");
            return Ok(device);
        }
        Err(e) => {
            warn!(error = %e, "Metal device unavailable");
            failures.push(format!("metal: {e}"));
        }
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("Cross-encoder using CUDA");
            return Ok(device);
        }
        Err(e) => {
            warn!(error = %e, "CUDA device unavailable");
            failures.push(format!("cuda: {e}"));
        }
    }

    #[cfg(any(feature = "metal", feature = "cuda"))]
    warn!(failures = %failures.join("; "), "Falling back to CPU device");

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    debug!("No GPU backend compiled, using CPU device");

    Ok(Device::Cpu)
}

/// Human-readable device label for logs.
pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    #[test]
    fn test_cpu_only_build_selects_cpu() {
        let device = select_device().unwrap();
        assert_eq!(device_label(&device), "cpu");
    }

    #[test]
    fn test_device_label_cpu() {
        assert_eq!(device_label(&Device::Cpu), "cpu");
    }
}
