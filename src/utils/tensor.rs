//! Tensor helpers
use tch::Tensor;

/// Scale factor that bounds the global norm of a gradient set.
///
/// Returns `1.0` when the joint norm of `grads` is within `max_norm`,
/// otherwise `max_norm / global_norm` so that rescaling every gradient by the
/// result preserves direction while capping the overall magnitude.
pub fn global_norm_clip_scale(grads: &[Tensor], max_norm: f64) -> f64 {
    let global_norm = global_norm(grads);
    if global_norm > max_norm {
        max_norm / (global_norm + 1e-6)
    } else {
        1.0
    }
}

/// Rescale `grads` in place so that their joint norm is at most `max_norm`.
pub fn clip_by_global_norm(grads: &[Tensor], max_norm: f64) {
    let scale = global_norm_clip_scale(grads, max_norm);
    if scale >= 1.0 {
        return;
    }
    tch::no_grad(|| {
        for grad in grads {
            let scaled: Tensor = grad * scale;
            grad.shallow_clone().copy_(&scaled);
        }
    });
}

/// Joint L2 norm of a set of tensors.
pub fn global_norm(tensors: &[Tensor]) -> f64 {
    tensors
        .iter()
        .map(|t| {
            let norm = f64::from(t.norm());
            norm * norm
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_norm_of_unit_vectors() {
        let tensors = [Tensor::of_slice(&[3.0_f32]), Tensor::of_slice(&[4.0_f32])];
        assert!((global_norm(&tensors) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn no_clip_below_threshold() {
        let grads = [Tensor::of_slice(&[0.3_f32, 0.4])];
        assert_eq!(global_norm_clip_scale(&grads, 1.0), 1.0);
    }

    #[test]
    fn clips_to_threshold() {
        let grads = [Tensor::of_slice(&[3.0_f32, 4.0])];
        let scale = global_norm_clip_scale(&grads, 1.0);
        assert!((scale * 5.0 - 1.0).abs() < 1e-4);
    }

    #[test]
    fn clip_rescales_in_place() {
        let grads = [Tensor::of_slice(&[3.0_f32, 4.0])];
        clip_by_global_norm(&grads, 1.0);
        assert!((global_norm(&grads) - 1.0).abs() < 1e-4);
        let values = Vec::<f32>::from(&grads[0]);
        // Direction is preserved
        assert!((values[1] / values[0] - 4.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn clip_below_threshold_is_identity() {
        let grads = [Tensor::of_slice(&[0.3_f32, 0.4])];
        clip_by_global_norm(&grads, 1.0);
        assert_eq!(Vec::<f32>::from(&grads[0]), vec![0.3, 0.4]);
    }
}
