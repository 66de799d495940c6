use anyhow::{bail, Result};
use candle_core::{DType, Tensor};

/// Mean over the unmasked tokens of `hidden` ([B,T,H]) using `attention_mask`
/// ([B,T]), optionally followed by L2 normalization. Returns [B,H].
pub fn masked_mean(hidden: &Tensor, attention_mask: &Tensor, l2_normalize: bool) -> Result<Tensor> {
    let (batch, _time, hidden_dim) = match hidden.dims() {
        &[b, t, h] => (b, t, h),
        dims => bail!("hidden shape must be [B,T,H], got {dims:?}"),
    };

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_broadcast = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let sum = (hidden * &mask_broadcast)?.sum(1)?;
    // An all-padding row would divide by zero; clamp the token count at 1.
    let lengths = mask.sum_keepdim(1)?.maximum(1f64)?;
    let mut mean = sum.broadcast_div(&lengths)?;

    if l2_normalize {
        let eps_val = match hidden.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
        let eps = Tensor::new(&[eps_val], hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(0)?;
        let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.broadcast_add(&eps)?;
        mean = mean.broadcast_div(&norm)?;
    }
    debug_assert_eq!(mean.dims(), &[batch, hidden_dim]);
    Ok(mean)
}
