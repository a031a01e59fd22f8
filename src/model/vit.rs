//! Vision transformer building blocks shared by the MAE encoder and decoder
//!
//! Parameter names follow the pretraining checkpoints: `proj`, `qkv`,
//! `q_bias`, `v_bias`, `norm1`, `mlp.fc1` and so on.

use candle_core::{Device, Module, Result, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, LayerNorm, Linear, VarBuilder, layer_norm, linear};

/// Non-overlapping patch projection as a strided convolution
#[derive(Debug)]
pub struct PatchEmbed {
    proj: Conv2d,
}

impl PatchEmbed {
    /// Load the projection from `proj.weight` and `proj.bias`
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are missing or mis-shaped
    pub fn load(
        vb: VarBuilder<'_>,
        in_channels: usize,
        dim: usize,
        patch_size: usize,
    ) -> Result<Self> {
        let conv_config = Conv2dConfig {
            stride: patch_size,
            ..Default::default()
        };
        let proj = candle_nn::conv2d(in_channels, dim, patch_size, conv_config, vb.pp("proj"))?;
        Ok(Self { proj })
    }
}

impl Module for PatchEmbed {
    fn forward(&self, pixel_values: &Tensor) -> Result<Tensor> {
        // [b, c, h, w] -> [b, dim, h/p, w/p] -> [b, n, dim]
        self.proj.forward(pixel_values)?.flatten_from(2)?.transpose(1, 2)
    }
}

/// Multi-head self-attention with learned query and value biases
///
/// The key bias is fixed at zero, matching how the checkpoints store only
/// `q_bias` and `v_bias` next to a bias-free `qkv` projection.
#[derive(Debug)]
pub struct Attention {
    qkv: Linear,
    proj: Linear,
    num_heads: usize,
    scale: f64,
}

impl Attention {
    /// Load attention weights for a `dim`-wide token stream
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are missing or mis-shaped
    pub fn load(vb: VarBuilder<'_>, dim: usize, num_heads: usize) -> Result<Self> {
        let qkv_weight = vb.pp("qkv").get((3 * dim, dim), "weight")?;
        let q_bias = vb.get(dim, "q_bias")?;
        let v_bias = vb.get(dim, "v_bias")?;
        let k_bias = q_bias.zeros_like()?;
        let qkv_bias = Tensor::cat(&[&q_bias, &k_bias, &v_bias], 0)?;
        let qkv = Linear::new(qkv_weight, Some(qkv_bias));

        let proj = linear(dim, dim, vb.pp("proj"))?;
        let scale = 1. / ((dim / num_heads) as f64).sqrt();

        Ok(Self {
            qkv,
            proj,
            num_heads,
            scale,
        })
    }
}

impl Module for Attention {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (b, n, c) = xs.dims3()?;
        let qkv = self
            .qkv
            .forward(xs)?
            .reshape((b, n, 3, self.num_heads, c / self.num_heads))?
            .permute((2, 0, 3, 1, 4))?; // 3, b, h, n, d
        let q = (qkv.get(0)?.contiguous()? * self.scale)?;
        let k = qkv.get(1)?.contiguous()?;
        let v = qkv.get(2)?.contiguous()?;
        let attn = candle_nn::ops::softmax_last_dim(&q.matmul(&k.t()?)?)?;
        let attn = attn.matmul(&v)?.transpose(1, 2)?.reshape((b, n, c))?;
        self.proj.forward(&attn)
    }
}

/// Two-layer feed-forward network with exact GELU
#[derive(Debug)]
pub struct Mlp {
    fc1: Linear,
    fc2: Linear,
}

impl Mlp {
    /// Load `fc1` and `fc2`
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are missing or mis-shaped
    pub fn load(vb: VarBuilder<'_>, dim: usize, hidden: usize) -> Result<Self> {
        let fc1 = linear(dim, hidden, vb.pp("fc1"))?;
        let fc2 = linear(hidden, dim, vb.pp("fc2"))?;
        Ok(Self { fc1, fc2 })
    }
}

impl Module for Mlp {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.fc2.forward(&self.fc1.forward(xs)?.gelu_erf()?)
    }
}

/// Pre-norm transformer block
#[derive(Debug)]
pub struct Block {
    norm1: LayerNorm,
    attn: Attention,
    norm2: LayerNorm,
    mlp: Mlp,
}

impl Block {
    /// Load one block
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are missing or mis-shaped
    pub fn load(
        vb: VarBuilder<'_>,
        dim: usize,
        num_heads: usize,
        mlp_ratio: usize,
        eps: f64,
    ) -> Result<Self> {
        Ok(Self {
            norm1: layer_norm(dim, eps, vb.pp("norm1"))?,
            attn: Attention::load(vb.pp("attn"), dim, num_heads)?,
            norm2: layer_norm(dim, eps, vb.pp("norm2"))?,
            mlp: Mlp::load(vb.pp("mlp"), dim, dim * mlp_ratio)?,
        })
    }
}

impl Module for Block {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = (xs + self.attn.forward(&self.norm1.forward(xs)?)?)?;
        &xs + self.mlp.forward(&self.norm2.forward(&xs)?)?
    }
}

/// Load `depth` blocks under `blocks.{i}`
///
/// # Errors
///
/// Returns an error if any block fails to load
pub fn load_blocks(
    vb: &VarBuilder<'_>,
    depth: usize,
    dim: usize,
    num_heads: usize,
    mlp_ratio: usize,
    eps: f64,
) -> Result<Vec<Block>> {
    let blocks_vb = vb.pp("blocks");
    (0..depth)
        .map(|i| Block::load(blocks_vb.pp(i.to_string()), dim, num_heads, mlp_ratio, eps))
        .collect()
}

/// Fixed sinusoidal position table shaped `[1, positions, dim]`
///
/// Even columns hold `sin(pos / 10000^(2*(j/2)/dim))`, odd columns the cosine.
///
/// # Errors
///
/// Returns an error if the tensor cannot be allocated on the device
pub fn sinusoid_table(positions: usize, dim: usize, device: &Device) -> Result<Tensor> {
    let mut values = Vec::with_capacity(positions * dim);
    for pos in 0..positions {
        for j in 0..dim {
            let exponent = 2.0 * (j / 2) as f64 / dim as f64;
            let angle = pos as f64 / 10000f64.powf(exponent);
            let value = if j % 2 == 0 { angle.sin() } else { angle.cos() };
            values.push(value as f32);
        }
    }
    Tensor::from_vec(values, (1, positions, dim), device)
}

/// Keep only the selected token positions of a `[b, n, c]` stream
///
/// # Errors
///
/// Returns an error if an index is out of range
pub fn select_tokens(tokens: &Tensor, indices: &Tensor) -> Result<Tensor> {
    tokens.index_select(indices, 1)?.contiguous()
}

/// Last `count` tokens of a `[b, n, c]` stream
///
/// # Errors
///
/// Returns an error if fewer than `count` tokens are present
pub fn last_tokens(tokens: &Tensor, count: usize) -> Result<Tensor> {
    let total = tokens.dim(1)?;
    tokens.narrow(1, total.saturating_sub(count), count)?.contiguous()
}
