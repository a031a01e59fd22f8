//! Pretraining masked autoencoder: ViT encoder over visible patches and a
//! narrow decoder that predicts the pixels of the masked ones

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{LayerNorm, Linear, VarBuilder, layer_norm, linear, linear_no_bias};
use ndarray::{Array2, Array3};

use crate::io::error::{Result, model_error, shape_mismatch};
use crate::model::Reconstructor;
use crate::model::config::MaeConfig;
use crate::model::vit::{
    Block, PatchEmbed, last_tokens, load_blocks, select_tokens, sinusoid_table,
};
use crate::patch::PatchMask;

/// Encoder over visible tokens
#[derive(Debug)]
pub struct Encoder {
    patch_embed: PatchEmbed,
    blocks: Vec<Block>,
    norm: LayerNorm,
    embed_dim: usize,
}

impl Encoder {
    fn load(vb: &VarBuilder<'_>, config: &MaeConfig) -> candle_core::Result<Self> {
        Ok(Self {
            patch_embed: PatchEmbed::load(
                vb.pp("patch_embed"),
                config.in_channels,
                config.encoder_embed_dim,
                config.patch_size,
            )?,
            blocks: load_blocks(
                vb,
                config.encoder_depth,
                config.encoder_embed_dim,
                config.encoder_num_heads,
                config.mlp_ratio,
                config.layer_norm_eps,
            )?,
            norm: layer_norm(config.encoder_embed_dim, config.layer_norm_eps, vb.pp("norm"))?,
            embed_dim: config.encoder_embed_dim,
        })
    }

    /// Embed the full image, then run the blocks on the visible tokens only
    fn forward(&self, pixel_values: &Tensor, visible: &Tensor) -> candle_core::Result<Tensor> {
        let tokens = self.patch_embed.forward(pixel_values)?;
        let positions = tokens.dim(1)?;
        let pos_embed = sinusoid_table(positions, self.embed_dim, tokens.device())?;
        let tokens = tokens.broadcast_add(&pos_embed)?;

        let mut xs = select_tokens(&tokens, visible)?;
        for block in &self.blocks {
            xs = block.forward(&xs)?;
        }
        self.norm.forward(&xs)
    }
}

/// Decoder predicting one patch vector per trailing token
#[derive(Debug)]
pub struct Decoder {
    blocks: Vec<Block>,
    norm: LayerNorm,
    head: Linear,
}

impl Decoder {
    fn load(vb: &VarBuilder<'_>, config: &MaeConfig) -> candle_core::Result<Self> {
        Ok(Self {
            blocks: load_blocks(
                vb,
                config.decoder_depth,
                config.decoder_embed_dim,
                config.decoder_num_heads,
                config.mlp_ratio,
                config.layer_norm_eps,
            )?,
            norm: layer_norm(config.decoder_embed_dim, config.layer_norm_eps, vb.pp("norm"))?,
            head: linear(
                config.decoder_embed_dim,
                config.decoder_num_classes,
                vb.pp("head"),
            )?,
        })
    }

    fn forward(&self, tokens: &Tensor, return_tokens: usize) -> candle_core::Result<Tensor> {
        let mut xs = tokens.clone();
        for block in &self.blocks {
            xs = block.forward(&xs)?;
        }
        let xs = last_tokens(&xs, return_tokens)?;
        self.head.forward(&self.norm.forward(&xs)?)
    }
}

/// Complete pretraining MAE
#[derive(Debug)]
pub struct MaeModel {
    config: MaeConfig,
    encoder: Encoder,
    encoder_to_decoder: Linear,
    mask_token: Tensor,
    decoder: Decoder,
    device: Device,
}

impl MaeModel {
    /// Build the model from a parameter source laid out as `encoder.*`,
    /// `encoder_to_decoder.weight`, `mask_token` and `decoder.*`
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is missing or has the wrong shape
    pub fn load(vb: &VarBuilder<'_>, config: MaeConfig) -> candle_core::Result<Self> {
        let encoder = Encoder::load(&vb.pp("encoder"), &config)?;
        let encoder_to_decoder = linear_no_bias(
            config.encoder_embed_dim,
            config.decoder_embed_dim,
            vb.pp("encoder_to_decoder"),
        )?;
        let mask_token = vb.get((1, 1, config.decoder_embed_dim), "mask_token")?;
        let decoder = Decoder::load(&vb.pp("decoder"), &config)?;

        Ok(Self {
            config,
            encoder,
            encoder_to_decoder,
            mask_token,
            decoder,
            device: vb.device().clone(),
        })
    }

    /// Architecture this model was built from
    pub const fn config(&self) -> &MaeConfig {
        &self.config
    }

    /// Device holding the weights
    pub const fn device(&self) -> &Device {
        &self.device
    }

    /// Predict masked patches for a `[1, 3, H, W]` batch
    ///
    /// `visible` and `masked` are `u32` patch indices in ascending order.
    /// Returns `[1, masked, decoder_num_classes]`.
    ///
    /// # Errors
    ///
    /// Returns an error if any tensor operation fails
    pub fn forward(
        &self,
        pixel_values: &Tensor,
        visible: &Tensor,
        masked: &Tensor,
    ) -> candle_core::Result<Tensor> {
        let x_vis = self.encoder.forward(pixel_values, visible)?;
        let x_vis = self.encoder_to_decoder.forward(&x_vis)?;

        let positions = visible.dim(0)? + masked.dim(0)?;
        let pos_embed = sinusoid_table(positions, self.config.decoder_embed_dim, &self.device)?;
        let pos_visible = select_tokens(&pos_embed, visible)?;
        let pos_masked = select_tokens(&pos_embed, masked)?;

        let visible_tokens = x_vis.broadcast_add(&pos_visible)?;
        let masked_tokens = pos_masked.broadcast_add(&self.mask_token)?;
        let tokens = Tensor::cat(&[&visible_tokens, &masked_tokens], 1)?;

        self.decoder.forward(&tokens, masked.dim(0)?)
    }

    fn index_tensor(&self, indices: &[usize]) -> candle_core::Result<Tensor> {
        let indices: Vec<u32> = indices.iter().map(|&index| index as u32).collect();
        let len = indices.len();
        Tensor::from_vec(indices, len, &self.device)
    }
}

impl Reconstructor for MaeModel {
    fn patch_size(&self) -> usize {
        self.config.patch_size
    }

    fn reconstruct(&self, image: &Array3<f32>, mask: &PatchMask) -> Result<Array2<f32>> {
        let (channels, height, width) = image.dim();
        let patch = self.config.patch_size;
        if channels != self.config.in_channels || height % patch != 0 || width % patch != 0 {
            return Err(shape_mismatch(
                "model input",
                &format!("({}, k*{patch}, k*{patch})", self.config.in_channels),
                &image.dim(),
            ));
        }
        let patches = (height / patch) * (width / patch);
        if mask.len() != patches {
            return Err(shape_mismatch("model mask", &patches, &mask.len()));
        }

        let data: Vec<f32> = image.iter().copied().collect();
        let pixel_values = Tensor::from_vec(data, (1, channels, height, width), &self.device)
            .map_err(model_error("input upload"))?;
        let visible = self
            .index_tensor(&mask.visible_indices())
            .map_err(model_error("mask upload"))?;
        let masked = self
            .index_tensor(&mask.masked_indices())
            .map_err(model_error("mask upload"))?;

        let predictions = self
            .forward(&pixel_values, &visible, &masked)
            .map_err(model_error("forward pass"))?;

        let rows = predictions
            .squeeze(0)
            .and_then(|p| p.to_dtype(DType::F32))
            .and_then(|p| p.to_device(&Device::Cpu))
            .and_then(|p| p.to_vec2::<f32>())
            .map_err(model_error("prediction download"))?;

        let count = rows.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec(
            (count, self.config.decoder_num_classes),
            flat,
        )?)
    }
}
