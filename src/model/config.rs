//! Architecture hyper-parameters for the pretraining MAE family

use crate::io::error::{Result, invalid_parameter};

/// Hyper-parameters of an MAE encoder/decoder pair
#[derive(Debug, Clone, PartialEq)]
pub struct MaeConfig {
    /// Registry name of the architecture
    pub name: String,
    /// Side length of one patch in pixels
    pub patch_size: usize,
    /// Input channels
    pub in_channels: usize,
    /// Encoder token width
    pub encoder_embed_dim: usize,
    /// Encoder transformer blocks
    pub encoder_depth: usize,
    /// Encoder attention heads
    pub encoder_num_heads: usize,
    /// Decoder token width
    pub decoder_embed_dim: usize,
    /// Decoder transformer blocks
    pub decoder_depth: usize,
    /// Decoder attention heads
    pub decoder_num_heads: usize,
    /// Width of each decoder prediction (`patch_size² × in_channels`)
    pub decoder_num_classes: usize,
    /// Hidden width of the MLP relative to the token width
    pub mlp_ratio: usize,
    /// LayerNorm epsilon
    pub layer_norm_eps: f64,
    /// Stochastic depth rate; only meaningful during training
    pub drop_path_rate: f64,
}

/// Names accepted by [`MaeConfig::from_name`]
pub const ARCHITECTURES: [&str; 3] = [
    "pretrain_mae_small_patch16_224",
    "pretrain_mae_base_patch16_224",
    "pretrain_mae_large_patch16_224",
];

impl MaeConfig {
    fn patch16(
        name: &str,
        encoder: (usize, usize, usize),
        decoder: (usize, usize, usize),
    ) -> Self {
        Self {
            name: name.to_string(),
            patch_size: 16,
            in_channels: 3,
            encoder_embed_dim: encoder.0,
            encoder_depth: encoder.1,
            encoder_num_heads: encoder.2,
            decoder_embed_dim: decoder.0,
            decoder_depth: decoder.1,
            decoder_num_heads: decoder.2,
            decoder_num_classes: 16 * 16 * 3,
            mlp_ratio: 4,
            layer_norm_eps: 1e-6,
            drop_path_rate: 0.0,
        }
    }

    /// ViT-S encoder with a 192-wide decoder
    pub fn small() -> Self {
        Self::patch16("pretrain_mae_small_patch16_224", (384, 12, 6), (192, 4, 3))
    }

    /// ViT-B encoder with a 384-wide decoder
    pub fn base() -> Self {
        Self::patch16("pretrain_mae_base_patch16_224", (768, 12, 12), (384, 4, 6))
    }

    /// ViT-L encoder with a 512-wide decoder
    pub fn large() -> Self {
        Self::patch16("pretrain_mae_large_patch16_224", (1024, 24, 16), (512, 8, 8))
    }

    /// Look up an architecture by registry name
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not one of [`ARCHITECTURES`]
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "pretrain_mae_small_patch16_224" => Ok(Self::small()),
            "pretrain_mae_base_patch16_224" => Ok(Self::base()),
            "pretrain_mae_large_patch16_224" => Ok(Self::large()),
            _ => Err(invalid_parameter(
                "model",
                &name,
                &format!("expected one of {}", ARCHITECTURES.join(", ")),
            )),
        }
    }

    /// Set the stochastic depth rate
    #[must_use]
    pub const fn with_drop_path(mut self, rate: f64) -> Self {
        self.drop_path_rate = rate;
        self
    }

    /// Check internal consistency of the dimensions
    ///
    /// # Errors
    ///
    /// Returns an error if a head count does not divide its token width or
    /// the decoder output is not one full patch
    pub fn validate(&self) -> Result<()> {
        if self.encoder_num_heads == 0 || self.encoder_embed_dim % self.encoder_num_heads != 0 {
            return Err(invalid_parameter(
                "encoder_num_heads",
                &self.encoder_num_heads,
                &format!("must divide encoder width {}", self.encoder_embed_dim),
            ));
        }
        if self.decoder_num_heads == 0 || self.decoder_embed_dim % self.decoder_num_heads != 0 {
            return Err(invalid_parameter(
                "decoder_num_heads",
                &self.decoder_num_heads,
                &format!("must divide decoder width {}", self.decoder_embed_dim),
            ));
        }
        let patch_dim = self.patch_size * self.patch_size * self.in_channels;
        if self.decoder_num_classes != patch_dim {
            return Err(invalid_parameter(
                "decoder_num_classes",
                &self.decoder_num_classes,
                &format!("must equal patch_size² × channels = {patch_dim}"),
            ));
        }
        Ok(())
    }
}
