//! Pipeline constants and runtime configuration defaults

// Preprocessing
/// Side length of the square model input
pub const DEFAULT_INPUT_SIZE: usize = 224;
/// Fraction of patches hidden from the encoder
pub const DEFAULT_MASK_RATIO: f32 = 0.75;
/// Per-channel mean used to standardize model input
pub const IMAGENET_DEFAULT_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel standard deviation used to standardize model input
pub const IMAGENET_DEFAULT_STD: [f32; 3] = [0.229, 0.224, 0.225];
/// Number of color channels the model consumes
pub const CHANNELS: usize = 3;

// Keeps flat patches from dividing by zero
/// Added to each per-patch standard deviation
pub const PATCH_NORM_EPSILON: f32 = 1e-6;

// Metrics
/// Absolute pixel difference below which a pixel counts as correct
pub const DEFAULT_ACCURACY_THRESHOLD: f32 = 0.05;

// Values at exactly 1.0 saturate in the saved reconstruction
/// Upper clip bound applied when writing the reconstruction
pub const DISPLAY_MAX: f32 = 0.996;

// Model selection
/// Architecture instantiated when none is named
pub const DEFAULT_MODEL: &str = "pretrain_mae_base_patch16_224";
/// Compute device used when none is named
pub const DEFAULT_DEVICE: &str = "cpu";
/// Top-level key holding the parameter map in pickle checkpoints
pub const DEFAULT_CHECKPOINT_KEY: &str = "model";
/// Stochastic depth rate, recorded but inactive at inference
pub const DEFAULT_DROP_PATH: f64 = 0.0;

/// Fixed seed for reproducible masks
pub const DEFAULT_SEED: u64 = 42;

// Output file names, all relative to the output root
/// Denormalized input image
pub const ORIGINAL_IMAGE_FILE: &str = "ori_img.jpg";
/// Reconstructed image
pub const RECONSTRUCTED_IMAGE_FILE: &str = "rec_img.jpg";
/// Reconstruction multiplied by the keep-mask
pub const OVERLAY_IMAGE_FILE: &str = "mask_img.jpg";
/// Overlay vs original, every patch
pub const OVERLAY_MSE_PLOT_FILE: &str = "mse_plot_mask.png";
/// Reconstruction vs original, every patch
pub const RECONSTRUCTED_MSE_PLOT_FILE: &str = "mse_plot_rec.png";
/// Overlay vs original, masked patches only
pub const MASKED_OVERLAY_MSE_PLOT_FILE: &str = "mse_plot_masked_patches.png";
/// Reconstruction vs original, masked patches only
pub const MASKED_RECONSTRUCTED_MSE_PLOT_FILE: &str = "mse_plot_reconstructed_patches.png";

/// Image extensions picked up when the target is a directory
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

// Plot settings
/// Plot bitmap size in pixels (width, height)
pub const PLOT_DIMENSIONS: (u32, u32) = (1500, 900);
/// Radius of the per-patch markers
pub const PLOT_MARKER_RADIUS: i32 = 3;
/// Font family used for captions, axis descriptions and tick labels
pub const PLOT_FONT_FAMILY: &str = "sans-serif";
/// Caption size in points
pub const PLOT_CAPTION_SIZE: u32 = 32;

// Progress bar display settings
/// Threshold for switching to batch progress mode
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
