//! Run configuration. Every field has a default, so a JSON file only needs
//! the values it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_MODEL_FILE: &str = "barzooka.onnx";
pub const DEFAULT_SCRATCH_DIR: &str = "./tmp/";

// ImageNet statistics, which the classifier's backbone was trained with.
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenerConfig
{
    pub model: ModelConfig,
    pub raster: RasterConfig,
    /// Parent of the per-document scratch directories. Created if missing.
    pub scratch_dir: PathBuf,
}

impl Default for ScreenerConfig
{
    fn default() -> Self
    {
        ScreenerConfig {
            model: ModelConfig::default(),
            raster: RasterConfig::default(),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
        }
    }
}

impl ScreenerConfig
{
    /// Reads a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, Error>
    {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        serde_json::from_str(&contents).map_err(|source| Error::ConfigFile { path: path.to_path_buf(), source })
    }

    pub fn validate(&self) -> Result<(), Error>
    {
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(Error::Config("scratch folder argument missing".to_string()));
        }
        self.model.validate()?;
        self.raster.validate()
    }
}

/// Input and output contract of the ONNX export of the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig
{
    pub path: PathBuf,
    pub input_name: String,
    pub output_name: String,
    /// Images are resized to `input_size` x `input_size` before inference.
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    /// A class is accepted when its score is strictly greater than this.
    pub threshold: f32,
    /// Set when the model emits logits rather than probabilities.
    pub apply_sigmoid: bool,
    pub intra_threads: usize,
}

impl Default for ModelConfig
{
    fn default() -> Self
    {
        ModelConfig {
            path: PathBuf::from(DEFAULT_MODEL_FILE),
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            input_size: 560,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
            threshold: 0.5,
            apply_sigmoid: true,
            intra_threads: 4,
        }
    }
}

impl ModelConfig
{
    pub fn validate(&self) -> Result<(), Error>
    {
        if self.input_size == 0 {
            return Err(Error::Config("model input_size must be greater than 0".to_string()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(Error::Config(format!("model threshold must lie in (0, 1), got {}", self.threshold)));
        }
        if self.std.iter().any(|std| *std == 0.0 || !std.is_finite()) {
            return Err(Error::Config("model std values must be finite and non-zero".to_string()));
        }
        if self.intra_threads == 0 {
            return Err(Error::Config("model intra_threads must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat
{
    Jpeg,
    Png,
}

impl RasterFormat
{
    /// Flag passed to pdftocairo.
    pub fn flag(self) -> &'static str
    {
        match self
        {
            RasterFormat::Jpeg => "-jpeg",
            RasterFormat::Png => "-png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RasterConfig
{
    pub program: PathBuf,
    /// Pages are scaled to `scale` x `scale` pixels.
    pub scale: u32,
    pub format: RasterFormat,
}

impl Default for RasterConfig
{
    fn default() -> Self
    {
        RasterConfig {
            program: PathBuf::from("pdftocairo"),
            scale: 560,
            format: RasterFormat::Jpeg,
        }
    }
}

impl RasterConfig
{
    pub fn validate(&self) -> Result<(), Error>
    {
        if self.program.as_os_str().is_empty() {
            return Err(Error::Config("rasterizer program missing".to_string()));
        }
        if self.scale == 0 {
            return Err(Error::Config("raster scale must be greater than 0".to_string()));
        }
        Ok(())
    }
}
