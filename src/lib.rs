//! Screens publication PDFs and images for the kind of statistical graph they
//! contain, using a pretrained multi-label image classifier.

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod document;
pub mod error;
pub mod labels;
pub mod output;
pub mod prediction;
pub mod preprocessing;
pub mod rasterize;
pub mod screener;

pub use classifier::{Classifier, OnnxClassifier};
pub use config::{ModelConfig, RasterConfig, RasterFormat, ScreenerConfig};
pub use error::{ClassifierError, Error, RasterizeError};
pub use labels::{GraphType, CLASSES};
pub use prediction::{BatchPrediction, ClassCounts, DocumentPrediction, PageLabels, RawPrediction};
pub use rasterize::{Pdftocairo, Rasterizer, ScratchPages};
pub use screener::{Barzooka, CorpusReport, SkippedDocument};
