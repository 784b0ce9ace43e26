use std::path::PathBuf;
use std::process::ExitStatus;

/// Crate-level error.
///
/// Configuration and I/O problems are surfaced to the caller as-is.
/// Rasterizer, classifier and image decoding failures are tied to a single
/// document, and the corpus loop isolates exactly those (see [`Error::is_document_failure`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to load configuration from {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Rasterize(#[from] RasterizeError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("Failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error
{
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self
    {
        Error::Io { path: path.into(), source }
    }

    /// True for failures that belong to one document rather than to the run:
    /// the rasterizer, the classifier, or an undecodable page image.
    pub fn is_document_failure(&self) -> bool
    {
        matches!(self, Error::Rasterize(_) | Error::Classifier(_) | Error::Image { .. })
    }
}

/// Failures of the external PDF rasterization tool.
#[derive(Debug, thiserror::Error)]
pub enum RasterizeError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status} for {pdf}: {stderr}")]
    Failed {
        program: PathBuf,
        pdf: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Failed to read rasterized pages in {dir}: {source}")]
    ReadPages {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the image classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model file not found at {0}")]
    ModelNotFound(PathBuf),
    #[error("Failed to create ONNX session from {path}: {message}")]
    CreateSession { path: PathBuf, message: String },
    #[error("Failed to convert image into tensor: {0}")]
    EncodeTensor(String),
    #[error("Session mutex was poisoned by a previous panic")]
    SessionPoisoned,
    #[error("Failed to run inference: {0}")]
    Inference(#[source] ort::Error),
    #[error("ONNX output \"{name}\" missing from session results")]
    OutputMissing { name: String },
    #[error("ONNX output \"{name}\" has {actual} scores but expected {expected}")]
    UnexpectedScoreCount { name: String, expected: usize, actual: usize },
    #[error("Classifier returned an empty confidence vector")]
    EmptyConfidence,
    #[error("Classifier returned no finite confidence among {0} scores")]
    NoFiniteScores(usize),
}
