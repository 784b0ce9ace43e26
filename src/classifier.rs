use std::sync::Mutex;

use image::DynamicImage;
use log::info;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;

use crate::config::ModelConfig;
use crate::error::ClassifierError;
use crate::labels::GraphType;
use crate::prediction::RawPrediction;
use crate::preprocessing;

/// Anything that can score an image against the graph type classes.
///
/// Implementations must be stateless per call: classifying the same image twice
/// yields the same prediction.
pub trait Classifier
{
    fn predict(&self, image: &DynamicImage) -> Result<RawPrediction, ClassifierError>;
}

/// The graph type classifier.
/// A convolutional network trained on publication page images, exported to ONNX
/// and executed with the ONNX runtime. It is a multi-label model: every class is
/// scored independently, and several classes may be accepted for one page.
///
/// The session is created once and kept for the whole process.
/// `Session::run` needs exclusive access, so it sits behind a mutex.
#[derive(Debug)]
pub struct OnnxClassifier
{
    session: Mutex<Session>,
    config: ModelConfig,
}

impl OnnxClassifier
{
    pub fn new(config: ModelConfig) -> Result<Self, ClassifierError>
    {
        if !config.path.is_file() {
            return Err(ClassifierError::ModelNotFound(config.path.clone()));
        }

        let session_error = |e: ort::Error| ClassifierError::CreateSession {
            path: config.path.clone(),
            message: e.to_string(),
        };

        let now = std::time::Instant::now();
        let session = Session::builder()
            .map_err(session_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| session_error(e.into()))?
            .with_intra_threads(config.intra_threads)
            .map_err(|e| session_error(e.into()))?
            .commit_from_file(&config.path)
            .map_err(session_error)?;
        info!("Loaded model {:?} in {:?}", config.path, now.elapsed());

        Ok(OnnxClassifier { session: Mutex::new(session), config })
    }

    fn scores(&self, image: &DynamicImage) -> Result<Vec<f32>, ClassifierError>
    {
        let input = preprocessing::image_to_model_format(image, &self.config);
        let shape = [1usize, 3, self.config.input_size as usize, self.config.input_size as usize];
        let data = input
            .as_slice()
            .ok_or_else(|| ClassifierError::EncodeTensor("input array is not contiguous".to_string()))?;
        let tensor = TensorRef::from_array_view((shape, data))
            .map_err(|e| ClassifierError::EncodeTensor(e.to_string()))?;

        let mut session = self.session.lock().map_err(|_| ClassifierError::SessionPoisoned)?;
        let outputs = session
            .run(ort::inputs! { self.config.input_name.as_str() => tensor })
            .map_err(ClassifierError::Inference)?;

        let output_name = &self.config.output_name;
        let output = outputs
            .get(output_name.as_str())
            .ok_or_else(|| ClassifierError::OutputMissing { name: output_name.clone() })?;
        let (_, scores) = output.try_extract_tensor::<f32>().map_err(ClassifierError::Inference)?;

        postprocess(&self.config, scores)
    }
}

impl Classifier for OnnxClassifier
{
    fn predict(&self, image: &DynamicImage) -> Result<RawPrediction, ClassifierError>
    {
        let scores = self.scores(image)?;
        Ok(RawPrediction::from_scores(scores, self.config.threshold))
    }
}

/// Checks the raw model output and turns it into per-class confidences.
fn postprocess(config: &ModelConfig, raw: &[f32]) -> Result<Vec<f32>, ClassifierError>
{
    if raw.len() != GraphType::COUNT {
        return Err(ClassifierError::UnexpectedScoreCount {
            name: config.output_name.clone(),
            expected: GraphType::COUNT,
            actual: raw.len(),
        });
    }

    if config.apply_sigmoid {
        Ok(raw.iter().map(|value| logistic(*value)).collect())
    } else {
        Ok(raw.to_vec())
    }
}

fn logistic(value: f32) -> f32
{
    1.0 / (1.0 + (-value).exp())
}
