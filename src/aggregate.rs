//! Turns raw classifier output into page labels, and page labels into per-document counts.

use image::DynamicImage;
use log::debug;

use crate::classifier::Classifier;
use crate::error::ClassifierError;
use crate::prediction::{BatchPrediction, ClassCounts, DocumentPrediction, PageLabels};

/// Labels one image.
///
/// The classifier's thresholded labels are returned unchanged when there are any.
/// If no class cleared the threshold, the single class with the highest score is
/// used instead, so the result is never empty.
pub fn classify_page<C>(classifier: &C, image: &DynamicImage) -> Result<PageLabels, ClassifierError>
where
    C: Classifier + ?Sized,
{
    let prediction = classifier.predict(image)?;
    if !prediction.labels.is_empty() {
        return Ok(PageLabels::new(prediction.labels));
    }

    if prediction.scores.is_empty() {
        return Err(ClassifierError::EmptyConfidence);
    }
    let fallback = prediction
        .top_class()
        .ok_or(ClassifierError::NoFiniteScores(prediction.scores.len()))?;
    debug!("No class cleared the threshold, falling back to {}", fallback);
    Ok(PageLabels::new(vec![fallback]))
}

/// Labels every image in order, one classifier call at a time.
pub fn classify_pages<'a, C, I>(classifier: &C, images: I) -> Result<Vec<PageLabels>, ClassifierError>
where
    C: Classifier + ?Sized,
    I: IntoIterator<Item = &'a DynamicImage>,
{
    images
        .into_iter()
        .map(|image| classify_page(classifier, image))
        .collect()
}

/// With `pagewise` the per-image labels are returned; otherwise the number of
/// images carrying each class.
pub fn classify_batch<'a, C, I>(classifier: &C, images: I, pagewise: bool) -> Result<BatchPrediction, ClassifierError>
where
    C: Classifier + ?Sized,
    I: IntoIterator<Item = &'a DynamicImage>,
{
    let pages = classify_pages(classifier, images)?;
    if pagewise {
        Ok(BatchPrediction::Pages(pages))
    } else {
        Ok(BatchPrediction::Counts(ClassCounts::from_pages(&pages)))
    }
}

/// The aggregated batch for one document's pages, tagged with `paper_id`.
pub fn classify_document<'a, C, I>(classifier: &C, paper_id: &str, images: I) -> Result<DocumentPrediction, ClassifierError>
where
    C: Classifier + ?Sized,
    I: IntoIterator<Item = &'a DynamicImage>,
{
    let pages = classify_pages(classifier, images)?;
    Ok(DocumentPrediction { paper_id: paper_id.to_string(), counts: ClassCounts::from_pages(&pages) })
}
