use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::aggregate;
use crate::classifier::{Classifier, OnnxClassifier};
use crate::config::ScreenerConfig;
use crate::document;
use crate::error::Error;
use crate::output::CsvSink;
use crate::prediction::{ClassCounts, DocumentPrediction, PageLabels};
use crate::preprocessing;
use crate::rasterize::{Pdftocairo, Rasterizer, ScratchPages};

/// Screens publications for graph types.
///
/// Holds the classifier, the PDF rasterizer and the scratch folder that page
/// images are extracted into. Everything runs sequentially.
pub struct Barzooka<C = OnnxClassifier, R = Pdftocairo>
{
    classifier: C,
    rasterizer: R,
    scratch_dir: PathBuf,
}

/// A document the corpus run could not screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument
{
    pub paper_id: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a corpus run. Predictions themselves go to the CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusReport
{
    pub screened: usize,
    pub skipped: Vec<SkippedDocument>,
}

impl Barzooka
{
    /// Loads the ONNX model and sets up `pdftocairo` as described by `config`.
    pub fn from_config(config: &ScreenerConfig) -> Result<Self, Error>
    {
        config.validate()?;
        let classifier = OnnxClassifier::new(config.model.clone())?;
        let rasterizer = Pdftocairo::new(config.raster.clone());
        Barzooka::new(classifier, rasterizer, &config.scratch_dir)
    }
}

impl<C, R> Barzooka<C, R>
where
    C: Classifier,
    R: Rasterizer,
{
    /// The scratch folder is created if it does not exist yet.
    pub fn new(classifier: C, rasterizer: R, scratch_dir: &Path) -> Result<Self, Error>
    {
        if scratch_dir.as_os_str().is_empty() {
            return Err(Error::Config("scratch folder argument missing".to_string()));
        }
        fs::create_dir_all(scratch_dir).map_err(|source| Error::io(scratch_dir, source))?;

        Ok(Barzooka { classifier, rasterizer, scratch_dir: scratch_dir.to_path_buf() })
    }

    pub fn classifier(&self) -> &C
    {
        &self.classifier
    }

    /// Screens every PDF below `pdf_folder` and writes one CSV row per document to `output`.
    pub fn screen_corpus(&self, pdf_folder: &Path, output: &Path) -> Result<CorpusReport, Error>
    {
        let pdfs = document::list_pdfs(pdf_folder)?;
        info!("Found {} PDFs in {:?}", pdfs.len(), pdf_folder);
        self.screen_documents(&pdfs, output)
    }

    /// Screens `pdfs` in order, appending a row to `output` after each one.
    ///
    /// A document whose rasterization, page images or classification fail is
    /// logged and skipped. Any other error ends the run.
    pub fn screen_documents(&self, pdfs: &[PathBuf], output: &Path) -> Result<CorpusReport, Error>
    {
        let mut sink = CsvSink::create(output)?;
        let mut report = CorpusReport::default();

        let now = std::time::Instant::now();
        for (index, pdf) in pdfs.iter().enumerate()
        {
            match self.screen_pdf(pdf)
            {
                Ok(prediction) => {
                    sink.append(&prediction)?;
                    report.screened += 1;
                    debug!("Screened {}/{}: {}", index + 1, pdfs.len(), prediction.paper_id);
                },
                Err(e) if e.is_document_failure() => {
                    let paper_id = document::document_id(pdf);
                    warn!("Could not screen pdf {} ({:?}): {}", paper_id, pdf, e);
                    report.skipped.push(SkippedDocument { paper_id, path: pdf.clone(), reason: e.to_string() });
                },
                Err(e) => return Err(e),
            }
        }
        info!(
            "Screened {} of {} PDFs into {:?} in {:?}",
            report.screened,
            pdfs.len(),
            sink.path(),
            now.elapsed()
        );

        Ok(report)
    }

    /// Page counts per graph type for one PDF.
    pub fn screen_pdf(&self, pdf: &Path) -> Result<DocumentPrediction, Error>
    {
        let pages = self.screen_pdf_pages(pdf)?;
        Ok(DocumentPrediction { paper_id: document::document_id(pdf), counts: ClassCounts::from_pages(&pages) })
    }

    /// Labels for each page of one PDF, in page order.
    /// Only one decoded page is held in memory at a time.
    pub fn screen_pdf_pages(&self, pdf: &Path) -> Result<Vec<PageLabels>, Error>
    {
        let scratch = ScratchPages::rasterize(&self.rasterizer, pdf, &self.scratch_dir)?;
        self.screen_images(scratch.pages())
    }

    /// Labels every image below `folder`, paired with its path.
    pub fn screen_image_folder(&self, folder: &Path) -> Result<Vec<(PathBuf, PageLabels)>, Error>
    {
        let images = document::list_images(folder)?;
        let labels = self.screen_images(&images)?;
        Ok(images.into_iter().zip(labels).collect())
    }

    /// Labels each image in `paths`, in order. Images are decoded one at a time.
    pub fn screen_images(&self, paths: &[PathBuf]) -> Result<Vec<PageLabels>, Error>
    {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths
        {
            let image = preprocessing::load_image(path)?;
            let labels = aggregate::classify_page(&self.classifier, &image)?;
            debug!("{:?}: {:?}", path, labels.as_slice());
            results.push(labels);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::aggregate::tests::ColourClassifier;
    use crate::error::RasterizeError;
    use crate::rasterize::tests::TextPages;

    /// One text page followed by a page that cannot be decoded.
    struct CorruptSecondPage;

    impl Rasterizer for CorruptSecondPage
    {
        fn rasterize(&self, pdf: &Path, prefix: &Path) -> Result<(), RasterizeError>
        {
            TextPages(1).rasterize(pdf, prefix)?;
            fs::write(format!("{}-02.png", prefix.display()), b"truncated").unwrap();
            Ok(())
        }
    }

    #[test]
    fn empty_scratch_dir_is_rejected_before_any_work()
    {
        let result = Barzooka::new(ColourClassifier::new(), TextPages(1), Path::new(""));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn scratch_dir_is_created()
    {
        let root = tempfile::tempdir().unwrap();
        let scratch = root.path().join("tmp");
        Barzooka::new(ColourClassifier::new(), TextPages(1), &scratch).unwrap();
        assert!(scratch.is_dir());
    }

    #[test]
    fn pagewise_pdf_has_one_entry_per_page()
    {
        let root = tempfile::tempdir().unwrap();
        let barzooka = Barzooka::new(ColourClassifier::new(), TextPages(12), root.path()).unwrap();

        let pages = barzooka.screen_pdf_pages(Path::new("papers/long.pdf")).unwrap();

        assert_eq!(pages.len(), 12);
        assert!(pages.iter().all(|page| !page.is_empty()));
        assert_eq!(barzooka.classifier().calls.get(), 12);
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn pages_are_classified_as_they_are_decoded()
    {
        let root = tempfile::tempdir().unwrap();
        let barzooka = Barzooka::new(ColourClassifier::new(), CorruptSecondPage, root.path()).unwrap();

        let result = barzooka.screen_pdf(Path::new("papers/doc.pdf"));

        assert!(matches!(result, Err(Error::Image { .. })));
        assert_eq!(barzooka.classifier().calls.get(), 1);
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn pdf_prediction_carries_document_id()
    {
        let root = tempfile::tempdir().unwrap();
        let barzooka = Barzooka::new(ColourClassifier::new(), TextPages(2), root.path()).unwrap();

        let prediction = barzooka.screen_pdf(Path::new("papers/10.1234+5.pdf")).unwrap();

        assert_eq!(prediction.paper_id, "10.1234/5");
        assert_eq!(prediction.counts.iter().map(|(_, count)| count).sum::<usize>(), 2);
    }

    #[test]
    fn single_pdf_failures_propagate()
    {
        let root = tempfile::tempdir().unwrap();
        let barzooka = Barzooka::new(ColourClassifier::new(), TextPages(2), root.path()).unwrap();

        assert!(matches!(barzooka.screen_pdf(Path::new("broken.pdf")), Err(Error::Rasterize(_))));
    }
}
