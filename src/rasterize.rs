use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::ImageFormat;
use log::{debug, warn};
use uuid::Uuid;

use crate::config::RasterConfig;
use crate::error::{Error, RasterizeError};

/// Converts a PDF into one image per page.
///
/// `prefix` is a path inside an existing directory; page images must be written
/// next to it as `<prefix>-<page number>.<ext>`.
pub trait Rasterizer
{
    fn rasterize(&self, pdf: &Path, prefix: &Path) -> Result<(), RasterizeError>;
}

/// Rasterizes with poppler's `pdftocairo`, which must be installed on the system.
#[derive(Debug, Clone)]
pub struct Pdftocairo
{
    config: RasterConfig,
}

impl Pdftocairo
{
    pub fn new(config: RasterConfig) -> Self
    {
        Pdftocairo { config }
    }
}

impl Rasterizer for Pdftocairo
{
    fn rasterize(&self, pdf: &Path, prefix: &Path) -> Result<(), RasterizeError>
    {
        let scale = self.config.scale.to_string();
        let mut command = Command::new(&self.config.program);
        command
            .arg(self.config.format.flag())
            .args(["-scale-to-x", &scale, "-scale-to-y", &scale])
            .arg(pdf)
            .arg(prefix);
        debug!("Running {:?}", command);

        let output = command.output().map_err(|source| RasterizeError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(RasterizeError::Failed {
                program: self.config.program.clone(),
                pdf: pdf.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// The page images of one document, held in a private scratch directory.
///
/// The directory is removed when the value is dropped, whether or not the
/// pages were classified successfully.
#[derive(Debug)]
pub struct ScratchPages
{
    dir: PathBuf,
    pages: Vec<PathBuf>,
}

impl ScratchPages
{
    /// Rasterizes `pdf` into a fresh directory below `scratch_root`.
    /// Pages are ordered by page number.
    pub fn rasterize<R>(rasterizer: &R, pdf: &Path, scratch_root: &Path) -> Result<Self, Error>
    where
        R: Rasterizer + ?Sized,
    {
        let dir = scratch_root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&dir).map_err(|source| Error::io(&dir, source))?;

        // From here on the guard owns the directory.
        let mut scratch = ScratchPages { dir, pages: Vec::new() };

        let stem = pdf
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string());
        rasterizer.rasterize(pdf, &scratch.dir.join(stem))?;

        scratch.pages = page_images(&scratch.dir)?;
        Ok(scratch)
    }

    pub fn pages(&self) -> &[PathBuf]
    {
        &self.pages
    }

    pub fn dir(&self) -> &Path
    {
        &self.dir
    }
}

impl Drop for ScratchPages
{
    fn drop(&mut self)
    {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!("Failed to remove scratch directory {:?}: {}", self.dir, e);
        }
    }
}

fn page_images(dir: &Path) -> Result<Vec<PathBuf>, RasterizeError>
{
    let read_error = |source: std::io::Error| RasterizeError::ReadPages { dir: dir.to_path_buf(), source };

    let mut pages = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)?
    {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && ImageFormat::from_path(&path).is_ok() {
            pages.push(path);
        }
    }
    pages.sort_by_key(|path| (page_number(path), path.clone()));
    Ok(pages)
}

// pdftocairo names pages `<prefix>-<n>` and zero-pads `n` for longer documents.
fn page_number(path: &Path) -> Option<u32>
{
    let stem = path.file_stem()?.to_str()?;
    let (_, number) = stem.rsplit_once('-')?;
    number.parse().ok()
}

#[cfg(test)]
pub(crate) mod tests
{
    use image::{Rgb, RgbImage};
    use rstest::rstest;

    use super::*;
    use crate::labels::GraphType;

    /// Writes the given number of plain text pages, or fails when the PDF's
    /// name contains "broken". Pixels carry the class index, as the test
    /// classifier expects.
    pub(crate) struct TextPages(pub u32);

    impl Rasterizer for TextPages
    {
        fn rasterize(&self, pdf: &Path, prefix: &Path) -> Result<(), RasterizeError>
        {
            if pdf.to_string_lossy().contains("broken") {
                return Err(RasterizeError::Spawn {
                    program: PathBuf::from("text-pages"),
                    source: std::io::Error::other("syntax error in PDF"),
                });
            }
            for page in 1..=self.0
            {
                let path = PathBuf::from(format!("{}-{:02}.png", prefix.display(), page));
                RgbImage::from_pixel(2, 2, Rgb([GraphType::Text.index() as u8, 0, 0])).save(path).unwrap();
            }
            Ok(())
        }
    }

    #[rstest]
    #[case("doc-1.jpg", Some(1))]
    #[case("doc-012.jpg", Some(12))]
    #[case("my-paper-3.png", Some(3))]
    #[case("cover.jpg", None)]
    fn parses_page_number(#[case] name: &str, #[case] expected: Option<u32>)
    {
        assert_eq!(page_number(Path::new(name)), expected);
    }

    #[test]
    fn pages_are_ordered_numerically()
    {
        let dir = tempfile::tempdir().unwrap();
        for name in ["doc-10.jpg", "doc-2.jpg", "doc-1.jpg", "doc.log"]
        {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let pages = page_images(dir.path()).unwrap();

        let names: Vec<String> = pages.iter().map(|path| path.file_name().unwrap().to_string_lossy().into_owned()).collect();
        assert_eq!(names, vec!["doc-1.jpg", "doc-2.jpg", "doc-10.jpg"]);
    }

    #[test]
    fn scratch_directory_is_removed_on_drop()
    {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchPages::rasterize(&TextPages(3), Path::new("papers/doc.pdf"), root.path()).unwrap();

        assert_eq!(scratch.pages().len(), 3);
        assert!(scratch.pages().iter().all(|page| page.starts_with(scratch.dir())));
        let dir = scratch.dir().to_path_buf();
        assert!(dir.is_dir());

        drop(scratch);
        assert!(!dir.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn scratch_directory_is_removed_when_rasterizing_fails()
    {
        let root = tempfile::tempdir().unwrap();
        let result = ScratchPages::rasterize(&TextPages(3), Path::new("papers/broken.pdf"), root.path());

        assert!(matches!(result, Err(Error::Rasterize(_))));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_program_is_a_spawn_error()
    {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = Pdftocairo::new(RasterConfig {
            program: dir.path().join("no-such-pdftocairo"),
            ..RasterConfig::default()
        });

        let result = rasterizer.rasterize(Path::new("doc.pdf"), &dir.path().join("doc"));
        assert!(matches!(result, Err(RasterizeError::Spawn { .. })));
    }
}
