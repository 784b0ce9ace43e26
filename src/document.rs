use std::path::{Path, PathBuf};

use image::ImageFormat;
use walkdir::WalkDir;

use crate::error::Error;

/// Derives the paper identifier from a PDF's file name.
///
/// Files are named after their DOI with `/` replaced by `+`, so the
/// replacement is undone and the `.pdf` suffix dropped, in any case, matching
/// [`list_pdfs`]: `folder/10.1234+5.pdf` becomes `10.1234/5`.
pub fn document_id(path: &Path) -> String
{
    let name = if is_pdf(path) { path.file_stem() } else { path.file_name() };
    name.map(|name| name.to_string_lossy().replace('+', "/")).unwrap_or_default()
}

/// All PDF files below `folder`, recursively, in file name order.
pub fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>, Error>
{
    list_files(folder, is_pdf)
}

/// All files below `folder` the image decoder recognises by extension, in file name order.
pub fn list_images(folder: &Path) -> Result<Vec<PathBuf>, Error>
{
    list_files(folder, |path| ImageFormat::from_path(path).is_ok())
}

fn is_pdf(path: &Path) -> bool
{
    path.extension()
        .map(|extension| extension.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn list_files(folder: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, Error>
{
    let mut files = Vec::new();
    for entry in WalkDir::new(folder).sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && keep(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("folder/my+paper.pdf", "my/paper")]
    #[case("pdfs/10.1371+journal.pone.0123456.pdf", "10.1371/journal.pone.0123456")]
    #[case("doc.pdf", "doc")]
    #[case("a/b/notes.pdf.pdf", "notes.pdf")]
    #[case("scan.PDF", "scan")]
    #[case("old/10.1000+x.Pdf", "10.1000/x")]
    #[case("notes.txt", "notes.txt")]
    fn derives_document_id(#[case] path: &str, #[case] expected: &str)
    {
        assert_eq!(document_id(Path::new(path)), expected);
    }

    #[test]
    fn lists_pdfs_recursively_in_name_order()
    {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "nested/c.pdf"]
        {
            fs::write(dir.path().join(name), b"%PDF").unwrap();
        }

        let pdfs = list_pdfs(dir.path()).unwrap();

        let expected: Vec<PathBuf> = ["a.PDF", "b.pdf", "nested/c.pdf"].iter().map(|name| dir.path().join(name)).collect();
        assert_eq!(pdfs, expected);
    }

    #[test]
    fn discovered_pdfs_never_keep_their_extension()
    {
        let dir = tempfile::tempdir().unwrap();
        for name in ["upper.PDF", "lower.pdf"]
        {
            fs::write(dir.path().join(name), b"%PDF").unwrap();
        }

        let ids: Vec<String> = list_pdfs(dir.path()).unwrap().iter().map(|pdf| document_id(pdf)).collect();

        assert_eq!(ids, vec!["lower", "upper"]);
    }

    #[test]
    fn lists_only_image_files()
    {
        let dir = tempfile::tempdir().unwrap();
        for name in ["dot1.jpg", "box1.png", "readme.md", "paper.pdf"]
        {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let images = list_images(dir.path()).unwrap();

        assert_eq!(images, vec![dir.path().join("box1.png"), dir.path().join("dot1.jpg")]);
    }

    #[test]
    fn missing_folder_is_an_error()
    {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(list_pdfs(&dir.path().join("missing")), Err(Error::Walk(_))));
    }
}
