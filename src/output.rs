use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::prediction::DocumentPrediction;

/// Appends document predictions to a CSV file, one row per document.
/// Every row is flushed as soon as it is written, so an interrupted run keeps
/// the results of all documents screened so far.
pub struct CsvSink
{
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSink
{
    /// Creates (or truncates) `path` and writes the header row.
    pub fn create(path: &Path) -> Result<Self, Error>
    {
        let file = File::create(path).map_err(|source| Error::io(path, source))?;
        let mut sink = CsvSink { path: path.to_path_buf(), writer: csv::Writer::from_writer(file) };
        sink.writer.write_record(DocumentPrediction::header())?;
        sink.flush()?;
        Ok(sink)
    }

    pub fn append(&mut self, prediction: &DocumentPrediction) -> Result<(), Error>
    {
        self.writer.write_record(prediction.record())?;
        self.flush()
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    fn flush(&mut self) -> Result<(), Error>
    {
        self.writer.flush().map_err(|source| Error::io(&self.path, source))
    }
}
