use std::path::Path;

use bpwatch_core::{ExtractionConfig, PatientRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::assemble::RecordAssembler;
use crate::corrections::CorrectionTable;
use crate::extract::FieldExtractor;
use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use crate::segment::Segmenter;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// raw text → blocks → fields → records.
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    segmenter: Segmenter,
    extractor: FieldExtractor,
    assembler: RecordAssembler,
}

impl RecordExtractor {
    pub fn new(segmenter: Segmenter, extractor: FieldExtractor, assembler: RecordAssembler) -> Self {
        Self { segmenter, extractor, assembler }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            Segmenter::new(config.noise_markers.clone()),
            FieldExtractor::new(CorrectionTable::new(config.corrections.clone())),
            RecordAssembler::new(config.source_id.clone()),
        )
    }

    /// Extracts every record in `raw`, stamping each with the time it was assembled.
    pub fn extract_records(&self, raw: &str) -> Vec<PatientRecord> {
        self.extract_records_with(raw, Utc::now)
    }

    /// As [`extract_records`](Self::extract_records), with an explicit clock.
    pub fn extract_records_with<F>(&self, raw: &str, mut clock: F) -> Vec<PatientRecord>
    where
        F: FnMut() -> DateTime<Utc>,
    {
        let blocks = self.segmenter.segment(raw);
        tracing::debug!(blocks = blocks.len(), "segmented OCR text");

        let mut records = Vec::new();
        for (idx, block) in blocks.iter().enumerate() {
            let fields = self.extractor.extract(block);
            match self.assembler.assemble(&fields, clock()) {
                Some(record) => {
                    tracing::debug!(block = idx, name = %record, "record assembled");
                    records.push(record);
                }
                None => {
                    tracing::debug!(block = idx, lines = block.lines().len(), "block rejected: no name");
                }
            }
        }

        if records.is_empty() {
            tracing::info!("No patient records parsed from the captured text");
        } else {
            tracing::info!(count = records.len(), "Parsed patient records");
        }
        records
    }
}

/// The result of running one captured region through the pipeline.
#[derive(Debug)]
pub struct CaptureResult {
    /// Raw OCR text output.
    pub ocr_text: String,
    pub records: Vec<PatientRecord>,
}

/// Orchestrates: preprocess → OCR → segment → extract → assemble.
pub struct CapturePipeline<R: OcrBackend> {
    recognizer: R,
    extractor: RecordExtractor,
}

impl<R: OcrBackend> CapturePipeline<R> {
    pub fn new(recognizer: R, extractor: RecordExtractor) -> Self {
        Self { recognizer, extractor }
    }

    pub fn extractor(&self) -> &RecordExtractor {
        &self.extractor
    }

    /// Preprocesses a captured image and returns the recognized text.
    pub fn recognize_text(&self, image_bytes: &[u8]) -> Result<String, PipelineError> {
        let prepared = preprocess::prepare_capture(image_bytes)?;
        let text = self.recognizer.recognize(&prepared)?;
        tracing::debug!(chars = text.len(), text = %text.trim(), "OCR text");
        Ok(text)
    }

    /// Process raw capture bytes.
    pub fn process_bytes(&self, image_bytes: &[u8]) -> Result<CaptureResult, PipelineError> {
        let ocr_text = self.recognize_text(image_bytes)?;
        let records = self.extractor.extract_records(&ocr_text);
        Ok(CaptureResult { ocr_text, records })
    }

    /// Process an image file on disk.
    pub async fn process_file(&self, path: &Path) -> Result<CaptureResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(&bytes)
    }
}
