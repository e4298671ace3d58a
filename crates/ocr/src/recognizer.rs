use std::path::PathBuf;
use std::process::Command;

use tempfile::NamedTempFile;
use thiserror::Error;

use bpwatch_core::OcrConfig;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract executable not found: {0}")]
    NotAvailable(String),
    #[error("IO error while running OCR: {0}")]
    Io(#[from] std::io::Error),
}

/// Implementations accept PNG image bytes of a captured region and return the recognized text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

/// Returns a pre-set string regardless of the image.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Tesseract command-line backend ────────────────────────────────────────────

/// Runs the `tesseract` executable on a temporary PNG and reads the text from stdout.
pub struct TesseractCli {
    executable: PathBuf,
    language: String,
    psm: u8,
}

impl TesseractCli {
    pub fn new(executable: impl Into<PathBuf>, language: &str, psm: u8) -> Self {
        Self {
            executable: executable.into(),
            language: language.to_string(),
            psm,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.tesseract.clone(), &config.language, config.page_segmentation_mode)
    }

    fn command(&self, input: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string());
        cmd
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let input = NamedTempFile::with_suffix(".png")?;
        std::fs::write(input.path(), image_bytes)?;

        let output = self.command(input.path()).output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                OcrError::NotAvailable(self.executable.display().to_string())
            }
            _ => OcrError::Io(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// libtesseract through `leptess`, avoiding a process and temp file per capture.
#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use bpwatch_core::OcrConfig;
    use leptess::{LepTess, Variable};

    pub struct LeptessRecognizer {
        language: String,
        psm: u8,
    }

    impl LeptessRecognizer {
        pub fn from_config(config: &OcrConfig) -> Self {
            Self { language: config.language.clone(), psm: config.page_segmentation_mode }
        }
    }

    impl OcrBackend for LeptessRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let engine_err = |e: &dyn std::fmt::Display| OcrError::Engine(e.to_string());

            let mut tess = LepTess::new(None, &self.language).map_err(|e| engine_err(&e))?;
            tess.set_variable(Variable::TesseditPagesegMode, &self.psm.to_string())
                .map_err(|e| engine_err(&e))?;
            tess.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            tess.get_utf8_text().map_err(|e| engine_err(&e))
        }
    }
}
