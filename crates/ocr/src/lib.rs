pub mod assemble;
pub mod corrections;
pub mod extract;
pub mod labels;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod segment;

pub use assemble::RecordAssembler;
pub use corrections::{CorrectionError, CorrectionTable};
pub use extract::{clean_phone, ExtractedFields, FieldExtractor};
pub use labels::{Field, LabelMatcher, LabelSet, LabelSpec};
pub use pipeline::{CapturePipeline, CaptureResult, PipelineError, RecordExtractor};
pub use preprocess::{prepare_capture, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, TesseractCli};
pub use segment::{RawTextBlock, Segmenter};
