use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bpwatch_core::{DeliveryConfig, PatientRecord, WatcherConfig, DEFAULT_CONFIG_FILE};
use bpwatch_delivery::{BatchReport, DeliveryClient, HttpTransport, RetryPolicy};
use bpwatch_ocr::{CapturePipeline, RecordExtractor};

#[cfg(not(feature = "tesseract"))]
pub type Recognizer = bpwatch_ocr::TesseractCli;
#[cfg(feature = "tesseract")]
pub type Recognizer = bpwatch_ocr::recognizer::tesseract_backend::LeptessRecognizer;

/// Loads the config file. A missing file is fine only when it is the default one.
pub fn load_config(path: &Path) -> anyhow::Result<WatcherConfig> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
        tracing::info!(path = %path.display(), "No configuration file; using defaults");
        return Ok(WatcherConfig::default());
    }
    let config = WatcherConfig::load(path)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

pub fn capture_pipeline(config: &WatcherConfig) -> CapturePipeline<Recognizer> {
    CapturePipeline::new(
        Recognizer::from_config(&config.ocr),
        RecordExtractor::from_config(&config.extraction),
    )
}

pub fn delivery_client(config: &DeliveryConfig) -> anyhow::Result<DeliveryClient<HttpTransport>> {
    let endpoint = config
        .endpoint
        .clone()
        .context("delivery.endpoint is not configured")?;
    let transport = HttpTransport::new(endpoint, config.timeout())?;
    Ok(DeliveryClient::new(transport, RetryPolicy::from(config)))
}

/// `-` reads standard input.
async fn read_text(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("reading standard input")?;
        return Ok(text);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading {}", input.display()))
}

fn print_records(records: &[PatientRecord]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

pub fn log_report(report: &BatchReport) {
    for (i, outcome) in report.outcomes.iter().enumerate() {
        tracing::info!(record = i + 1, outcome = ?outcome, "Delivery outcome");
    }
    if report.all_delivered() {
        tracing::info!("All parsed data sent to server successfully");
    } else {
        tracing::warn!(
            delivered = report.delivered_count(),
            failed = report.failed_count(),
            "Failed to send some or all parsed data to server"
        );
    }
}

pub async fn parse(config: &WatcherConfig, input: PathBuf) -> anyhow::Result<()> {
    let text = read_text(&input).await?;
    let records = RecordExtractor::from_config(&config.extraction).extract_records(&text);
    print_records(&records)
}

pub async fn ocr(config: &WatcherConfig, image: PathBuf) -> anyhow::Result<()> {
    let result = capture_pipeline(config)
        .process_file(&image)
        .await
        .with_context(|| format!("processing {}", image.display()))?;
    tracing::info!("Raw OCR text:\n---\n{}\n---", result.ocr_text.trim());
    print_records(&result.records)
}

pub async fn deliver(mut config: WatcherConfig, input: PathBuf, endpoint: Option<String>) -> anyhow::Result<()> {
    if endpoint.is_some() {
        config.delivery.endpoint = endpoint;
    }
    config.validate_delivery()?;

    let text = read_text(&input).await?;
    let records = RecordExtractor::from_config(&config.extraction).extract_records(&text);
    if records.is_empty() {
        tracing::info!("No parsed patient data to send to server");
        return Ok(());
    }

    let client = delivery_client(&config.delivery)?;
    let report = client.deliver_batch(&records).await;
    log_report(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_default_config_falls_back() {
        // Only meaningful when the test's cwd has no bpwatch.toml.
        if !Path::new(DEFAULT_CONFIG_FILE).exists() {
            let config = load_config(Path::new(DEFAULT_CONFIG_FILE)).unwrap();
            assert_eq!(config.delivery.max_retries, 3);
        }
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/bpwatch-test.toml")).is_err());
    }

    #[test]
    fn client_requires_endpoint() {
        assert!(delivery_client(&DeliveryConfig::default()).is_err());
        let config = DeliveryConfig { endpoint: Some("http://127.0.0.1:8000".into()), ..Default::default() };
        assert_eq!(delivery_client(&config).unwrap().policy(), RetryPolicy::default());
    }
}
