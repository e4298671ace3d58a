//! The unattended run: bring the application up, log in, confirm the login
//! landed, read the patient list off the screen and deliver it.

use std::time::Duration;

use anyhow::{bail, Context};
use bpwatch_core::{PatientRecord, WatcherConfig};
use bpwatch_delivery::{BatchReport, DeliveryClient, HttpTransport, Transport};
use bpwatch_desktop::{default_title_pattern, process_name_from_command, title_regex, Desktop, LoginTargets};
use bpwatch_ocr::{CapturePipeline, OcrBackend};

use crate::commands::{self, log_report, Recognizer};

const STEP_PAUSE: Duration = Duration::from_millis(500);
const RENDER_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct RunSummary {
    pub records: Vec<PatientRecord>,
    /// `None` when there was nothing to deliver.
    pub report: Option<BatchReport>,
}

pub struct Workflow<'a, D: Desktop, R: OcrBackend, T: Transport> {
    config: &'a WatcherConfig,
    desktop: D,
    pipeline: CapturePipeline<R>,
    delivery: DeliveryClient<T>,
}

fn required<T: Clone>(value: &Option<T>, key: &str) -> anyhow::Result<T> {
    value.clone().with_context(|| format!("{key} is not configured"))
}

impl<'a, D: Desktop> Workflow<'a, D, Recognizer, HttpTransport> {
    /// Validates the config, then builds the real OCR pipeline and HTTP client.
    pub fn from_config(config: &'a WatcherConfig, desktop: D) -> anyhow::Result<Self> {
        config.validate_workflow()?;
        let pipeline = commands::capture_pipeline(config);
        let delivery = commands::delivery_client(&config.delivery)?;
        Ok(Self::new(config, desktop, pipeline, delivery))
    }
}

impl<'a, D: Desktop, R: OcrBackend, T: Transport> Workflow<'a, D, R, T> {
    pub fn new(config: &'a WatcherConfig, desktop: D, pipeline: CapturePipeline<R>, delivery: DeliveryClient<T>) -> Self {
        Self { config, desktop, pipeline, delivery }
    }

    /// Runs the steps in order. The config must already have passed
    /// `validate_workflow`.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        self.ensure_running().await?;
        self.focus_application().await?;
        self.login().await?;
        self.check_login().await?;

        let records = self.read_patient_list().await?;
        if records.is_empty() {
            tracing::info!("No parsed patient data to send to server");
            return Ok(RunSummary { records, report: None });
        }

        tracing::info!(count = records.len(), "Sending parsed patient records to server");
        let report = self.delivery.deliver_batch(&records).await;
        log_report(&report);
        Ok(RunSummary { records, report: Some(report) })
    }

    async fn ensure_running(&self) -> anyhow::Result<()> {
        let app = &self.config.application;
        let command = required(&app.executable, "application.executable")?;
        let process = process_name_from_command(&command).context("application.executable has no program name")?;

        if self.desktop.is_running(&process) {
            tracing::info!(process = %process, "Application is already running");
            return Ok(());
        }

        tracing::info!(process = %process, "Application is not running; launching");
        self.desktop.launch(&command).await?;
        tracing::info!(secs = app.launch_wait_secs, "Waiting for the application to start");
        tokio::time::sleep(Duration::from_secs(app.launch_wait_secs)).await;
        Ok(())
    }

    async fn focus_application(&self) -> anyhow::Result<()> {
        let app = &self.config.application;
        let pattern = match &app.window_title {
            Some(pattern) => pattern.clone(),
            None => default_title_pattern(app.executable.as_deref().unwrap_or_default()),
        };
        let title = title_regex(&pattern)?;

        tracing::info!(pattern = %pattern, "Searching for application window");
        let Some(window) = self.desktop.find_window(&title).await? else {
            bail!("Application window with title regex '{pattern}' not found");
        };
        self.desktop.focus(&window).await?;
        tokio::time::sleep(Duration::from_millis(app.focus_wait_ms)).await;
        Ok(())
    }

    async fn login(&self) -> anyhow::Result<()> {
        let login = &self.config.login;
        let credentials = required(&self.config.credentials, "credentials")?;
        let targets = LoginTargets {
            username_field: required(&login.username_field, "login.username_field")?,
            password_field: required(&login.password_field, "login.password_field")?,
            login_button: required(&login.login_button, "login.login_button")?,
        };
        bpwatch_desktop::perform_login(
            &self.desktop,
            &credentials,
            targets,
            Duration::from_millis(login.keystroke_delay_ms),
            STEP_PAUSE,
        )
        .await?;
        Ok(())
    }

    async fn check_login(&self) -> anyhow::Result<()> {
        let login = &self.config.login;
        let region = required(&login.success_region, "login.success_region")?;
        tokio::time::sleep(RENDER_WAIT).await;

        let png = self.desktop.capture(region).await?;
        let text = self.pipeline.recognize_text(&png)?;
        if !text.contains(&login.success_text) {
            bail!("Login check failed: did not find '{}' in captured text", login.success_text);
        }
        tracing::info!(expected = %login.success_text, "Login check succeeded");
        Ok(())
    }

    async fn read_patient_list(&self) -> anyhow::Result<Vec<PatientRecord>> {
        let region = required(&self.config.extraction.patient_list_region, "extraction.patient_list_region")?;
        let png = self.desktop.capture(region).await?;
        let result = self.pipeline.process_bytes(&png)?;
        tracing::info!("Raw OCR extracted text:\n---\n{}\n---", result.ocr_text.trim());

        for record in &result.records {
            tracing::info!("Parsed patient record:\n{}", serde_json::to_string_pretty(record)?);
        }
        Ok(result.records)
    }
}
