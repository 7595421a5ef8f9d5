//! Modality prompts and the boundary to the hosted vision model.
//!
//! The repository hosts no model of its own: a request carries the marked
//! image plus a modality-specific prompt, and whatever sits behind
//! [`VisionModel`] produces the report. The default implementation pipes the
//! request JSON to an external gateway command so the transport (and the API
//! key handling) stays outside the editor.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Image modalities offered by the analysis screen.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Modality {
    Ecg,
    Radiology,
    Retina,
    Dermatoscopy,
    Urinalysis,
    Toxicology,
}

impl Modality {
    pub const ALL: [Modality; 6] = [
        Modality::Ecg,
        Modality::Radiology,
        Modality::Retina,
        Modality::Dermatoscopy,
        Modality::Urinalysis,
        Modality::Toxicology,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Modality::Ecg => "ECG",
            Modality::Radiology => "Radiology",
            Modality::Retina => "Retinal Fundus",
            Modality::Dermatoscopy => "Dermatoscopy",
            Modality::Urinalysis => "Urinalysis Strip",
            Modality::Toxicology => "Toxicology",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Modality::Ecg => {
                "Analyze this ECG image. Identify rhythm, rate, axis, intervals, and \
                 morphological abnormalities (ST changes, T-waves). Return findings in a \
                 structured list."
            }
            Modality::Radiology => {
                "Interpret this radiological image. Describe findings in bones, soft \
                 tissues, and organs. Note fractures, opacities, or lesions. Use standard \
                 radiological reporting terms."
            }
            Modality::Retina => {
                "Analyze this retinal fundus image. Check optic disc, macula, and vessels \
                 for signs of retinopathy, glaucoma, or other pathologies."
            }
            Modality::Dermatoscopy => {
                "Analyze this skin lesion using ABCDE criteria. Describe structure, color, \
                 and specific dermatoscopic patterns."
            }
            Modality::Urinalysis => {
                "Read this urinalysis reagent strip. Report each pad's colorimetric result \
                 against the reference scale and flag values outside the normal range."
            }
            Modality::Toxicology => {
                "Interpret this toxicology test result. Identify the assay type, read each \
                 band or well, and state which substances test presumptively positive."
            }
        }
    }
}

/// Shared guidance sent with every request, asking for objective, EHR-ready
/// output and an honest confidence score.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a clinical imaging assistant. Describe exactly what is visible; do not \
hallucinate features and do not state definitive diagnoses. Score confidence \
(0-100) by image quality and clarity. Set urgentAlert true only for findings \
suggesting an immediately life-threatening condition. Respond with a single \
JSON object: {modalityDetected, clinicalFindings, confidenceScore, urgentAlert} \
where clinicalFindings is concise Markdown ready to paste into a clinical note.";

/// One analysis request. The image travels through a temp file so the
/// payload never has to be inlined into the JSON envelope.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub modality: String,
    pub prompt: String,
    pub system_instruction: String,
    pub media_type: String,
    pub image_path: PathBuf,
}

/// The model's structured report.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub modality_detected: String,
    pub clinical_findings: String,
    pub confidence_score: f32,
    pub urgent_alert: bool,
}

pub fn parse_report(text: &str) -> Result<AnalysisReport> {
    serde_json::from_str(text.trim()).context("model returned malformed report JSON")
}

/// Write the displayed image to a temp file and assemble the request.
pub fn build_request(modality: Modality, media_type: &str, image_bytes: &[u8]) -> Result<AnalysisRequest> {
    let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
    let image_path = std::env::temp_dir().join(format!("medimark-{stamp}.img"));
    fs::write(&image_path, image_bytes)
        .with_context(|| format!("cannot stage image at {}", image_path.display()))?;

    Ok(AnalysisRequest {
        modality: modality.label().to_string(),
        prompt: modality.prompt().to_string(),
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        media_type: media_type.to_string(),
        image_path,
    })
}

/// Narrow boundary to the hosted model. Implementations own transport,
/// retries and credentials; the editor only sees a report or an error.
pub trait VisionModel: Send + Sync {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport>;
}

/// Configuration for [`CommandModel`], injected once at construction.
/// Core logic never reads ambient environment state.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Gateway executable: request JSON on stdin, report JSON on stdout.
    pub gateway: String,
    pub api_key: Option<String>,
}

pub struct CommandModel {
    config: ModelConfig,
}

impl CommandModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }
}

impl VisionModel for CommandModel {
    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let payload = serde_json::to_string(request).context("cannot serialize request")?;

        let mut command = Command::new(&self.config.gateway);
        command.stdin(Stdio::piped()).stdout(Stdio::piped());
        if let Some(key) = &self.config.api_key {
            command.env("MEDIMARK_API_KEY", key);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("cannot start gateway '{}'", self.config.gateway))?;
        child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("gateway stdin unavailable"))?
            .write_all(payload.as_bytes())
            .context("cannot send request to gateway")?;

        let output = child.wait_with_output().context("gateway did not finish")?;
        if !output.status.success() {
            return Err(anyhow!("gateway exited with {}", output.status));
        }

        let text = String::from_utf8(output.stdout).context("gateway emitted non-UTF-8 output")?;
        parse_report(&text)
    }
}

/// A single in-flight analysis, running on a worker thread. The UI polls
/// [`AnalysisJob::try_take`] each frame; dropping the job simply orphans the
/// worker, whose result is then discarded with the channel.
pub struct AnalysisJob {
    rx: Receiver<Result<AnalysisReport>>,
}

impl AnalysisJob {
    pub fn spawn(model: Arc<dyn VisionModel>, request: AnalysisRequest) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            debug!("analysis started for {}", request.modality);
            let result = model.analyze(&request);
            if let Err(err) = fs::remove_file(&request.image_path) {
                warn!(
                    "cannot remove staged image {}: {err:#}",
                    request.image_path.display()
                );
            }
            let _ = tx.send(result);
        });
        Self { rx }
    }

    pub fn try_take(&self) -> Option<Result<AnalysisReport>> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::{parse_report, AnalysisJob, AnalysisReport, AnalysisRequest, Modality, VisionModel};

    #[test]
    fn every_modality_has_a_distinct_prompt() {
        let prompts: Vec<&str> = Modality::ALL.iter().map(|m| m.prompt()).collect();
        for (index, prompt) in prompts.iter().enumerate() {
            assert!(!prompt.is_empty());
            assert!(!prompts[..index].contains(prompt));
        }
    }

    #[test]
    fn report_parses_the_wire_format() {
        let report = parse_report(
            r###"{
                "modalityDetected": "12-Lead ECG",
                "clinicalFindings": "## Rhythm\n- Sinus rhythm at 72 bpm",
                "confidenceScore": 87.5,
                "urgentAlert": false
            }"###,
        )
        .expect("valid report");

        assert_eq!(report.modality_detected, "12-Lead ECG");
        assert!((report.confidence_score - 87.5).abs() < f32::EPSILON);
        assert!(!report.urgent_alert);
    }

    #[test]
    fn malformed_report_is_an_error() {
        assert!(parse_report("not json").is_err());
        assert!(parse_report(r#"{"modalityDetected": "ECG"}"#).is_err());
    }

    struct ScriptedModel(AnalysisReport);

    impl VisionModel for ScriptedModel {
        fn analyze(&self, _request: &AnalysisRequest) -> anyhow::Result<AnalysisReport> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn job_delivers_the_model_result() {
        let report = AnalysisReport {
            modality_detected: "Chest X-Ray PA View".to_string(),
            clinical_findings: "- No acute findings".to_string(),
            confidence_score: 91.0,
            urgent_alert: false,
        };
        let request = AnalysisRequest {
            modality: Modality::Radiology.label().to_string(),
            prompt: Modality::Radiology.prompt().to_string(),
            system_instruction: String::new(),
            media_type: "image/png".to_string(),
            image_path: std::env::temp_dir().join("medimark-test-missing.img"),
        };

        let job = AnalysisJob::spawn(Arc::new(ScriptedModel(report.clone())), request);

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = job.try_take() {
                assert_eq!(result.expect("scripted result"), report);
                break;
            }
            assert!(Instant::now() < deadline, "worker never delivered");
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}
