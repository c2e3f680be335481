//! Transcription and clinical assistant jobs
//!
//! Speech-to-text and the inference helpers (section auto-fill, drug
//! interaction check, recommendations) sit behind the [`Assistant`] trait.
//! The only implementation today is [`SimulatedAssistant`], which ignores its
//! input and returns fixed sample text. Jobs run as delayed tokio tasks and
//! hand their output back to the application loop.

use crate::fields::{FieldId, FieldSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Where the consultation audio came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AudioSource {
    /// Live microphone recording
    Microphone,
    /// Uploaded audio file
    File(PathBuf),
}

/// Transcription and inference collaborator
pub(crate) trait Assistant: Send + Sync {
    /// Turn consultation audio into transcript text
    fn transcribe(&self, source: &AudioSource) -> String;

    /// Derive note sections from a transcript
    fn fill_sections(&self, transcript: &str) -> Vec<(FieldId, String)>;

    /// Check current medications against new prescriptions
    fn check_interactions(&self, current_meds: &str, prescriptions: &str) -> String;

    /// Patient recommendations for the note as a whole
    fn recommendations(&self, note: &FieldSnapshot) -> String;
}

const SAMPLE_TRANSCRIPT: &str = "Patient: Good afternoon, doctor. I have pain in my stomach, especially after eating. I also get heartburn and belching.

Doctor: How long have you had these symptoms? Have you taken anything for relief?

Patient: About two weeks. Sometimes I take Rennie, it helps, but not for long.";

const SAMPLE_SECTIONS: [(FieldId, &str); 8] = [
    (
        FieldId::Complaints,
        "Epigastric pain after meals, heartburn, belching.",
    ),
    (
        FieldId::LifeHistory,
        "No chronic diseases reported. No previous surgery.",
    ),
    (FieldId::Allergies, "Allergy history unremarkable."),
    (
        FieldId::Examination,
        "General condition satisfactory. Skin clear. Tongue coated white. Epigastric tenderness on palpation.",
    ),
    (
        FieldId::Diagnosis,
        "Acute gastritis. Gastroesophageal reflux disease.",
    ),
    (
        FieldId::Prescriptions,
        "1. Omeprazole 20 mg once daily in the morning, 30 min before meals - 14 days\n2. Almagel 1 tbsp 3 times daily, 1 hour after meals - 10 days",
    ),
    (
        FieldId::Examinations,
        "1. Upper GI endoscopy\n2. Abdominal ultrasound\n3. Complete blood count, blood chemistry",
    ),
    (FieldId::CurrentMeds, "Rennie as needed for heartburn."),
];

const SAMPLE_RECOMMENDATIONS: &str = "Recommendations for the patient:
1. Diet: avoid spicy, fried and fatty food and carbonated drinks
2. Small meals 4-5 times a day
3. Do not lie down for 2 hours after eating
4. Stop smoking and alcohol
5. Follow-up in 2 weeks";

const SAMPLE_INTERACTION_REPORT: &str = "Check complete. No conflicts found.";

/// Stand-in assistant returning fixed sample text
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SimulatedAssistant;

impl Assistant for SimulatedAssistant {
    fn transcribe(&self, _source: &AudioSource) -> String {
        SAMPLE_TRANSCRIPT.to_string()
    }

    fn fill_sections(&self, _transcript: &str) -> Vec<(FieldId, String)> {
        SAMPLE_SECTIONS
            .iter()
            .map(|(id, text)| (*id, text.to_string()))
            .collect()
    }

    fn check_interactions(&self, _current_meds: &str, _prescriptions: &str) -> String {
        SAMPLE_INTERACTION_REPORT.to_string()
    }

    fn recommendations(&self, _note: &FieldSnapshot) -> String {
        SAMPLE_RECOMMENDATIONS.to_string()
    }
}

/// Kinds of long-running jobs; at most one of each runs at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum JobKind {
    Transcription,
    DrugCheck,
    Recommendations,
    Analysis,
}

/// A unit of work for the assistant, with the input it was started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Job {
    Transcribe {
        source: AudioSource,
    },
    CheckDrugs {
        current_meds: String,
        prescriptions: String,
    },
    Recommend {
        note: FieldSnapshot,
    },
    Analyze {
        transcript: String,
    },
}

/// Result of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JobOutput {
    Transcribed {
        source: AudioSource,
        transcript: String,
        sections: Vec<(FieldId, String)>,
    },
    DrugsChecked {
        report: String,
    },
    Recommended {
        text: String,
    },
    Analyzed {
        sections: Vec<(FieldId, String)>,
    },
}

impl Job {
    pub(crate) fn kind(&self) -> JobKind {
        match self {
            Job::Transcribe { .. } => JobKind::Transcription,
            Job::CheckDrugs { .. } => JobKind::DrugCheck,
            Job::Recommend { .. } => JobKind::Recommendations,
            Job::Analyze { .. } => JobKind::Analysis,
        }
    }

    /// Run the job to completion against an assistant
    pub(crate) fn run(self, assistant: &dyn Assistant) -> JobOutput {
        match self {
            Job::Transcribe { source } => {
                let transcript = assistant.transcribe(&source);
                let sections = assistant.fill_sections(&transcript);
                JobOutput::Transcribed {
                    source,
                    transcript,
                    sections,
                }
            }
            Job::CheckDrugs {
                current_meds,
                prescriptions,
            } => JobOutput::DrugsChecked {
                report: assistant.check_interactions(&current_meds, &prescriptions),
            },
            Job::Recommend { note } => JobOutput::Recommended {
                text: assistant.recommendations(&note),
            },
            Job::Analyze { transcript } => JobOutput::Analyzed {
                sections: assistant.fill_sections(&transcript),
            },
        }
    }
}

impl JobOutput {
    pub(crate) fn kind(&self) -> JobKind {
        match self {
            JobOutput::Transcribed { .. } => JobKind::Transcription,
            JobOutput::DrugsChecked { .. } => JobKind::DrugCheck,
            JobOutput::Recommended { .. } => JobKind::Recommendations,
            JobOutput::Analyzed { .. } => JobKind::Analysis,
        }
    }
}

/// Wait out the job's delay, then run it
///
/// Once started a job always completes; there is no cancellation.
#[tracing::instrument(skip(assistant))]
pub(crate) async fn run_delayed(
    assistant: Arc<dyn Assistant>,
    job: Job,
    delay: Duration,
) -> JobOutput {
    tokio::time::sleep(delay).await;
    let kind = job.kind();
    let output = job.run(assistant.as_ref());
    info!("{:?} job finished", kind);
    output
}
