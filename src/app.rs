//! Application core
//!
//! Holds the whole application state and turns user commands into state
//! changes plus a list of effects for the front end to carry out (print a
//! notification, schedule a job, copy to the clipboard, ...). Nothing in here
//! touches the terminal, the clipboard or the async runtime.

use crate::assist::{AudioSource, Job, JobKind, JobOutput};
use crate::fields::{FieldBinding, FieldId, NoteFields};
use crate::session::{self, SessionOutcome, SessionRepository};
use crate::store::{FontSize, StoreError};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A user action (or a finished job) to apply to the state
#[derive(Debug, Clone)]
pub(crate) enum Command {
    SetField { field: FieldId, text: String },
    AppendField { field: FieldId, text: String },
    NewSession(String),
    /// Save under the given name, or the current one if `None`
    SaveSession(Option<String>),
    LoadSession(String),
    /// Delete a session the user already confirmed
    DeleteSession(String),
    SetFontSize(FontSize),
    StartRecording,
    StopRecording,
    UploadAudio(PathBuf),
    CopySection(FieldId),
    CheckDrugs,
    GenerateRecommendations,
    AnalyzeConversation,
    ApplyTemplates,
    JobFinished(JobOutput),
}

/// Side effect requested by the core
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Notify { message: String, severity: Severity },
    /// Recording/processing status line
    Status(String),
    ApplyFontSize(FontSize),
    /// Run `job` after `delay` and feed the output back as `JobFinished`
    Schedule { job: Job, delay: Duration },
    CopyToClipboard { section: FieldId, text: String },
    /// Note sections were replaced wholesale and should be redrawn
    FieldsChanged,
}

fn notify(message: impl Into<String>, severity: Severity) -> Effect {
    Effect::Notify {
        message: message.into(),
        severity,
    }
}

fn no_such_session(name: &str) -> Effect {
    notify(format!("No session named \"{}\"", name), Severity::Info)
}

fn storage_failed(e: &StoreError) -> Effect {
    error!("Failed to persist sessions: {}", e);
    notify(format!("Failed to save sessions: {}", e), Severity::Error)
}

/// Delays of the simulated jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JobDelays {
    pub stop_recording: Duration,
    pub upload: Duration,
    pub drug_check: Duration,
    pub recommendations: Duration,
    pub analysis: Duration,
}

impl Default for JobDelays {
    fn default() -> Self {
        Self {
            stop_recording: Duration::from_millis(2000),
            upload: Duration::from_millis(1500),
            drug_check: Duration::from_millis(2000),
            recommendations: Duration::from_millis(2000),
            analysis: Duration::from_millis(2000),
        }
    }
}

/// Application state
pub(crate) struct App {
    repo: SessionRepository,
    fields: NoteFields,
    recording: bool,
    /// Jobs started and not yet finished; their controls are disabled
    pending: BTreeSet<JobKind>,
    delays: JobDelays,
}

impl App {
    pub(crate) fn new(repo: SessionRepository, delays: JobDelays) -> Self {
        Self {
            repo,
            fields: NoteFields::default(),
            recording: false,
            pending: BTreeSet::new(),
            delays,
        }
    }

    pub(crate) fn fields(&self) -> &NoteFields {
        &self.fields
    }

    pub(crate) fn sessions(&self) -> &SessionRepository {
        &self.repo
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording
    }

    pub(crate) fn is_pending(&self, kind: JobKind) -> bool {
        self.pending.contains(&kind)
    }

    /// Apply the stored font size and restore the current session
    pub(crate) fn start(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::ApplyFontSize(self.repo.font_size())];
        let current = self.repo.current_session().to_string();

        match self.repo.load(&current, &mut self.fields) {
            Ok(SessionOutcome::NotFound(name)) => {
                // Created but never saved; start it blank
                info!("Current session {:?} has no saved snapshot yet", name);
                self.fields.clear_all();
            }
            Ok(_) => {}
            Err(e) => effects.push(storage_failed(&e)),
        }

        effects.push(Effect::FieldsChanged);
        info!("Medical notes initialized (session: {})", self.repo.current_session());
        effects
    }

    pub(crate) fn dispatch(&mut self, command: Command) -> Vec<Effect> {
        debug!(?command, "Dispatching command");
        match command {
            Command::SetField { field, text } => {
                self.fields.write(field, text);
                self.auto_save()
            }
            Command::AppendField { field, text } => {
                self.fields.append(field, &text);
                self.auto_save()
            }
            Command::NewSession(name) => self.new_session(&name),
            Command::SaveSession(name) => self.save_session(name),
            Command::LoadSession(name) => self.load_session(&name),
            Command::DeleteSession(name) => self.delete_session(&name),
            Command::SetFontSize(size) => self.set_font_size(size),
            Command::StartRecording => self.start_recording(),
            Command::StopRecording => self.stop_recording(),
            Command::UploadAudio(path) => self.upload_audio(path),
            Command::CopySection(section) => vec![Effect::CopyToClipboard {
                section,
                text: self.fields.get(section).to_string(),
            }],
            Command::CheckDrugs => self.check_drugs(),
            Command::GenerateRecommendations => self.generate_recommendations(),
            Command::AnalyzeConversation => self.analyze_conversation(),
            Command::ApplyTemplates => self.apply_templates(),
            Command::JobFinished(output) => self.finish_job(output),
        }
    }

    fn auto_save(&mut self) -> Vec<Effect> {
        match session::on_field_edited(&mut self.repo, &self.fields) {
            Ok(_) => Vec::new(),
            Err(e) => vec![storage_failed(&e)],
        }
    }

    fn new_session(&mut self, name: &str) -> Vec<Effect> {
        match self.repo.create(name, &mut self.fields) {
            Ok(SessionOutcome::Created(name)) => vec![
                Effect::FieldsChanged,
                notify(format!("Created new session: {}", name), Severity::Success),
            ],
            Ok(_) => Vec::new(),
            Err(e) => vec![Effect::FieldsChanged, storage_failed(&e)],
        }
    }

    fn save_session(&mut self, name: Option<String>) -> Vec<Effect> {
        let name = name.unwrap_or_else(|| self.repo.current_session().to_string());
        match self.repo.save(&name, &self.fields) {
            Ok(SessionOutcome::Saved(name)) => {
                vec![notify(format!("Session \"{}\" saved", name), Severity::Success)]
            }
            Ok(_) => Vec::new(),
            Err(e) => vec![storage_failed(&e)],
        }
    }

    fn load_session(&mut self, name: &str) -> Vec<Effect> {
        match self.repo.load(name, &mut self.fields) {
            Ok(SessionOutcome::Loaded(name)) => vec![
                Effect::FieldsChanged,
                notify(format!("Session \"{}\" loaded", name), Severity::Success),
            ],
            Ok(SessionOutcome::Reset) => vec![Effect::FieldsChanged],
            Ok(SessionOutcome::NotFound(name)) => vec![no_such_session(&name)],
            Ok(_) => Vec::new(),
            Err(e) => vec![Effect::FieldsChanged, storage_failed(&e)],
        }
    }

    fn delete_session(&mut self, name: &str) -> Vec<Effect> {
        match self.repo.delete(name, &mut self.fields) {
            Ok(SessionOutcome::Deleted { name, was_active }) => {
                let mut effects =
                    vec![notify(format!("Session \"{}\" deleted", name), Severity::Success)];
                if was_active {
                    effects.push(Effect::FieldsChanged);
                }
                effects
            }
            Ok(SessionOutcome::NotFound(name)) => vec![no_such_session(&name)],
            Ok(_) => Vec::new(),
            Err(e) => vec![Effect::FieldsChanged, storage_failed(&e)],
        }
    }

    fn set_font_size(&mut self, size: FontSize) -> Vec<Effect> {
        let mut effects = vec![Effect::ApplyFontSize(size)];
        if let Err(e) = self.repo.set_font_size(size) {
            effects.push(storage_failed(&e));
        }
        effects
    }

    /// Mark a job as running and schedule it
    fn schedule(&mut self, job: Job, delay: Duration) -> Effect {
        self.pending.insert(job.kind());
        Effect::Schedule { job, delay }
    }

    fn busy(&self, kind: JobKind) -> Option<Vec<Effect>> {
        if self.pending.contains(&kind) {
            warn!("{:?} already running, control disabled", kind);
            Some(vec![notify("Still processing, please wait", Severity::Warning)])
        } else {
            None
        }
    }

    fn start_recording(&mut self) -> Vec<Effect> {
        if self.recording {
            warn!("Already recording, control disabled");
            return vec![notify("Already recording", Severity::Warning)];
        }
        if let Some(effects) = self.busy(JobKind::Transcription) {
            return effects;
        }

        self.recording = true;
        info!("Recording started");
        vec![Effect::Status("Recording...".to_string())]
    }

    fn stop_recording(&mut self) -> Vec<Effect> {
        if !self.recording {
            warn!("Not recording, control disabled");
            return vec![notify("Not recording", Severity::Warning)];
        }

        self.recording = false;
        info!("Recording stopped, transcribing");
        let job = Job::Transcribe {
            source: AudioSource::Microphone,
        };
        vec![
            Effect::Status("Recording finished. Processing...".to_string()),
            self.schedule(job, self.delays.stop_recording),
        ]
    }

    fn upload_audio(&mut self, path: PathBuf) -> Vec<Effect> {
        if path.as_os_str().is_empty() {
            return Vec::new();
        }
        if self.recording {
            warn!("Upload while recording, control disabled");
            return vec![notify("Stop the recording first", Severity::Warning)];
        }
        if let Some(effects) = self.busy(JobKind::Transcription) {
            return effects;
        }

        info!("Processing uploaded audio: {:?}", path);
        let job = Job::Transcribe {
            source: AudioSource::File(path),
        };
        vec![
            Effect::Status("Processing audio file...".to_string()),
            self.schedule(job, self.delays.upload),
        ]
    }

    fn check_drugs(&mut self) -> Vec<Effect> {
        if self.fields.is_unfilled(FieldId::CurrentMeds) {
            return vec![notify(
                "Fill in the current medications section first",
                Severity::Warning,
            )];
        }
        if let Some(effects) = self.busy(JobKind::DrugCheck) {
            return effects;
        }

        let job = Job::CheckDrugs {
            current_meds: self.fields.get(FieldId::CurrentMeds).to_string(),
            prescriptions: self.fields.get(FieldId::Prescriptions).to_string(),
        };
        vec![
            notify("Checking drug compatibility...", Severity::Info),
            self.schedule(job, self.delays.drug_check),
        ]
    }

    fn generate_recommendations(&mut self) -> Vec<Effect> {
        if let Some(effects) = self.busy(JobKind::Recommendations) {
            return effects;
        }

        let job = Job::Recommend {
            note: self.fields.capture_all(),
        };
        vec![
            notify("Generating recommendations...", Severity::Info),
            self.schedule(job, self.delays.recommendations),
        ]
    }

    fn analyze_conversation(&mut self) -> Vec<Effect> {
        if self.fields.is_unfilled(FieldId::Transcription) {
            return vec![notify(
                "Transcribe the conversation first",
                Severity::Warning,
            )];
        }
        if let Some(effects) = self.busy(JobKind::Analysis) {
            return effects;
        }

        let job = Job::Analyze {
            transcript: self.fields.get(FieldId::Transcription).to_string(),
        };
        vec![
            notify("Analyzing conversation...", Severity::Info),
            self.schedule(job, self.delays.analysis),
        ]
    }

    fn apply_templates(&mut self) -> Vec<Effect> {
        for id in FieldId::ALL {
            if let Some(template) = id.template() {
                if self.fields.is_unfilled(id) {
                    self.fields.write(id, template.to_string());
                }
            }
        }

        let mut effects = vec![
            Effect::FieldsChanged,
            notify("Templates applied to empty sections", Severity::Success),
        ];
        effects.extend(self.auto_save());
        effects
    }

    fn fill_sections(&mut self, sections: Vec<(FieldId, String)>) {
        for (id, text) in sections {
            self.fields.write(id, text);
        }
    }

    fn finish_job(&mut self, output: JobOutput) -> Vec<Effect> {
        self.pending.remove(&output.kind());

        let mut effects = match output {
            JobOutput::Transcribed {
                source,
                transcript,
                sections,
            } => {
                self.fields.write(FieldId::Transcription, transcript);
                self.fill_sections(sections);
                let status = match source {
                    AudioSource::Microphone => "Processing complete",
                    AudioSource::File(_) => "File processed",
                };
                vec![Effect::FieldsChanged, Effect::Status(status.to_string())]
            }
            JobOutput::DrugsChecked { report } => {
                return vec![notify(report, Severity::Success)];
            }
            JobOutput::Recommended { text } => {
                self.fields
                    .append(FieldId::Prescriptions, &format!("\n\n{}", text));
                vec![
                    Effect::FieldsChanged,
                    notify(
                        "Recommendations added to the prescriptions section",
                        Severity::Success,
                    ),
                ]
            }
            JobOutput::Analyzed { sections } => {
                self.fill_sections(sections);
                vec![
                    Effect::FieldsChanged,
                    notify(
                        "Analysis complete. Sections filled in automatically.",
                        Severity::Success,
                    ),
                ]
            }
        };

        effects.extend(self.auto_save());
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::SimulatedAssistant;
    use crate::session::ManualClock;
    use crate::store::{ConfigStore, Configuration, MemoryStorage, CONFIG_KEY, DEFAULT_SESSION};

    fn app_with(storage: &MemoryStorage) -> App {
        let repo = SessionRepository::open(ConfigStore::new(storage.clone()), ManualClock::at(1));
        App::new(repo, JobDelays::default())
    }

    fn app() -> (App, MemoryStorage) {
        let storage = MemoryStorage::default();
        (app_with(&storage), storage)
    }

    fn stored(storage: &MemoryStorage) -> Configuration {
        serde_json::from_str(&storage.get(CONFIG_KEY).unwrap()).unwrap()
    }

    /// Run every scheduled job immediately and feed the result back
    fn complete_jobs(app: &mut App, effects: &[Effect]) -> Vec<Effect> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Schedule { job, .. } => Some(job.clone()),
                _ => None,
            })
            .flat_map(|job| app.dispatch(Command::JobFinished(job.run(&SimulatedAssistant))))
            .collect()
    }

    fn has_notification(effects: &[Effect], severity: Severity) -> bool {
        effects
            .iter()
            .any(|e| matches!(e, Effect::Notify { severity: s, .. } if *s == severity))
    }

    fn set(app: &mut App, field: FieldId, text: &str) -> Vec<Effect> {
        app.dispatch(Command::SetField {
            field,
            text: text.to_string(),
        })
    }

    #[test]
    fn test_start_restores_current_session() {
        let storage = MemoryStorage::default();
        {
            let mut app = app_with(&storage);
            app.dispatch(Command::NewSession("visit1".to_string()));
            set(&mut app, FieldId::Complaints, "headache");
            app.dispatch(Command::SetFontSize(FontSize::Large));
        }

        let mut app = app_with(&storage);
        let effects = app.start();

        assert_eq!(effects[0], Effect::ApplyFontSize(FontSize::Large));
        assert_eq!(app.sessions().current_session(), "visit1");
        assert_eq!(app.fields().get(FieldId::Complaints), "headache");
    }

    #[test]
    fn test_start_with_unsaved_current_session_is_blank() {
        let storage = MemoryStorage::default();
        app_with(&storage).dispatch(Command::NewSession("draft".to_string()));

        let mut app = app_with(&storage);
        app.start();

        assert_eq!(app.sessions().current_session(), "draft");
        assert_eq!(app.fields(), &NoteFields::default());
    }

    #[test]
    fn test_edits_in_default_session_are_not_saved() {
        let (mut app, storage) = app();
        app.start();

        set(&mut app, FieldId::Complaints, "headache");
        set(&mut app, FieldId::Diagnosis, "migraine");

        assert_eq!(app.sessions().list().count(), 0);
        assert!(stored(&storage).sessions.is_empty());
    }

    #[test]
    fn test_visit_scenario_through_commands() {
        let (mut app, storage) = app();
        app.start();

        let effects = app.dispatch(Command::NewSession("visit1".to_string()));
        assert!(has_notification(&effects, Severity::Success));
        assert_eq!(app.fields(), &NoteFields::default());

        set(&mut app, FieldId::Complaints, "headache");
        assert_eq!(stored(&storage).sessions["visit1"].data["complaints"], "headache");

        set(&mut app, FieldId::Diagnosis, "migraine");
        app.dispatch(Command::SaveSession(Some("visit1".to_string())));
        app.dispatch(Command::LoadSession("default".to_string()));
        assert_eq!(app.fields(), &NoteFields::default());

        let effects = app.dispatch(Command::LoadSession("visit1".to_string()));
        assert!(effects.contains(&Effect::FieldsChanged));
        assert_eq!(app.fields().get(FieldId::Complaints), "headache");
        assert_eq!(app.fields().get(FieldId::Diagnosis), "migraine");
    }

    #[test]
    fn test_save_without_name_uses_current() {
        let (mut app, _) = app();
        app.dispatch(Command::NewSession("visit1".to_string()));
        let effects = app.dispatch(Command::SaveSession(None));
        assert!(has_notification(&effects, Severity::Success));
        assert!(app.sessions().get("visit1").is_some());
    }

    #[test]
    fn test_save_without_name_in_default_session_is_noop() {
        let (mut app, storage) = app();
        let effects = app.dispatch(Command::SaveSession(None));
        assert!(effects.is_empty());
        assert!(storage.get(CONFIG_KEY).is_none());
    }

    #[test]
    fn test_blank_session_name_is_noop() {
        let (mut app, _) = app();
        set(&mut app, FieldId::Allergies, "latex");

        let effects = app.dispatch(Command::NewSession("   ".to_string()));

        assert!(effects.is_empty());
        assert_eq!(app.sessions().current_session(), DEFAULT_SESSION);
        assert_eq!(app.fields().get(FieldId::Allergies), "latex");
    }

    #[test]
    fn test_load_unknown_session_keeps_note() {
        let (mut app, _) = app();
        set(&mut app, FieldId::Allergies, "latex");
        let effects = app.dispatch(Command::LoadSession("nonexistent".to_string()));
        assert_eq!(
            effects,
            vec![notify("No session named \"nonexistent\"", Severity::Info)]
        );
        assert_eq!(app.fields().get(FieldId::Allergies), "latex");
        assert_eq!(app.sessions().current_session(), DEFAULT_SESSION);
    }

    #[test]
    fn test_delete_unknown_session_reports_it() {
        let (mut app, storage) = app();
        app.dispatch(Command::NewSession("visit1".to_string()));
        set(&mut app, FieldId::Complaints, "cough");

        let effects = app.dispatch(Command::DeleteSession("ghost".to_string()));

        assert_eq!(
            effects,
            vec![notify("No session named \"ghost\"", Severity::Info)]
        );
        assert_eq!(app.sessions().current_session(), "visit1");
        assert_eq!(app.fields().get(FieldId::Complaints), "cough");
        assert!(stored(&storage).sessions.contains_key("visit1"));
    }

    #[test]
    fn test_delete_active_session() {
        let (mut app, _) = app();
        app.dispatch(Command::NewSession("visit1".to_string()));
        set(&mut app, FieldId::Complaints, "cough");

        let effects = app.dispatch(Command::DeleteSession("visit1".to_string()));

        assert!(effects.contains(&Effect::FieldsChanged));
        assert_eq!(app.sessions().current_session(), DEFAULT_SESSION);
        assert_eq!(app.fields(), &NoteFields::default());

        // Further edits stay unsaved
        set(&mut app, FieldId::Complaints, "fever");
        assert_eq!(app.sessions().list().count(), 0);
    }

    #[test]
    fn test_recording_controls_exclude_each_other() {
        let (mut app, _) = app();

        let effects = app.dispatch(Command::StopRecording);
        assert!(has_notification(&effects, Severity::Warning));

        let effects = app.dispatch(Command::StartRecording);
        assert_eq!(effects, vec![Effect::Status("Recording...".to_string())]);
        assert!(app.is_recording());
        assert!(has_notification(
            &app.dispatch(Command::StartRecording),
            Severity::Warning
        ));
        assert!(has_notification(
            &app.dispatch(Command::UploadAudio(PathBuf::from("visit.wav"))),
            Severity::Warning
        ));

        let effects = app.dispatch(Command::StopRecording);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Schedule { delay, .. } if *delay == Duration::from_millis(2000)
        )));
        assert!(!app.is_recording());
        assert!(app.is_pending(JobKind::Transcription));

        // Still transcribing: record stays disabled
        assert!(has_notification(
            &app.dispatch(Command::StartRecording),
            Severity::Warning
        ));
    }

    #[test]
    fn test_transcription_fills_note_and_autosaves() {
        let (mut app, storage) = app();
        app.dispatch(Command::NewSession("visit1".to_string()));
        app.dispatch(Command::StartRecording);
        let scheduled = app.dispatch(Command::StopRecording);

        let effects = complete_jobs(&mut app, &scheduled);

        assert!(effects.contains(&Effect::Status("Processing complete".to_string())));
        assert!(!app.is_pending(JobKind::Transcription));
        assert!(!app.fields().is_unfilled(FieldId::Transcription));
        for id in FieldId::ALL {
            assert!(!app.fields().is_unfilled(id), "{} left empty", id);
        }
        let saved = &stored(&storage).sessions["visit1"].data;
        assert_eq!(saved["transcription"], app.fields().get(FieldId::Transcription));
    }

    #[test]
    fn test_upload_reports_file_processed() {
        let (mut app, _) = app();
        assert!(app.dispatch(Command::UploadAudio(PathBuf::new())).is_empty());

        let scheduled = app.dispatch(Command::UploadAudio(PathBuf::from("visit.wav")));
        assert!(scheduled.contains(&Effect::Status("Processing audio file...".to_string())));
        assert!(scheduled.iter().any(|e| matches!(
            e,
            Effect::Schedule { delay, .. } if *delay == Duration::from_millis(1500)
        )));
        assert!(has_notification(
            &app.dispatch(Command::UploadAudio(PathBuf::from("again.wav"))),
            Severity::Warning
        ));

        let effects = complete_jobs(&mut app, &scheduled);
        assert!(effects.contains(&Effect::Status("File processed".to_string())));
    }

    #[test]
    fn test_drug_check_needs_current_meds() {
        let (mut app, _) = app();
        let effects = app.dispatch(Command::CheckDrugs);
        assert!(has_notification(&effects, Severity::Warning));
        assert!(!app.is_pending(JobKind::DrugCheck));

        set(&mut app, FieldId::CurrentMeds, FieldId::CurrentMeds.placeholder());
        assert!(has_notification(&app.dispatch(Command::CheckDrugs), Severity::Warning));

        set(&mut app, FieldId::CurrentMeds, "warfarin");
        let scheduled = app.dispatch(Command::CheckDrugs);
        assert!(has_notification(&scheduled, Severity::Info));
        assert!(app.is_pending(JobKind::DrugCheck));

        let effects = complete_jobs(&mut app, &scheduled);
        assert!(has_notification(&effects, Severity::Success));
        assert!(!app.is_pending(JobKind::DrugCheck));
    }

    #[test]
    fn test_recommendations_append_to_prescriptions() {
        let (mut app, storage) = app();
        app.dispatch(Command::NewSession("visit1".to_string()));
        set(&mut app, FieldId::Prescriptions, "Omeprazole");

        let scheduled = app.dispatch(Command::GenerateRecommendations);
        assert!(has_notification(
            &app.dispatch(Command::GenerateRecommendations),
            Severity::Warning
        ));
        complete_jobs(&mut app, &scheduled);

        let prescriptions = app.fields().get(FieldId::Prescriptions);
        assert!(prescriptions.starts_with("Omeprazole\n\nRecommendations"));
        assert_eq!(
            stored(&storage).sessions["visit1"].data["prescriptions"],
            prescriptions
        );
    }

    #[test]
    fn test_analysis_needs_transcript() {
        let (mut app, _) = app();
        assert!(has_notification(
            &app.dispatch(Command::AnalyzeConversation),
            Severity::Warning
        ));

        set(&mut app, FieldId::Transcription, "Doctor: what brings you in?");
        let scheduled = app.dispatch(Command::AnalyzeConversation);
        assert!(has_notification(
            &app.dispatch(Command::AnalyzeConversation),
            Severity::Warning
        ));
        let effects = complete_jobs(&mut app, &scheduled);

        assert!(has_notification(&effects, Severity::Success));
        assert!(!app.fields().is_unfilled(FieldId::Diagnosis));
        assert_eq!(
            app.fields().get(FieldId::Transcription),
            "Doctor: what brings you in?"
        );
    }

    #[test]
    fn test_templates_only_fill_empty_sections() {
        let (mut app, storage) = app();
        app.dispatch(Command::NewSession("visit1".to_string()));
        set(&mut app, FieldId::Diagnosis, "Migraine");
        set(&mut app, FieldId::Complaints, FieldId::Complaints.placeholder());

        app.dispatch(Command::ApplyTemplates);

        let fields = app.fields();
        assert_eq!(fields.get(FieldId::Diagnosis), "Migraine");
        assert_eq!(
            fields.get(FieldId::Complaints),
            "Complaints at the time of examination: "
        );
        assert_eq!(fields.get(FieldId::Allergies), "Allergy history: unremarkable.");
        assert_eq!(fields.get(FieldId::Transcription), "");
        assert_eq!(
            stored(&storage).sessions["visit1"].data["allergies"],
            "Allergy history: unremarkable."
        );
    }

    #[test]
    fn test_copy_section_emits_text() {
        let (mut app, _) = app();
        set(&mut app, FieldId::Diagnosis, "Gastritis");
        assert_eq!(
            app.dispatch(Command::CopySection(FieldId::Diagnosis)),
            vec![Effect::CopyToClipboard {
                section: FieldId::Diagnosis,
                text: "Gastritis".to_string()
            }]
        );
    }

    #[test]
    fn test_font_size_is_persisted() {
        let (mut app, storage) = app();
        let effects = app.dispatch(Command::SetFontSize(FontSize::Small));
        assert_eq!(effects, vec![Effect::ApplyFontSize(FontSize::Small)]);
        assert_eq!(stored(&storage).font_size, FontSize::Small);
    }
}
