//! Line-oriented console front end
//!
//! Reads commands from stdin, feeds them to the application core and carries
//! out the effects it returns: printing notifications and the note, running
//! assistant jobs in the background and copying to the clipboard. Finished
//! jobs come back over a channel and are dispatched like any other command,
//! so the application state only ever changes on this loop.

use crate::app::{App, Command, Effect, Severity};
use crate::assist::{self, Assistant, Job, JobKind, JobOutput};
use crate::clipboard::copy_to_clipboard;
use crate::fields::FieldId;
use crate::store::FontSize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

const HELP: &str = "Commands:
  show                      Show the note
  set <section> <text>      Replace a section (\\n for a newline)
  append <section> <text>   Append to a section
  new <name>                Start a new session
  save [name]               Save the note (defaults to the current session)
  load <name>               Load a saved session (\"default\" starts blank)
  delete <name>             Delete a saved session
  list                      List saved sessions
  font <small|normal|large> Change the font size
  record | stop             Start/stop recording the consultation
  upload <path>             Transcribe an audio file
  copy [section]            Copy a section (default: transcription)
  drugs                     Check drug compatibility
  recommend                 Add recommendations to the prescriptions
  analyze                   Fill sections from the transcript
  templates                 Fill empty sections with templates
  help | quit";

/// One parsed line of user input
#[derive(Debug, Clone)]
pub(crate) enum Input {
    Command(Command),
    /// Ask before dispatching a delete
    ConfirmDelete(String),
    Show,
    ListSessions,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Split off the first word of a line
fn split_word(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (line, ""),
    }
}

fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}

fn parse_section_edit(rest: &str) -> Result<(FieldId, String), String> {
    let (section, text) = split_word(rest);
    if section.is_empty() {
        return Err("Usage: set <section> <text>".to_string());
    }
    let field = section.parse::<FieldId>().map_err(|e| e.to_string())?;
    Ok((field, unescape(text)))
}

/// Parse a line of console input
pub(crate) fn parse_line(line: &str) -> Input {
    let line = line.trim();
    let (word, rest) = split_word(line);
    let rest_trimmed = rest.trim();

    let command = match word {
        "" => return Input::Empty,
        "show" => return Input::Show,
        "list" | "sessions" => return Input::ListSessions,
        "help" | "?" => return Input::Help,
        "quit" | "exit" => return Input::Quit,
        "set" => match parse_section_edit(rest) {
            Ok((field, text)) => Command::SetField { field, text },
            Err(msg) => return Input::Invalid(msg),
        },
        "append" => match parse_section_edit(rest) {
            Ok((field, text)) => Command::AppendField { field, text },
            Err(msg) => return Input::Invalid(msg),
        },
        "new" => Command::NewSession(rest_trimmed.to_string()),
        "save" if rest_trimmed.is_empty() => Command::SaveSession(None),
        "save" => Command::SaveSession(Some(rest_trimmed.to_string())),
        "load" | "delete" if rest_trimmed.is_empty() => {
            return Input::Invalid(format!("Usage: {} <name>", word))
        }
        "load" => Command::LoadSession(rest_trimmed.to_string()),
        "delete" => return Input::ConfirmDelete(rest_trimmed.to_string()),
        "font" => match rest_trimmed.parse::<FontSize>() {
            Ok(size) => Command::SetFontSize(size),
            Err(msg) => return Input::Invalid(msg),
        },
        "record" => Command::StartRecording,
        "stop" => Command::StopRecording,
        "upload" => Command::UploadAudio(PathBuf::from(rest_trimmed)),
        "copy" if rest_trimmed.is_empty() => Command::CopySection(FieldId::Transcription),
        "copy" => match rest_trimmed.parse::<FieldId>() {
            Ok(field) => Command::CopySection(field),
            Err(e) => return Input::Invalid(e.to_string()),
        },
        "drugs" => Command::CheckDrugs,
        "recommend" => Command::GenerateRecommendations,
        "analyze" => Command::AnalyzeConversation,
        "templates" => Command::ApplyTemplates,
        other => return Input::Invalid(format!("Unknown command: {} (try \"help\")", other)),
    };

    Input::Command(command)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Local date and time of a save, for the session list
pub(crate) fn format_saved_at(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| millis.to_string())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_notification(message: &str, severity: Severity) {
    println!("[{}] {}", severity, message);
}

fn render_sessions(app: &App) {
    let repo = app.sessions();
    let mut any = false;
    for (name, saved_at) in repo.list() {
        any = true;
        let marker = if name == repo.current_session() { '*' } else { ' ' };
        println!("{} {} ({})", marker, name, format_saved_at(saved_at));
    }
    if !any {
        println!("No saved sessions");
    }
}

/// Carries out effects returned by the application core
struct EffectRunner {
    assistant: Arc<dyn Assistant>,
    job_tx: mpsc::UnboundedSender<JobOutput>,
    font_size: FontSize,
}

impl EffectRunner {
    fn run(&mut self, app: &App, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify { message, severity } => print_notification(&message, severity),
                Effect::Status(text) => println!("Status: {}", text),
                Effect::ApplyFontSize(size) => {
                    self.font_size = size;
                    println!("Font size: {}", size);
                }
                Effect::Schedule { job, delay } => self.spawn_job(job, delay),
                Effect::CopyToClipboard { section, text } => match copy_to_clipboard(&text) {
                    Ok(()) => print_notification(
                        &format!("Section \"{}\" copied to clipboard", section.display_name()),
                        Severity::Success,
                    ),
                    Err(_) => print_notification("Copy failed", Severity::Error),
                },
                Effect::FieldsChanged => self.render_note(app),
            }
        }
    }

    fn spawn_job(&self, job: Job, delay: Duration) {
        let assistant = self.assistant.clone();
        let job_tx = self.job_tx.clone();
        tokio::spawn(async move {
            let output = assist::run_delayed(assistant, job, delay).await;
            if job_tx.send(output).is_err() {
                warn!("Job finished after the console closed");
            }
        });
    }

    /// Print every section; the font size sets the spacing
    fn render_note(&self, app: &App) {
        println!("=== Session: {} ===", app.sessions().current_session());
        if app.is_recording() {
            println!("(recording)");
        }
        for kind in [
            JobKind::Transcription,
            JobKind::DrugCheck,
            JobKind::Recommendations,
            JobKind::Analysis,
        ] {
            if app.is_pending(kind) {
                println!("({:?} in progress)", kind);
            }
        }

        for id in FieldId::ALL {
            let content = app.fields().get(id);
            match self.font_size {
                FontSize::Small => {
                    let label = format!("{}:", id.display_name());
                    let first = content.lines().next().unwrap_or("");
                    println!("{:<22} {}", label, first);
                    continue;
                }
                FontSize::Normal => println!("-- {} [{}]", id.display_name(), id),
                FontSize::Large => {
                    println!();
                    println!("== {} [{}] ==", id.display_name().to_uppercase(), id);
                }
            }
            if content.is_empty() {
                println!("   ({})", id.placeholder());
            } else {
                for line in content.lines() {
                    println!("   {}", line);
                }
            }
        }
    }
}

/// Run the console until stdin closes or the user quits
pub(crate) async fn run(mut app: App, assistant: Arc<dyn Assistant>) -> anyhow::Result<()> {
    let (job_tx, mut job_rx) = mpsc::unbounded_channel::<JobOutput>();
    let mut runner = EffectRunner {
        assistant,
        job_tx,
        font_size: FontSize::default(),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_delete: Option<String> = None;

    let effects = app.start();
    runner.run(&app, effects);
    println!("Type \"help\" for commands.");
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                if let Some(name) = pending_delete.take() {
                    if is_yes(&line) {
                        let effects = app.dispatch(Command::DeleteSession(name));
                        runner.run(&app, effects);
                    } else {
                        println!("Cancelled");
                    }
                    prompt();
                    continue;
                }

                match parse_line(&line) {
                    Input::Command(command) => {
                        let effects = app.dispatch(command);
                        runner.run(&app, effects);
                    }
                    Input::ConfirmDelete(name) => {
                        match app.sessions().get(&name) {
                            Some(record) => print!(
                                "Delete session \"{}\" (saved {})? [y/N] ",
                                name,
                                format_saved_at(record.timestamp)
                            ),
                            None => print!("Delete session \"{}\"? [y/N] ", name),
                        }
                        let _ = std::io::stdout().flush();
                        pending_delete = Some(name);
                        continue;
                    }
                    Input::Show => runner.render_note(&app),
                    Input::ListSessions => render_sessions(&app),
                    Input::Help => println!("{}", HELP),
                    Input::Quit => break,
                    Input::Empty => {}
                    Input::Invalid(message) => println!("{}", message),
                }
                prompt();
            }
            Some(output) = job_rx.recv() => {
                println!();
                let effects = app.dispatch(Command::JobFinished(output));
                runner.run(&app, effects);
                prompt();
            }
        }
    }

    info!("Console closed");
    Ok(())
}
