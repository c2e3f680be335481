//! Named note sessions
//!
//! A session is a snapshot of every note section saved under a name. The
//! repository keeps the snapshots and the "current session" pointer and
//! persists both through the config store after every change; auto-save keeps
//! the current named session in step with edits.

mod autosave;
mod repository;

pub(crate) use autosave::on_field_edited;
pub(crate) use repository::{SessionOutcome, SessionRepository, SystemClock};

#[cfg(test)]
pub(crate) use repository::ManualClock;
