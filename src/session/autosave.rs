//! Auto-save on edit
//!
//! Every edit to a note section re-saves the current session, unless no named
//! session is active. Edits to the unnamed default session stay unsaved until
//! the user picks a name.

use super::repository::{SessionOutcome, SessionRepository};
use crate::fields::FieldBinding;
use crate::store::StoreError;
use tracing::debug;

/// React to an edit of any bound section
///
/// Returns `true` if the current session was saved.
pub(crate) fn on_field_edited(
    repo: &mut SessionRepository,
    fields: &dyn FieldBinding,
) -> Result<bool, StoreError> {
    if repo.is_default_active() {
        debug!("Auto-save skipped for the default session");
        return Ok(false);
    }

    let name = repo.current_session().to_string();
    let outcome = repo.save(&name, fields)?;
    Ok(matches!(outcome, SessionOutcome::Saved(_)))
}
