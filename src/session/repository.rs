//! Session snapshots and the current-session pointer

use crate::fields::FieldBinding;
use crate::store::{
    ConfigStore, Configuration, FontSize, SessionRecord, StoreError, DEFAULT_SESSION,
};
use tracing::{debug, info, warn};

/// Source of save timestamps
pub(crate) trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-advanced clock for tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct ManualClock(std::sync::Arc<std::sync::atomic::AtomicI64>);

#[cfg(test)]
impl ManualClock {
    pub(crate) fn at(millis: i64) -> Self {
        Self(std::sync::Arc::new(std::sync::atomic::AtomicI64::new(millis)))
    }

    pub(crate) fn set(&self, millis: i64) {
        self.0.store(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// What a session operation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionOutcome {
    /// Fields cleared and the pointer moved to a new, not yet saved name
    Created(String),
    /// Fields stored under the name, which is now current
    Saved(String),
    /// Stored fields restored and the name made current
    Loaded(String),
    /// Fields cleared and the pointer reset to the default session
    Reset,
    /// Record removed; `was_active` if it was the current session
    Deleted { name: String, was_active: bool },
    /// Empty, whitespace-only or reserved name; nothing changed
    Declined,
    /// No session by that name; nothing changed
    NotFound(String),
}

/// Trim a user-supplied name, rejecting empty and reserved names
fn usable_name(raw: &str) -> Option<&str> {
    let name = raw.trim();
    if name.is_empty() || name == DEFAULT_SESSION {
        None
    } else {
        Some(name)
    }
}

/// Saved sessions plus the pointer to the active one
///
/// Every mutating operation writes the full configuration back through the
/// config store before returning. A write failure is returned after the
/// in-memory change has been applied.
pub(crate) struct SessionRepository {
    store: ConfigStore,
    config: Configuration,
    clock: Box<dyn Clock>,
}

impl SessionRepository {
    /// Load the stored configuration and wrap it
    pub(crate) fn open(mut store: ConfigStore, clock: impl Clock + 'static) -> Self {
        let mut config = store.load();
        if config.sessions.remove(DEFAULT_SESSION).is_some() {
            warn!("Dropped stored session using the reserved name \"{}\"", DEFAULT_SESSION);
        }
        Self {
            store,
            config,
            clock: Box::new(clock),
        }
    }

    /// Name of the active session (`"default"` when none is)
    pub(crate) fn current_session(&self) -> &str {
        &self.config.current_session
    }

    /// Whether no named session is active
    pub(crate) fn is_default_active(&self) -> bool {
        self.config.current_session == DEFAULT_SESSION
    }

    pub(crate) fn get(&self, name: &str) -> Option<&SessionRecord> {
        self.config.sessions.get(name)
    }

    /// Saved sessions as `(name, saved_at_millis)`, recomputed on every call
    pub(crate) fn list(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.config
            .sessions
            .iter()
            .map(|(name, record)| (name.as_str(), record.timestamp))
    }

    pub(crate) fn font_size(&self) -> FontSize {
        self.config.font_size
    }

    pub(crate) fn set_font_size(&mut self, size: FontSize) -> Result<(), StoreError> {
        self.config.font_size = size;
        info!("Font size set to {}", size);
        self.persist()
    }

    /// Start a new, empty session
    ///
    /// The record itself is only written on the first save.
    pub(crate) fn create(
        &mut self,
        name: &str,
        fields: &mut dyn FieldBinding,
    ) -> Result<SessionOutcome, StoreError> {
        let Some(name) = usable_name(name) else {
            debug!("Declined to create session with name {:?}", name);
            return Ok(SessionOutcome::Declined);
        };

        fields.clear_all();
        self.config.current_session = name.to_string();
        info!("Created session: {}", name);
        self.persist()?;
        Ok(SessionOutcome::Created(name.to_string()))
    }

    /// Snapshot the fields under `name` and make it current
    pub(crate) fn save(
        &mut self,
        name: &str,
        fields: &dyn FieldBinding,
    ) -> Result<SessionOutcome, StoreError> {
        let Some(name) = usable_name(name) else {
            debug!("Declined to save session with name {:?}", name);
            return Ok(SessionOutcome::Declined);
        };

        // Saved-at never goes backwards for a given name
        let now = self.clock.now_millis();
        let timestamp = self
            .config
            .sessions
            .get(name)
            .map_or(now, |previous| now.max(previous.timestamp));

        self.config.sessions.insert(
            name.to_string(),
            SessionRecord {
                data: fields.capture_all(),
                timestamp,
            },
        );
        self.config.current_session = name.to_string();
        debug!(timestamp, "Saved session: {}", name);
        self.persist()?;
        Ok(SessionOutcome::Saved(name.to_string()))
    }

    /// Restore the fields saved under `name`
    ///
    /// Loading the default session, which is never stored, clears the fields
    /// and resets the pointer. Unknown names change nothing.
    pub(crate) fn load(
        &mut self,
        name: &str,
        fields: &mut dyn FieldBinding,
    ) -> Result<SessionOutcome, StoreError> {
        let name = name.trim();

        if let Some(record) = self.config.sessions.get(name) {
            fields.apply_all(&record.data);
            self.config.current_session = name.to_string();
            info!("Loaded session: {}", name);
            self.persist()?;
            return Ok(SessionOutcome::Loaded(name.to_string()));
        }

        if name == DEFAULT_SESSION {
            fields.clear_all();
            self.config.current_session = DEFAULT_SESSION.to_string();
            info!("Started blank default session");
            self.persist()?;
            return Ok(SessionOutcome::Reset);
        }

        debug!("No session named {:?}", name);
        Ok(SessionOutcome::NotFound(name.to_string()))
    }

    /// Remove a saved session
    ///
    /// Deleting the active session also clears the fields and resets the
    /// pointer to the default session.
    pub(crate) fn delete(
        &mut self,
        name: &str,
        fields: &mut dyn FieldBinding,
    ) -> Result<SessionOutcome, StoreError> {
        let name = name.trim();
        if self.config.sessions.remove(name).is_none() {
            debug!("No session named {:?} to delete", name);
            return Ok(SessionOutcome::NotFound(name.to_string()));
        }

        let was_active = self.config.current_session == name;
        if was_active {
            self.config.current_session = DEFAULT_SESSION.to_string();
            fields.clear_all();
        }
        info!(was_active, "Deleted session: {}", name);
        self.persist()?;
        Ok(SessionOutcome::Deleted {
            name: name.to_string(),
            was_active,
        })
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.store.save(&self.config)
    }
}
