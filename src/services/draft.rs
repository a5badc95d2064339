//! Editor drafts and notice submission.
//!
//! DESIGN
//! ======
//! Each operator session owns one `Draft`: the form fields, the selected
//! image with its preview handle, the last validation result, and the
//! submission phase.
//!
//! LIFECYCLE
//! =========
//! `Idle → Pending → Idle` on success (form reset, preview released) and
//! `Idle → Pending → Failed` on a store failure (form kept for correction).
//! While `Pending` every mutation and any second submit is refused. Each
//! submit makes exactly one store write; there is no automatic retry.
//!
//! The draft lock is never held across the simulated latency or the store
//! call, so other sessions are not blocked by a pending submission.

use serde::Serialize;
use tracing::{info, warn};

use crate::services::board::record_update;
use crate::services::feed;
use crate::services::images::{ImageFile, image_url};
use crate::services::notice::{Notice, today};
use crate::services::preview::{PreviewHandle, PreviewRegistry};
use crate::services::store::StoreError;
use crate::services::validation::{self, Field, FieldError, FieldErrors};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmitPhase {
    #[default]
    Idle,
    Pending,
    Failed {
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("a submission is pending")]
    Pending,
    #[error("file rejected: {}", .0.code())]
    File(FieldError),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("a submission is already pending")]
    AlreadyPending,
    #[error("validation failed")]
    Invalid(FieldErrors),
    #[error("error creating notice: {0}")]
    Store(#[from] StoreError),
    #[error("submission task failed: {0}")]
    Task(String),
}

impl crate::frame::ErrorCode for DraftError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Pending => "E_SUBMIT_PENDING",
            Self::File(_) => "E_FILE_REJECTED",
        }
    }
}

impl crate::frame::ErrorCode for SubmitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyPending => "E_SUBMIT_PENDING",
            Self::Invalid(_) => "E_VALIDATION",
            Self::Store(_) => "E_STORE_UNAVAILABLE",
            Self::Task(_) => "E_INTERNAL",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Values captured when a submission enters `Pending`.
#[derive(Debug, Clone)]
pub struct Submission {
    pub title: String,
    pub description: String,
    pub file: Option<ImageFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub mime: String,
    pub size: usize,
}

/// Serializable snapshot of a draft for the Editor surface.
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub title: String,
    pub description: String,
    pub title_chars: usize,
    pub description_chars: usize,
    pub file: Option<FileSummary>,
    pub preview_url: Option<String>,
    pub errors: FieldErrors,
    pub phase: SubmitPhase,
}

// =============================================================================
// DRAFT
// =============================================================================

#[derive(Debug, Default)]
pub struct Draft {
    title: String,
    description: String,
    file: Option<ImageFile>,
    preview: Option<PreviewHandle>,
    errors: FieldErrors,
    phase: SubmitPhase,
}

impl Draft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn file(&self) -> Option<&ImageFile> {
        self.file.as_ref()
    }

    #[must_use]
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[must_use]
    pub fn phase(&self) -> &SubmitPhase {
        &self.phase
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.phase == SubmitPhase::Pending
    }

    /// True when every field is in its initial state.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.file.is_none() && self.preview.is_none()
    }

    /// Replace the text fields and recompute their errors.
    ///
    /// # Errors
    ///
    /// `Pending` while a submission is in flight.
    pub fn set_fields(&mut self, title: impl Into<String>, description: impl Into<String>) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.title = title.into();
        self.description = description.into();
        self.validate();
        Ok(())
    }

    /// Select an image. A rejected file leaves the previous selection and its
    /// preview in place and records the `file` error. An accepted file
    /// supersedes the previous selection and releases its preview. The new
    /// preview is served only to the session `owner`.
    ///
    /// # Errors
    ///
    /// `Pending` while a submission is in flight, `File` on rejection.
    pub fn select_file(&mut self, previews: &PreviewRegistry, owner: &str, file: ImageFile) -> Result<(), DraftError> {
        self.ensure_editable()?;
        if let Err(err) = validation::validate_file(file.info()) {
            self.errors.set(Field::File, err);
            return Err(DraftError::File(err));
        }

        self.errors.clear(Field::File);
        self.release_preview();
        self.preview = Some(previews.acquire(owner, file.clone()));
        self.file = Some(file);
        Ok(())
    }

    /// Drop the selected image and release its preview.
    ///
    /// # Errors
    ///
    /// `Pending` while a submission is in flight.
    pub fn clear_file(&mut self) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.file = None;
        self.errors.clear(Field::File);
        self.release_preview();
        Ok(())
    }

    /// Validate the current values and remember the result.
    pub fn validate(&mut self) -> &FieldErrors {
        self.errors = validation::validate(&self.title, &self.description, self.file.as_ref().map(ImageFile::info));
        &self.errors
    }

    /// Return to the empty initial state, releasing any preview.
    ///
    /// # Errors
    ///
    /// `Pending` while a submission is in flight.
    pub fn reset(&mut self) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.clear();
        Ok(())
    }

    /// Enter `Pending` if the draft validates, capturing the values to submit.
    ///
    /// # Errors
    ///
    /// `AlreadyPending` during an in-flight submission, `Invalid` with every
    /// field error otherwise.
    pub fn begin_submit(&mut self) -> Result<Submission, SubmitError> {
        if self.is_pending() {
            return Err(SubmitError::AlreadyPending);
        }
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SubmitError::Invalid(errors.clone()));
        }

        self.phase = SubmitPhase::Pending;
        Ok(Submission {
            title: self.title.trim().to_owned(),
            description: self.description.trim().to_owned(),
            file: self.file.clone(),
        })
    }

    /// Submission stored: back to the empty form.
    pub fn finish_success(&mut self) {
        self.clear();
    }

    /// Submission failed: keep every field, report the failure.
    pub fn finish_failure(&mut self, message: impl Into<String>) {
        self.phase = SubmitPhase::Failed { message: message.into() };
    }

    #[must_use]
    pub fn view(&self) -> DraftView {
        DraftView {
            title: self.title().to_owned(),
            description: self.description().to_owned(),
            title_chars: validation::text_length(self.title()),
            description_chars: validation::text_length(self.description()),
            file: self.file().map(|f| FileSummary { mime: f.mime.clone(), size: f.bytes.len() }),
            preview_url: self.preview().map(PreviewHandle::url),
            errors: self.errors().clone(),
            phase: self.phase().clone(),
        }
    }

    fn ensure_editable(&mut self) -> Result<(), DraftError> {
        if self.is_pending() {
            return Err(DraftError::Pending);
        }
        // Editing after a failure starts a fresh attempt.
        if matches!(self.phase, SubmitPhase::Failed { .. }) {
            self.phase = SubmitPhase::Idle;
        }
        Ok(())
    }

    fn release_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            handle.release();
        }
    }

    fn clear(&mut self) {
        self.release_preview();
        self.title.clear();
        self.description.clear();
        self.file = None;
        self.errors = FieldErrors::new();
        self.phase = SubmitPhase::Idle;
    }
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Submit the draft owned by `session`.
///
/// Waits the configured latency, stores the image, constructs the notice and
/// writes it to the notice store once. On success the draft is reset and
/// Board viewers receive `notice:created`; on failure the image reference is
/// dropped again and the draft keeps its contents in the `Failed` phase.
///
/// # Errors
///
/// `AlreadyPending`, `Invalid`, or `Store` as described on [`SubmitError`].
pub async fn submit(state: &AppState, session: &str) -> Result<Notice, SubmitError> {
    let submission = {
        let mut drafts = state.drafts.write().await;
        drafts.entry(session.to_owned()).or_default().begin_submit()?
    };
    info!(title = %submission.title, has_image = submission.file.is_some(), "notice submission pending");

    tokio::time::sleep(state.config.submit_delay).await;

    let digest = submission.file.as_ref().map(|file| state.images.put(file));
    let notice = Notice {
        id: state.ids.next_id(),
        title: submission.title,
        description: submission.description,
        image_url: digest.as_deref().map(image_url),
        timestamp: today(),
    };
    let result = state.notices.insert(notice.clone()).await;

    {
        let mut drafts = state.drafts.write().await;
        let draft = drafts.get_mut(session);
        match (&result, draft) {
            (Ok(()), Some(draft)) => draft.finish_success(),
            (Err(e), Some(draft)) => draft.finish_failure(format!("Error creating notice. Please try again. ({e})")),
            // Session ended while pending; nothing left to update.
            (_, None) => {}
        }
    }

    match result {
        Ok(()) => {
            record_update(state).await;
            feed::publish(state, &feed::notice_created_frame(&notice)).await;
            info!(id = %notice.id, "notice created");
            Ok(notice)
        }
        Err(e) => {
            if let Some(digest) = &digest {
                state.images.remove(digest);
            }
            warn!(error = %e, "notice submission failed");
            Err(SubmitError::Store(e))
        }
    }
}

/// Run [`submit`] on its own task so a dropped request cannot abandon a
/// pending draft halfway.
///
/// # Errors
///
/// As [`submit`], plus `Task` if the task panicked.
pub async fn submit_detached(state: &AppState, session: &str) -> Result<Notice, SubmitError> {
    let state = state.clone();
    let session = session.to_owned();
    tokio::spawn(async move { submit(&state, &session).await })
        .await
        .map_err(|e| SubmitError::Task(e.to_string()))?
}

/// Release and forget the draft of an ended session.
pub async fn discard(state: &AppState, session: &str) {
    // Dropping the draft drops its preview handle, which releases it.
    let removed = state.drafts.write().await.remove(session);
    if removed.is_some_and(|draft| !draft.is_blank()) {
        info!("unsubmitted draft discarded");
    }
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
