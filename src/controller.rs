//! Upload → analyzing → result state machine.
//!
//! The view and the outcome live in one `State` value, so a result without an
//! image (or an analysis without one) cannot be represented. Every transition is a
//! single assignment under the lock; the lock is never held across the network call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::{failure_message, IngestError};
use crate::gemini::Analyzer;
use crate::ingest::{ingest, ImageBlob, UploadedImage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Upload { error: Option<String> },
    Analyzing { image: UploadedImage },
    Result { image: UploadedImage, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewState {
    Upload,
    Analyzing,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Pending,
    Success { text: String },
    Failure { message: String },
}

/// What the HTTP API reports about the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub view: ViewState,
    pub image: Option<UploadedImage>,
    pub outcome: Option<AnalysisOutcome>,
}

impl Default for State {
    fn default() -> Self {
        State::Upload { error: None }
    }
}

impl State {
    pub fn view(&self) -> ViewState {
        match self {
            State::Upload { .. } => ViewState::Upload,
            State::Analyzing { .. } => ViewState::Analyzing,
            State::Result { .. } => ViewState::Result,
        }
    }

    /// `None` once the outcome has been cleared.
    pub fn outcome(&self) -> Option<AnalysisOutcome> {
        match self {
            State::Upload { error: None } => None,
            State::Upload { error: Some(message) } => Some(AnalysisOutcome::Failure {
                message: message.clone(),
            }),
            State::Analyzing { .. } => Some(AnalysisOutcome::Pending),
            State::Result { text, .. } => Some(AnalysisOutcome::Success { text: text.clone() }),
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        match self {
            State::Upload { .. } => None,
            State::Analyzing { image } | State::Result { image, .. } => Some(image),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            view: self.view(),
            image: self.image().cloned(),
            outcome: self.outcome(),
        }
    }
}

/// Ticket for an analysis started by [`AppController::select`].
#[derive(Debug, Clone)]
pub struct PendingAnalysis {
    generation: u64,
    image: UploadedImage,
}

impl PendingAnalysis {
    pub fn image(&self) -> &UploadedImage {
        &self.image
    }
}

#[derive(Default)]
struct Inner {
    state: State,
    /// Bumped by every select and reset; results from older generations are dropped.
    generation: u64,
}

pub struct AppController<A> {
    analyzer: A,
    inner: Mutex<Inner>,
}

impl<A: Analyzer> AppController<A> {
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            inner: Mutex::new(Inner::default()),
        }
    }

    #[cfg(test)]
    pub(crate) fn analyzer(&self) -> &A {
        &self.analyzer
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> State {
        self.lock().state.clone()
    }

    pub fn view(&self) -> ViewState {
        self.lock().state.view()
    }

    pub fn outcome(&self) -> Option<AnalysisOutcome> {
        self.lock().state.outcome()
    }

    pub fn image(&self) -> Option<UploadedImage> {
        self.lock().state.image().cloned()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().state.snapshot()
    }

    /// Validate the blob and enter ANALYZING.
    ///
    /// A rejected blob leaves the machine where it was; when that is UPLOAD the
    /// rejection becomes the displayed failure. A valid blob supersedes whatever
    /// analysis may still be in flight.
    pub fn select(&self, blob: ImageBlob) -> Result<PendingAnalysis, IngestError> {
        let image = match ingest(blob) {
            Ok(image) => image,
            Err(err) => {
                let mut inner = self.lock();
                if matches!(inner.state, State::Upload { .. }) {
                    inner.state = State::Upload {
                        error: Some(failure_message(&err)),
                    };
                }
                return Err(err);
            }
        };

        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = State::Analyzing {
            image: image.clone(),
        };
        log::debug!(
            "-> ANALYZING {:?} (generation {})",
            image.file_name,
            inner.generation
        );

        Ok(PendingAnalysis {
            generation: inner.generation,
            image,
        })
    }

    /// Call the analyzer for a pending selection and apply its outcome.
    pub async fn run(&self, pending: PendingAnalysis) -> Snapshot {
        let result = self
            .analyzer
            .analyze(&pending.image.base64, &pending.image.mime_type)
            .await;

        let mut inner = self.lock();
        if inner.generation != pending.generation {
            log::info!(
                "Dropping stale analysis for {:?} (generation {}, now {})",
                pending.image.file_name,
                pending.generation,
                inner.generation
            );
            return inner.state.snapshot();
        }

        inner.state = match result {
            Ok(text) => {
                log::debug!("-> RESULT ({} chars)", text.len());
                State::Result {
                    image: pending.image,
                    text,
                }
            }
            Err(err) => {
                log::warn!("Analysis failed: {err}");
                State::Upload {
                    error: Some(failure_message(&err)),
                }
            }
        };
        inner.state.snapshot()
    }

    /// Select an image and wait for its analysis to settle.
    ///
    /// A rejected blob is returned as the error rather than as whatever snapshot
    /// happens to be current, which may belong to another upload.
    pub async fn handle_image(&self, blob: ImageBlob) -> Result<Snapshot, IngestError> {
        let pending = self.select(blob)?;
        Ok(self.run(pending).await)
    }

    pub fn reset(&self) -> Snapshot {
        let mut inner = self.lock();
        inner.generation += 1;
        if inner.state != State::default() {
            log::debug!("-> UPLOAD (reset from {:?})", inner.state.view());
            inner.state = State::default();
        }
        inner.state.snapshot()
    }
}

impl<A: Analyzer + 'static> AppController<A> {
    /// Run a pending analysis on its own task.
    ///
    /// Once started the call always settles and applies its outcome, even if
    /// whoever is awaiting the handle goes away.
    pub fn spawn(self: &Arc<Self>, pending: PendingAnalysis) -> JoinHandle<Snapshot> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.run(pending).await })
    }
}
