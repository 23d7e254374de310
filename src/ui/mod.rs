//! Dialog and window requests from the engine
//!
//! The engine asks the embedder to show JavaScript dialogs, grant media
//! capture and close the page. Each request carries a one-shot reply that the
//! coordinator answers through the configured `DialogPresenter`.

use tokio::sync::oneshot;
use url::Url;

use crate::script::FrameInfo;

/// Device a capture permission request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCaptureKind {
    Camera,
    Microphone,
    CameraAndMicrophone,
}

/// Answer to a capture permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    /// Let the engine ask the user
    Prompt,
    Grant,
    Deny,
}

/// UI callback channel
#[derive(Debug)]
pub enum UiCallback {
    Alert {
        message: String,
        frame: FrameInfo,
        reply: oneshot::Sender<()>,
    },
    Confirm {
        message: String,
        frame: FrameInfo,
        reply: oneshot::Sender<bool>,
    },
    Prompt {
        message: String,
        default_text: Option<String>,
        frame: FrameInfo,
        reply: oneshot::Sender<Option<String>>,
    },
    MediaCapturePermission {
        origin: Url,
        kind: MediaCaptureKind,
        reply: oneshot::Sender<PermissionDecision>,
    },
    /// The page called `window.close()`
    Close,
}

/// Presents dialogs on behalf of the page
///
/// Defaults dismiss everything: alerts return immediately, confirms are
/// declined, prompts are cancelled.
pub trait DialogPresenter {
    fn alert(&mut self, message: &str, frame: &FrameInfo) {
        let _ = (message, frame);
    }

    fn confirm(&mut self, message: &str, frame: &FrameInfo) -> bool {
        let _ = (message, frame);
        false
    }

    fn prompt(&mut self, message: &str, default_text: Option<&str>, frame: &FrameInfo) -> Option<String> {
        let _ = (message, default_text, frame);
        None
    }

    fn media_capture_permission(&mut self, origin: &Url, kind: MediaCaptureKind) -> PermissionDecision {
        let _ = (origin, kind);
        PermissionDecision::Prompt
    }

    fn close(&mut self) {}
}

/// Dismisses every dialog
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDialogPresenter;

impl DialogPresenter for DefaultDialogPresenter {}

/// Routes UI callbacks to the presenter
pub struct UiCoordinator {
    presenter: Box<dyn DialogPresenter>,
    close_requested: bool,
}

impl UiCoordinator {
    pub fn new(presenter: Box<dyn DialogPresenter>) -> Self {
        Self {
            presenter,
            close_requested: false,
        }
    }

    pub fn handle(&mut self, callback: UiCallback) {
        let delivered = match callback {
            UiCallback::Alert {
                message,
                frame,
                reply,
            } => {
                self.presenter.alert(&message, &frame);
                reply.send(()).is_ok()
            }
            UiCallback::Confirm {
                message,
                frame,
                reply,
            } => reply.send(self.presenter.confirm(&message, &frame)).is_ok(),
            UiCallback::Prompt {
                message,
                default_text,
                frame,
                reply,
            } => {
                let answer = self.presenter.prompt(&message, default_text.as_deref(), &frame);
                reply.send(answer).is_ok()
            }
            UiCallback::MediaCapturePermission {
                origin,
                kind,
                reply,
            } => {
                let decision = self.presenter.media_capture_permission(&origin, kind);
                log::debug!("{:?} capture for {}: {:?}", kind, origin, decision);
                reply.send(decision).is_ok()
            }
            UiCallback::Close => {
                log::debug!("page requested close");
                self.close_requested = true;
                self.presenter.close();
                true
            }
        };
        if !delivered {
            log::debug!("engine stopped waiting for a dialog answer");
        }
    }

    /// Whether the page has asked to be closed
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

impl Default for UiCoordinator {
    fn default() -> Self {
        Self::new(Box::new(DefaultDialogPresenter))
    }
}
