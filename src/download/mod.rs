//! Download coordinator
//!
//! A `DownloadId` is handed out the moment a download is requested. The
//! engine resolves its own handle later, and may report progress for that
//! handle before the resolution arrives. Such updates are held per handle and
//! replayed in arrival order once the handle is tied to an id, ahead of any
//! live update.

mod decider;

pub use decider::{DefaultDownloadDecider, DirectoryDownloadDecider, DownloadDecider};

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::PathBuf;

use futures::stream::BoxStream;
use tokio::sync::oneshot;
use url::Url;

use crate::engine::DownloadHandle;
use crate::utils::{LoadError, Subscribers};

/// Opaque identity of one download; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DownloadId(u64);

impl DownloadId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "download#{}", self.0)
    }
}

/// Update the engine reports for a download handle
#[derive(Debug)]
pub enum DownloadUpdate {
    Progress {
        received: u64,
        expected: Option<u64>,
    },
    Redirected(Url),
    /// The engine needs a destination; `None` cancels the download
    DestinationRequested {
        suggested_filename: String,
        reply: oneshot::Sender<Option<PathBuf>>,
    },
    Finished,
    Failed {
        error: LoadError,
        resume_data: Option<Vec<u8>>,
    },
}

/// Download callback channel
#[derive(Debug)]
pub enum DownloadCallback {
    /// A requested download now has an engine handle
    Resolved {
        ticket: DownloadId,
        handle: DownloadHandle,
    },
    /// The engine could not start a requested download
    ResolutionFailed { ticket: DownloadId, error: LoadError },
    /// A navigation turned into a download
    Began { handle: DownloadHandle, url: Url },
    Update {
        handle: DownloadHandle,
        update: DownloadUpdate,
    },
}

/// Bytes received so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub received: u64,
    pub expected: Option<u64>,
}

impl DownloadProgress {
    /// Completed fraction, when the expected size is known
    pub fn fraction(&self) -> Option<f64> {
        match self.expected {
            Some(0) => Some(1.0),
            Some(expected) => Some((self.received as f64 / expected as f64).min(1.0)),
            None => None,
        }
    }
}

/// Public download event kinds
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEventKind {
    Progress(DownloadProgress),
    Redirected(Url),
    DestinationDecided(Option<PathBuf>),
    Finished,
    Failed {
        error: LoadError,
        resume_data: Option<Vec<u8>>,
    },
}

impl DownloadEventKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadEventKind::Finished | DownloadEventKind::Failed { .. })
    }
}

/// A download event as seen by consumers
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadEvent {
    pub id: DownloadId,
    pub kind: DownloadEventKind,
}

/// Where a download came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOrigin {
    Request(Url),
    Resume,
    Navigation(Url),
}

/// Lifecycle of a download id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Issued, engine handle not yet known
    Pending,
    Active,
    Finished,
    Failed,
    Cancelled,
}

impl DownloadState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadState::Finished | DownloadState::Failed | DownloadState::Cancelled
        )
    }
}

/// Result of a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Cancelled before resolution; nothing more will be delivered
    Discarded,
    /// The engine must cancel this handle
    Forward(DownloadHandle),
    /// Already terminal or unknown
    Ignored,
}

struct DownloadRecord {
    origin: DownloadOrigin,
    state: DownloadState,
    handle: Option<DownloadHandle>,
}

/// Unresolved handles whose updates are held at once; the oldest is dropped
/// beyond this
const MAX_UNCLAIMED_HANDLES: usize = 64;

/// Stream of download events
pub type DownloadEvents = BoxStream<'static, DownloadEvent>;

/// Issues download ids and orders their events
pub struct DownloadCoordinator {
    next_id: u64,
    records: HashMap<DownloadId, DownloadRecord>,
    by_handle: HashMap<DownloadHandle, DownloadId>,
    /// Updates for handles not yet tied to an id, in arrival order
    unclaimed: HashMap<DownloadHandle, Vec<DownloadUpdate>>,
    /// Keys of `unclaimed`, oldest first
    unclaimed_order: VecDeque<DownloadHandle>,
    /// Handles of downloads cancelled before resolution
    discarded: HashSet<DownloadHandle>,
    listeners: Subscribers<DownloadEvent>,
    decider: Box<dyn DownloadDecider>,
}

impl DownloadCoordinator {
    pub fn new(decider: Box<dyn DownloadDecider>) -> Self {
        Self {
            next_id: 1,
            records: HashMap::new(),
            by_handle: HashMap::new(),
            unclaimed: HashMap::new(),
            unclaimed_order: VecDeque::new(),
            discarded: HashSet::new(),
            listeners: Subscribers::new(),
            decider,
        }
    }

    /// Issue an id for a download whose handle is not known yet
    pub fn issue(&mut self, origin: DownloadOrigin) -> DownloadId {
        self.insert(origin, DownloadState::Pending, None)
    }

    fn insert(
        &mut self,
        origin: DownloadOrigin,
        state: DownloadState,
        handle: Option<DownloadHandle>,
    ) -> DownloadId {
        let id = DownloadId(self.next_id);
        self.next_id += 1;
        log::debug!("issued {} for {:?}", id, origin);
        self.records.insert(
            id,
            DownloadRecord {
                origin,
                state,
                handle,
            },
        );
        id
    }

    /// Route a download callback
    ///
    /// Returns a handle the engine should cancel, if any.
    pub fn handle(&mut self, callback: DownloadCallback) -> Option<DownloadHandle> {
        match callback {
            DownloadCallback::Resolved { ticket, handle } => self.resolve(ticket, handle),
            DownloadCallback::ResolutionFailed { ticket, error } => {
                match self.records.get_mut(&ticket) {
                    Some(record) if record.state == DownloadState::Pending => {
                        record.state = DownloadState::Failed;
                        log::debug!("{} failed to start: {}", ticket, error);
                        self.listeners.publish(DownloadEvent {
                            id: ticket,
                            kind: DownloadEventKind::Failed {
                                error,
                                resume_data: None,
                            },
                        });
                    }
                    _ => log::debug!("ignoring resolution failure for {}", ticket),
                }
                None
            }
            DownloadCallback::Began { handle, url } => {
                if self.by_handle.contains_key(&handle) {
                    log::warn!("download handle {} began twice", handle.raw());
                    return None;
                }
                let id = self.insert(
                    DownloadOrigin::Navigation(url),
                    DownloadState::Active,
                    Some(handle),
                );
                self.attach(id, handle);
                None
            }
            DownloadCallback::Update { handle, update } => {
                if self.discarded.contains(&handle) {
                    log::trace!("dropping update for discarded handle {}", handle.raw());
                    if matches!(update, DownloadUpdate::Finished | DownloadUpdate::Failed { .. }) {
                        self.discarded.remove(&handle);
                    }
                    return None;
                }
                match self.by_handle.get(&handle).copied() {
                    Some(id) => self.apply(id, update),
                    None => self.buffer(handle, update),
                }
                None
            }
        }
    }

    fn resolve(&mut self, ticket: DownloadId, handle: DownloadHandle) -> Option<DownloadHandle> {
        let Some(record) = self.records.get_mut(&ticket) else {
            log::warn!("resolution for unknown {}", ticket);
            self.discard(handle);
            return Some(handle);
        };

        match record.state {
            DownloadState::Pending => {
                record.state = DownloadState::Active;
                record.handle = Some(handle);
                self.attach(ticket, handle);
                None
            }
            DownloadState::Cancelled => {
                log::debug!("{} was cancelled before resolution", ticket);
                self.discard(handle);
                Some(handle)
            }
            state => {
                log::warn!("duplicate resolution for {} in state {:?}", ticket, state);
                None
            }
        }
    }

    fn buffer(&mut self, handle: DownloadHandle, update: DownloadUpdate) {
        log::trace!("buffering update for unresolved handle {}", handle.raw());
        if let Some(buffered) = self.unclaimed.get_mut(&handle) {
            buffered.push(update);
            return;
        }
        if self.unclaimed_order.len() >= MAX_UNCLAIMED_HANDLES {
            if let Some(oldest) = self.unclaimed_order.pop_front() {
                log::warn!("dropping updates held for unresolved handle {}", oldest.raw());
                self.unclaimed.remove(&oldest);
            }
        }
        self.unclaimed_order.push_back(handle);
        self.unclaimed.insert(handle, vec![update]);
    }

    fn take_unclaimed(&mut self, handle: DownloadHandle) -> Option<Vec<DownloadUpdate>> {
        let buffered = self.unclaimed.remove(&handle)?;
        self.unclaimed_order.retain(|h| *h != handle);
        Some(buffered)
    }

    /// Tie a handle to an id and replay anything buffered for it
    fn attach(&mut self, id: DownloadId, handle: DownloadHandle) {
        self.by_handle.insert(handle, id);
        if let Some(buffered) = self.take_unclaimed(handle) {
            log::trace!("replaying {} buffered updates for {}", buffered.len(), id);
            for update in buffered {
                self.apply(id, update);
            }
        }
    }

    fn discard(&mut self, handle: DownloadHandle) {
        self.discarded.insert(handle);
        // dropping buffered destination replies tells the engine to give up
        self.take_unclaimed(handle);
    }

    fn apply(&mut self, id: DownloadId, update: DownloadUpdate) {
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if record.state.is_terminal() {
            log::warn!("dropping {:?} for terminal {}", update, id);
            return;
        }

        let kind = match update {
            DownloadUpdate::Progress { received, expected } => {
                DownloadEventKind::Progress(DownloadProgress { received, expected })
            }
            DownloadUpdate::Redirected(url) => DownloadEventKind::Redirected(url),
            DownloadUpdate::DestinationRequested {
                suggested_filename,
                reply,
            } => {
                let destination = self.decider.destination(id, &suggested_filename);
                if reply.send(destination.clone()).is_err() {
                    log::debug!("engine dropped destination request for {}", id);
                }
                DownloadEventKind::DestinationDecided(destination)
            }
            DownloadUpdate::Finished => {
                record.state = DownloadState::Finished;
                DownloadEventKind::Finished
            }
            DownloadUpdate::Failed { error, resume_data } => {
                record.state = DownloadState::Failed;
                DownloadEventKind::Failed { error, resume_data }
            }
        };

        self.listeners.publish(DownloadEvent { id, kind });
    }

    /// Cancel a download by id
    pub fn cancel(&mut self, id: DownloadId) -> CancelOutcome {
        let Some(record) = self.records.get_mut(&id) else {
            return CancelOutcome::Ignored;
        };
        match (record.state, record.handle) {
            (DownloadState::Pending, _) => {
                record.state = DownloadState::Cancelled;
                log::debug!("{} cancelled before resolution", id);
                CancelOutcome::Discarded
            }
            (DownloadState::Active, Some(handle)) => CancelOutcome::Forward(handle),
            _ => CancelOutcome::Ignored,
        }
    }

    pub fn state(&self, id: DownloadId) -> Option<DownloadState> {
        self.records.get(&id).map(|r| r.state)
    }

    pub fn origin(&self, id: DownloadId) -> Option<&DownloadOrigin> {
        self.records.get(&id).map(|r| &r.origin)
    }

    /// Id a resolved engine handle belongs to
    pub fn id_for_handle(&self, handle: DownloadHandle) -> Option<DownloadId> {
        self.by_handle.get(&handle).copied()
    }

    pub fn events(&mut self) -> DownloadEvents {
        self.listeners.subscribe()
    }

    pub fn shutdown(&mut self) {
        self.listeners.close();
        self.unclaimed.clear();
        self.unclaimed_order.clear();
    }
}

impl Default for DownloadCoordinator {
    fn default() -> Self {
        Self::new(Box::new(DefaultDownloadDecider))
    }
}
