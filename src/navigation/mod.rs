//! Navigation coordinator
//!
//! Turns raw engine lifecycle callbacks into canonical per-navigation events.
//! Each engine token is wrapped into a `NavigationId` the first time it is
//! seen, either as the return value of a load or as the first callback of an
//! engine-initiated navigation.
//!
//! State graph per navigation:
//!
//! ```text
//! NotStarted -> Provisional -> Committed -> Finished
//!                   |  ^            \
//!                   |  '-redirect    '-> Failed
//!                   '-> FailedProvisional
//! ```
//!
//! The current navigation is the most recently started one. Events of a
//! superseded navigation are still published but never move the pointer back.

mod back_forward;
mod policy;

pub use back_forward::{BackForwardItem, BackForwardList};
pub use policy::{
    DefaultNavigationDecider, NavigationAction, NavigationDecider, NavigationPolicy,
    NavigationResponse, NavigationType,
};

use std::collections::HashMap;
use std::fmt;

use futures::stream::BoxStream;
use tokio::sync::oneshot;

use crate::engine::NavigationToken;
use crate::utils::{LoadError, Subscribers};

/// Opaque identity of one navigation; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavigationId(u64);

impl fmt::Display for NavigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "navigation#{}", self.0)
    }
}

/// Lifecycle callback as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum RawNavigationEvent {
    DidStartProvisional,
    DidReceiveServerRedirect,
    DidCommit,
    DidFailProvisional(LoadError),
    DidFail(LoadError),
    DidFinish,
}

/// Navigation callback channel
#[derive(Debug)]
pub enum NavigationCallback {
    Lifecycle {
        token: NavigationToken,
        event: RawNavigationEvent,
    },
    DecideActionPolicy {
        action: NavigationAction,
        reply: oneshot::Sender<NavigationPolicy>,
    },
    DecideResponsePolicy {
        response: NavigationResponse,
        reply: oneshot::Sender<NavigationPolicy>,
    },
}

/// Canonical event kinds
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEventKind {
    Started,
    ReceivedServerRedirect,
    Committed,
    Finished,
    FailedProvisional(LoadError),
    Failed(LoadError),
}

impl NavigationEventKind {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NavigationEventKind::Finished
                | NavigationEventKind::FailedProvisional(_)
                | NavigationEventKind::Failed(_)
        )
    }
}

impl From<RawNavigationEvent> for NavigationEventKind {
    fn from(raw: RawNavigationEvent) -> Self {
        match raw {
            RawNavigationEvent::DidStartProvisional => NavigationEventKind::Started,
            RawNavigationEvent::DidReceiveServerRedirect => {
                NavigationEventKind::ReceivedServerRedirect
            }
            RawNavigationEvent::DidCommit => NavigationEventKind::Committed,
            RawNavigationEvent::DidFailProvisional(err) => NavigationEventKind::FailedProvisional(err),
            RawNavigationEvent::DidFail(err) => NavigationEventKind::Failed(err),
            RawNavigationEvent::DidFinish => NavigationEventKind::Finished,
        }
    }
}

/// A canonical navigation event
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationEvent {
    pub id: NavigationId,
    pub kind: NavigationEventKind,
    /// Position in the page-wide emission order
    pub sequence: u64,
}

/// Per-navigation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    NotStarted,
    Provisional,
    Committed,
    Finished,
    FailedProvisional,
    Failed,
}

impl NavigationState {
    /// Next state for an event, or `None` if the edge is not in the graph
    pub fn advance(self, kind: &NavigationEventKind) -> Option<NavigationState> {
        use NavigationEventKind as K;
        use NavigationState as S;
        match (self, kind) {
            (S::NotStarted, K::Started) => Some(S::Provisional),
            (S::Provisional, K::ReceivedServerRedirect) => Some(S::Provisional),
            (S::Provisional, K::Committed) => Some(S::Committed),
            (S::Provisional, K::FailedProvisional(_)) => Some(S::FailedProvisional),
            (S::Committed, K::Finished) => Some(S::Finished),
            (S::Committed, K::Failed(_)) => Some(S::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NavigationState::Finished | NavigationState::FailedProvisional | NavigationState::Failed
        )
    }
}

/// Stream of every canonical navigation event
pub type NavigationEvents = BoxStream<'static, NavigationEvent>;

/// Canonicalizes engine navigation callbacks
pub struct NavigationCoordinator {
    next_id: u64,
    next_sequence: u64,
    /// Tokens whose navigation has not reached a terminal state; a token
    /// leaves at its terminal event and only a new start brings it back
    live: HashMap<NavigationToken, NavigationId>,
    states: HashMap<NavigationId, NavigationState>,
    current: Option<NavigationId>,
    current_event: Option<NavigationEvent>,
    listeners: Subscribers<NavigationEvent>,
    decider: Box<dyn NavigationDecider>,
}

impl NavigationCoordinator {
    pub fn new(decider: Box<dyn NavigationDecider>) -> Self {
        Self {
            next_id: 1,
            next_sequence: 0,
            live: HashMap::new(),
            states: HashMap::new(),
            current: None,
            current_event: None,
            listeners: Subscribers::new(),
            decider,
        }
    }

    /// Wrap the token returned by a load call
    ///
    /// A token that is already live keeps its existing id.
    pub fn register_load(&mut self, token: NavigationToken) -> NavigationId {
        if let Some(id) = self.live.get(&token) {
            return *id;
        }
        self.issue(token)
    }

    fn issue(&mut self, token: NavigationToken) -> NavigationId {
        let id = NavigationId(self.next_id);
        self.next_id += 1;
        self.live.insert(token, id);
        self.states.insert(id, NavigationState::NotStarted);
        log::debug!("{} wraps engine token {}", id, token.raw());
        id
    }

    /// Route a navigation callback
    ///
    /// Returns the canonical event for lifecycle callbacks that fit the graph.
    pub fn handle(&mut self, callback: NavigationCallback) -> Option<NavigationEvent> {
        match callback {
            NavigationCallback::Lifecycle { token, event } => self.handle_lifecycle(token, event),
            NavigationCallback::DecideActionPolicy { action, reply } => {
                let policy = self.decider.decide_policy_for_action(&action);
                log::debug!("policy for {}: {:?}", action.request.url(), policy);
                if reply.send(policy).is_err() {
                    log::debug!("engine dropped action policy request");
                }
                None
            }
            NavigationCallback::DecideResponsePolicy { response, reply } => {
                let policy = self.decider.decide_policy_for_response(&response);
                log::debug!("response policy for {}: {:?}", response.url, policy);
                if reply.send(policy).is_err() {
                    log::debug!("engine dropped response policy request");
                }
                None
            }
        }
    }

    fn handle_lifecycle(
        &mut self,
        token: NavigationToken,
        raw: RawNavigationEvent,
    ) -> Option<NavigationEvent> {
        let kind = NavigationEventKind::from(raw);

        let id = match self.live.get(&token) {
            Some(id) => *id,
            None if kind == NavigationEventKind::Started => self.issue(token),
            None => {
                log::warn!("dropping {:?} for token {} with no live navigation", kind, token.raw());
                return None;
            }
        };

        let state = self.states.get(&id).copied().unwrap_or(NavigationState::NotStarted);
        let Some(next) = state.advance(&kind) else {
            log::warn!("dropping {:?} for {} in state {:?}", kind, id, state);
            return None;
        };
        self.states.insert(id, next);

        if next.is_terminal() {
            self.live.remove(&token);
        }

        let event = NavigationEvent {
            id,
            kind,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        if event.kind == NavigationEventKind::Started {
            if let Some(previous) = self.current.filter(|previous| *previous != id) {
                if self.states.get(&previous).is_some_and(|s| !s.is_terminal()) {
                    log::debug!("{} supersedes in-flight {}", id, previous);
                }
            }
            self.current = Some(id);
        }
        if self.current == Some(id) {
            self.current_event = Some(event.clone());
        } else {
            log::debug!("{:?} for superseded {}", event.kind, id);
        }

        self.listeners.publish(event.clone());
        Some(event)
    }

    /// The most recently started navigation
    pub fn current_navigation(&self) -> Option<NavigationId> {
        self.current
    }

    /// Latest event of the current navigation
    pub fn current_event(&self) -> Option<&NavigationEvent> {
        self.current_event.as_ref()
    }

    pub fn state(&self, id: NavigationId) -> Option<NavigationState> {
        self.states.get(&id).copied()
    }

    /// Navigations that have not reached a terminal state
    pub fn in_flight(&self) -> usize {
        self.live.len()
    }

    /// Stream of every event, including those of superseded navigations
    pub fn events(&mut self) -> NavigationEvents {
        self.listeners.subscribe()
    }

    /// End all event streams
    pub fn shutdown(&mut self) {
        self.listeners.close();
    }
}

impl Default for NavigationCoordinator {
    fn default() -> Self {
        Self::new(Box::new(DefaultNavigationDecider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn lifecycle(token: u64, event: RawNavigationEvent) -> NavigationCallback {
        NavigationCallback::Lifecycle {
            token: NavigationToken::new(token),
            event,
        }
    }

    fn kinds(events: &[NavigationEvent]) -> Vec<(NavigationId, NavigationEventKind)> {
        events.iter().map(|e| (e.id, e.kind.clone())).collect()
    }

    #[test]
    fn test_full_lifecycle() {
        let mut coordinator = NavigationCoordinator::default();
        let id = coordinator.register_load(NavigationToken::new(10));
        assert_eq!(coordinator.state(id), Some(NavigationState::NotStarted));

        for raw in [
            RawNavigationEvent::DidStartProvisional,
            RawNavigationEvent::DidReceiveServerRedirect,
            RawNavigationEvent::DidCommit,
            RawNavigationEvent::DidFinish,
        ] {
            assert!(coordinator.handle(lifecycle(10, raw)).is_some());
        }
        assert_eq!(coordinator.state(id), Some(NavigationState::Finished));
        assert_eq!(coordinator.current_navigation(), Some(id));
        assert_eq!(
            coordinator.current_event().map(|e| e.kind.clone()),
            Some(NavigationEventKind::Finished)
        );
        assert_eq!(coordinator.in_flight(), 0);
    }

    #[test]
    fn test_register_load_is_idempotent_per_token() {
        let mut coordinator = NavigationCoordinator::default();
        let a = coordinator.register_load(NavigationToken::new(1));
        let again = coordinator.register_load(NavigationToken::new(1));
        let b = coordinator.register_load(NavigationToken::new(2));
        assert_eq!(a, again);
        assert_ne!(a, b);
    }

    #[test]
    fn test_engine_initiated_navigation_gets_id() {
        let mut coordinator = NavigationCoordinator::default();
        let event = coordinator
            .handle(lifecycle(5, RawNavigationEvent::DidStartProvisional))
            .unwrap();
        assert_eq!(coordinator.current_navigation(), Some(event.id));
    }

    #[test]
    fn test_out_of_graph_events_dropped() {
        let mut coordinator = NavigationCoordinator::default();
        let id = coordinator.register_load(NavigationToken::new(1));
        // commit before start
        assert!(coordinator.handle(lifecycle(1, RawNavigationEvent::DidCommit)).is_none());
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidStartProvisional));
        // finish before commit
        assert!(coordinator.handle(lifecycle(1, RawNavigationEvent::DidFinish)).is_none());
        // failed (post-commit) while provisional
        let err = LoadError::new("network", 1, "x");
        assert!(coordinator.handle(lifecycle(1, RawNavigationEvent::DidFail(err))).is_none());
        assert_eq!(coordinator.state(id), Some(NavigationState::Provisional));
        // unknown token without a start
        assert!(coordinator.handle(lifecycle(99, RawNavigationEvent::DidFinish)).is_none());
    }

    #[test]
    fn test_nothing_after_terminal() {
        let mut coordinator = NavigationCoordinator::default();
        let id = coordinator.register_load(NavigationToken::new(1));
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidStartProvisional));
        let err = LoadError::new("network", -1001, "timed out");
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidFailProvisional(err)));
        assert_eq!(coordinator.state(id), Some(NavigationState::FailedProvisional));
        assert!(coordinator.handle(lifecycle(1, RawNavigationEvent::DidCommit)).is_none());
        assert!(coordinator.handle(lifecycle(1, RawNavigationEvent::DidFinish)).is_none());
    }

    #[test]
    fn test_finished_token_restart_gets_fresh_id() {
        let mut coordinator = NavigationCoordinator::default();
        let first = coordinator.register_load(NavigationToken::new(1));
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidStartProvisional));
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidCommit));
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidFinish));

        let second = coordinator
            .handle(lifecycle(1, RawNavigationEvent::DidStartProvisional))
            .unwrap()
            .id;
        assert_ne!(first, second);
        assert_eq!(coordinator.state(first), Some(NavigationState::Finished));
    }

    #[test]
    fn test_finished_tokens_leave_no_bookkeeping() {
        let mut coordinator = NavigationCoordinator::default();
        for token in 1..=100 {
            coordinator.register_load(NavigationToken::new(token));
            coordinator.handle(lifecycle(token, RawNavigationEvent::DidStartProvisional));
            coordinator.handle(lifecycle(token, RawNavigationEvent::DidCommit));
            coordinator.handle(lifecycle(token, RawNavigationEvent::DidFinish));
        }
        assert!(coordinator.live.is_empty());
        assert_eq!(coordinator.in_flight(), 0);

        // late callbacks for a finished token are still dropped
        assert!(coordinator.handle(lifecycle(7, RawNavigationEvent::DidFinish)).is_none());
        assert!(coordinator.handle(lifecycle(7, RawNavigationEvent::DidCommit)).is_none());
    }

    #[test]
    fn test_superseded_navigation_does_not_retarget_current() {
        let mut coordinator = NavigationCoordinator::default();
        let mut stream = coordinator.events();
        let a = coordinator.register_load(NavigationToken::new(1));
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidStartProvisional));
        let b = coordinator.register_load(NavigationToken::new(2));
        coordinator.handle(lifecycle(2, RawNavigationEvent::DidStartProvisional));
        assert_eq!(coordinator.current_navigation(), Some(b));

        let err = LoadError::new("WebKitErrorDomain", 102, "frame load interrupted");
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidFailProvisional(err.clone())));
        assert_eq!(coordinator.current_navigation(), Some(b));
        assert_eq!(
            coordinator.current_event().map(|e| e.id),
            Some(b),
            "stale terminal event must not become the current event"
        );

        coordinator.handle(lifecycle(2, RawNavigationEvent::DidCommit));
        coordinator.handle(lifecycle(2, RawNavigationEvent::DidFinish));
        coordinator.shutdown();

        let events: Vec<_> = futures::executor::block_on(stream.by_ref().collect());
        assert_eq!(
            kinds(&events),
            vec![
                (a, NavigationEventKind::Started),
                (b, NavigationEventKind::Started),
                (a, NavigationEventKind::FailedProvisional(err)),
                (b, NavigationEventKind::Committed),
                (b, NavigationEventKind::Finished),
            ]
        );
        let sequences: Vec<_> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_policy_requests_are_answered() {
        let mut coordinator = NavigationCoordinator::default();
        let (reply, mut answer) = oneshot::channel();
        let response = NavigationResponse {
            url: url::Url::parse("https://example.com/archive.zip").unwrap(),
            mime_type: Some("application/zip".into()),
            status: Some(200),
            is_for_main_frame: true,
            can_show_mime_type: false,
        };
        assert!(coordinator
            .handle(NavigationCallback::DecideResponsePolicy { response, reply })
            .is_none());
        assert_eq!(answer.try_recv().ok(), Some(NavigationPolicy::Download));
    }

    #[test]
    fn test_shutdown_ends_stream() {
        let mut coordinator = NavigationCoordinator::default();
        let mut stream = coordinator.events();
        coordinator.shutdown();
        coordinator.handle(lifecycle(1, RawNavigationEvent::DidStartProvisional));
        assert_eq!(stream.next().now_or_never(), Some(None));
    }

    fn raw_event() -> impl Strategy<Value = RawNavigationEvent> {
        prop_oneof![
            Just(RawNavigationEvent::DidStartProvisional),
            Just(RawNavigationEvent::DidReceiveServerRedirect),
            Just(RawNavigationEvent::DidCommit),
            Just(RawNavigationEvent::DidFinish),
            Just(RawNavigationEvent::DidFailProvisional(LoadError::new("p", 1, "p"))),
            Just(RawNavigationEvent::DidFail(LoadError::new("f", 2, "f"))),
        ]
    }

    proptest! {
        #[test]
        fn prop_events_follow_state_graph(
            script in prop::collection::vec((0u64..4, raw_event(), any::<bool>()), 0..64)
        ) {
            let mut coordinator = NavigationCoordinator::default();
            let mut issued = HashSet::new();
            let mut states: HashMap<NavigationId, NavigationState> = HashMap::new();
            let mut last_started: Option<NavigationId> = None;

            for (token, raw, load_first) in script {
                if load_first {
                    let id = coordinator.register_load(NavigationToken::new(token));
                    if !states.contains_key(&id) {
                        prop_assert!(issued.insert(id), "id reused");
                        states.insert(id, NavigationState::NotStarted);
                    }
                }
                if let Some(event) = coordinator.handle(lifecycle(token, raw)) {
                    let state = states.entry(event.id).or_insert_with(|| {
                        issued.insert(event.id);
                        NavigationState::NotStarted
                    });
                    let next = state.advance(&event.kind);
                    prop_assert!(next.is_some(), "{:?} from {:?}", event.kind, state);
                    *state = next.unwrap();
                    if event.kind == NavigationEventKind::Started {
                        last_started = Some(event.id);
                    }
                }
                prop_assert_eq!(coordinator.current_navigation(), last_started);
            }
        }
    }
}
