//! Observation registry
//!
//! Bridges engine property changes into a will-change / did-change pair per
//! façade property. Subscriptions are created lazily on first access and kept
//! in a table keyed by property, so repeated reads share one engine
//! observation.

use std::collections::HashMap;

use futures::stream::BoxStream;

use crate::engine::{
    ChangePhase, ObservableProperty, ObservationToken, PropertyChange, PropertySource,
    PropertyValue,
};
use crate::utils::{ObservationError, Subscribers};

/// Notification delivered to property observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyNotification {
    /// The property is about to change; its current value is still the old one
    WillChange(ObservableProperty),
    /// The property has its new value
    DidChange(ObservableProperty),
}

impl PropertyNotification {
    pub fn property(&self) -> ObservableProperty {
        match self {
            PropertyNotification::WillChange(p) | PropertyNotification::DidChange(p) => *p,
        }
    }
}

/// Stream of property notifications
pub type PropertyNotifications = BoxStream<'static, PropertyNotification>;

/// Deduplicated table of engine observations
pub struct ObservationRegistry {
    subscriptions: HashMap<ObservableProperty, ObservationToken>,
    listeners: Subscribers<PropertyNotification>,
    invalidated: bool,
}

impl ObservationRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            listeners: Subscribers::new(),
            invalidated: false,
        }
    }

    /// Read a property, registering an observation on first access
    ///
    /// If the read fails, an observation created by this call is invalidated
    /// and forgotten before the error is returned.
    pub fn observe<S: PropertySource + ?Sized>(
        &mut self,
        source: &mut S,
        property: ObservableProperty,
    ) -> Result<PropertyValue, ObservationError> {
        let created = if self.subscriptions.contains_key(&property) {
            None
        } else {
            let token = source.observe(property)?;
            log::debug!("observing {} ({:?})", property, token);
            self.subscriptions.insert(property, token);
            Some(token)
        };

        match source.read(property) {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(token) = created {
                    self.subscriptions.remove(&property);
                    source.invalidate(token);
                    log::debug!("dropped observation of {} after failed read", property);
                }
                Err(err.into())
            }
        }
    }

    /// Whether a property currently has an engine observation
    pub fn is_observing(&self, property: ObservableProperty) -> bool {
        self.subscriptions.contains_key(&property)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Stream of will-change / did-change notifications
    pub fn notifications(&mut self) -> PropertyNotifications {
        self.listeners.subscribe()
    }

    /// Translate a raw engine change into a notification
    ///
    /// Changes to properties nobody has read yet are ignored.
    pub fn handle_change(&mut self, change: PropertyChange) -> Option<PropertyNotification> {
        if self.invalidated || !self.subscriptions.contains_key(&change.property) {
            log::trace!("ignoring change of unobserved {}", change.property);
            return None;
        }

        let notification = match change.phase {
            ChangePhase::Prior => PropertyNotification::WillChange(change.property),
            ChangePhase::Settled => PropertyNotification::DidChange(change.property),
        };
        self.listeners.publish(notification);
        Some(notification)
    }

    /// Invalidate every observation and end all notification streams
    ///
    /// Returns how many engine observations were invalidated; a second call
    /// invalidates nothing.
    pub fn invalidate_all<S: PropertySource + ?Sized>(&mut self, source: &mut S) -> usize {
        let count = self.subscriptions.len();
        for (property, token) in self.subscriptions.drain() {
            log::trace!("invalidating observation of {}", property);
            source.invalidate(token);
        }
        self.close();
        count
    }

    /// End all notification streams without touching the engine
    ///
    /// Every observation must already have been invalidated.
    pub fn close(&mut self) {
        debug_assert!(self.subscriptions.is_empty());
        self.listeners.close();
        self.invalidated = true;
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }
}

impl Default for ObservationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
