//! # Webpage - observable façade over a content engine
//!
//! Wraps a callback-driven content engine in a single observable page with a
//! coherent navigation and download lifecycle.
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - **engine**: The engine collaborator traits and raw callback messages
//! - **observation**: Lazily registered property observations
//! - **navigation**: Canonical navigation state machine and policy decisions
//! - **download**: Download identities, buffering and replay
//! - **ui**: Dialog requests routed to a presenter
//! - **page**: The `WebPage` façade tying everything together
//! - **network**: Request and simulated response types
//! - **script**: Script call types
//! - **utils**: Shared utilities and error types

pub mod download;
pub mod engine;
pub mod navigation;
pub mod network;
pub mod observation;
pub mod page;
pub mod script;
pub mod ui;
pub mod utils;

// Re-export main types for convenience
pub use download::{DownloadEvent, DownloadEventKind, DownloadId};
pub use engine::{Engine, EngineFactory, EngineMessage, PropertySource};
pub use navigation::{NavigationEvent, NavigationEventKind, NavigationId};
pub use page::{PageConfiguration, WebPage};
pub use utils::error::{PageError, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "webpage";
