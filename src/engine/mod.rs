//! Content engine collaborator
//!
//! The engine is opaque: it renders, runs scripts and talks to the network on
//! its own. The façade sees it through two traits:
//! 1. `PropertySource` for observable properties
//! 2. `Engine` for loads, script calls, exports, media and downloads
//!
//! Everything the engine reports back arrives as an `EngineMessage` on the
//! channel handed to `EngineFactory::create`.

mod types;

pub use types::{
    ChangePhase, CssMediaType, DownloadHandle, FullscreenState, MediaCaptureState,
    MediaPlaybackState, NavigationToken, ObservableProperty, ObservationToken, PdfConfiguration,
    PropertyChange, PropertyValue, ServerTrust,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use crate::download::{DownloadCallback, DownloadId};
use crate::navigation::{BackForwardItem, BackForwardList, NavigationCallback};
use crate::network::{Request, SimulatedResponse};
use crate::page::PageConfiguration;
use crate::script::ScriptCall;
use crate::ui::UiCallback;
use crate::utils::{EngineError, ScriptError};

/// Callback delivered by the engine onto the façade's confinement task
#[derive(Debug)]
pub enum EngineMessage {
    /// An observed property is about to change or has changed
    Property(PropertyChange),
    /// Navigation lifecycle or policy request
    Navigation(NavigationCallback),
    /// Dialog or window request
    Ui(UiCallback),
    /// Download lifecycle
    Download(DownloadCallback),
}

/// Sending half of the engine callback channel
pub type EngineSender = UnboundedSender<EngineMessage>;

/// Observable property access
#[cfg_attr(test, mockall::automock)]
pub trait PropertySource {
    /// Start observing a property; changes arrive as `EngineMessage::Property`
    fn observe(&mut self, property: ObservableProperty) -> Result<ObservationToken, EngineError>;

    /// Stop an observation
    fn invalidate(&mut self, token: ObservationToken);

    /// Read the current value of a property
    fn read(&self, property: ObservableProperty) -> Result<PropertyValue, EngineError>;
}

/// The wrapped content engine
///
/// Load methods return `None` when the engine declines to start a navigation.
#[async_trait(?Send)]
pub trait Engine: PropertySource {
    fn load_request(&mut self, request: &Request) -> Option<NavigationToken>;

    /// `encoding_name` is always a canonical charset name
    fn load_data(
        &mut self,
        data: &[u8],
        mime_type: &str,
        encoding_name: &str,
        base_url: &Url,
    ) -> Option<NavigationToken>;

    fn load_html(&mut self, html: &str, base_url: &Url) -> Option<NavigationToken>;

    fn load_file(&mut self, file_url: &Url, read_access_url: &Url) -> Option<NavigationToken>;

    fn load_file_request(
        &mut self,
        request: &Request,
        read_access_url: &Url,
    ) -> Option<NavigationToken>;

    fn load_simulated_request(
        &mut self,
        request: &Request,
        response: &SimulatedResponse,
        body: &[u8],
    ) -> Option<NavigationToken>;

    fn load_simulated_html(&mut self, request: &Request, html: &str) -> Option<NavigationToken>;

    fn go_to(&mut self, item: &BackForwardItem) -> Option<NavigationToken>;

    fn reload(&mut self, from_origin: bool) -> Option<NavigationToken>;

    fn stop_loading(&mut self);

    fn back_forward_list(&self) -> BackForwardList;

    fn media_type(&self) -> Option<CssMediaType>;

    fn set_media_type(&mut self, media_type: Option<CssMediaType>);

    fn custom_user_agent(&self) -> Option<String>;

    fn set_custom_user_agent(&mut self, user_agent: Option<String>);

    fn is_inspectable(&self) -> bool;

    fn set_inspectable(&mut self, inspectable: bool);

    async fn call_script(&mut self, call: &ScriptCall) -> Result<Option<Value>, ScriptError>;

    async fn create_pdf(&mut self, configuration: &PdfConfiguration)
    -> Result<Vec<u8>, EngineError>;

    async fn create_web_archive(&mut self) -> Result<Vec<u8>, EngineError>;

    async fn pause_all_media_playback(&mut self);

    async fn media_playback_state(&mut self) -> MediaPlaybackState;

    async fn set_all_media_playback_suspended(&mut self, suspended: bool);

    async fn close_all_media_presentations(&mut self);

    async fn set_camera_capture_state(&mut self, state: MediaCaptureState);

    async fn set_microphone_capture_state(&mut self, state: MediaCaptureState);

    /// Begin a download; the handle is reported later as
    /// `DownloadCallback::Resolved` carrying `ticket`
    fn start_download(&mut self, request: &Request, ticket: DownloadId);

    fn resume_download(&mut self, resume_data: &[u8], ticket: DownloadId);

    fn cancel_download(&mut self, handle: DownloadHandle);
}

/// Creates the engine the first time the façade needs it
pub trait EngineFactory {
    fn create(
        &mut self,
        configuration: &PageConfiguration,
        callbacks: EngineSender,
    ) -> Result<Box<dyn Engine>, EngineError>;
}

impl<F> EngineFactory for F
where
    F: FnMut(&PageConfiguration, EngineSender) -> Result<Box<dyn Engine>, EngineError>,
{
    fn create(
        &mut self,
        configuration: &PageConfiguration,
        callbacks: EngineSender,
    ) -> Result<Box<dyn Engine>, EngineError> {
        self(configuration, callbacks)
    }
}
