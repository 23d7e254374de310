//! The observable page façade
//!
//! `WebPage` owns the engine handle and the three coordinators. Engine
//! callbacks are queued on a channel and dispatched on the task that owns the
//! page:
//! 1. Property changes go to the observation registry
//! 2. Navigation callbacks go to the navigation coordinator
//! 3. UI callbacks go to the dialog presenter
//! 4. Download callbacks go to the download coordinator
//!
//! Teardown invalidates every observation, ends every consumer stream and
//! only then releases the engine.

mod builder;
mod configuration;
mod preconditions;

pub use builder::WebPageBuilder;
pub use configuration::{ContentMode, PageConfiguration};
pub use preconditions::canonical_encoding;

use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use url::Url;

use crate::download::{
    CancelOutcome, DownloadCoordinator, DownloadEvents, DownloadId, DownloadOrigin, DownloadState,
};
use crate::engine::{
    CssMediaType, Engine, EngineFactory, EngineMessage, EngineSender, FullscreenState,
    MediaCaptureState, MediaPlaybackState, NavigationToken, ObservableProperty, PdfConfiguration,
    PropertyValue, ServerTrust,
};
use crate::navigation::{
    BackForwardItem, BackForwardList, NavigationCoordinator, NavigationEvent,
    NavigationEventKind, NavigationEvents, NavigationId, NavigationState,
};
use crate::network::{Request, SimulatedResponse};
use crate::observation::{ObservationRegistry, PropertyNotifications};
use crate::script::ScriptCall;
use crate::ui::UiCoordinator;
use crate::utils::{ObservationError, PageError, Precondition, Result};

/// Observable façade over a content engine
pub struct WebPage {
    configuration: PageConfiguration,
    factory: Box<dyn EngineFactory>,
    engine: Option<Box<dyn Engine>>,
    /// Handed to the engine when it is created
    sender: Option<EngineSender>,
    callbacks: UnboundedReceiver<EngineMessage>,
    observations: ObservationRegistry,
    navigations: NavigationCoordinator,
    downloads: DownloadCoordinator,
    ui: UiCoordinator,
    back_forward: BackForwardList,
    closed: bool,
}

impl WebPage {
    /// Create a page with default configuration and delegates
    pub fn new(factory: impl EngineFactory + 'static) -> Self {
        WebPageBuilder::new().build(factory)
    }

    pub fn builder() -> WebPageBuilder {
        WebPageBuilder::new()
    }

    fn from_builder(builder: WebPageBuilder, factory: Box<dyn EngineFactory>) -> Self {
        let (sender, callbacks) = unbounded_channel();
        Self {
            configuration: builder.configuration,
            factory,
            engine: None,
            sender: Some(sender),
            callbacks,
            observations: ObservationRegistry::new(),
            navigations: NavigationCoordinator::new(builder.navigation_decider),
            downloads: DownloadCoordinator::new(builder.download_decider),
            ui: UiCoordinator::new(builder.dialog_presenter),
            back_forward: BackForwardList::new(),
            closed: false,
        }
    }

    pub fn configuration(&self) -> &PageConfiguration {
        &self.configuration
    }

    /// Whether the engine handle has been created yet
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_engine(&mut self) -> Result<()> {
        if self.closed {
            return Err(PageError::Closed);
        }
        if self.engine.is_none() {
            let sender = self.sender.clone().ok_or(PageError::Closed)?;
            let engine = self.factory.create(&self.configuration, sender)?;
            log::debug!("engine created");
            self.engine = Some(engine);
            self.sender = None;
        }
        Ok(())
    }

    /// The engine, created on first use
    fn engine(&mut self) -> Result<&mut Box<dyn Engine>> {
        self.ensure_engine()?;
        self.engine.as_mut().ok_or(PageError::Closed)
    }

    // Callback dispatch

    /// Dispatch every callback already queued by the engine
    pub fn process_pending_callbacks(&mut self) -> usize {
        let mut dispatched = 0;
        while !self.closed {
            let Ok(message) = self.callbacks.try_recv() else {
                break;
            };
            self.dispatch(message);
            dispatched += 1;
        }
        dispatched
    }

    /// Wait for the next callback and dispatch it
    ///
    /// Returns `false` without waiting when the page is closed or no engine
    /// exists yet, and `false` once the engine has dropped its end of the
    /// channel.
    pub async fn next_callback(&mut self) -> bool {
        // only the engine sends; before it exists nothing can ever arrive
        if self.closed || self.engine.is_none() {
            return false;
        }
        match self.callbacks.recv().await {
            Some(message) => {
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::Property(change) => {
                self.observations.handle_change(change);
            }
            EngineMessage::Navigation(callback) => {
                let Some(event) = self.navigations.handle(callback) else {
                    return;
                };
                if event.kind == NavigationEventKind::Committed || event.kind.is_terminal() {
                    self.refresh_back_forward_list();
                }
            }
            EngineMessage::Ui(callback) => self.ui.handle(callback),
            EngineMessage::Download(callback) => {
                if let Some(handle) = self.downloads.handle(callback) {
                    if let Some(engine) = self.engine.as_deref_mut() {
                        engine.cancel_download(handle);
                    }
                }
            }
        }
    }

    fn refresh_back_forward_list(&mut self) {
        if let Some(engine) = self.engine.as_deref() {
            self.back_forward = engine.back_forward_list();
        }
    }

    // Loading

    fn wrap(&mut self, token: Option<NavigationToken>) -> Option<NavigationId> {
        match token {
            Some(token) => Some(self.navigations.register_load(token)),
            None => {
                log::debug!("engine declined to start a navigation");
                None
            }
        }
    }

    /// Load a URL request
    pub fn load(&mut self, request: &Request) -> Result<Option<NavigationId>> {
        let token = self.engine()?.load_request(request);
        Ok(self.wrap(token))
    }

    /// Load raw data with a MIME type and character encoding
    ///
    /// The encoding label must map to a canonical charset name; otherwise the
    /// call fails before the engine is touched.
    pub fn load_data(
        &mut self,
        data: &[u8],
        mime_type: &str,
        encoding: &str,
        base_url: &Url,
    ) -> Result<Option<NavigationId>> {
        preconditions::require_mime_type(mime_type)?;
        let encoding_name = canonical_encoding(encoding)?;
        let token = self
            .engine()?
            .load_data(data, mime_type, encoding_name, base_url);
        Ok(self.wrap(token))
    }

    /// Load an HTML string
    pub fn load_html(&mut self, html: &str, base_url: &Url) -> Result<Option<NavigationId>> {
        let token = self.engine()?.load_html(html, base_url);
        Ok(self.wrap(token))
    }

    /// Load a local file, granting read access to `read_access_url`
    pub fn load_file(&mut self, file_url: &Url, read_access_url: &Url) -> Result<Option<NavigationId>> {
        preconditions::require_file_url(file_url)?;
        preconditions::require_file_url(read_access_url)?;
        let token = self.engine()?.load_file(file_url, read_access_url);
        Ok(self.wrap(token))
    }

    /// Load a file request, granting read access to `read_access_url`
    pub fn load_file_request(
        &mut self,
        request: &Request,
        read_access_url: &Url,
    ) -> Result<Option<NavigationId>> {
        preconditions::require_file_url(request.url())?;
        preconditions::require_file_url(read_access_url)?;
        let token = self.engine()?.load_file_request(request, read_access_url);
        Ok(self.wrap(token))
    }

    /// Load data as if it were the response to `request`
    pub fn load_simulated_request(
        &mut self,
        request: &Request,
        response: &SimulatedResponse,
        body: &[u8],
    ) -> Result<Option<NavigationId>> {
        let token = self
            .engine()?
            .load_simulated_request(request, response, body);
        Ok(self.wrap(token))
    }

    /// Load HTML as if it were the response to `request`
    pub fn load_simulated_html(&mut self, request: &Request, html: &str) -> Result<Option<NavigationId>> {
        let token = self.engine()?.load_simulated_html(request, html);
        Ok(self.wrap(token))
    }

    /// Navigate to an item of the back-forward list
    pub fn load_item(&mut self, item: &BackForwardItem) -> Result<Option<NavigationId>> {
        if !self.back_forward.contains(item) {
            return Err(Precondition::NotInHistory(item.url.to_string()).into());
        }
        let token = self.engine()?.go_to(item);
        Ok(self.wrap(token))
    }

    /// Reload the current page
    pub fn reload(&mut self, from_origin: bool) -> Result<Option<NavigationId>> {
        let token = self.engine()?.reload(from_origin);
        Ok(self.wrap(token))
    }

    /// Stop loading; events already delivered stay delivered
    pub fn stop_loading(&mut self) -> Result<()> {
        self.engine()?.stop_loading();
        Ok(())
    }

    // Navigation state

    /// The most recently started navigation
    pub fn current_navigation(&self) -> Option<NavigationId> {
        self.navigations.current_navigation()
    }

    /// Latest event of the current navigation
    pub fn current_navigation_event(&self) -> Option<&NavigationEvent> {
        self.navigations.current_event()
    }

    pub fn navigation_state(&self, id: NavigationId) -> Option<NavigationState> {
        self.navigations.state(id)
    }

    /// Every navigation event, superseded navigations included
    pub fn navigation_events(&mut self) -> NavigationEvents {
        self.navigations.events()
    }

    pub fn back_forward_list(&self) -> &BackForwardList {
        &self.back_forward
    }

    /// Whether the page asked to be closed
    pub fn close_requested(&self) -> bool {
        self.ui.close_requested()
    }

    // Observed properties

    fn observe(&mut self, property: ObservableProperty) -> Result<PropertyValue> {
        self.ensure_engine()?;
        let engine = self.engine.as_deref_mut().ok_or(PageError::Closed)?;
        Ok(self.observations.observe(engine, property)?)
    }

    /// Will-change / did-change notifications for properties read so far
    pub fn property_notifications(&mut self) -> PropertyNotifications {
        self.observations.notifications()
    }

    pub fn url(&mut self) -> Result<Option<Url>> {
        match self.observe(ObservableProperty::Url)? {
            PropertyValue::Url(url) => Ok(url),
            other => Err(mismatch(ObservableProperty::Url, &other)),
        }
    }

    /// Page title; empty when the engine has none
    pub fn title(&mut self) -> Result<String> {
        match self.observe(ObservableProperty::Title)? {
            PropertyValue::Text(title) => Ok(title.unwrap_or_default()),
            other => Err(mismatch(ObservableProperty::Title, &other)),
        }
    }

    /// Estimated progress of the current navigation, 0.0 to 1.0
    pub fn estimated_progress(&mut self) -> Result<f64> {
        match self.observe(ObservableProperty::EstimatedProgress)? {
            PropertyValue::Number(progress) => Ok(progress.clamp(0.0, 1.0)),
            other => Err(mismatch(ObservableProperty::EstimatedProgress, &other)),
        }
    }

    pub fn is_loading(&mut self) -> Result<bool> {
        self.observe_flag(ObservableProperty::IsLoading)
    }

    pub fn server_trust(&mut self) -> Result<Option<ServerTrust>> {
        match self.observe(ObservableProperty::ServerTrust)? {
            PropertyValue::Trust(trust) => Ok(trust),
            other => Err(mismatch(ObservableProperty::ServerTrust, &other)),
        }
    }

    pub fn has_only_secure_content(&mut self) -> Result<bool> {
        self.observe_flag(ObservableProperty::HasOnlySecureContent)
    }

    pub fn is_writing_tools_active(&mut self) -> Result<bool> {
        self.observe_flag(ObservableProperty::IsWritingToolsActive)
    }

    pub fn fullscreen_state(&mut self) -> Result<FullscreenState> {
        match self.observe(ObservableProperty::FullscreenState)? {
            PropertyValue::Fullscreen(state) => Ok(state),
            other => Err(mismatch(ObservableProperty::FullscreenState, &other)),
        }
    }

    pub fn camera_capture_state(&mut self) -> Result<MediaCaptureState> {
        self.observe_capture(ObservableProperty::CameraCaptureState)
    }

    pub fn microphone_capture_state(&mut self) -> Result<MediaCaptureState> {
        self.observe_capture(ObservableProperty::MicrophoneCaptureState)
    }

    fn observe_flag(&mut self, property: ObservableProperty) -> Result<bool> {
        match self.observe(property)? {
            PropertyValue::Flag(flag) => Ok(flag),
            other => Err(mismatch(property, &other)),
        }
    }

    fn observe_capture(&mut self, property: ObservableProperty) -> Result<MediaCaptureState> {
        match self.observe(property)? {
            PropertyValue::Capture(state) => Ok(state),
            other => Err(mismatch(property, &other)),
        }
    }

    // Passthrough settings

    pub fn media_type(&mut self) -> Result<Option<CssMediaType>> {
        Ok(self.engine()?.media_type())
    }

    pub fn set_media_type(&mut self, media_type: Option<CssMediaType>) -> Result<()> {
        self.engine()?.set_media_type(media_type);
        Ok(())
    }

    pub fn custom_user_agent(&mut self) -> Result<Option<String>> {
        Ok(self.engine()?.custom_user_agent())
    }

    pub fn set_custom_user_agent(&mut self, user_agent: Option<String>) -> Result<()> {
        self.engine()?.set_custom_user_agent(user_agent);
        Ok(())
    }

    pub fn is_inspectable(&mut self) -> Result<bool> {
        Ok(self.engine()?.is_inspectable())
    }

    pub fn set_inspectable(&mut self, inspectable: bool) -> Result<()> {
        self.engine()?.set_inspectable(inspectable);
        Ok(())
    }

    // Scripts and export

    /// Run a function body with bound arguments
    ///
    /// `None` means the body returned nothing; `Some(Value::Null)` means it
    /// returned `null`.
    pub async fn call_script(&mut self, call: &ScriptCall) -> Result<Option<Value>> {
        Ok(self.engine()?.call_script(call).await?)
    }

    pub async fn export_pdf(&mut self, configuration: &PdfConfiguration) -> Result<Vec<u8>> {
        Ok(self.engine()?.create_pdf(configuration).await?)
    }

    pub async fn export_archive(&mut self) -> Result<Vec<u8>> {
        Ok(self.engine()?.create_web_archive().await?)
    }

    // Media

    pub async fn pause_all_media_playback(&mut self) -> Result<()> {
        self.engine()?.pause_all_media_playback().await;
        Ok(())
    }

    pub async fn media_playback_state(&mut self) -> Result<MediaPlaybackState> {
        Ok(self.engine()?.media_playback_state().await)
    }

    pub async fn set_all_media_playback_suspended(&mut self, suspended: bool) -> Result<()> {
        self.engine()?.set_all_media_playback_suspended(suspended).await;
        Ok(())
    }

    pub async fn close_all_media_presentations(&mut self) -> Result<()> {
        self.engine()?.close_all_media_presentations().await;
        Ok(())
    }

    pub async fn set_camera_capture_state(&mut self, state: MediaCaptureState) -> Result<()> {
        self.engine()?.set_camera_capture_state(state).await;
        Ok(())
    }

    pub async fn set_microphone_capture_state(&mut self, state: MediaCaptureState) -> Result<()> {
        self.engine()?.set_microphone_capture_state(state).await;
        Ok(())
    }

    // Downloads

    /// Start a download; the id is usable before the engine confirms it
    pub fn start_download(&mut self, request: &Request) -> Result<DownloadId> {
        self.ensure_engine()?;
        let id = self
            .downloads
            .issue(DownloadOrigin::Request(request.url().clone()));
        self.engine()?.start_download(request, id);
        Ok(id)
    }

    /// Resume a failed download from its resume data
    pub fn resume_download(&mut self, resume_data: &[u8]) -> Result<DownloadId> {
        self.ensure_engine()?;
        let id = self.downloads.issue(DownloadOrigin::Resume);
        self.engine()?.resume_download(resume_data, id);
        Ok(id)
    }

    /// Cancel a download
    ///
    /// Before the engine confirms the download, cancellation is final and
    /// nothing more is delivered for the id.
    pub fn cancel_download(&mut self, id: DownloadId) -> Result<()> {
        if self.closed {
            return Err(PageError::Closed);
        }
        match self.downloads.cancel(id) {
            CancelOutcome::Forward(handle) => self.engine()?.cancel_download(handle),
            CancelOutcome::Discarded | CancelOutcome::Ignored => {}
        }
        Ok(())
    }

    pub fn download_state(&self, id: DownloadId) -> Option<DownloadState> {
        self.downloads.state(id)
    }

    pub fn download_events(&mut self) -> DownloadEvents {
        self.downloads.events()
    }

    // Teardown

    /// Tear the page down; later calls do nothing
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.engine.as_deref_mut() {
            Some(engine) => {
                let invalidated = self.observations.invalidate_all(engine);
                log::debug!("invalidated {} observations", invalidated);
            }
            None => self.observations.close(),
        }
        self.navigations.shutdown();
        self.downloads.shutdown();
        self.callbacks.close();
        self.sender = None;

        if self.engine.take().is_some() {
            log::debug!("engine released");
        }
    }
}

impl Drop for WebPage {
    fn drop(&mut self) {
        self.close();
    }
}

fn mismatch(property: ObservableProperty, value: &PropertyValue) -> PageError {
    ObservationError::TypeMismatch {
        property: property.as_str(),
        found: value.kind(),
    }
    .into()
}
