//! Scripted engine shared by the integration tests
//!
//! The fake records every call in a shared `FakeState` so tests can inspect
//! what the page asked for after handing the engine over.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use webpage::download::{DownloadCallback, DownloadId, DownloadUpdate};
use webpage::engine::{
    CssMediaType, DownloadHandle, EngineSender, FullscreenState, MediaCaptureState,
    MediaPlaybackState, NavigationToken, ObservableProperty, ObservationToken, PdfConfiguration,
    PropertyValue,
};
use webpage::navigation::{
    BackForwardItem, BackForwardList, NavigationCallback, RawNavigationEvent,
};
use webpage::network::{Request, SimulatedResponse};
use webpage::page::WebPageBuilder;
use webpage::script::ScriptCall;
use webpage::utils::{EngineError, ScriptError};
use webpage::{Engine, EngineMessage, PageConfiguration, PropertySource, WebPage};

/// Everything the fake engine has seen and will answer with
#[derive(Default)]
pub struct FakeState {
    pub created: usize,
    pub dropped: bool,
    pub sender: Option<EngineSender>,
    pub configuration: Option<PageConfiguration>,

    /// Load and control calls, in order
    pub calls: Vec<String>,
    pub decline_loads: bool,
    pub next_token: u64,

    pub next_observation: u64,
    pub observed: Vec<ObservableProperty>,
    pub invalidated: Vec<ObservationToken>,
    pub properties: HashMap<ObservableProperty, PropertyValue>,
    pub failing_reads: HashSet<ObservableProperty>,

    pub back_forward: BackForwardList,
    pub user_agent: Option<String>,
    pub media_type: Option<CssMediaType>,
    pub inspectable: bool,

    pub script_results: VecDeque<Result<Option<Value>, ScriptError>>,
    pub scripts: Vec<String>,

    pub started_downloads: Vec<DownloadId>,
    pub resumed_downloads: Vec<DownloadId>,
    pub cancelled_downloads: Vec<DownloadHandle>,
}

pub type Shared = Rc<RefCell<FakeState>>;

pub struct FakeEngine {
    state: Shared,
}

impl FakeEngine {
    fn load(&mut self, call: String) -> Option<NavigationToken> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if state.decline_loads {
            return None;
        }
        state.next_token += 1;
        Some(NavigationToken::new(state.next_token))
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.state.borrow_mut().dropped = true;
    }
}

impl PropertySource for FakeEngine {
    fn observe(&mut self, property: ObservableProperty) -> Result<ObservationToken, EngineError> {
        let mut state = self.state.borrow_mut();
        state.next_observation += 1;
        state.observed.push(property);
        Ok(ObservationToken::new(state.next_observation))
    }

    fn invalidate(&mut self, token: ObservationToken) {
        self.state.borrow_mut().invalidated.push(token);
    }

    fn read(&self, property: ObservableProperty) -> Result<PropertyValue, EngineError> {
        let state = self.state.borrow();
        if state.failing_reads.contains(&property) {
            return Err(EngineError::Property {
                property: property.as_str(),
                reason: "unavailable".into(),
            });
        }
        if let Some(value) = state.properties.get(&property) {
            return Ok(value.clone());
        }
        Ok(match property {
            ObservableProperty::Url => PropertyValue::Url(None),
            ObservableProperty::Title => PropertyValue::Text(None),
            ObservableProperty::EstimatedProgress => PropertyValue::Number(0.0),
            ObservableProperty::ServerTrust => PropertyValue::Trust(None),
            ObservableProperty::FullscreenState => {
                PropertyValue::Fullscreen(FullscreenState::NotInFullscreen)
            }
            ObservableProperty::CameraCaptureState | ObservableProperty::MicrophoneCaptureState => {
                PropertyValue::Capture(MediaCaptureState::None)
            }
            ObservableProperty::IsLoading
            | ObservableProperty::HasOnlySecureContent
            | ObservableProperty::IsWritingToolsActive => PropertyValue::Flag(false),
        })
    }
}

#[async_trait(?Send)]
impl Engine for FakeEngine {
    fn load_request(&mut self, request: &Request) -> Option<NavigationToken> {
        self.load(format!("load_request {}", request.url()))
    }

    fn load_data(
        &mut self,
        _data: &[u8],
        mime_type: &str,
        encoding_name: &str,
        base_url: &Url,
    ) -> Option<NavigationToken> {
        self.load(format!("load_data {} {} {}", mime_type, encoding_name, base_url))
    }

    fn load_html(&mut self, _html: &str, base_url: &Url) -> Option<NavigationToken> {
        self.load(format!("load_html {}", base_url))
    }

    fn load_file(&mut self, file_url: &Url, _read_access_url: &Url) -> Option<NavigationToken> {
        self.load(format!("load_file {}", file_url))
    }

    fn load_file_request(
        &mut self,
        request: &Request,
        _read_access_url: &Url,
    ) -> Option<NavigationToken> {
        self.load(format!("load_file_request {}", request.url()))
    }

    fn load_simulated_request(
        &mut self,
        request: &Request,
        response: &SimulatedResponse,
        _body: &[u8],
    ) -> Option<NavigationToken> {
        self.load(format!(
            "load_simulated_request {} {}",
            request.url(),
            response.status_code()
        ))
    }

    fn load_simulated_html(&mut self, request: &Request, _html: &str) -> Option<NavigationToken> {
        self.load(format!("load_simulated_html {}", request.url()))
    }

    fn go_to(&mut self, item: &BackForwardItem) -> Option<NavigationToken> {
        self.load(format!("go_to {}", item.id))
    }

    fn reload(&mut self, from_origin: bool) -> Option<NavigationToken> {
        self.load(format!("reload {}", from_origin))
    }

    fn stop_loading(&mut self) {
        self.state.borrow_mut().calls.push("stop_loading".into());
    }

    fn back_forward_list(&self) -> BackForwardList {
        self.state.borrow().back_forward.clone()
    }

    fn media_type(&self) -> Option<CssMediaType> {
        self.state.borrow().media_type.clone()
    }

    fn set_media_type(&mut self, media_type: Option<CssMediaType>) {
        self.state.borrow_mut().media_type = media_type;
    }

    fn custom_user_agent(&self) -> Option<String> {
        self.state.borrow().user_agent.clone()
    }

    fn set_custom_user_agent(&mut self, user_agent: Option<String>) {
        self.state.borrow_mut().user_agent = user_agent;
    }

    fn is_inspectable(&self) -> bool {
        self.state.borrow().inspectable
    }

    fn set_inspectable(&mut self, inspectable: bool) {
        self.state.borrow_mut().inspectable = inspectable;
    }

    async fn call_script(&mut self, call: &ScriptCall) -> Result<Option<Value>, ScriptError> {
        let mut state = self.state.borrow_mut();
        state.scripts.push(call.body.clone());
        state.script_results.pop_front().unwrap_or(Ok(None))
    }

    async fn create_pdf(&mut self, _configuration: &PdfConfiguration) -> Result<Vec<u8>, EngineError> {
        Ok(b"%PDF-1.7".to_vec())
    }

    async fn create_web_archive(&mut self) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::Export("no archive".into()))
    }

    async fn pause_all_media_playback(&mut self) {
        self.state.borrow_mut().calls.push("pause_all_media_playback".into());
    }

    async fn media_playback_state(&mut self) -> MediaPlaybackState {
        MediaPlaybackState::Paused
    }

    async fn set_all_media_playback_suspended(&mut self, suspended: bool) {
        self.state
            .borrow_mut()
            .calls
            .push(format!("set_all_media_playback_suspended {}", suspended));
    }

    async fn close_all_media_presentations(&mut self) {
        self.state.borrow_mut().calls.push("close_all_media_presentations".into());
    }

    async fn set_camera_capture_state(&mut self, state: MediaCaptureState) {
        self.state
            .borrow_mut()
            .properties
            .insert(ObservableProperty::CameraCaptureState, PropertyValue::Capture(state));
    }

    async fn set_microphone_capture_state(&mut self, state: MediaCaptureState) {
        self.state
            .borrow_mut()
            .properties
            .insert(ObservableProperty::MicrophoneCaptureState, PropertyValue::Capture(state));
    }

    fn start_download(&mut self, _request: &Request, ticket: DownloadId) {
        self.state.borrow_mut().started_downloads.push(ticket);
    }

    fn resume_download(&mut self, _resume_data: &[u8], ticket: DownloadId) {
        self.state.borrow_mut().resumed_downloads.push(ticket);
    }

    fn cancel_download(&mut self, handle: DownloadHandle) {
        self.state.borrow_mut().cancelled_downloads.push(handle);
    }
}

/// A page wired to a fake engine
pub struct Harness {
    pub page: WebPage,
    pub state: Shared,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_builder(WebPage::builder())
    }

    pub fn with_builder(builder: WebPageBuilder) -> Self {
        let state = Shared::default();
        let factory_state = Rc::clone(&state);
        let page = builder.build(
            move |configuration: &PageConfiguration,
                  sender: EngineSender|
                  -> Result<Box<dyn Engine>, EngineError> {
                {
                    let mut state = factory_state.borrow_mut();
                    state.created += 1;
                    state.sender = Some(sender);
                    state.configuration = Some(configuration.clone());
                }
                Ok(Box::new(FakeEngine {
                    state: Rc::clone(&factory_state),
                }))
            },
        );
        Self { page, state }
    }

    /// Queue a callback as the engine would; ignored once the page is closed
    pub fn send(&self, message: EngineMessage) {
        let sender = self
            .state
            .borrow()
            .sender
            .clone()
            .expect("engine has not been created");
        let _ = sender.send(message);
    }

    pub fn lifecycle(&self, token: u64, event: RawNavigationEvent) {
        self.send(EngineMessage::Navigation(NavigationCallback::Lifecycle {
            token: NavigationToken::new(token),
            event,
        }));
    }

    pub fn download(&self, callback: DownloadCallback) {
        self.send(EngineMessage::Download(callback));
    }

    pub fn download_update(&self, handle: u64, update: DownloadUpdate) {
        self.download(DownloadCallback::Update {
            handle: DownloadHandle::new(handle),
            update,
        });
    }

    pub fn progress(&self, handle: u64, received: u64) {
        self.download_update(
            handle,
            DownloadUpdate::Progress {
                received,
                expected: Some(100),
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }
}

pub fn url(raw: &str) -> Url {
    Url::parse(raw).expect("valid test url")
}

pub fn request(raw: &str) -> Request {
    Request::get(url(raw))
}
