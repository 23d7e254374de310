//! Webpage demo
//!
//! Drives the page façade with an in-process scripted engine: two overlapping
//! navigations and a download whose progress races its handle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::rc::Rc;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use url::Url;

use webpage::download::{DirectoryDownloadDecider, DownloadCallback, DownloadId, DownloadUpdate};
use webpage::engine::{
    ChangePhase, CssMediaType, DownloadHandle, EngineSender, FullscreenState, MediaCaptureState,
    MediaPlaybackState, NavigationToken, ObservableProperty, ObservationToken, PdfConfiguration,
    PropertyChange, PropertyValue,
};
use webpage::navigation::{BackForwardItem, BackForwardList, NavigationCallback, RawNavigationEvent};
use webpage::network::{Request, SimulatedResponse};
use webpage::script::ScriptCall;
use webpage::utils::{EngineError, LoadError, ScriptError};
use webpage::{Engine, EngineMessage, NAME, PageConfiguration, PropertySource, VERSION, WebPage};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 1 && args[1] == "--cli" {
        if let Err(e) = run_cli_mode().await {
            eprintln!("❌ Demo failed: {}", e);
            std::process::exit(1);
        }
    } else {
        println!("{} v{} - run with --cli for the scripted demo", NAME, VERSION);
    }
}

async fn run_cli_mode() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 {} v{} - scripted engine demo", NAME, VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let wire: Rc<RefCell<Option<EngineSender>>> = Rc::new(RefCell::new(None));
    let factory_wire = Rc::clone(&wire);
    let mut page = WebPage::builder()
        .configuration(PageConfiguration::new().application_name("webpage-demo"))
        .download_decider(DirectoryDownloadDecider::new(env::temp_dir()))
        .build(
            move |_: &PageConfiguration,
                  sender: EngineSender|
                  -> Result<Box<dyn Engine>, EngineError> {
                *factory_wire.borrow_mut() = Some(sender);
                Ok(Box::new(DemoEngine::default()))
            },
        );

    let mut navigations = page.navigation_events();
    let mut downloads = page.download_events();

    // Two loads; the second supersedes the first while it is provisional
    let first = page.load(&Request::parse("https://example.com/first")?)?;
    let second = page.load(&Request::parse("https://example.com/second")?)?;
    println!("✅ issued {:?} and {:?}", first, second);
    println!("📄 title before load: {:?}", page.title()?);

    let sender = wire.borrow().clone().ok_or("engine was not created")?;
    let send = |message: EngineMessage| {
        post(&sender, message);
    };
    let nav = |token: u64, event: RawNavigationEvent| {
        EngineMessage::Navigation(NavigationCallback::Lifecycle {
            token: NavigationToken::new(token),
            event,
        })
    };

    send(nav(1, RawNavigationEvent::DidStartProvisional));
    send(nav(2, RawNavigationEvent::DidStartProvisional));
    send(nav(
        1,
        RawNavigationEvent::DidFailProvisional(LoadError::new("demo", 102, "superseded")),
    ));
    send(nav(2, RawNavigationEvent::DidCommit));
    send(EngineMessage::Property(PropertyChange {
        property: ObservableProperty::Title,
        phase: ChangePhase::Prior,
    }));
    send(EngineMessage::Property(PropertyChange {
        property: ObservableProperty::Title,
        phase: ChangePhase::Settled,
    }));
    send(nav(2, RawNavigationEvent::DidFinish));

    // A download whose progress arrives before its handle resolves
    let download = page.start_download(&Request::parse("https://example.com/archive.zip")?)?;
    let handle = DownloadHandle::new(1);
    for received in [10, 55] {
        send(EngineMessage::Download(DownloadCallback::Update {
            handle,
            update: DownloadUpdate::Progress {
                received,
                expected: Some(100),
            },
        }));
    }
    send(EngineMessage::Download(DownloadCallback::Resolved {
        ticket: download,
        handle,
    }));
    send(EngineMessage::Download(DownloadCallback::Update {
        handle,
        update: DownloadUpdate::Finished,
    }));

    let dispatched = page.process_pending_callbacks();
    println!("📨 dispatched {} engine callbacks", dispatched);
    println!("📍 current navigation: {:?}", page.current_navigation());

    let result = page.call_script(&ScriptCall::new("return 6 * 7;")).await?;
    println!("🧮 script result: {:?}", result);

    page.close();

    while let Some(event) = navigations.next().await {
        println!("   • {} {:?}", event.id, event.kind);
    }
    while let Some(event) = downloads.next().await {
        println!("   • {} {:?}", event.id, event.kind);
    }
    Ok(())
}

/// Queue a callback on the page; returns `false` if the page is gone
fn post(sender: &EngineSender, message: EngineMessage) -> bool {
    match sender.send(message) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("page stopped accepting callbacks: dropped {:?}", err.0);
            false
        }
    }
}

/// Minimal engine that hands out tokens and answers reads from a table
#[derive(Default)]
struct DemoEngine {
    next_token: u64,
    next_observation: u64,
    properties: HashMap<ObservableProperty, PropertyValue>,
    user_agent: Option<String>,
    media_type: Option<CssMediaType>,
    inspectable: bool,
}

impl DemoEngine {
    fn token(&mut self) -> Option<NavigationToken> {
        self.next_token += 1;
        Some(NavigationToken::new(self.next_token))
    }
}

impl PropertySource for DemoEngine {
    fn observe(&mut self, _property: ObservableProperty) -> Result<ObservationToken, EngineError> {
        self.next_observation += 1;
        Ok(ObservationToken::new(self.next_observation))
    }

    fn invalidate(&mut self, token: ObservationToken) {
        log::debug!("demo engine dropped observation {}", token.raw());
    }

    fn read(&self, property: ObservableProperty) -> Result<PropertyValue, EngineError> {
        if let Some(value) = self.properties.get(&property) {
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
impl Engine for DemoEngine {
    fn load_request(&mut self, _request: &Request) -> Option<NavigationToken> {
        self.token()
    }

    fn load_data(&mut self, _: &[u8], _: &str, _: &str, _: &Url) -> Option<NavigationToken> {
        self.token()
    }

    fn load_html(&mut self, _html: &str, _base_url: &Url) -> Option<NavigationToken> {
        self.token()
    }

    fn load_file(&mut self, _file_url: &Url, _read_access_url: &Url) -> Option<NavigationToken> {
        self.token()
    }

    fn load_file_request(&mut self, _: &Request, _: &Url) -> Option<NavigationToken> {
        self.token()
    }

    fn load_simulated_request(
        &mut self,
        _: &Request,
        _: &SimulatedResponse,
        _: &[u8],
    ) -> Option<NavigationToken> {
        self.token()
    }

    fn load_simulated_html(&mut self, _: &Request, _: &str) -> Option<NavigationToken> {
        self.token()
    }

    fn go_to(&mut self, _item: &BackForwardItem) -> Option<NavigationToken> {
        self.token()
    }

    fn reload(&mut self, _from_origin: bool) -> Option<NavigationToken> {
        None
    }

    fn stop_loading(&mut self) {}

    fn back_forward_list(&self) -> BackForwardList {
        BackForwardList::new()
    }

    fn media_type(&self) -> Option<CssMediaType> {
        self.media_type.clone()
    }

    fn set_media_type(&mut self, media_type: Option<CssMediaType>) {
        self.media_type = media_type;
    }

    fn custom_user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn set_custom_user_agent(&mut self, user_agent: Option<String>) {
        self.user_agent = user_agent;
    }

    fn is_inspectable(&self) -> bool {
        self.inspectable
    }

    fn set_inspectable(&mut self, inspectable: bool) {
        self.inspectable = inspectable;
    }

    async fn call_script(&mut self, _call: &ScriptCall) -> Result<Option<Value>, ScriptError> {
        Ok(Some(Value::from(42)))
    }

    async fn create_pdf(&mut self, _: &PdfConfiguration) -> Result<Vec<u8>, EngineError> {
        Ok(b"%PDF-1.7".to_vec())
    }

    async fn create_web_archive(&mut self) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::Export("archives are not supported by the demo engine".into()))
    }

    async fn pause_all_media_playback(&mut self) {}

    async fn media_playback_state(&mut self) -> MediaPlaybackState {
        MediaPlaybackState::None
    }

    async fn set_all_media_playback_suspended(&mut self, _suspended: bool) {}

    async fn close_all_media_presentations(&mut self) {}

    async fn set_camera_capture_state(&mut self, _state: MediaCaptureState) {}

    async fn set_microphone_capture_state(&mut self, _state: MediaCaptureState) {}

    fn start_download(&mut self, request: &Request, ticket: DownloadId) {
        log::info!("demo engine downloading {} for {}", request.url(), ticket);
    }

    fn resume_download(&mut self, _resume_data: &[u8], ticket: DownloadId) {
        log::info!("demo engine resuming {}", ticket);
    }

    fn cancel_download(&mut self, handle: DownloadHandle) {
        log::info!("demo engine cancelling handle {}", handle.raw());
    }
}
