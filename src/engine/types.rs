//! Raw engine tokens and property values

use std::fmt;
use url::Url;

/// Navigation token issued by the engine for a load it started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavigationToken(u64);

impl NavigationToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Engine-side download handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DownloadHandle(u64);

impl DownloadHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Engine-side key-value observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationToken(u64);

impl ObservationToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Engine properties the façade exposes as observable state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObservableProperty {
    Url,
    Title,
    EstimatedProgress,
    IsLoading,
    ServerTrust,
    HasOnlySecureContent,
    IsWritingToolsActive,
    FullscreenState,
    CameraCaptureState,
    MicrophoneCaptureState,
}

impl ObservableProperty {
    pub const ALL: [ObservableProperty; 10] = [
        ObservableProperty::Url,
        ObservableProperty::Title,
        ObservableProperty::EstimatedProgress,
        ObservableProperty::IsLoading,
        ObservableProperty::ServerTrust,
        ObservableProperty::HasOnlySecureContent,
        ObservableProperty::IsWritingToolsActive,
        ObservableProperty::FullscreenState,
        ObservableProperty::CameraCaptureState,
        ObservableProperty::MicrophoneCaptureState,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObservableProperty::Url => "url",
            ObservableProperty::Title => "title",
            ObservableProperty::EstimatedProgress => "estimatedProgress",
            ObservableProperty::IsLoading => "isLoading",
            ObservableProperty::ServerTrust => "serverTrust",
            ObservableProperty::HasOnlySecureContent => "hasOnlySecureContent",
            ObservableProperty::IsWritingToolsActive => "isWritingToolsActive",
            ObservableProperty::FullscreenState => "fullscreenState",
            ObservableProperty::CameraCaptureState => "cameraCaptureState",
            ObservableProperty::MicrophoneCaptureState => "microphoneCaptureState",
        }
    }
}

impl fmt::Display for ObservableProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trust information for the current page's connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTrust {
    pub host: String,
    /// DER-encoded certificates, leaf first
    pub certificate_chain: Vec<Vec<u8>>,
}

/// Fullscreen states a page may be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FullscreenState {
    EnteringFullscreen,
    ExitingFullscreen,
    InFullscreen,
    #[default]
    NotInFullscreen,
}

/// Camera or microphone capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaCaptureState {
    #[default]
    None,
    Active,
    Muted,
}

/// Media playback state of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaPlaybackState {
    #[default]
    None,
    Playing,
    Paused,
    Suspended,
}

/// A CSS media type, canonical or arbitrary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssMediaType(String);

impl CssMediaType {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn all() -> Self {
        Self::new("all")
    }

    pub fn screen() -> Self {
        Self::new("screen")
    }

    pub fn print() -> Self {
        Self::new("print")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Raw value read from an engine property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Url(Option<Url>),
    Text(Option<String>),
    Number(f64),
    Flag(bool),
    Trust(Option<ServerTrust>),
    Fullscreen(FullscreenState),
    Capture(MediaCaptureState),
}

impl PropertyValue {
    /// Shape name, used in type mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Url(_) => "url",
            PropertyValue::Text(_) => "text",
            PropertyValue::Number(_) => "number",
            PropertyValue::Flag(_) => "flag",
            PropertyValue::Trust(_) => "trust",
            PropertyValue::Fullscreen(_) => "fullscreen",
            PropertyValue::Capture(_) => "capture",
        }
    }
}

/// Which half of a property change a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePhase {
    Prior,
    Settled,
}

/// Raw property change reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyChange {
    pub property: ObservableProperty,
    pub phase: ChangePhase,
}

/// Portion of the page to render as PDF
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PdfConfiguration {
    /// Rectangle in page coordinates; `None` captures the whole page
    pub rect: Option<(f64, f64, f64, f64)>,
    pub allow_transparent_background: bool,
}
