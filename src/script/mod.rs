//! Script evaluation types
//!
//! Values crossing into and out of the page are JSON values. A function body
//! that returns nothing evaluates to `None`; one that returns `null` evaluates
//! to `Some(Value::Null)`.

use serde_json::{Map, Value};
use url::Url;

/// Named arguments bound into the function body
pub type ScriptArguments = Map<String, Value>;

/// Frame targeted by a script call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Engine frame identifier
    pub id: u64,
    pub is_main_frame: bool,
    pub url: Option<Url>,
}

impl FrameInfo {
    pub fn main(id: u64, url: Option<Url>) -> Self {
        Self {
            id,
            is_main_frame: true,
            url,
        }
    }
}

/// Namespace a script runs in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ContentWorld {
    /// The world page scripts run in
    #[default]
    Page,
    /// The engine's default client world
    Defaults,
    /// An isolated world with a name
    Named(String),
}

impl ContentWorld {
    pub fn named(name: impl Into<String>) -> Self {
        ContentWorld::Named(name.into())
    }
}

/// A single script call as forwarded to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCall {
    pub body: String,
    pub arguments: ScriptArguments,
    /// `None` targets the main frame
    pub frame: Option<FrameInfo>,
    pub world: ContentWorld,
}

impl ScriptCall {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            arguments: ScriptArguments::new(),
            frame: None,
            world: ContentWorld::default(),
        }
    }

    /// Bind a named argument
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn in_frame(mut self, frame: FrameInfo) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn in_world(mut self, world: ContentWorld) -> Self {
        self.world = world;
        self
    }
}
