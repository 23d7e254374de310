//! Builder wiring the delegates into a page

use super::{PageConfiguration, WebPage};
use crate::download::{DefaultDownloadDecider, DownloadDecider};
use crate::engine::EngineFactory;
use crate::navigation::{DefaultNavigationDecider, NavigationDecider};
use crate::ui::{DefaultDialogPresenter, DialogPresenter};

/// Builds a `WebPage` with optional deciders and presenter
pub struct WebPageBuilder {
    pub(super) configuration: PageConfiguration,
    pub(super) navigation_decider: Box<dyn NavigationDecider>,
    pub(super) dialog_presenter: Box<dyn DialogPresenter>,
    pub(super) download_decider: Box<dyn DownloadDecider>,
}

impl WebPageBuilder {
    pub fn new() -> Self {
        Self {
            configuration: PageConfiguration::default(),
            navigation_decider: Box::new(DefaultNavigationDecider),
            dialog_presenter: Box::new(DefaultDialogPresenter),
            download_decider: Box::new(DefaultDownloadDecider),
        }
    }

    pub fn configuration(mut self, configuration: PageConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn navigation_decider(mut self, decider: impl NavigationDecider + 'static) -> Self {
        self.navigation_decider = Box::new(decider);
        self
    }

    pub fn dialog_presenter(mut self, presenter: impl DialogPresenter + 'static) -> Self {
        self.dialog_presenter = Box::new(presenter);
        self
    }

    pub fn download_decider(mut self, decider: impl DownloadDecider + 'static) -> Self {
        self.download_decider = Box::new(decider);
        self
    }

    /// Build the page; the engine is created on first use
    pub fn build(self, factory: impl EngineFactory + 'static) -> WebPage {
        WebPage::from_builder(self, Box::new(factory))
    }
}

impl Default for WebPageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
