//! Navigation policy decisions

use url::Url;

use crate::network::Request;
use crate::script::FrameInfo;

/// What triggered a navigation action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    LinkActivated,
    FormSubmitted,
    BackForward,
    Reload,
    FormResubmitted,
    Other,
}

/// A navigation the engine is about to perform
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationAction {
    pub request: Request,
    pub navigation_type: NavigationType,
    pub source_frame: Option<FrameInfo>,
    pub target_is_main_frame: bool,
    /// Set when the link carries a download attribute
    pub should_perform_download: bool,
}

/// A response received for a navigation
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationResponse {
    pub url: Url,
    pub mime_type: Option<String>,
    pub status: Option<u16>,
    pub is_for_main_frame: bool,
    pub can_show_mime_type: bool,
}

/// Decision for an action or response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPolicy {
    Allow,
    Cancel,
    /// Turn the navigation into a download
    Download,
}

/// Decides whether navigations proceed
pub trait NavigationDecider {
    fn decide_policy_for_action(&mut self, action: &NavigationAction) -> NavigationPolicy {
        if action.should_perform_download {
            NavigationPolicy::Download
        } else {
            NavigationPolicy::Allow
        }
    }

    fn decide_policy_for_response(&mut self, response: &NavigationResponse) -> NavigationPolicy {
        if response.can_show_mime_type {
            NavigationPolicy::Allow
        } else {
            NavigationPolicy::Download
        }
    }
}

/// Allows everything the engine can display, downloads the rest
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNavigationDecider;

impl NavigationDecider for DefaultNavigationDecider {}
