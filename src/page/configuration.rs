//! Page configuration handed to the engine at creation

/// Content mode the engine renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    #[default]
    Recommended,
    Mobile,
    Desktop,
}

/// Settings applied when the engine is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfiguration {
    /// Appended to the engine's user agent
    pub application_name: Option<String>,
    pub content_mode: ContentMode,
    pub javascript_enabled: bool,
    pub upgrade_known_hosts_to_https: bool,
    pub limits_navigations_to_app_bound_domains: bool,
    /// Initial inspectability; can be changed later on the page
    pub inspectable: bool,
}

impl Default for PageConfiguration {
    fn default() -> Self {
        Self {
            application_name: None,
            content_mode: ContentMode::Recommended,
            javascript_enabled: true,
            upgrade_known_hosts_to_https: true,
            limits_navigations_to_app_bound_domains: false,
            inspectable: false,
        }
    }
}

impl PageConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    pub fn content_mode(mut self, mode: ContentMode) -> Self {
        self.content_mode = mode;
        self
    }

    pub fn javascript_enabled(mut self, enabled: bool) -> Self {
        self.javascript_enabled = enabled;
        self
    }

    pub fn upgrade_known_hosts_to_https(mut self, upgrade: bool) -> Self {
        self.upgrade_known_hosts_to_https = upgrade;
        self
    }

    pub fn limits_navigations_to_app_bound_domains(mut self, limit: bool) -> Self {
        self.limits_navigations_to_app_bound_domains = limit;
        self
    }

    pub fn inspectable(mut self, inspectable: bool) -> Self {
        self.inspectable = inspectable;
        self
    }
}
