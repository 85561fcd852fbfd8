// Client configuration. Defaults point at the production admin API; the
// binary overlays command line flags and environment variables on top.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.wildeerllp.com";
pub const DEFAULT_APP_URL: &str = "https://app.wildeerllp.com";
pub const DEFAULT_APP_NAME: &str = "wildeerllp";

/// Settings shared by the session and the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST admin API, without trailing slash.
    pub api_base_url: String,
    /// Web app URL. Used for the login page and the origin/referer headers.
    pub app_url: String,
    /// Value of the `app_name` header sent on every request.
    pub app_name: String,
    pub request_timeout: Duration,
    /// How long the browser login may wait for the form and the redirect.
    pub login_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_base_url: DEFAULT_API_URL.into(),
            app_url: DEFAULT_APP_URL.into(),
            app_name: DEFAULT_APP_NAME.into(),
            request_timeout: Duration::from_secs(30),
            login_timeout: Duration::from_secs(20),
        }
    }
}

impl ClientConfig {
    /// Default configuration talking to another API base URL. Mostly useful
    /// for pointing the client at a local mock server.
    pub fn with_api_url(api_base_url: &str) -> Self {
        ClientConfig {
            api_base_url: normalize_url(api_base_url),
            ..Self::default()
        }
    }

    /// URL of the web login page.
    pub fn login_url(&self) -> String {
        format!("{}/login", normalize_url(&self.app_url))
    }
}

/// Strip trailing slashes so paths can be appended with `format!`.
pub fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
