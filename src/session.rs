// Session state: the id token and the header set every admin request carries.
// A session is a plain value owned by the API client, so several
// authenticated sessions can live side by side.

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN, REFERER,
};
use std::fmt;
use tracing::{info, warn};

use crate::browser::{BrowserLauncher, LoginBrowser};
use crate::config::{normalize_url, ClientConfig};
use crate::error::{AdminError, Result};

const APP_NAME_HEADER: &str = "app_name";

/// Login credentials for the web app. Never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Credentials {
            identity: identity.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Authentication state for one admin user.
#[derive(Clone)]
pub struct Session {
    app_name: String,
    app_url: String,
    login_url: String,
    token: Option<String>,
    headers: HeaderMap,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("app_name", &self.app_name)
            .field("app_url", &self.app_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers)
            .finish()
    }
}

impl Session {
    /// An unauthenticated session for the app described by `config`.
    pub fn new(config: &ClientConfig) -> Self {
        Session {
            app_name: config.app_name.clone(),
            app_url: normalize_url(&config.app_url),
            login_url: config.login_url(),
            token: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Headers to attach to every request. Empty until authenticated.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Use an id token obtained elsewhere, skipping the browser.
    pub fn set_token(&mut self, token: &str) -> Result<()> {
        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(token)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(APP_NAME_HEADER, HeaderValue::from_str(&self.app_name)?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_str(&self.app_url)?);
        headers.insert(REFERER, HeaderValue::from_str(&format!("{}/", self.app_url))?);

        self.headers = headers;
        self.token = Some(token.to_string());
        Ok(())
    }

    /// Log in through a browser and adopt the id token it leaves in local
    /// storage. The browser is closed on every path out of this function.
    pub fn authenticate(
        &mut self,
        launcher: &dyn BrowserLauncher,
        credentials: &Credentials,
        headless: bool,
    ) -> Result<()> {
        info!(identity = %credentials.identity, headless, "starting browser login");
        let browser = launcher.launch(headless).map_err(AdminError::Browser)?;
        let mut browser = BrowserGuard(browser);

        let token = browser
            .0
            .login(&self.login_url, &credentials.identity, &credentials.secret)
            .map_err(AdminError::Browser)?;
        drop(browser);

        match token {
            Some(token) => {
                self.set_token(&token)?;
                info!(identity = %credentials.identity, "authenticated");
                Ok(())
            }
            None => {
                warn!("login finished without an idToken in local storage");
                Err(AdminError::Authentication(
                    "token not found in local storage".into(),
                ))
            }
        }
    }
}

/// Closes the wrapped browser when dropped, including during unwinding.
struct BrowserGuard(Box<dyn LoginBrowser>);

impl Drop for BrowserGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}
