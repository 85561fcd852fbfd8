// Browser login boundary. The session only needs "log in and hand me the id
// token", so the browser is hidden behind two small traits; tests plug in a
// fake and the binary plugs in Chrome via `headless_chrome`.

use anyhow::{anyhow, bail, Context};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Local storage keys written by the login page end with this marker.
pub const ID_TOKEN_KEY_MARKER: &str = "idToken";

const IDENTITY_SELECTOR: &str = "input[type='text'], input[type='email']";
const SECRET_SELECTOR: &str = "input[type='password']";
const SUBMIT_SELECTOR: &str = "button[type='submit']";

/// Dumps local storage as a JSON array of `[key, value]` pairs.
const LOCAL_STORAGE_SCRIPT: &str = r#"JSON.stringify(
    Object.keys(localStorage).map(function (k) { return [k, localStorage.getItem(k)]; })
)"#;

/// An open browser able to perform the login form flow.
pub trait LoginBrowser {
    /// Open `login_url`, submit the credentials, wait until the page leaves the
    /// login URL and return the id token found in local storage, if any.
    fn login(&mut self, login_url: &str, identity: &str, secret: &str)
        -> anyhow::Result<Option<String>>;

    /// Release the browser process.
    fn close(&mut self);
}

/// Starts browsers. Kept separate from `LoginBrowser` so the session decides
/// when the browser is closed.
pub trait BrowserLauncher {
    fn launch(&self, headless: bool) -> anyhow::Result<Box<dyn LoginBrowser>>;
}

/// Return the first non-empty value whose key contains `idToken`.
pub fn find_id_token<I, K, V>(entries: I) -> Option<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    entries
        .into_iter()
        .filter(|(key, _)| key.as_ref().contains(ID_TOKEN_KEY_MARKER))
        .map(|(_, value)| value.into())
        .find(|value| !value.is_empty())
}

/// Launches a local Chrome/Chromium through the DevTools protocol.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    /// Upper bound for waiting on the form and the post-login redirect.
    pub timeout: Duration,
    /// Pause after the redirect so the page can finish writing local storage.
    pub settle: Duration,
}

impl ChromeLauncher {
    pub fn new(timeout: Duration) -> Self {
        ChromeLauncher {
            timeout,
            settle: Duration::from_secs(2),
        }
    }
}

impl BrowserLauncher for ChromeLauncher {
    fn launch(&self, headless: bool) -> anyhow::Result<Box<dyn LoginBrowser>> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .sandbox(false)
            .idle_browser_timeout(self.timeout + self.settle + Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("invalid browser launch options: {}", e))?;
        let browser = Browser::new(options).context("Failed to launch Chrome")?;
        let tab = browser.new_tab().context("Failed to open a browser tab")?;
        tab.set_default_timeout(self.timeout);
        debug!(headless, "browser launched");
        Ok(Box::new(ChromeBrowser {
            browser: Some(browser),
            tab,
            timeout: self.timeout,
            settle: self.settle,
        }))
    }
}

/// A running Chrome instance with one tab.
pub struct ChromeBrowser {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    timeout: Duration,
    settle: Duration,
}

impl ChromeBrowser {
    fn wait_until_left(&self, login_url: &str) -> anyhow::Result<()> {
        let deadline = Instant::now() + self.timeout;
        while self.tab.get_url().contains("/login") {
            if Instant::now() >= deadline {
                bail!("still on {} after {:?}", login_url, self.timeout);
            }
            thread::sleep(Duration::from_millis(250));
        }
        Ok(())
    }

    fn local_storage(&self) -> anyhow::Result<Vec<(String, String)>> {
        let result = self
            .tab
            .evaluate(LOCAL_STORAGE_SCRIPT, false)
            .context("Failed to read local storage")?;
        let raw = match result.value {
            Some(serde_json::Value::String(raw)) => raw,
            other => bail!("unexpected local storage dump: {:?}", other),
        };
        let entries: Vec<(String, Option<String>)> =
            serde_json::from_str(&raw).context("Parsing local storage dump")?;
        Ok(entries
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect())
    }
}

impl LoginBrowser for ChromeBrowser {
    fn login(
        &mut self,
        login_url: &str,
        identity: &str,
        secret: &str,
    ) -> anyhow::Result<Option<String>> {
        self.tab
            .navigate_to(login_url)?
            .wait_until_navigated()
            .with_context(|| format!("Failed to open {}", login_url))?;

        self.tab
            .wait_for_element(IDENTITY_SELECTOR)
            .context("Login form did not appear")?
            .type_into(identity)?;
        self.tab.find_element(SECRET_SELECTOR)?.type_into(secret)?;
        self.tab.find_element(SUBMIT_SELECTOR)?.click()?;

        self.wait_until_left(login_url)?;
        thread::sleep(self.settle);
        debug!(url = %self.tab.get_url(), "left login page");

        Ok(find_id_token(self.local_storage()?))
    }

    fn close(&mut self) {
        // Dropping the handle kills the browser process.
        if self.browser.take().is_some() {
            debug!("browser closed");
        }
    }
}

impl Drop for ChromeBrowser {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_cognito_id_token_over_other_keys() {
        let entries = vec![
            ("CognitoIdentityServiceProvider.abc.user.accessToken", "access"),
            ("CognitoIdentityServiceProvider.abc.user.idToken", "id-token"),
            ("CognitoIdentityServiceProvider.abc.user.refreshToken", "refresh"),
        ];
        assert_eq!(find_id_token(entries), Some("id-token".to_string()));
    }

    #[test]
    fn empty_token_values_are_skipped() {
        let entries = vec![("a.idToken", ""), ("b.idToken", "second")];
        assert_eq!(find_id_token(entries), Some("second".to_string()));
    }

    #[test]
    fn no_matching_key_yields_none() {
        let entries = vec![("theme", "dark"), ("lastVisited", "/dashboard")];
        assert_eq!(find_id_token(entries), None);
    }
}
