// API client module: a blocking HTTP client for the Wildeer admin API. Every
// public method builds one path plus query or body, sends exactly one request
// through `get`/`post`/`put` and hands back the parsed JSON untouched.

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::browser::BrowserLauncher;
use crate::config::{normalize_url, ClientConfig};
use crate::error::{AdminError, Result};
use crate::models::{SortDirection, UpdateField, UserUpdates, AVAILABLE_APPS};
use crate::session::{Credentials, Session};

/// Largest page the listing endpoint is documented to serve.
pub const MAX_PAGE_SIZE: u32 = 25;

/// Filters and paging for `GET /admin/users`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    pub page: u32,
    pub page_size: u32,
    pub search_term: Option<String>,
    /// `None` means every app in [`AVAILABLE_APPS`].
    pub app_names: Option<Vec<String>>,
    pub sort_by: String,
    pub sort_direction: SortDirection,
    pub user_type: String,
}

impl Default for UserQuery {
    fn default() -> Self {
        UserQuery {
            page: 1,
            page_size: MAX_PAGE_SIZE,
            search_term: None,
            app_names: None,
            sort_by: "date".into(),
            sort_direction: SortDirection::Descend,
            user_type: "all".into(),
        }
    }
}

impl UserQuery {
    /// A default query searching for `term`.
    pub fn search(term: &str, page: u32, page_size: u32) -> Self {
        UserQuery {
            page,
            page_size,
            search_term: Some(term.to_string()),
            ..Self::default()
        }
    }

    /// Encoded query string, parameters in sorted order. App names are
    /// encoded one by one and joined with a bare comma.
    pub fn to_query_string(&self) -> String {
        let app_names = match &self.app_names {
            Some(names) => names
                .iter()
                .map(|n| urlencoding::encode(n).into_owned())
                .collect::<Vec<_>>()
                .join(","),
            None => AVAILABLE_APPS.join(","),
        };

        let mut query = QueryString::default();
        query.push_raw("app_names", &app_names);
        query.push("page", &self.page.to_string());
        query.push("page_size", &self.page_size.to_string());
        if let Some(term) = self.search_term.as_deref().filter(|t| !t.is_empty()) {
            query.push("search_term", term);
        }
        query.push("sort_by", &self.sort_by);
        query.push("sort_direction", self.sort_direction.as_str());
        query.push("type", &self.user_type);
        query.finish()
    }
}

/// Small `key=value&...` builder that keeps insertion order.
#[derive(Default)]
struct QueryString {
    pairs: Vec<String>,
}

impl QueryString {
    fn push(&mut self, key: &str, value: &str) {
        self.push_raw(key, &urlencoding::encode(value));
    }

    fn push_raw(&mut self, key: &str, encoded: &str) {
        self.pairs.push(format!("{}={}", key, encoded));
    }

    fn finish(self) -> String {
        self.pairs.join("&")
    }
}

fn single_param(key: &str, value: &str) -> String {
    let mut query = QueryString::default();
    query.push(key, value);
    query.finish()
}

/// Admin API client holding the HTTP connection pool, the base URL and the
/// session whose headers go on every request.
pub struct AdminClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl AdminClient {
    /// Build an unauthenticated client from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("wildeer-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AdminError::ClientBuild)?;
        Ok(AdminClient {
            client,
            base_url: normalize_url(&config.api_base_url),
            session: Session::new(config),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in through the browser; see [`Session::authenticate`].
    pub fn authenticate(
        &mut self,
        launcher: &dyn BrowserLauncher,
        credentials: &Credentials,
        headless: bool,
    ) -> Result<()> {
        self.session.authenticate(launcher, credentials, headless)
    }

    /// Use a known id token; see [`Session::set_token`].
    pub fn set_token(&mut self, token: &str) -> Result<()> {
        self.session.set_token(token)
    }

    // HTTP verbs -------------------------------------------------------------

    /// GET `endpoint` with an already encoded query string.
    pub fn get(&self, endpoint: &str, query: Option<&str>) -> Result<Value> {
        let url = match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", self.base_url, endpoint, q),
            _ => format!("{}{}", self.base_url, endpoint),
        };
        self.send("GET", endpoint, self.client.get(url))
    }

    pub fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.send("POST", endpoint, self.client.post(url).json(body))
    }

    pub fn put(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        self.send("PUT", endpoint, self.client.put(url).json(body))
    }

    fn send(&self, verb: &str, endpoint: &str, request: RequestBuilder) -> Result<Value> {
        debug!(verb, endpoint, "calling admin API");
        let res = request
            .headers(self.session.headers().clone())
            .send()
            .map_err(|source| AdminError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = res.status();
        if !status.is_success() {
            debug!(verb, endpoint, %status, "admin API returned an error");
            // A body that fails to arrive is left empty.
            let body = res.text().unwrap_or_else(|_| "".into());
            return Err(AdminError::Http {
                status,
                endpoint: endpoint.to_string(),
                body,
            });
        }

        let text = res.text().map_err(|source| AdminError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| AdminError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    // Users ------------------------------------------------------------------

    /// Info about the signed-in admin (`payload` holds user, plan and usage).
    pub fn current_user(&self) -> Result<Value> {
        self.get("/user", None)
    }

    /// List or search users. Returns
    /// `{success, info: {total_count, total_pages, current_page}, data: [...]}`.
    pub fn list_users(&self, query: &UserQuery) -> Result<Value> {
        if query.page_size > MAX_PAGE_SIZE {
            warn!(
                page_size = query.page_size,
                "page size above {}, the API may cap it", MAX_PAGE_SIZE
            );
        }
        self.get("/admin/users", Some(&query.to_query_string()))
    }

    /// Search users by email, user id or API key across all apps.
    pub fn search_users(&self, term: &str, page: u32, page_size: u32) -> Result<Value> {
        self.list_users(&UserQuery::search(term, page, page_size))
    }

    pub fn get_user_usage(&self, user_id: &str) -> Result<Value> {
        self.get("/admin/user/usage", Some(&single_param("user_id", user_id)))
    }

    /// PUT `{userId, appName, ...updates}` to `/admin/users`. Keys in `updates`
    /// are laid over the identifying pair as given.
    pub fn update_user(
        &self,
        user_id: &str,
        app_name: &str,
        updates: &UserUpdates,
    ) -> Result<Value> {
        for name in updates.keys() {
            if UpdateField::from_name(name).is_none() && name != "userId" && name != "appName" {
                warn!(field = %name, "update field not known to this client, sending anyway");
            }
        }

        let mut body = UserUpdates::new();
        body.insert("userId".into(), json!(user_id));
        body.insert("appName".into(), json!(app_name));
        body.extend(updates.clone());
        self.put("/admin/users", &Value::Object(body))
    }

    pub fn block_user(&self, user_id: &str, app_name: &str) -> Result<Value> {
        self.update_user(user_id, app_name, &flag(UpdateField::IsAdminBlocked, true))
    }

    pub fn unblock_user(&self, user_id: &str, app_name: &str) -> Result<Value> {
        self.update_user(user_id, app_name, &flag(UpdateField::IsAdminBlocked, false))
    }

    pub fn set_payment_problem(
        &self,
        user_id: &str,
        app_name: &str,
        has_problem: bool,
    ) -> Result<Value> {
        self.update_user(
            user_id,
            app_name,
            &flag(UpdateField::HasPaymentProblem, has_problem),
        )
    }

    /// Turn on overage billing at `multiplier` times the base rate (the web
    /// app uses 2).
    pub fn enable_overage(
        &self,
        user_id: &str,
        app_name: &str,
        multiplier: u32,
    ) -> Result<Value> {
        let mut updates = flag(UpdateField::OverageEnabled, true);
        updates.insert(
            UpdateField::OverageRateMultiplier.as_str().into(),
            json!(multiplier),
        );
        self.update_user(user_id, app_name, &updates)
    }

    pub fn disable_overage(&self, user_id: &str, app_name: &str) -> Result<Value> {
        self.update_user(user_id, app_name, &flag(UpdateField::OverageEnabled, false))
    }

    // Plans and flags -------------------------------------------------------

    /// `{success, data: [plan, ...]}`
    pub fn get_plans(&self) -> Result<Value> {
        self.get("/admin/plans", None)
    }

    /// `{success, payload: {flag_name: value, ...}}`
    pub fn get_feature_flags(&self) -> Result<Value> {
        self.get("/admin/feature-flags", None)
    }

    // Ban checks -------------------------------------------------------------

    pub fn is_email_domain_banned(&self, email: &str) -> Result<Value> {
        self.get("/isemaildomainbanned", Some(&single_param("email", email)))
    }

    pub fn is_email_blocked(&self, email: &str) -> Result<Value> {
        self.get("/isemailblocked", Some(&single_param("email", email)))
    }

    pub fn is_api_key_banned(&self, api_key: &str) -> Result<Value> {
        self.get("/isapikeybanned", Some(&single_param("api_key", api_key)))
    }

    pub fn is_ip_banned(&self, ip: &str) -> Result<Value> {
        self.get("/isipbanned", Some(&single_param("ip", ip)))
    }
}

fn flag(field: UpdateField, value: bool) -> UserUpdates {
    let mut updates = UserUpdates::new();
    updates.insert(field.as_str().into(), Value::Bool(value));
    updates
}
