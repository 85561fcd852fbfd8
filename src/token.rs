// Read-only peek into the id token. The payload segment of the JWT is
// decoded so the CLI can say who is signed in and for how long; the
// signature is not checked, the admin API does that.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AdminError, Result};

/// The subset of id token claims the CLI displays.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<u64>,
}

impl IdTokenClaims {
    /// Decode the payload segment of `token`.
    pub fn decode(token: &str) -> Result<Self> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| AdminError::Input("id token is not a JWT".into()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AdminError::Input(format!("id token payload: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AdminError::Input(format!("id token claims: {}", e)))
    }

    /// Seconds until expiry, or `None` if the token carries no `exp` or has
    /// already expired.
    pub fn seconds_left(&self) -> Option<u64> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        self.exp?.checked_sub(now).filter(|left| *left > 0)
    }
}
