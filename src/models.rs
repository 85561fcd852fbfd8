// Data shapes exchanged with the admin API. Responses stay opaque
// `serde_json::Value`s in the client; the structs here are lenient read-only
// views the CLI uses for its summaries.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Apps whose users the admin API manages. Used as the default filter.
pub const AVAILABLE_APPS: [&str; 10] = [
    "asindataapi",
    "backyardapi",
    "bigboxapi",
    "bluecartapi",
    "countdownapi",
    "rainforestapi",
    "redcircleapi",
    "scaleserp",
    "serpwow",
    "valueserp",
];

/// Arbitrary field overlay for a user update. Field names and value types are
/// checked by the admin API, not here; see [`UpdateField`] for the known ones.
pub type UserUpdates = Map<String, Value>;

/// Fields the admin API is known to accept in a user update.
///
/// | field | type |
/// |---|---|
/// | `userEmail` | string |
/// | `isAdminBlocked`, `isMultiFreeTrialBlocked`, `isUserEmailVerified` | bool |
/// | `hasPaymentProblem` | bool |
/// | `userEmailPreferencesError`, `userEmailPreferencesSystem`, `userEmailPreferencesUpdate` | bool |
/// | `overageEnabled` | bool |
/// | `overageRateMultiplier` | integer |
/// | `overageRateCentsPerThousand` | integer or null |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateField {
    UserEmail,
    IsAdminBlocked,
    IsMultiFreeTrialBlocked,
    IsUserEmailVerified,
    HasPaymentProblem,
    UserEmailPreferencesError,
    UserEmailPreferencesSystem,
    UserEmailPreferencesUpdate,
    OverageEnabled,
    OverageRateMultiplier,
    OverageRateCentsPerThousand,
}

impl UpdateField {
    pub const ALL: [UpdateField; 11] = [
        UpdateField::UserEmail,
        UpdateField::IsAdminBlocked,
        UpdateField::IsMultiFreeTrialBlocked,
        UpdateField::IsUserEmailVerified,
        UpdateField::HasPaymentProblem,
        UpdateField::UserEmailPreferencesError,
        UpdateField::UserEmailPreferencesSystem,
        UpdateField::UserEmailPreferencesUpdate,
        UpdateField::OverageEnabled,
        UpdateField::OverageRateMultiplier,
        UpdateField::OverageRateCentsPerThousand,
    ];

    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateField::UserEmail => "userEmail",
            UpdateField::IsAdminBlocked => "isAdminBlocked",
            UpdateField::IsMultiFreeTrialBlocked => "isMultiFreeTrialBlocked",
            UpdateField::IsUserEmailVerified => "isUserEmailVerified",
            UpdateField::HasPaymentProblem => "hasPaymentProblem",
            UpdateField::UserEmailPreferencesError => "userEmailPreferencesError",
            UpdateField::UserEmailPreferencesSystem => "userEmailPreferencesSystem",
            UpdateField::UserEmailPreferencesUpdate => "userEmailPreferencesUpdate",
            UpdateField::OverageEnabled => "overageEnabled",
            UpdateField::OverageRateMultiplier => "overageRateMultiplier",
            UpdateField::OverageRateCentsPerThousand => "overageRateCentsPerThousand",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

/// Sort order accepted by the user listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascend,
    #[default]
    Descend,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascend => "ascend",
            SortDirection::Descend => "descend",
        }
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pagination block of a user listing.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PageInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_pages: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_page: u64,
}

/// One entry of a user listing, as far as the CLI cares.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub app_name: Option<String>,
}

/// `{success, info, data}` envelope returned by the user listing.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UserListing {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: PageInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<UserSummary>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub plan_name: Option<String>,
    #[serde(default)]
    pub plan_monthly_cost: Value,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PlanList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Plan>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub available_credits: Value,
}

/// Payload of `GET /user`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub user_user_name: Option<String>,
    pub user_email: Option<String>,
    pub plan: Option<Plan>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CurrentUserResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload: CurrentUser,
}
