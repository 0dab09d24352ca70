//! Account status model and admin request/response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a farm account. An account is in exactly one status
/// at a time; administrators have no status concept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Unverified,
    Active,
    Suspended,
    Deactivated,
}

impl AccountStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deactivated => "deactivated",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "unverified" => Some(Self::Unverified),
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "deactivated" => Some(Self::Deactivated),
            _ => None,
        }
    }
}

/// Allow-listed administrator actions against a farm account. Anything else
/// fails deserialization before it can reach the status column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
    Suspend,
    Reinstate,
    Deactivate,
}

impl StatusAction {
    /// Status the account lands in after this action.
    #[must_use]
    pub fn target_status(self) -> AccountStatus {
        match self {
            Self::Suspend => AccountStatus::Suspended,
            Self::Reinstate => AccountStatus::Active,
            Self::Deactivate => AccountStatus::Deactivated,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suspend => "suspend",
            Self::Reinstate => "reinstate",
            Self::Deactivate => "deactivate",
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StatusActionRequest {
    pub action: StatusAction,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountSummary {
    pub id: String,
    pub farm_name: String,
    pub email: String,
    pub status: AccountStatus,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountSummary>,
}
