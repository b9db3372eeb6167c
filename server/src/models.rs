use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Channel a registration arrived through. Stored on the voter row as
/// lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Public,
    Brigadista,
    LeaderLink,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Public => "public",
            Mode::Brigadista => "brigadista",
            Mode::LeaderLink => "leader_link",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    #[serde(default)]
    pub mode: Mode,
}

#[derive(Debug, Deserialize)]
pub struct MunicipalityQuery {
    pub department_id: Option<i64>,
    pub department: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NeighborhoodQuery {
    pub municipality_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CoordinatorQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderQuery {
    pub search: Option<String>,
    pub coordinator_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LinkResolveQuery {
    pub leader: i64,
    pub coord: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaderItem {
    pub id: i64,
    pub name: String,
    pub coordinator_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterVoterIn {
    pub document: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub municipality_id: i64,
    pub neighborhood_id: i64,
    pub leader_id: i64,
    #[serde(default)]
    pub coordinator_id: Option<i64>,
    #[serde(default)]
    pub consent: bool,
    #[serde(default)]
    pub captcha_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Created,
    Updated,
}

#[derive(Debug, Serialize)]
pub struct RegisterVoterOut {
    pub status: RegisterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a referral-link check. Always a structured answer: lookup
/// misses and membership mismatches set `valid = false` with a message
/// instead of raising an error status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResolveOut {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinator_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinator_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LinkResolveOut {
    pub fn rejected(message: &str) -> Self {
        Self {
            valid: false,
            leader_code: None,
            coordinator_code: None,
            leader_name: None,
            coordinator_name: None,
            message: Some(message.to_string()),
        }
    }

    pub fn confirmed(leader: &LeaderItem, coordinator: &CatalogItem) -> Self {
        Self {
            valid: true,
            leader_code: Some(leader.id),
            coordinator_code: Some(coordinator.id),
            leader_name: Some(leader.name.clone()),
            coordinator_name: Some(coordinator.name.clone()),
            message: None,
        }
    }
}

/// Fully validated submission plus the server-derived consent evidence.
/// `consent_at` doubles as the created/updated timestamp of the write.
#[derive(Debug)]
pub struct NewVoter {
    pub leader_id: i64,
    pub document: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub municipality_id: i64,
    pub neighborhood_id: i64,
    pub mode: Mode,
    pub consent_at: DateTime<Utc>,
    pub consent_ip: String,
    pub consent_user_agent: String,
}

#[cfg(test)]
mod tests {
    use serde_json::{json, to_value};

    use super::{
        CatalogItem, LeaderItem, LinkResolveOut, Mode, RegisterQuery, RegisterStatus,
        RegisterVoterOut,
    };

    #[test]
    fn test_mode_values() {
        assert_eq!(
            serde_json::from_value::<Mode>(json!("public")).unwrap(),
            Mode::Public
        );
        assert_eq!(
            serde_json::from_value::<Mode>(json!("brigadista")).unwrap(),
            Mode::Brigadista
        );
        assert_eq!(
            serde_json::from_value::<Mode>(json!("leader_link")).unwrap(),
            Mode::LeaderLink
        );
        assert!(serde_json::from_value::<Mode>(json!("other")).is_err());

        assert_eq!(Mode::LeaderLink.as_str(), "leader_link");
    }

    #[test]
    fn test_mode_defaults_to_public() {
        let query: RegisterQuery = serde_json::from_value(json!({})).unwrap();

        assert_eq!(query.mode, Mode::Public);
    }

    #[test]
    fn test_created_response_has_no_message() {
        let value = to_value(RegisterVoterOut {
            status: RegisterStatus::Created,
            message: None,
        })
        .unwrap();

        assert_eq!(value, json!({ "status": "created" }));
    }

    #[test]
    fn test_rejected_resolution_shape() {
        let value = to_value(LinkResolveOut::rejected("Líder no encontrado.")).unwrap();

        assert_eq!(
            value,
            json!({ "valid": false, "message": "Líder no encontrado." })
        );
    }

    #[test]
    fn test_confirmed_resolution_uses_camel_case() {
        let leader = LeaderItem {
            id: 7,
            name: "Líder Zona Norte".to_string(),
            coordinator_id: 3,
        };
        let coordinator = CatalogItem {
            id: 3,
            name: "Coordinador General".to_string(),
        };

        let value = to_value(LinkResolveOut::confirmed(&leader, &coordinator)).unwrap();

        assert_eq!(
            value,
            json!({
                "valid": true,
                "leaderCode": 7,
                "coordinatorCode": 3,
                "leaderName": "Líder Zona Norte",
                "coordinatorName": "Coordinador General"
            })
        );
    }
}
