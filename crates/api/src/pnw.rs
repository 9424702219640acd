//! Politics and War GraphQL API client
//!
//! Used to validate member API keys, look up alliances when an administrator
//! whitelists one, and show live alliance data on landing pages. The API key
//! travels as the `api_key` query parameter; user input is always passed as
//! GraphQL variables, never spliced into the query text.

use reqwest::Client;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

/// Maximum number of alliances returned by a name search
const SEARCH_LIMIT: i32 = 10;

const ALLIANCE_BY_ID_QUERY: &str = r#"
    query AllianceById($id: [Int]) {
        alliances(id: $id, first: 1) {
            data {
                id
                name
                acronym
                score
                color
                rank
                flag
                date
                accept_members
                nations {
                    id
                    nation_name
                    leader_name
                    score
                    num_cities
                    last_active
                }
            }
        }
    }
"#;

const SEARCH_ALLIANCES_QUERY: &str = r#"
    query SearchAlliances($name: [String], $first: Int) {
        alliances(name: $name, first: $first) {
            data {
                id
                name
                acronym
                score
                color
                rank
                flag
                date
                accept_members
            }
        }
    }
"#;

const ME_QUERY: &str = r#"
    query Me {
        me {
            nation {
                id
                nation_name
                leader_name
                alliance_id
                alliance {
                    id
                    name
                    acronym
                }
                score
                num_cities
                color
                last_active
            }
        }
    }
"#;

// ============================================================================
// Types
// ============================================================================

/// Alliance as returned by the game API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnwAlliance {
    #[serde(deserialize_with = "de_id")]
    pub id: i32,
    pub name: String,
    pub acronym: Option<String>,
    #[serde(default)]
    pub score: f64,
    pub color: Option<String>,
    pub rank: Option<i32>,
    pub flag: Option<String>,
    pub date: Option<String>,
    pub accept_members: Option<bool>,
    pub nations: Option<Vec<PnwAllianceMember>>,
}

impl PnwAlliance {
    /// Acronym, treating the API's empty string as absent
    pub fn acronym(&self) -> Option<&str> {
        self.acronym.as_deref().filter(|a| !a.trim().is_empty())
    }
}

/// Nation listed under an alliance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnwAllianceMember {
    #[serde(deserialize_with = "de_id")]
    pub id: i32,
    pub nation_name: String,
    pub leader_name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub num_cities: i32,
    pub last_active: Option<String>,
}

/// Alliance reference embedded in a nation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnwAllianceRef {
    #[serde(deserialize_with = "de_id")]
    pub id: i32,
    pub name: String,
    pub acronym: Option<String>,
}

/// Nation owning an API key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnwNation {
    #[serde(deserialize_with = "de_id")]
    pub id: i32,
    pub nation_name: String,
    pub leader_name: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub alliance_id: Option<i32>,
    pub alliance: Option<PnwAllianceRef>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub num_cities: i32,
    pub color: Option<String>,
    pub last_active: Option<String>,
}

impl PnwNation {
    /// Alliance the nation belongs to; the API reports `0` for none
    pub fn alliance_id(&self) -> Option<i32> {
        self.alliance_id
            .or_else(|| self.alliance.as_ref().map(|a| a.id))
            .filter(|id| *id > 0)
    }
}

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'static str,
    variables: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Paginated<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AlliancesData {
    alliances: Paginated<PnwAlliance>,
}

#[derive(Debug, Deserialize)]
struct MeData {
    me: Option<MeNation>,
}

#[derive(Debug, Deserialize)]
struct MeNation {
    nation: Option<PnwNation>,
}

#[derive(Debug, thiserror::Error)]
pub enum PnwError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned status {0}")]
    Status(u16),
    #[error("GraphQL error: {0}")]
    GraphQL(String),
    #[error("{0}")]
    InvalidKey(String),
    #[error("Response contained no data")]
    EmptyResponse,
}

// ============================================================================
// Client
// ============================================================================

/// Client for the Politics and War GraphQL API
#[derive(Clone)]
pub struct PnwClient {
    client: Client,
    endpoint: String,
}

impl PnwClient {
    /// Create a client with a request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PnwError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
        })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
        api_key: Option<&str>,
    ) -> Result<T, PnwError> {
        let mut request = self.client.post(&self.endpoint).json(&GraphQLRequest {
            query,
            variables: &variables,
        });
        if let Some(key) = api_key {
            request = request.query(&[("api_key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "Politics and War API returned error status");
            return Err(PnwError::Status(status.as_u16()));
        }

        let result: GraphQLResponse<T> = response.json().await?;

        if let Some(errors) = result.errors.filter(|e| !e.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(PnwError::GraphQL(message));
        }

        result.data.ok_or(PnwError::EmptyResponse)
    }

    /// Fetch one alliance, including its member nations
    pub async fn alliance_by_id(
        &self,
        alliance_id: i32,
        api_key: Option<&str>,
    ) -> Result<Option<PnwAlliance>, PnwError> {
        let data: AlliancesData = self
            .query(ALLIANCE_BY_ID_QUERY, json!({ "id": [alliance_id] }), api_key)
            .await?;

        debug!(alliance_id, found = !data.alliances.data.is_empty(), "Fetched alliance");
        Ok(data.alliances.data.into_iter().next())
    }

    /// Search alliances by name
    pub async fn search_alliances(
        &self,
        name: &str,
        api_key: Option<&str>,
    ) -> Result<Vec<PnwAlliance>, PnwError> {
        let data: AlliancesData = self
            .query(
                SEARCH_ALLIANCES_QUERY,
                json!({ "name": [name], "first": SEARCH_LIMIT }),
                api_key,
            )
            .await?;

        Ok(data.alliances.data)
    }

    /// Check an API key by asking for the nation that owns it
    pub async fn validate_api_key(&self, api_key: &str) -> Result<PnwNation, PnwError> {
        let data: MeData = match self.query(ME_QUERY, json!({}), Some(api_key)).await {
            Ok(data) => data,
            Err(PnwError::GraphQL(message)) => return Err(PnwError::InvalidKey(message)),
            Err(PnwError::Status(code @ (401 | 403))) => {
                return Err(PnwError::InvalidKey(format!("API key rejected (status {code})")))
            }
            Err(e) => return Err(e),
        };

        data.me
            .and_then(|me| me.nation)
            .ok_or_else(|| {
                PnwError::InvalidKey(
                    "API key is valid but could not retrieve nation data".to_string(),
                )
            })
    }
}

// ============================================================================
// Id decoding
// ============================================================================

/// The API encodes ids as strings; accept both strings and numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl RawId {
    fn into_i32<E: de::Error>(self) -> Result<i32, E> {
        match self {
            RawId::Int(n) => i32::try_from(n).map_err(E::custom),
            RawId::Str(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    RawId::deserialize(deserializer)?.into_i32()
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    Option::<RawId>::deserialize(deserializer)?
        .map(RawId::into_i32)
        .transpose()
}
