//! Client (customer) records.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use shopdesk_core::{Client, ClientFilter, ClientInput, Page, DEFAULT_PAGE_SIZE};

use crate::error::ApiError;
use crate::extract::{require_admin, ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

/// Client as returned to callers. The CPF is never echoed.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicClient {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<Client> for PublicClient {
    fn from(client: Client) -> Self {
        PublicClient {
            id: client.id,
            name: client.name,
            email: client.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientList {
    pub clients: Vec<PublicClient>,
}

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    name: Option<String>,
    email: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    skip: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

async fn list_clients(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(query): ApiQuery<ClientQuery>,
) -> Result<ApiJson<ClientList>, ApiError> {
    let filter = ClientFilter {
        name: query.name,
        email: query.email,
    };
    let clients = state
        .db
        .clients()
        .list(&filter, Page::new(query.limit, query.skip))
        .await?;

    Ok(ApiJson(ClientList {
        clients: clients.into_iter().map(PublicClient::from).collect(),
    }))
}

async fn create_client(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<(StatusCode, ApiJson<PublicClient>), ApiError> {
    let client = state.db.clients().create(&input).await?;
    Ok((StatusCode::CREATED, ApiJson(client.into())))
}

async fn get_client(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiJson<PublicClient>, ApiError> {
    let client = state.db.clients().get(id).await?;
    Ok(ApiJson(client.into()))
}

async fn update_client(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<ApiJson<PublicClient>, ApiError> {
    let client = state.db.clients().update(id, &input).await?;
    Ok(ApiJson(client.into()))
}

async fn delete_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;
    state.db.clients().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
