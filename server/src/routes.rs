use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json,
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    captcha::verify_turnstile,
    database::{
        get_coordinator, get_leader, get_neighborhood_municipality, list_coordinators,
        list_departments, list_leaders, list_municipalities, list_neighborhoods, register_voter,
    },
    error::AppError,
    models::{
        CatalogItem, CoordinatorQuery, LeaderItem, LeaderQuery, LinkResolveOut, LinkResolveQuery,
        MunicipalityQuery, NeighborhoodQuery, NewVoter, RegisterQuery, RegisterStatus,
        RegisterVoterIn, RegisterVoterOut,
    },
    state::AppState,
    utils::{get_client_ip, get_user_agent, normalize_phone, validate_length, validate_numeric},
};

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

pub async fn departments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CatalogItem>>, AppError> {
    let rows = list_departments(&state.pool).await?;

    Ok(Json(rows))
}

pub async fn municipalities_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MunicipalityQuery>,
) -> Result<Json<Vec<CatalogItem>>, AppError> {
    let rows = list_municipalities(
        &state.pool,
        query.department_id,
        query.department.as_deref(),
    )
    .await?;

    Ok(Json(rows))
}

pub async fn neighborhoods_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NeighborhoodQuery>,
) -> Result<Json<Vec<CatalogItem>>, AppError> {
    let rows = list_neighborhoods(&state.pool, query.municipality_id).await?;

    Ok(Json(rows))
}

pub async fn coordinators_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CoordinatorQuery>,
) -> Result<Json<Vec<CatalogItem>>, AppError> {
    let rows = list_coordinators(&state.pool, query.search.as_deref()).await?;

    Ok(Json(rows))
}

pub async fn leaders_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderQuery>,
) -> Result<Json<Vec<LeaderItem>>, AppError> {
    let rows = list_leaders(&state.pool, query.coordinator_id, query.search.as_deref()).await?;

    Ok(Json(rows))
}

/// Confirms a referral link's leader/coordinator pair before the form is
/// shown. Misses are answered inline, never as error statuses.
pub async fn link_resolve_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LinkResolveQuery>,
) -> Result<Json<LinkResolveOut>, AppError> {
    let Some(leader) = get_leader(&state.pool, query.leader).await? else {
        return Ok(Json(LinkResolveOut::rejected("Líder no encontrado.")));
    };

    let Some(coordinator) = get_coordinator(&state.pool, query.coord).await? else {
        return Ok(Json(LinkResolveOut::rejected("Coordinador no encontrado.")));
    };

    if leader.coordinator_id != coordinator.id {
        return Ok(Json(LinkResolveOut::rejected(
            "El líder no pertenece a este coordinador.",
        )));
    }

    Ok(Json(LinkResolveOut::confirmed(&leader, &coordinator)))
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(query): Query<RegisterQuery>,
    headers: HeaderMap,
    Json(payload): Json<RegisterVoterIn>,
) -> Result<Json<RegisterVoterOut>, AppError> {
    validate_length(&payload.document, "document", 6, 20)?;
    validate_length(&payload.first_name, "first_name", 1, 100)?;
    validate_length(&payload.last_name, "last_name", 1, 100)?;
    validate_length(&payload.address, "address", 1, 200)?;
    validate_length(&payload.phone, "phone", 7, 20)?;

    validate_numeric(&payload.document, "document")?;
    validate_numeric(&normalize_phone(&payload.phone), "phone")?;

    if !payload.consent {
        return Err(AppError::ConsentRequired);
    }

    let client_ip = get_client_ip(&headers, peer);

    verify_turnstile(&state.config, &state.http, &payload.captcha_token, &client_ip).await?;

    let municipality_id = get_neighborhood_municipality(&state.pool, payload.neighborhood_id)
        .await?
        .ok_or(AppError::UnknownNeighborhood)?;

    if municipality_id != payload.municipality_id {
        return Err(AppError::NeighborhoodMismatch);
    }

    let leader = get_leader(&state.pool, payload.leader_id)
        .await?
        .ok_or(AppError::UnknownLeader)?;

    if let Some(coordinator_id) = payload.coordinator_id {
        get_coordinator(&state.pool, coordinator_id)
            .await?
            .ok_or(AppError::UnknownCoordinator)?;

        if leader.coordinator_id != coordinator_id {
            return Err(AppError::LeaderMismatch);
        }
    }

    let voter = NewVoter {
        leader_id: payload.leader_id,
        document: payload.document,
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        address: payload.address.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        municipality_id: payload.municipality_id,
        neighborhood_id: payload.neighborhood_id,
        mode: query.mode,
        consent_at: Utc::now(),
        consent_ip: client_ip,
        consent_user_agent: get_user_agent(&headers),
    };

    let was_existing = register_voter(&state.pool, &voter)
        .await
        .map_err(AppError::SaveFailed)?;

    if was_existing {
        return Ok(Json(RegisterVoterOut {
            status: RegisterStatus::Updated,
            message: Some("Ya estabas registrado, actualizamos tu información.".to_string()),
        }));
    }

    Ok(Json(RegisterVoterOut {
        status: RegisterStatus::Created,
        message: None,
    }))
}
