use super::{ApiError, ApiResult, AppState};
use crate::database::models::{
    offer_status, request_status, HelpOfferRecord, HelpRequestRecord,
};
use crate::listings::{CreateHelpOfferInput, CreateHelpRequestInput, ListingService};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetStatusBody {
    status: String,
}

pub(crate) async fn list_requests(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<HelpRequestRecord>> {
    let service = ListingService::new(state.database.clone());
    let limit = params.limit.unwrap_or(50).min(200);
    Ok(Json(service.list_requests(limit)?))
}

pub(crate) async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<HelpRequestRecord> {
    let service = ListingService::new(state.database.clone());
    match service.get_request(&id)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("request {id} not found"))),
    }
}

pub(crate) async fn create_request(
    State(state): State<AppState>,
    Json(input): Json<CreateHelpRequestInput>,
) -> ApiResult<HelpRequestRecord> {
    if input.title.trim().is_empty()
        || input.description.trim().is_empty()
        || input.contact_name.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "title, description and contact_name are required".into(),
        ));
    }
    let service = ListingService::new(state.database.clone());
    Ok(Json(service.create_request(input)?))
}

pub(crate) async fn set_request_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetStatusBody>,
) -> ApiResult<HelpRequestRecord> {
    if !request_status::ALL.contains(&body.status.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "invalid request status '{}'",
            body.status
        )));
    }
    let service = ListingService::new(state.database.clone());
    if !service.set_request_status(&id, &body.status)? {
        return Err(ApiError::NotFound(format!("request {id} not found")));
    }
    match service.get_request(&id)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("request {id} not found"))),
    }
}

pub(crate) async fn list_offers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<HelpOfferRecord>> {
    let service = ListingService::new(state.database.clone());
    let limit = params.limit.unwrap_or(50).min(200);
    Ok(Json(service.list_offers(limit)?))
}

pub(crate) async fn get_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<HelpOfferRecord> {
    let service = ListingService::new(state.database.clone());
    match service.get_offer(&id)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("offer {id} not found"))),
    }
}

pub(crate) async fn create_offer(
    State(state): State<AppState>,
    Json(input): Json<CreateHelpOfferInput>,
) -> ApiResult<HelpOfferRecord> {
    if input.name.trim().is_empty()
        || input.description.trim().is_empty()
        || input.contact_info.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "name, description and contact_info are required".into(),
        ));
    }
    let service = ListingService::new(state.database.clone());
    Ok(Json(service.create_offer(input)?))
}

pub(crate) async fn set_offer_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetStatusBody>,
) -> ApiResult<HelpOfferRecord> {
    if !offer_status::ALL.contains(&body.status.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "invalid offer status '{}'",
            body.status
        )));
    }
    let service = ListingService::new(state.database.clone());
    if !service.set_offer_status(&id, &body.status)? {
        return Err(ApiError::NotFound(format!("offer {id} not found")));
    }
    match service.get_offer(&id)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("offer {id} not found"))),
    }
}
