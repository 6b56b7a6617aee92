use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use campusly_core::CallContext;
use campusly_domain::FeeFields;

use crate::dto::{FeeStructureRequest, FeeStructureResponse, FeeSyncResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::tenant_path;

pub async fn default_fee_structure_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<FeeStructureResponse>> {
    let structure = state.revenue_account.default_fee_structure().await?;

    Ok(Json(FeeStructureResponse::from(structure)))
}

pub async fn update_default_fee_structure_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Json(payload): Json<FeeStructureRequest>,
) -> ApiResult<Json<FeeStructureResponse>> {
    let structure = state
        .revenue_account
        .update_default_fee_structure(&context, FeeFields::from(payload))
        .await?;

    Ok(Json(FeeStructureResponse::from(structure)))
}

pub async fn fee_structure_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<FeeStructureResponse>> {
    let structure = state
        .revenue_account
        .fee_structure(tenant_path(tenant_id.as_str())?)
        .await?;

    Ok(Json(FeeStructureResponse::from(structure)))
}

pub async fn set_custom_fee_structure_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<FeeStructureRequest>,
) -> ApiResult<Json<FeeStructureResponse>> {
    let structure = state
        .revenue_account
        .set_custom_fee_structure(
            &context,
            tenant_path(tenant_id.as_str())?,
            FeeFields::from(payload),
        )
        .await?;

    Ok(Json(FeeStructureResponse::from(structure)))
}

pub async fn clear_custom_fee_structure_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
) -> ApiResult<StatusCode> {
    let removed = state
        .revenue_account
        .clear_custom_fee_structure(&context, tenant_path(tenant_id.as_str())?)
        .await?;

    Ok(if removed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}

pub async fn sync_fee_structure_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<FeeSyncResponse>> {
    let outcome = state
        .revenue_account
        .sync_fee_structure(&context, tenant_path(tenant_id.as_str())?)
        .await?;

    Ok(Json(FeeSyncResponse::from(outcome)))
}
