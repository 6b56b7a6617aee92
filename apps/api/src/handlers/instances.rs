use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use campusly_core::{AccountId, CallContext, ProgramId};
use campusly_domain::Role;

use crate::dto::{
    AmountResponse, InstanceStatusResponse, MemberRoleRequest, RevenueSplitResponse,
    TuitionRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::tenant_path;

pub async fn collect_tuition_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<TuitionRequest>,
) -> ApiResult<Json<RevenueSplitResponse>> {
    let gate = state.gate(tenant_path(tenant_id.as_str())?);
    let split = state
        .fee_collection
        .collect_tuition(
            &gate,
            &context,
            ProgramId::new(payload.program_id),
            payload.amount,
        )
        .await?;

    Ok(Json(RevenueSplitResponse::from(split)))
}

pub async fn collect_program_creation_fee_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<AmountResponse>> {
    let gate = state.gate(tenant_path(tenant_id.as_str())?);
    let amount = state
        .fee_collection
        .collect_program_creation_fee(&gate, &context)
        .await?;

    Ok(Json(AmountResponse { amount }))
}

pub async fn collect_certificate_fee_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<AmountResponse>> {
    let gate = state.gate(tenant_path(tenant_id.as_str())?);
    let amount = state
        .fee_collection
        .collect_certificate_fee(&gate, &context)
        .await?;

    Ok(Json(AmountResponse { amount }))
}

pub async fn grant_member_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<MemberRoleRequest>,
) -> ApiResult<StatusCode> {
    state
        .gate(tenant_path(tenant_id.as_str())?)
        .grant_member_role(
            &context,
            Role::from_transport(payload.role.as_str())?,
            AccountId::parse(payload.account.as_str())?,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_member_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<MemberRoleRequest>,
) -> ApiResult<StatusCode> {
    state
        .gate(tenant_path(tenant_id.as_str())?)
        .revoke_member_role(
            &context,
            Role::from_transport(payload.role.as_str())?,
            AccountId::parse(payload.account.as_str())?,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn recover_instance_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<InstanceStatusResponse>> {
    let status = state
        .gate(tenant_path(tenant_id.as_str())?)
        .recover(&context)
        .await?;

    Ok(Json(InstanceStatusResponse {
        status: status.as_str().to_owned(),
    }))
}

pub async fn instance_status_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<InstanceStatusResponse>> {
    let status = state
        .gate(tenant_path(tenant_id.as_str())?)
        .status()
        .await?;

    Ok(Json(InstanceStatusResponse {
        status: status.as_str().to_owned(),
    }))
}
