use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use campusly_core::{AccountId, AppError, CallContext};
use campusly_domain::DeploymentConfig;

use crate::dto::{
    AmountResponse, PlatformBalanceResponse, PlatformWithdrawalRequest, ProvisionTenantRequest,
    SubscriptionStatusResponse, TenantResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::account_path;

pub async fn provision_tenant_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Json(payload): Json<ProvisionTenantRequest>,
) -> ApiResult<(StatusCode, Json<TenantResponse>)> {
    let organization_admin = AccountId::parse(payload.organization_admin.as_str())?;
    let config = payload
        .config
        .map(DeploymentConfig::try_from)
        .transpose()?;
    let record = state
        .tenant_factory
        .provision(&context, organization_admin, config)
        .await?;

    Ok((StatusCode::CREATED, Json(TenantResponse::from(record))))
}

pub async fn list_tenants_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
) -> ApiResult<Json<Vec<TenantResponse>>> {
    let tenants = state
        .tenant_factory
        .list_tenants(&context)
        .await?
        .into_iter()
        .map(TenantResponse::from)
        .collect();

    Ok(Json(tenants))
}

pub async fn tenant_handler(
    State(state): State<AppState>,
    Path(organization_admin): Path<String>,
) -> ApiResult<Json<TenantResponse>> {
    let organization_admin = account_path(organization_admin.as_str())?;
    let record = match state.tenant_factory.tenant_for(organization_admin).await? {
        Some(tenant_id) => state.tenant_factory.tenant_record(tenant_id).await?,
        None => None,
    }
    .ok_or_else(|| {
        AppError::Conflict(format!(
            "organization admin '{organization_admin}' owns no tenant"
        ))
    })?;

    Ok(Json(TenantResponse::from(record)))
}

pub async fn renew_tenant_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(organization_admin): Path<String>,
) -> ApiResult<Json<TenantResponse>> {
    let record = state
        .tenant_factory
        .renew(&context, account_path(organization_admin.as_str())?)
        .await?;

    Ok(Json(TenantResponse::from(record)))
}

pub async fn deactivate_tenant_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(organization_admin): Path<String>,
) -> ApiResult<Json<TenantResponse>> {
    let record = state
        .tenant_factory
        .deactivate(&context, account_path(organization_admin.as_str())?)
        .await?;

    Ok(Json(TenantResponse::from(record)))
}

pub async fn subscription_status_handler(
    State(state): State<AppState>,
    Path(organization_admin): Path<String>,
) -> ApiResult<Json<SubscriptionStatusResponse>> {
    let status = state
        .tenant_factory
        .subscription_status(account_path(organization_admin.as_str())?)
        .await?;

    Ok(Json(SubscriptionStatusResponse::from(status)))
}

pub async fn platform_balance_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<PlatformBalanceResponse>> {
    let balance = state.tenant_factory.platform_balance().await?;

    Ok(Json(PlatformBalanceResponse { balance }))
}

pub async fn withdraw_platform_fees_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Json(payload): Json<PlatformWithdrawalRequest>,
) -> ApiResult<Json<AmountResponse>> {
    let recipient = AccountId::parse(payload.recipient.as_str())?;
    state
        .tenant_factory
        .withdraw_platform_fees(&context, recipient, payload.amount)
        .await?;

    Ok(Json(AmountResponse {
        amount: payload.amount,
    }))
}
