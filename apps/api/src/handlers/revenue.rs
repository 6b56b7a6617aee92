use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use campusly_application::PaymentInput;
use campusly_core::{AccountId, CallContext, ProgramId};
use campusly_domain::FixedFeeKind;

use crate::dto::{
    AmountResponse, FixedFeeRequest, PaymentRequest, RevenueLedgerResponse, RevenueSplitResponse,
    RevenueWithdrawalRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::tenant_path;

pub async fn process_payment_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<PaymentRequest>,
) -> ApiResult<Json<RevenueSplitResponse>> {
    let payer = match payload.payer.as_deref() {
        Some(payer) => AccountId::parse(payer)?,
        None => context.caller(),
    };

    let split = state
        .revenue_account
        .process_payment(
            &context,
            PaymentInput {
                tenant_id: tenant_path(tenant_id.as_str())?,
                payer,
                program_id: ProgramId::new(payload.program_id),
                amount: payload.amount,
            },
        )
        .await?;

    Ok(Json(RevenueSplitResponse::from(split)))
}

pub async fn issue_fixed_fee_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<FixedFeeRequest>,
) -> ApiResult<Json<AmountResponse>> {
    let kind = FixedFeeKind::from_str(payload.kind.trim())?;
    let amount = state
        .revenue_account
        .issue_fixed_fee(&context, tenant_path(tenant_id.as_str())?, kind)
        .await?;

    Ok(Json(AmountResponse { amount }))
}

pub async fn withdraw_revenue_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<RevenueWithdrawalRequest>,
) -> ApiResult<Json<AmountResponse>> {
    let amount = state
        .revenue_account
        .withdraw(
            &context,
            tenant_path(tenant_id.as_str())?,
            AccountId::parse(payload.recipient.as_str())?,
        )
        .await?;

    Ok(Json(AmountResponse { amount }))
}

pub async fn revenue_ledger_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<RevenueLedgerResponse>> {
    let ledger = state
        .revenue_account
        .ledger(tenant_path(tenant_id.as_str())?)
        .await?;

    Ok(Json(RevenueLedgerResponse::from(ledger)))
}
