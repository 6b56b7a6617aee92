use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use campusly_core::CallContext;
use campusly_domain::RoleScope;

use crate::dto::{RoleGrantRequest, RoleGrantResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::account_path;

pub async fn grant_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Json(payload): Json<RoleGrantRequest>,
) -> ApiResult<StatusCode> {
    let (role, account, scope) = payload.parse()?;

    match scope {
        RoleScope::Global => {
            state
                .role_registry
                .grant_global(&context, role, account)
                .await?
        }
        RoleScope::Tenant(_) => {
            state
                .role_registry
                .grant_scoped(&context, role, account, scope)
                .await?
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_role_handler(
    State(state): State<AppState>,
    Extension(context): Extension<CallContext>,
    Json(payload): Json<RoleGrantRequest>,
) -> ApiResult<StatusCode> {
    let (role, account, scope) = payload.parse()?;

    match scope {
        RoleScope::Global => {
            state
                .role_registry
                .revoke_global(&context, role, account)
                .await?
        }
        RoleScope::Tenant(_) => {
            state
                .role_registry
                .revoke_scoped(&context, role, account, scope)
                .await?
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_role_grants_handler(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> ApiResult<Json<Vec<RoleGrantResponse>>> {
    let grants = state
        .role_registry
        .list_grants(account_path(account.as_str())?)
        .await?
        .into_iter()
        .map(RoleGrantResponse::from)
        .collect();

    Ok(Json(grants))
}
