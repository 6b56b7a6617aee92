use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use campusly_core::{AccountId, AppError, AppResult, CallContext};

use crate::error::ApiResult;

/// Header naming the account a request acts as.
pub const ACCOUNT_HEADER: &str = "x-campusly-account";
/// Header carrying the value attached to a request.
pub const ATTACHED_VALUE_HEADER: &str = "x-campusly-attached-value";

pub async fn require_caller(mut request: Request, next: Next) -> ApiResult<Response> {
    let context = call_context_from_headers(request.headers())?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

pub(crate) fn call_context_from_headers(headers: &HeaderMap) -> AppResult<CallContext> {
    let account = headers
        .get(ACCOUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("{ACCOUNT_HEADER} header is required")))?;
    let caller = AccountId::parse(account)
        .map_err(|error| AppError::Unauthorized(format!("invalid caller: {error}")))?;
    if caller.is_nil() {
        return Err(AppError::Unauthorized(
            "the null identity cannot call the api".to_owned(),
        ));
    }

    let attached_value = match headers.get(ATTACHED_VALUE_HEADER) {
        None => 0,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "{ATTACHED_VALUE_HEADER} must be a non-negative integer"
                ))
            })?,
    };

    Ok(CallContext::new(caller, attached_value))
}
