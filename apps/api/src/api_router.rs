use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use campusly_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

use cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let caller_routes = Router::new()
        .route("/api/roles/grants", post(handlers::roles::grant_role_handler))
        .route(
            "/api/roles/revocations",
            post(handlers::roles::revoke_role_handler),
        )
        .route(
            "/api/tenants",
            get(handlers::tenants::list_tenants_handler)
                .post(handlers::tenants::provision_tenant_handler),
        )
        .route(
            "/api/tenants/{organization_admin}/renewal",
            post(handlers::tenants::renew_tenant_handler),
        )
        .route(
            "/api/tenants/{organization_admin}/deactivation",
            post(handlers::tenants::deactivate_tenant_handler),
        )
        .route(
            "/api/platform/withdrawals",
            post(handlers::tenants::withdraw_platform_fees_handler),
        )
        .route(
            "/api/fee-structures/default",
            put(handlers::fees::update_default_fee_structure_handler),
        )
        .route(
            "/api/fee-structures/{tenant_id}",
            put(handlers::fees::set_custom_fee_structure_handler)
                .delete(handlers::fees::clear_custom_fee_structure_handler),
        )
        .route(
            "/api/fee-structures/{tenant_id}/sync",
            post(handlers::fees::sync_fee_structure_handler),
        )
        .route(
            "/api/revenue/{tenant_id}/payments",
            post(handlers::revenue::process_payment_handler),
        )
        .route(
            "/api/revenue/{tenant_id}/fixed-fees",
            post(handlers::revenue::issue_fixed_fee_handler),
        )
        .route(
            "/api/revenue/{tenant_id}/withdrawals",
            post(handlers::revenue::withdraw_revenue_handler),
        )
        .route(
            "/api/instances/{tenant_id}/tuition",
            post(handlers::instances::collect_tuition_handler),
        )
        .route(
            "/api/instances/{tenant_id}/program-creation-fee",
            post(handlers::instances::collect_program_creation_fee_handler),
        )
        .route(
            "/api/instances/{tenant_id}/certificate-fee",
            post(handlers::instances::collect_certificate_fee_handler),
        )
        .route(
            "/api/instances/{tenant_id}/members",
            post(handlers::instances::grant_member_role_handler),
        )
        .route(
            "/api/instances/{tenant_id}/members/revocations",
            post(handlers::instances::revoke_member_role_handler),
        )
        .route(
            "/api/instances/{tenant_id}/recovery",
            post(handlers::instances::recover_instance_handler),
        )
        .route_layer(from_fn(middleware::require_caller));

    let read_routes = Router::new()
        .route(
            "/api/roles/{account}",
            get(handlers::roles::list_role_grants_handler),
        )
        .route(
            "/api/tenants/{organization_admin}",
            get(handlers::tenants::tenant_handler),
        )
        .route(
            "/api/tenants/{organization_admin}/subscription",
            get(handlers::tenants::subscription_status_handler),
        )
        .route(
            "/api/platform/balance",
            get(handlers::tenants::platform_balance_handler),
        )
        .route(
            "/api/fee-structures/default",
            get(handlers::fees::default_fee_structure_handler),
        )
        .route(
            "/api/fee-structures/{tenant_id}",
            get(handlers::fees::fee_structure_handler),
        )
        .route(
            "/api/revenue/{tenant_id}/ledger",
            get(handlers::revenue::revenue_ledger_handler),
        )
        .route(
            "/api/instances/{tenant_id}/status",
            get(handlers::instances::instance_status_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(read_routes)
        .merge(caller_routes)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
