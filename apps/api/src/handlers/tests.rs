use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use campusly_core::{AccountId, AppError, CallContext, TenantId};

use crate::api_config::ApiConfig;
use crate::api_services::build_test_state;
use crate::dto::{
    DeploymentConfigRequest, FeeStructureRequest, FixedFeeRequest, MemberRoleRequest,
    PlatformWithdrawalRequest, ProvisionTenantRequest, RevenueWithdrawalRequest, RoleGrantRequest,
    TuitionRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

use super::{fees, instances, revenue, roles, tenants};

struct Platform {
    state: AppState,
    master: AccountId,
}

impl Platform {
    async fn new() -> Self {
        let master = AccountId::new();
        let config = ApiConfig::in_memory(master, AccountId::new())
            .unwrap_or_else(|error| panic!("invalid test config: {error}"));

        Self {
            state: build_test_state(&config).await,
            master,
        }
    }

    async fn provision(&self, organization_admin: AccountId) -> TenantId {
        let (status, Json(tenant)) = tenants::provision_tenant_handler(
            State(self.state.clone()),
            Extension(CallContext::new(organization_admin, 500)),
            Json(ProvisionTenantRequest {
                organization_admin: organization_admin.to_string(),
                config: None,
            }),
        )
        .await
        .unwrap_or_else(|ApiError(error)| panic!("provisioning failed: {error}"));

        assert_eq!(status, StatusCode::CREATED);
        assert!(tenant.deployed && tenant.active);
        TenantId::parse(tenant.tenant_id.as_str())
            .unwrap_or_else(|error| panic!("invalid tenant id: {error}"))
    }

    async fn member(
        &self,
        tenant_id: TenantId,
        organization_admin: AccountId,
        role: &str,
    ) -> AccountId {
        let member = AccountId::new();
        let status = instances::grant_member_role_handler(
            State(self.state.clone()),
            Extension(CallContext::unpaid(organization_admin)),
            Path(tenant_id.to_string()),
            Json(MemberRoleRequest {
                role: role.to_owned(),
                account: member.to_string(),
            }),
        )
        .await
        .unwrap_or_else(|ApiError(error)| panic!("member grant failed: {error}"));

        assert_eq!(status, StatusCode::NO_CONTENT);
        member
    }
}

#[tokio::test]
async fn tuition_flows_into_ledger_and_treasury() {
    let platform = Platform::new().await;
    let organization_admin = AccountId::new();
    let tenant_id = platform.provision(organization_admin).await;
    let student = platform
        .member(tenant_id, organization_admin, "student")
        .await;

    let Json(split) = instances::collect_tuition_handler(
        State(platform.state.clone()),
        Extension(CallContext::new(student, 1_000)),
        Path(tenant_id.to_string()),
        Json(TuitionRequest {
            program_id: 7,
            amount: 1_000,
        }),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("tuition refused: {error}"));
    assert_eq!((split.platform_share, split.tenant_share), (200, 800));

    let Json(ledger) =
        revenue::revenue_ledger_handler(State(platform.state.clone()), Path(tenant_id.to_string()))
            .await
            .unwrap_or_else(|ApiError(error)| panic!("ledger unavailable: {error}"));
    assert_eq!(ledger.total_revenue, 1_000);
    assert_eq!(ledger.tenant_share_accrued, 800);
    assert_eq!(ledger.programs.len(), 1);
    assert_eq!(ledger.programs[0].program_id, 7);

    let Json(balance) = tenants::platform_balance_handler(State(platform.state.clone()))
        .await
        .unwrap_or_else(|ApiError(error)| panic!("balance unavailable: {error}"));
    assert_eq!(balance.balance, 700);
}

#[tokio::test]
async fn organization_admin_withdraws_the_tenant_share() {
    let platform = Platform::new().await;
    let organization_admin = AccountId::new();
    let tenant_id = platform.provision(organization_admin).await;
    let student = platform
        .member(tenant_id, organization_admin, "student")
        .await;

    instances::collect_tuition_handler(
        State(platform.state.clone()),
        Extension(CallContext::new(student, 500)),
        Path(tenant_id.to_string()),
        Json(TuitionRequest {
            program_id: 1,
            amount: 500,
        }),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("tuition refused: {error}"));

    let Json(withdrawn) = revenue::withdraw_revenue_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(organization_admin)),
        Path(tenant_id.to_string()),
        Json(RevenueWithdrawalRequest {
            recipient: organization_admin.to_string(),
        }),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("withdrawal refused: {error}"));
    assert_eq!(withdrawn.amount, 400);

    let again = revenue::withdraw_revenue_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(organization_admin)),
        Path(tenant_id.to_string()),
        Json(RevenueWithdrawalRequest {
            recipient: organization_admin.to_string(),
        }),
    )
    .await;
    assert!(again.is_err());
}

#[tokio::test]
async fn underpaid_provisioning_is_a_payment_error() {
    let platform = Platform::new().await;
    let organization_admin = AccountId::new();

    let result = tenants::provision_tenant_handler(
        State(platform.state.clone()),
        Extension(CallContext::new(organization_admin, 499)),
        Json(ProvisionTenantRequest {
            organization_admin: organization_admin.to_string(),
            config: None,
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError(AppError::Payment(_)))));
}

#[tokio::test]
async fn overflowing_subscription_duration_is_a_validation_error() {
    let platform = Platform::new().await;
    let organization_admin = AccountId::new();

    let result = tenants::provision_tenant_handler(
        State(platform.state.clone()),
        Extension(CallContext::new(organization_admin, 500)),
        Json(ProvisionTenantRequest {
            organization_admin: organization_admin.to_string(),
            config: Some(DeploymentConfigRequest {
                program_creation_fee: 50,
                subscription_fee: 500,
                certificate_fee: 20,
                revenue_share_percent: 20,
                subscription_duration_days: i64::MAX,
            }),
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError(AppError::Validation(_)))));
    assert_eq!(
        platform
            .state
            .tenant_factory
            .tenant_for(organization_admin)
            .await,
        Ok(None)
    );
}

#[tokio::test]
async fn only_the_master_grants_global_roles() {
    let platform = Platform::new().await;
    let operator = AccountId::new();
    let request = || {
        Json(RoleGrantRequest {
            role: "admin".to_owned(),
            account: operator.to_string(),
            tenant_id: None,
        })
    };

    let by_stranger = roles::grant_role_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(AccountId::new())),
        request(),
    )
    .await;
    assert!(matches!(by_stranger, Err(ApiError(AppError::Forbidden(_)))));

    let by_master = roles::grant_role_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(platform.master)),
        request(),
    )
    .await;
    assert!(matches!(by_master, Ok(StatusCode::NO_CONTENT)));

    let Json(grants) =
        roles::list_role_grants_handler(State(platform.state.clone()), Path(operator.to_string()))
            .await
            .unwrap_or_else(|ApiError(error)| panic!("grants unavailable: {error}"));
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].role, "admin");
    assert_eq!(grants[0].tenant_id, None);
}

#[tokio::test]
async fn custom_fees_apply_to_fixed_fee_collection() {
    let platform = Platform::new().await;
    let organization_admin = AccountId::new();
    let tenant_id = platform.provision(organization_admin).await;
    let teacher = platform
        .member(tenant_id, organization_admin, "teacher")
        .await;

    let Json(custom) = fees::set_custom_fee_structure_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(platform.master)),
        Path(tenant_id.to_string()),
        Json(FeeStructureRequest {
            program_creation_fee: 80,
            subscription_fee: 400,
            certificate_fee: 35,
            revenue_share_percent: 10,
        }),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("custom fees refused: {error}"));
    assert!(custom.is_custom);

    let Json(collected) = instances::collect_certificate_fee_handler(
        State(platform.state.clone()),
        Extension(CallContext::new(teacher, 35)),
        Path(tenant_id.to_string()),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("certificate fee refused: {error}"));
    assert_eq!(collected.amount, 35);

    let cleared = fees::clear_custom_fee_structure_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(platform.master)),
        Path(tenant_id.to_string()),
    )
    .await;
    assert!(matches!(cleared, Ok(StatusCode::NO_CONTENT)));

    let Json(resolved) =
        fees::fee_structure_handler(State(platform.state.clone()), Path(tenant_id.to_string()))
            .await
            .unwrap_or_else(|ApiError(error)| panic!("fees unavailable: {error}"));
    assert!(!resolved.is_custom);
    assert_eq!(resolved.certificate_fee, 20);
}

#[tokio::test]
async fn fixed_fee_kind_must_be_known() {
    let platform = Platform::new().await;
    let organization_admin = AccountId::new();
    let tenant_id = platform.provision(organization_admin).await;

    let result = revenue::issue_fixed_fee_handler(
        State(platform.state.clone()),
        Extension(CallContext::new(tenant_id.as_account(), 20)),
        Path(tenant_id.to_string()),
        Json(FixedFeeRequest {
            kind: "donation".to_owned(),
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError(AppError::Validation(_)))));
}

#[tokio::test]
async fn recovered_instance_refuses_collections() {
    let platform = Platform::new().await;
    let organization_admin = AccountId::new();
    let tenant_id = platform.provision(organization_admin).await;
    let student = platform
        .member(tenant_id, organization_admin, "student")
        .await;

    let Json(recovered) = instances::recover_instance_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(organization_admin)),
        Path(tenant_id.to_string()),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("recovery refused: {error}"));
    assert_eq!(recovered.status, "recovered");

    let tuition = instances::collect_tuition_handler(
        State(platform.state.clone()),
        Extension(CallContext::new(student, 100)),
        Path(tenant_id.to_string()),
        Json(TuitionRequest {
            program_id: 1,
            amount: 100,
        }),
    )
    .await;
    assert!(matches!(tuition, Err(ApiError(AppError::Conflict(_)))));
}

#[tokio::test]
async fn deactivated_tenant_reports_its_subscription_state() {
    let platform = Platform::new().await;
    let organization_admin = AccountId::new();
    platform.provision(organization_admin).await;

    let Json(deactivated) = tenants::deactivate_tenant_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(platform.master)),
        Path(organization_admin.to_string()),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("deactivation refused: {error}"));
    assert!(!deactivated.active);

    let Json(status) = tenants::subscription_status_handler(
        State(platform.state.clone()),
        Path(organization_admin.to_string()),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("status unavailable: {error}"));
    assert_eq!(status.status, "deactivated");
}

#[tokio::test]
async fn platform_withdrawal_is_bounded_by_the_treasury() {
    let platform = Platform::new().await;
    platform.provision(AccountId::new()).await;
    let recipient = AccountId::new();

    let too_much = tenants::withdraw_platform_fees_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(platform.master)),
        Json(PlatformWithdrawalRequest {
            recipient: recipient.to_string(),
            amount: 501,
        }),
    )
    .await;
    assert!(too_much.is_err());

    let Json(withdrawn) = tenants::withdraw_platform_fees_handler(
        State(platform.state.clone()),
        Extension(CallContext::unpaid(platform.master)),
        Json(PlatformWithdrawalRequest {
            recipient: recipient.to_string(),
            amount: 500,
        }),
    )
    .await
    .unwrap_or_else(|ApiError(error)| panic!("withdrawal refused: {error}"));
    assert_eq!(withdrawn.amount, 500);
}
