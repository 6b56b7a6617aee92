use std::sync::atomic::Ordering;

use campusly_core::{AccountId, AppError, CallContext, TenantId};
use campusly_domain::{
    AuditAction, DeploymentConfig, FeeFields, Role, RoleScope, SubscriptionStatus,
};
use chrono::Duration;

use crate::InstanceKind;
use crate::test_fakes::{Harness, epoch};

fn config(revenue_share_percent: u8) -> DeploymentConfig {
    DeploymentConfig {
        program_creation_fee: 40,
        subscription_fee: 400,
        certificate_fee: 15,
        revenue_share_percent,
        subscription_duration: Duration::days(60),
    }
}

fn paying(account: AccountId, value: u64) -> CallContext {
    CallContext::new(account, value)
}

/// Asserts that nothing a provisioning attempt creates is left behind.
async fn assert_no_partial_provisioning(harness: &Harness, organization_admin: AccountId) {
    assert!(harness.tenants.records.lock().await.is_empty());
    assert!(harness.instances.live.lock().await.is_empty());
    assert!(harness.profiles.active.lock().await.is_empty());
    assert!(harness.fee_schedules.custom.lock().await.is_empty());
    assert_eq!(harness.factory.platform_balance().await, Ok(0));
    assert_eq!(
        harness.factory.tenant_for(organization_admin).await,
        Ok(None)
    );

    let tenant_grants = harness
        .roles
        .grants
        .lock()
        .await
        .iter()
        .filter(|grant| !grant.scope.is_global())
        .count();
    assert_eq!(tenant_grants, 0);
    assert!(
        !harness
            .audit
            .events
            .lock()
            .await
            .iter()
            .any(|event| event.action == AuditAction::TenantProvisioned)
    );
}

#[tokio::test]
async fn provision_wires_instances_grants_roles_and_records_subscription() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();

    let record = harness.provision(organization_admin).await;
    let tenant_id = record.tenant_id();
    let scope = RoleScope::Tenant(tenant_id);

    assert!(record.active());
    assert!(record.deployed());
    assert_eq!(record.subscription_end(), epoch() + Duration::days(30));
    assert_eq!(
        harness.factory.tenant_for(organization_admin).await,
        Ok(Some(tenant_id))
    );

    let live = harness.instances.live.lock().await.clone();
    assert_eq!(live.len(), InstanceKind::ALL.len());
    let root = live
        .iter()
        .find(|instance| instance.kind == InstanceKind::TenantRoot)
        .copied()
        .unwrap_or_else(|| panic!("tenant root was not cloned"));
    assert_eq!(root.address, tenant_id.as_account());

    let initialized = harness.instances.initialized.lock().await.clone();
    assert_eq!(initialized.len(), live.len());
    assert!(
        initialized
            .iter()
            .all(|(_, wiring)| *wiring == harness.settings.service_wiring)
    );
    assert_eq!(
        *harness.instances.local_grants.lock().await,
        vec![(root, Role::Admin, organization_admin)]
    );

    let registry = &harness.role_registry;
    assert_eq!(
        registry
            .check(Role::Tenant, tenant_id.as_account(), scope)
            .await,
        Ok(true)
    );
    assert_eq!(
        registry.check(Role::Admin, organization_admin, scope).await,
        Ok(true)
    );
    assert_eq!(
        registry
            .check(Role::Admin, organization_admin, RoleScope::Tenant(TenantId::new()))
            .await,
        Ok(false)
    );

    assert!(harness.profiles.active.lock().await.contains(&tenant_id));
    assert_eq!(harness.factory.platform_balance().await, Ok(500));
    assert!(
        harness
            .audit
            .events
            .lock()
            .await
            .iter()
            .any(|event| event.action == AuditAction::TenantProvisioned)
    );
}

#[tokio::test]
async fn provisioning_twice_conflicts_regardless_of_config() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    let first = harness.provision(organization_admin).await;

    for requested in [None, Some(config(20)), Some(config(101))] {
        let result = harness
            .factory
            .provision(&paying(organization_admin, 500), organization_admin, requested)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    let records = harness.tenants.records.lock().await;
    assert_eq!(records.len(), 1);
    assert_eq!(
        records
            .get(&organization_admin)
            .map(|record| record.tenant_id()),
        Some(first.tenant_id())
    );
}

#[tokio::test]
async fn program_and_null_identities_cannot_own_tenants() {
    let harness = Harness::new().await;
    let program = AccountId::new();
    harness.accounts.programs.lock().await.insert(program);

    let by_program = harness
        .factory
        .provision(&paying(program, 500), program, None)
        .await;
    let by_null = harness
        .factory
        .provision(&paying(AccountId::new(), 500), AccountId::NIL, None)
        .await;

    assert!(matches!(by_program, Err(AppError::Validation(_))));
    assert!(matches!(by_null, Err(AppError::Validation(_))));
    assert_no_partial_provisioning(&harness, program).await;
}

#[tokio::test]
async fn payment_below_default_subscription_fee_is_rejected() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();

    let result = harness
        .factory
        .provision(&paying(organization_admin, 499), organization_admin, None)
        .await;

    assert!(matches!(result, Err(AppError::Payment(_))));
    assert_no_partial_provisioning(&harness, organization_admin).await;
}

#[tokio::test]
async fn provisioning_charges_the_stored_default_subscription_fee() {
    let harness = Harness::new().await;
    let raised = FeeFields {
        subscription_fee: 5_000,
        ..harness.settings.default_fees
    };
    harness
        .revenue_account
        .update_default_fee_structure(&harness.master(), raised)
        .await
        .unwrap_or_else(|error| panic!("default update failed: {error}"));
    let organization_admin = AccountId::new();

    let stale_price = harness
        .factory
        .provision(&paying(organization_admin, 500), organization_admin, None)
        .await;
    assert!(matches!(stale_price, Err(AppError::Payment(_))));
    assert_no_partial_provisioning(&harness, organization_admin).await;

    let record = harness
        .factory
        .provision(&paying(organization_admin, 5_000), organization_admin, None)
        .await
        .unwrap_or_else(|error| panic!("provisioning failed: {error}"));
    let renewed = harness
        .factory
        .renew(&paying(organization_admin, 5_000), organization_admin)
        .await;
    assert!(renewed.is_ok_and(|renewed| renewed.tenant_id() == record.tenant_id()));
}

#[tokio::test]
async fn out_of_bounds_config_is_rejected_before_any_side_effect() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    let too_short = DeploymentConfig {
        subscription_duration: Duration::days(7),
        ..config(20)
    };

    for requested in [config(101), too_short] {
        let result = harness
            .factory
            .provision(
                &paying(organization_admin, 500),
                organization_admin,
                Some(requested),
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    assert_no_partial_provisioning(&harness, organization_admin).await;
}

#[tokio::test]
async fn supplied_config_sets_custom_fees_and_duration() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();

    let record = harness
        .factory
        .provision(
            &paying(organization_admin, 500),
            organization_admin,
            Some(config(30)),
        )
        .await
        .unwrap_or_else(|error| panic!("provisioning failed: {error}"));

    assert_eq!(record.subscription_end(), epoch() + Duration::days(60));
    let structure = harness
        .revenue_account
        .fee_structure(record.tenant_id())
        .await
        .unwrap_or_else(|error| panic!("fee read failed: {error}"));
    assert!(structure.is_custom());
    assert_eq!(structure.revenue_share_percent(), 30);
    assert_eq!(structure.subscription_fee(), 400);
}

#[tokio::test]
async fn full_revenue_share_passes_validation_but_rolls_back_on_fee_push() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();

    let result = harness
        .factory
        .provision(
            &paying(organization_admin, 500),
            organization_admin,
            Some(config(100)),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_no_partial_provisioning(&harness, organization_admin).await;
}

#[tokio::test]
async fn failed_profile_activation_rolls_back_everything() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    harness.profiles.fail_activate.store(true, Ordering::SeqCst);

    let result = harness
        .factory
        .provision(
            &paying(organization_admin, 500),
            organization_admin,
            Some(config(20)),
        )
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_no_partial_provisioning(&harness, organization_admin).await;
}

#[tokio::test]
async fn failed_instance_initialization_rolls_back_cloned_instances() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    *harness.instances.fail_initialize.lock().await = Some(InstanceKind::CertificateIssuer);

    let result = harness
        .factory
        .provision(&paying(organization_admin, 500), organization_admin, None)
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_no_partial_provisioning(&harness, organization_admin).await;
}

#[tokio::test]
async fn failed_record_commit_rolls_back_payment_and_activation() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    harness.tenants.fail_insert.store(true, Ordering::SeqCst);

    let result = harness
        .factory
        .provision(
            &paying(organization_admin, 750),
            organization_admin,
            Some(config(20)),
        )
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_no_partial_provisioning(&harness, organization_admin).await;
}

#[tokio::test]
async fn on_time_renewals_each_add_exactly_one_period() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    let record = harness.provision(organization_admin).await;
    let mut expected_end = record.subscription_end();

    for _ in 0..3 {
        harness.clock.advance(Duration::days(5));
        let renewed = harness
            .factory
            .renew(&paying(organization_admin, 500), organization_admin)
            .await
            .unwrap_or_else(|error| panic!("renewal failed: {error}"));
        expected_end += Duration::days(30);
        assert_eq!(renewed.subscription_end(), expected_end);
    }

    assert_eq!(harness.factory.platform_balance().await, Ok(2_000));
}

#[tokio::test]
async fn renewal_one_second_inside_grace_keeps_prior_end() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    let record = harness.provision(organization_admin).await;
    let prior_end = record.subscription_end();

    harness
        .clock
        .set(prior_end + Duration::days(3) - Duration::seconds(1));
    let renewed = harness
        .factory
        .renew(&paying(organization_admin, 500), organization_admin)
        .await;

    assert_eq!(
        renewed.map(|record| record.subscription_end()),
        Ok(prior_end + Duration::days(30))
    );
}

#[tokio::test]
async fn renewal_one_second_past_grace_starts_from_now() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    let record = harness.provision(organization_admin).await;
    let now = record.subscription_end() + Duration::days(3) + Duration::seconds(1);

    harness.clock.set(now);
    let renewed = harness
        .factory
        .renew(&paying(organization_admin, 500), organization_admin)
        .await;

    assert_eq!(
        renewed.map(|record| record.subscription_end()),
        Ok(now + Duration::days(30))
    );
}

#[tokio::test]
async fn renewal_on_day_thirty_two_and_day_forty() {
    for (renew_day, expected_end_day) in [(32, 60), (40, 70)] {
        let harness = Harness::new().await;
        let organization_admin = AccountId::new();
        harness.provision(organization_admin).await;

        harness.clock.set(epoch() + Duration::days(renew_day));
        let renewed = harness
            .factory
            .renew(&paying(organization_admin, 500), organization_admin)
            .await;

        assert_eq!(
            renewed.map(|record| record.subscription_end()),
            Ok(epoch() + Duration::days(expected_end_day)),
            "renewal on day {renew_day}"
        );
    }
}

#[tokio::test]
async fn renewal_charges_resolved_subscription_fee() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    harness
        .factory
        .provision(
            &paying(organization_admin, 500),
            organization_admin,
            Some(config(20)),
        )
        .await
        .unwrap_or_else(|error| panic!("provisioning failed: {error}"));

    let short = harness
        .factory
        .renew(&paying(organization_admin, 399), organization_admin)
        .await;
    let exact = harness
        .factory
        .renew(&paying(organization_admin, 400), organization_admin)
        .await;

    assert!(matches!(short, Err(AppError::Payment(_))));
    assert!(exact.is_ok());
}

#[tokio::test]
async fn renewal_needs_an_active_record() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();

    let missing = harness
        .factory
        .renew(&paying(organization_admin, 500), organization_admin)
        .await;
    assert!(matches!(missing, Err(AppError::Conflict(_))));

    harness.provision(organization_admin).await;
    harness
        .factory
        .deactivate(&harness.master(), organization_admin)
        .await
        .unwrap_or_else(|error| panic!("deactivation failed: {error}"));
    let deactivated = harness
        .factory
        .renew(&paying(organization_admin, 500), organization_admin)
        .await;
    assert!(matches!(deactivated, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn deactivation_is_admin_only_terminal_and_keeps_roles() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    let record = harness.provision(organization_admin).await;
    let scope = RoleScope::Tenant(record.tenant_id());

    let by_tenant_admin = harness
        .factory
        .deactivate(&CallContext::unpaid(organization_admin), organization_admin)
        .await;
    assert!(matches!(by_tenant_admin, Err(AppError::Forbidden(_))));

    let deactivated = harness
        .factory
        .deactivate(&harness.master(), organization_admin)
        .await;
    assert!(deactivated.is_ok_and(|record| !record.active()));

    let again = harness
        .factory
        .deactivate(&harness.master(), organization_admin)
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    assert_eq!(
        harness
            .role_registry
            .check(Role::Admin, organization_admin, scope)
            .await,
        Ok(true)
    );
    assert_eq!(
        harness.factory.subscription_status(organization_admin).await,
        Ok(SubscriptionStatus::Deactivated)
    );
}

#[tokio::test]
async fn subscription_status_follows_the_clock() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    let record = harness.provision(organization_admin).await;
    let end = record.subscription_end();

    let cases = [
        (Duration::zero(), SubscriptionStatus::Active),
        (Duration::days(3), SubscriptionStatus::InGrace),
        (
            Duration::days(3) + Duration::seconds(1),
            SubscriptionStatus::Expired,
        ),
    ];

    for (offset, expected) in cases {
        harness.clock.set(end + offset);
        assert_eq!(
            harness.factory.subscription_status(organization_admin).await,
            Ok(expected)
        );
    }
}

#[tokio::test]
async fn platform_fee_withdrawal_debits_before_transfer() {
    let harness = Harness::new().await;
    harness.provision(AccountId::new()).await;
    let recipient = AccountId::new();

    let result = harness
        .factory
        .withdraw_platform_fees(&harness.master(), recipient, 300)
        .await;

    assert_eq!(result, Ok(200));
    assert_eq!(harness.factory.platform_balance().await, Ok(200));
    assert_eq!(*harness.transfers.transfers.lock().await, vec![(recipient, 300)]);
}

#[tokio::test]
async fn platform_fee_withdrawal_rejects_bad_requests() {
    let harness = Harness::new().await;
    harness.provision(AccountId::new()).await;
    let recipient = AccountId::new();

    let stranger = harness
        .factory
        .withdraw_platform_fees(&CallContext::unpaid(AccountId::new()), recipient, 10)
        .await;
    let too_much = harness
        .factory
        .withdraw_platform_fees(&harness.master(), recipient, 501)
        .await;
    let zero = harness
        .factory
        .withdraw_platform_fees(&harness.master(), recipient, 0)
        .await;
    let null_recipient = harness
        .factory
        .withdraw_platform_fees(&harness.master(), AccountId::NIL, 10)
        .await;

    assert!(matches!(stranger, Err(AppError::Forbidden(_))));
    assert!(matches!(too_much, Err(AppError::Validation(_))));
    assert!(matches!(zero, Err(AppError::Validation(_))));
    assert!(matches!(null_recipient, Err(AppError::Validation(_))));
    assert_eq!(harness.factory.platform_balance().await, Ok(500));
}

#[tokio::test]
async fn failed_platform_transfer_restores_treasury() {
    let harness = Harness::new().await;
    harness.provision(AccountId::new()).await;
    harness.transfers.fail.store(true, Ordering::SeqCst);

    let result = harness
        .factory
        .withdraw_platform_fees(&harness.master(), AccountId::new(), 300)
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert_eq!(harness.factory.platform_balance().await, Ok(500));
}

#[tokio::test]
async fn listing_tenants_requires_platform_admin() {
    let harness = Harness::new().await;
    let organization_admin = AccountId::new();
    harness.provision(organization_admin).await;

    let by_master = harness.factory.list_tenants(&harness.master()).await;
    let by_tenant_admin = harness
        .factory
        .list_tenants(&CallContext::unpaid(organization_admin))
        .await;

    assert!(by_master.is_ok_and(|records| records.len() == 1));
    assert!(matches!(by_tenant_admin, Err(AppError::Forbidden(_))));
}
