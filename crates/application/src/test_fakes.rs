//! In-process fakes for every application port, shared by the service
//! tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};

use async_trait::async_trait;
use campusly_core::{AccountId, AppError, AppResult, CallContext, TenantId};
use campusly_domain::{
    FeeFields, FeeStructure, InstanceStatus, RateLimitPolicy, RateLimitWindow, RevenueLedger,
    Role, RoleGrant, RoleScope, TenantRecord,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Mutex;

use crate::{
    AccountDirectory, AccountKind, AuditEvent, AuditRepository, Clock, FeeScheduleRepository,
    FeeSyncTarget, FundsTransfer, InstanceHandle, InstanceKind, InstanceProvisioner,
    InstanceStatusRepository, PlatformSettings, PlatformTreasury, ProvisioningLimits,
    RateLimitRepository, RateLimitService, RevenueAccount, RevenueAccountPorts,
    RevenueLedgerRepository, RoleRegistry, RoleRepository, ServiceWiring, TenantFactory,
    TenantFactoryPorts, TenantGate, TenantGatePorts, TenantProfileService, TenantRepository,
};

pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

pub(crate) fn platform_settings() -> PlatformSettings {
    PlatformSettings {
        master_account: AccountId::new(),
        factory_account: AccountId::new(),
        default_fees: FeeFields {
            program_creation_fee: 50,
            subscription_fee: 500,
            certificate_fee: 20,
            revenue_share_percent: 20,
        },
        default_subscription_duration: Duration::days(30),
        provisioning_limits: ProvisioningLimits {
            min_subscription_fee: 100,
            max_subscription_fee: 10_000,
            min_subscription_duration: Duration::days(30),
            max_subscription_duration: Duration::days(365),
        },
        grace_period: Duration::days(3),
        withdrawal_cooldown: Duration::seconds(3600),
        collection_rate_limit: RateLimitPolicy {
            cooldown: Duration::zero(),
            burst_limit: 100,
            window: Duration::minutes(1),
        },
        service_wiring: ServiceWiring {
            revenue_account: AccountId::new(),
            tenant_profile: AccountId::new(),
            tuition: AccountId::new(),
            role_registry: AccountId::new(),
            master_admin: AccountId::new(),
        },
    }
}

pub(crate) struct FakeClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl FakeClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub(crate) fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
    pub(crate) fail: AtomicBool,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }

        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    pub(crate) grants: Mutex<HashSet<RoleGrant>>,
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn insert_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        Ok(self.grants.lock().await.insert(grant))
    }

    async fn delete_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        Ok(self.grants.lock().await.remove(&grant))
    }

    async fn contains_grant(&self, grant: RoleGrant) -> AppResult<bool> {
        Ok(self.grants.lock().await.contains(&grant))
    }

    async fn any_holder(&self, role: Role, scope: RoleScope) -> AppResult<bool> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .any(|grant| grant.role == role && grant.scope == scope))
    }

    async fn list_grants_for_account(&self, account: AccountId) -> AppResult<Vec<RoleGrant>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|grant| grant.account == account)
            .copied()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeTenantRepository {
    pub(crate) records: Mutex<HashMap<AccountId, TenantRecord>>,
    pub(crate) fail_insert: AtomicBool,
}

#[async_trait]
impl TenantRepository for FakeTenantRepository {
    async fn find_by_organization(
        &self,
        organization_admin: AccountId,
    ) -> AppResult<Option<TenantRecord>> {
        Ok(self.records.lock().await.get(&organization_admin).cloned())
    }

    async fn find_by_tenant(&self, tenant_id: TenantId) -> AppResult<Option<TenantRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|record| record.tenant_id() == tenant_id)
            .cloned())
    }

    async fn insert_if_absent(&self, record: TenantRecord) -> AppResult<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(AppError::Internal("tenant store unavailable".to_owned()));
        }

        let mut records = self.records.lock().await;
        if records.contains_key(&record.organization_admin()) {
            return Err(AppError::Conflict("tenant already exists".to_owned()));
        }

        records.insert(record.organization_admin(), record);
        Ok(())
    }

    async fn replace(&self, previous: &TenantRecord, next: TenantRecord) -> AppResult<()> {
        let mut records = self.records.lock().await;
        if records.get(&previous.organization_admin()) != Some(previous) {
            return Err(AppError::Conflict("tenant record changed concurrently".to_owned()));
        }

        records.insert(next.organization_admin(), next);
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<TenantRecord>> {
        let mut records: Vec<_> = self.records.lock().await.values().cloned().collect();
        records.sort_by_key(TenantRecord::provisioned_at);
        Ok(records)
    }
}

#[derive(Default)]
pub(crate) struct FakeInstanceProvisioner {
    pub(crate) live: Mutex<Vec<InstanceHandle>>,
    pub(crate) initialized: Mutex<Vec<(InstanceHandle, ServiceWiring)>>,
    pub(crate) local_grants: Mutex<Vec<(InstanceHandle, Role, AccountId)>>,
    pub(crate) pushed_fees: Mutex<HashMap<TenantId, FeeStructure>>,
    pub(crate) fail_initialize: Mutex<Option<InstanceKind>>,
    pub(crate) fail_push: AtomicBool,
}

#[async_trait]
impl InstanceProvisioner for FakeInstanceProvisioner {
    async fn clone_template(
        &self,
        kind: InstanceKind,
        tenant_id: TenantId,
    ) -> AppResult<InstanceHandle> {
        let address = match kind {
            InstanceKind::TenantRoot => tenant_id.as_account(),
            _ => AccountId::new(),
        };
        let instance = InstanceHandle {
            kind,
            tenant_id,
            address,
        };
        self.live.lock().await.push(instance);
        Ok(instance)
    }

    async fn initialize(&self, instance: &InstanceHandle, wiring: &ServiceWiring) -> AppResult<()> {
        if *self.fail_initialize.lock().await == Some(instance.kind) {
            return Err(AppError::Internal(format!(
                "failed to initialize {}",
                instance.kind
            )));
        }

        self.initialized.lock().await.push((*instance, *wiring));
        Ok(())
    }

    async fn grant_role(
        &self,
        instance: &InstanceHandle,
        role: Role,
        account: AccountId,
    ) -> AppResult<()> {
        self.local_grants
            .lock()
            .await
            .push((*instance, role, account));
        Ok(())
    }

    async fn retire(&self, instance: &InstanceHandle) -> AppResult<()> {
        self.live.lock().await.retain(|live| live != instance);
        Ok(())
    }
}

#[async_trait]
impl FeeSyncTarget for FakeInstanceProvisioner {
    async fn push_fee_structure(
        &self,
        tenant_id: TenantId,
        structure: FeeStructure,
    ) -> AppResult<()> {
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(AppError::Internal("tenant instance rejected fees".to_owned()));
        }

        self.pushed_fees.lock().await.insert(tenant_id, structure);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeTenantProfileService {
    pub(crate) active: Mutex<HashSet<TenantId>>,
    pub(crate) fail_activate: AtomicBool,
}

#[async_trait]
impl TenantProfileService for FakeTenantProfileService {
    async fn activate_school(&self, tenant_id: TenantId) -> AppResult<()> {
        if self.fail_activate.load(Ordering::SeqCst) {
            return Err(AppError::Internal("profile service unavailable".to_owned()));
        }

        self.active.lock().await.insert(tenant_id);
        Ok(())
    }

    async fn deactivate_school(&self, tenant_id: TenantId) -> AppResult<()> {
        self.active.lock().await.remove(&tenant_id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAccountDirectory {
    pub(crate) programs: Mutex<HashSet<AccountId>>,
}

#[async_trait]
impl AccountDirectory for FakeAccountDirectory {
    async fn account_kind(&self, account: AccountId) -> AppResult<AccountKind> {
        if self.programs.lock().await.contains(&account) {
            Ok(AccountKind::Program)
        } else {
            Ok(AccountKind::Individual)
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeTreasury {
    pub(crate) balance: Mutex<u64>,
}

#[async_trait]
impl PlatformTreasury for FakeTreasury {
    async fn credit(&self, amount: u64) -> AppResult<u64> {
        let mut balance = self.balance.lock().await;
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| AppError::Validation("treasury overflow".to_owned()))?;
        Ok(*balance)
    }

    async fn debit(&self, amount: u64) -> AppResult<u64> {
        let mut balance = self.balance.lock().await;
        *balance = balance.checked_sub(amount).ok_or_else(|| {
            AppError::Validation(format!("amount {amount} exceeds platform balance"))
        })?;
        Ok(*balance)
    }

    async fn balance(&self) -> AppResult<u64> {
        Ok(*self.balance.lock().await)
    }
}

/// A withdrawal the transfer fake attempts while a transfer is in flight.
pub(crate) struct ReentrantWithdrawal {
    pub(crate) revenue_account: RevenueAccount,
    pub(crate) context: CallContext,
    pub(crate) tenant_id: TenantId,
    pub(crate) recipient: AccountId,
}

#[derive(Default)]
pub(crate) struct FakeFundsTransfer {
    pub(crate) transfers: Mutex<Vec<(AccountId, u64)>>,
    pub(crate) fail: AtomicBool,
    pub(crate) reentry: Mutex<Option<ReentrantWithdrawal>>,
    pub(crate) reentry_results: Mutex<Vec<AppResult<u64>>>,
}

#[async_trait]
impl FundsTransfer for FakeFundsTransfer {
    async fn transfer(&self, recipient: AccountId, amount: u64) -> AppResult<()> {
        let reentry = self.reentry.lock().await.take();
        if let Some(reentry) = reentry {
            let result = reentry
                .revenue_account
                .withdraw(&reentry.context, reentry.tenant_id, reentry.recipient)
                .await;
            self.reentry_results.lock().await.push(result);
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("transfer rejected".to_owned()));
        }

        self.transfers.lock().await.push((recipient, amount));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeFeeScheduleRepository {
    pub(crate) default_structure: Mutex<Option<FeeStructure>>,
    pub(crate) custom: Mutex<HashMap<TenantId, FeeStructure>>,
    pub(crate) fail_save_custom: AtomicBool,
}

#[async_trait]
impl FeeScheduleRepository for FakeFeeScheduleRepository {
    async fn find_default_structure(&self) -> AppResult<Option<FeeStructure>> {
        Ok(*self.default_structure.lock().await)
    }

    async fn save_default_structure(&self, structure: FeeStructure) -> AppResult<()> {
        *self.default_structure.lock().await = Some(structure);
        Ok(())
    }

    async fn find_custom_structure(&self, tenant_id: TenantId) -> AppResult<Option<FeeStructure>> {
        Ok(self.custom.lock().await.get(&tenant_id).copied())
    }

    async fn save_custom_structure(
        &self,
        tenant_id: TenantId,
        structure: FeeStructure,
    ) -> AppResult<()> {
        if self.fail_save_custom.load(Ordering::SeqCst) {
            return Err(AppError::Internal("fee store unavailable".to_owned()));
        }

        self.custom.lock().await.insert(tenant_id, structure);
        Ok(())
    }

    async fn remove_custom_structure(&self, tenant_id: TenantId) -> AppResult<bool> {
        Ok(self.custom.lock().await.remove(&tenant_id).is_some())
    }
}

#[derive(Default)]
pub(crate) struct FakeLedgerRepository {
    pub(crate) ledgers: Mutex<HashMap<TenantId, RevenueLedger>>,
    pub(crate) fail_save: AtomicBool,
}

#[async_trait]
impl RevenueLedgerRepository for FakeLedgerRepository {
    async fn find_ledger(&self, tenant_id: TenantId) -> AppResult<Option<RevenueLedger>> {
        Ok(self.ledgers.lock().await.get(&tenant_id).cloned())
    }

    async fn save_ledger(&self, ledger: &RevenueLedger) -> AppResult<RevenueLedger> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(AppError::Internal("ledger store unavailable".to_owned()));
        }

        let mut ledgers = self.ledgers.lock().await;
        let stored_version = ledgers
            .get(&ledger.tenant_id())
            .map_or(0, RevenueLedger::version);
        if stored_version != ledger.version() {
            return Err(AppError::Conflict("revenue ledger changed concurrently".to_owned()));
        }

        let saved = RevenueLedger::restore(
            ledger.tenant_id(),
            ledger.total_revenue(),
            ledger.platform_share_accrued(),
            ledger.tenant_share_accrued(),
            ledger.last_withdrawal_time(),
            ledger.programs().clone(),
            ledger.next_version(),
        );
        ledgers.insert(ledger.tenant_id(), saved.clone());
        Ok(saved)
    }
}

#[derive(Default)]
pub(crate) struct FakeInstanceStatusRepository {
    pub(crate) statuses: Mutex<HashMap<TenantId, InstanceStatus>>,
}

#[async_trait]
impl InstanceStatusRepository for FakeInstanceStatusRepository {
    async fn find_status(&self, tenant_id: TenantId) -> AppResult<InstanceStatus> {
        Ok(self
            .statuses
            .lock()
            .await
            .get(&tenant_id)
            .copied()
            .unwrap_or_default())
    }

    async fn transition(
        &self,
        tenant_id: TenantId,
        expected: InstanceStatus,
        next: InstanceStatus,
    ) -> AppResult<bool> {
        let mut statuses = self.statuses.lock().await;
        let current = statuses.get(&tenant_id).copied().unwrap_or_default();
        if current != expected {
            return Ok(false);
        }

        statuses.insert(tenant_id, next);
        Ok(true)
    }
}

#[derive(Default)]
pub(crate) struct FakeRateLimitRepository {
    pub(crate) windows: Mutex<HashMap<String, RateLimitWindow>>,
}

#[async_trait]
impl RateLimitRepository for FakeRateLimitRepository {
    async fn record_event(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<RateLimitWindow> {
        let mut windows = self.windows.lock().await;
        let mut window = windows.get(key).copied().unwrap_or_default();
        window.admit(policy, now)?;
        windows.insert(key.to_owned(), window);
        Ok(window)
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self.windows.lock().await;
        let initial = windows.len();
        windows.retain(|_, window| window.last_event_at.is_some_and(|at| at >= before));
        Ok((initial - windows.len()) as u64)
    }
}

/// Every service wired over fakes, with the master bootstrapped and the
/// factory account holding global admin.
pub(crate) struct Harness {
    pub(crate) settings: PlatformSettings,
    pub(crate) clock: Arc<FakeClock>,
    pub(crate) audit: Arc<FakeAuditRepository>,
    pub(crate) roles: Arc<FakeRoleRepository>,
    pub(crate) tenants: Arc<FakeTenantRepository>,
    pub(crate) instances: Arc<FakeInstanceProvisioner>,
    pub(crate) profiles: Arc<FakeTenantProfileService>,
    pub(crate) accounts: Arc<FakeAccountDirectory>,
    pub(crate) treasury: Arc<FakeTreasury>,
    pub(crate) transfers: Arc<FakeFundsTransfer>,
    pub(crate) fee_schedules: Arc<FakeFeeScheduleRepository>,
    pub(crate) ledgers: Arc<FakeLedgerRepository>,
    pub(crate) statuses: Arc<FakeInstanceStatusRepository>,
    pub(crate) rate_limits: Arc<FakeRateLimitRepository>,
    pub(crate) role_registry: RoleRegistry,
    pub(crate) revenue_account: RevenueAccount,
    pub(crate) factory: TenantFactory,
    pub(crate) rate_limit_service: RateLimitService,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        Self::with_settings(platform_settings()).await
    }

    pub(crate) async fn with_settings(settings: PlatformSettings) -> Self {
        let clock = Arc::new(FakeClock::at(epoch()));
        let audit = Arc::new(FakeAuditRepository::default());
        let roles = Arc::new(FakeRoleRepository::default());
        let tenants = Arc::new(FakeTenantRepository::default());
        let instances = Arc::new(FakeInstanceProvisioner::default());
        let profiles = Arc::new(FakeTenantProfileService::default());
        let accounts = Arc::new(FakeAccountDirectory::default());
        let treasury = Arc::new(FakeTreasury::default());
        let transfers = Arc::new(FakeFundsTransfer::default());
        let fee_schedules = Arc::new(FakeFeeScheduleRepository::default());
        let ledgers = Arc::new(FakeLedgerRepository::default());
        let statuses = Arc::new(FakeInstanceStatusRepository::default());
        let rate_limits = Arc::new(FakeRateLimitRepository::default());

        let role_registry = RoleRegistry::new(roles.clone(), audit.clone());
        let revenue_account = RevenueAccount::new(
            RevenueAccountPorts {
                fee_schedules: fee_schedules.clone(),
                ledgers: ledgers.clone(),
                tenants: tenants.clone(),
                treasury: treasury.clone(),
                funds_transfer: transfers.clone(),
                fee_sync: instances.clone(),
                audit: audit.clone(),
            },
            role_registry.clone(),
            clock.clone(),
            settings.default_fees,
            settings.withdrawal_cooldown,
        );
        let factory = TenantFactory::new(
            TenantFactoryPorts {
                tenants: tenants.clone(),
                instances: instances.clone(),
                profiles: profiles.clone(),
                accounts: accounts.clone(),
                treasury: treasury.clone(),
                funds_transfer: transfers.clone(),
                audit: audit.clone(),
            },
            role_registry.clone(),
            revenue_account.clone(),
            clock.clone(),
            settings.clone(),
        );
        let rate_limit_service = RateLimitService::new(rate_limits.clone(), clock.clone());

        let bootstrapped = role_registry.bootstrap_master(settings.master_account).await;
        assert!(matches!(bootstrapped, Ok(true)));
        let factory_admin = role_registry
            .grant_global(
                &CallContext::unpaid(settings.master_account),
                Role::Admin,
                settings.factory_account,
            )
            .await;
        assert!(factory_admin.is_ok());

        Self {
            settings,
            clock,
            audit,
            roles,
            tenants,
            instances,
            profiles,
            accounts,
            treasury,
            transfers,
            fee_schedules,
            ledgers,
            statuses,
            rate_limits,
            role_registry,
            revenue_account,
            factory,
            rate_limit_service,
        }
    }

    pub(crate) fn master(&self) -> CallContext {
        CallContext::unpaid(self.settings.master_account)
    }

    pub(crate) fn gate(&self, tenant_id: TenantId) -> TenantGate {
        TenantGate::new(
            tenant_id,
            TenantGatePorts {
                tenants: self.tenants.clone(),
                statuses: self.statuses.clone(),
                audit: self.audit.clone(),
            },
            self.role_registry.clone(),
            self.rate_limit_service.clone(),
            self.clock.clone(),
        )
    }

    /// Provisions a tenant on the default schedule, paying exactly the
    /// default subscription fee.
    pub(crate) async fn provision(&self, organization_admin: AccountId) -> TenantRecord {
        self.factory
            .provision(
                &CallContext::new(
                    organization_admin,
                    self.settings.default_fees.subscription_fee,
                ),
                organization_admin,
                None,
            )
            .await
            .unwrap_or_else(|error| panic!("provisioning failed: {error}"))
    }

    /// Grants `role` to a fresh account inside a tenant.
    pub(crate) async fn member(&self, tenant_id: TenantId, role: Role) -> AccountId {
        let account = AccountId::new();
        self.role_registry
            .grant_scoped(&self.master(), role, account, RoleScope::Tenant(tenant_id))
            .await
            .unwrap_or_else(|error| panic!("grant failed: {error}"));
        account
    }
}
