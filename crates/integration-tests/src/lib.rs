//! Integration test support for Estate CRM.
//!
//! Provides in-memory stand-ins for the two external services the portal
//! talks to, so the resolver, the exports and the full router can be driven
//! end to end without a network.
//!
//! - [`MemoryBackend`] - CRM backend with per-operation failure injection
//!   and call counting
//! - [`MemoryIdentity`] - identity provider that accepts issued delegations
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p estate-crm-integration-tests
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use secrecy::ExposeSecret;

use estate_crm_core::{
    AgentStatus, FollowUpId, FollowUpStatus, LeadId, LeadType, LoginMode, OwnerId, Principal,
    PropertyType, Timestamp, UserRole,
};
use estate_crm_portal::backend::{BackendError, CrmBackend};
use estate_crm_portal::config::CacheConfig;
use estate_crm_portal::identity::{IdentityError, IdentityProvider, LoginRequest};
use estate_crm_portal::models::{
    AgentRecord, AgentRegistration, FollowUp, FollowUpInput, Lead, LeadInput, Owner, OwnerInput,
    UserProfile,
};
use estate_crm_portal::state::AppState;

/// Creation time stamped on every record (2024-03-15T10:30:00Z).
pub const CREATED_AT: u64 = 1_710_498_600_000_000_000;

pub const ADMIN: &str = "ryjl3-tyaaa-aaaaa-aaaba-cai";
pub const AGENT: &str = "rrkah-fqaaa-aaaaa-aaaaq-cai";
pub const OTHER_AGENT: &str = "rdmx6-jaaaa-aaaaa-aaadq-cai";
pub const NEWCOMER: &str = "r7inp-6aaaa-aaaaa-aaabq-cai";

/// Parse one of the fixture principals.
///
/// # Panics
///
/// Panics if `text` is not a valid principal.
#[must_use]
pub fn principal(text: &str) -> Principal {
    Principal::parse(text).unwrap_or_else(|e| panic!("bad fixture principal {text}: {e}"))
}

/// Operation names accepted by [`MemoryBackend::fail`] and
/// [`MemoryBackend::calls`].
pub mod ops {
    pub const ROLE: &str = "get_caller_user_role";
    pub const PROFILE: &str = "get_caller_user_profile";
    pub const SAVE_PROFILE: &str = "save_caller_user_profile";
    pub const AGENT_DETAILS: &str = "get_agent_details";
    pub const ALL_AGENTS: &str = "get_all_agents";
    pub const REGISTER: &str = "register_as_agent";
    pub const UPDATE_STATUS: &str = "update_agent_status";
    pub const ALL_LEADS: &str = "get_all_leads";
    pub const ALL_OWNERS: &str = "get_all_owners";
    pub const CREATE_LEAD: &str = "create_lead";
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Backend
// =============================================================================

#[derive(Default)]
struct Store {
    roles: HashMap<Principal, UserRole>,
    profiles: HashMap<Principal, UserProfile>,
    agents: BTreeMap<Principal, AgentRecord>,
    leads: BTreeMap<LeadId, Lead>,
    owners: BTreeMap<OwnerId, Owner>,
    follow_ups: BTreeMap<FollowUpId, FollowUp>,
    next_id: u64,
}

impl Store {
    fn role(&self, principal: &Principal) -> UserRole {
        self.roles.get(principal).copied().unwrap_or(UserRole::User)
    }

    fn require_admin(&self, caller: &Principal) -> Result<(), BackendError> {
        if self.role(caller) == UserRole::Admin {
            Ok(())
        } else {
            Err(BackendError::Unauthorized)
        }
    }

    fn require_self_or_admin(
        &self,
        caller: &Principal,
        subject: &Principal,
    ) -> Result<(), BackendError> {
        if caller == subject {
            Ok(())
        } else {
            self.require_admin(caller)
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory CRM backend.
///
/// Enforces the same ownership rules as the real backend: admins see
/// everything, agents only their own records. Unknown principals hold the
/// `user` role.
#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An admin with a profile, an active agent with a profile and record,
    /// and a newcomer with nothing.
    #[must_use]
    pub fn seeded() -> Self {
        let backend = Self::new();
        backend.set_role(&principal(ADMIN), UserRole::Admin);
        backend.set_profile(&principal(ADMIN), "Priya Admin", LoginMode::Admin);
        backend.set_profile(&principal(AGENT), "Ravi Agent", LoginMode::Agent);
        backend.set_agent(&principal(AGENT), AgentStatus::Active);
        backend
    }

    pub fn set_role(&self, principal: &Principal, role: UserRole) {
        lock(&self.store).roles.insert(principal.clone(), role);
    }

    pub fn set_profile(&self, principal: &Principal, name: &str, role: LoginMode) {
        lock(&self.store).profiles.insert(
            principal.clone(),
            UserProfile {
                name: name.to_owned(),
                role,
            },
        );
    }

    pub fn set_agent(&self, principal: &Principal, status: AgentStatus) {
        lock(&self.store).agents.insert(
            principal.clone(),
            AgentRecord {
                id: principal.clone(),
                status,
                name: format!("Agent {principal}"),
                mobile: "9876543210".to_owned(),
                photo_url: format!("memory://photos/{principal}"),
            },
        );
    }

    /// Current stored status of `principal`'s agent record.
    #[must_use]
    pub fn agent_status(&self, principal: &Principal) -> Option<AgentStatus> {
        lock(&self.store).agents.get(principal).map(|a| a.status)
    }

    /// Stored profile of `principal`.
    #[must_use]
    pub fn profile(&self, principal: &Principal) -> Option<UserProfile> {
        lock(&self.store).profiles.get(principal).cloned()
    }

    /// Every stored lead.
    #[must_use]
    pub fn leads(&self) -> Vec<Lead> {
        lock(&self.store).leads.values().cloned().collect()
    }

    /// Make `op` fail with `Unavailable` until [`Self::recover`].
    pub fn fail(&self, op: &'static str) {
        lock(&self.failing).insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        lock(&self.failing).remove(op);
    }

    /// How many times `op` was called, failed calls included.
    #[must_use]
    pub fn calls(&self, op: &'static str) -> usize {
        lock(&self.calls).get(op).copied().unwrap_or(0)
    }

    fn enter(&self, op: &'static str) -> Result<MutexGuard<'_, Store>, BackendError> {
        *lock(&self.calls).entry(op).or_insert(0) += 1;
        if lock(&self.failing).contains(op) {
            return Err(BackendError::Unavailable(format!("{op} is down")));
        }
        Ok(lock(&self.store))
    }
}

#[async_trait]
impl CrmBackend for MemoryBackend {
    async fn get_caller_user_role(&self, caller: &Principal) -> Result<UserRole, BackendError> {
        Ok(self.enter(ops::ROLE)?.role(caller))
    }

    async fn get_caller_user_profile(
        &self,
        caller: &Principal,
    ) -> Result<Option<UserProfile>, BackendError> {
        Ok(self.enter(ops::PROFILE)?.profiles.get(caller).cloned())
    }

    async fn save_caller_user_profile(
        &self,
        caller: &Principal,
        profile: &UserProfile,
    ) -> Result<(), BackendError> {
        self.enter(ops::SAVE_PROFILE)?
            .profiles
            .insert(caller.clone(), profile.clone());
        Ok(())
    }

    async fn get_agent_details(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<AgentRecord, BackendError> {
        let store = self.enter(ops::AGENT_DETAILS)?;
        store.require_self_or_admin(caller, agent)?;
        store
            .agents
            .get(agent)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("agent {agent}")))
    }

    async fn get_all_agents(&self, caller: &Principal) -> Result<Vec<AgentRecord>, BackendError> {
        let store = self.enter(ops::ALL_AGENTS)?;
        store.require_admin(caller)?;
        Ok(store.agents.values().cloned().collect())
    }

    async fn register_as_agent(
        &self,
        caller: &Principal,
        registration: &AgentRegistration,
    ) -> Result<(), BackendError> {
        let mut store = self.enter(ops::REGISTER)?;
        if store.agents.contains_key(caller) {
            return Err(BackendError::AlreadyRegistered);
        }
        store.agents.insert(
            caller.clone(),
            AgentRecord {
                id: caller.clone(),
                status: AgentStatus::Pending,
                name: registration.name.clone(),
                mobile: registration.mobile.to_string(),
                photo_url: format!("memory://photos/{caller}"),
            },
        );
        Ok(())
    }

    async fn update_agent_status(
        &self,
        caller: &Principal,
        agent: &Principal,
        status: AgentStatus,
    ) -> Result<(), BackendError> {
        let mut store = self.enter(ops::UPDATE_STATUS)?;
        store.require_admin(caller)?;
        let record = store
            .agents
            .get_mut(agent)
            .ok_or_else(|| BackendError::NotFound(format!("agent {agent}")))?;
        record.status = status;
        Ok(())
    }

    async fn get_all_leads(&self, caller: &Principal) -> Result<Vec<Lead>, BackendError> {
        let store = self.enter(ops::ALL_LEADS)?;
        store.require_admin(caller)?;
        Ok(store.leads.values().cloned().collect())
    }

    async fn get_agent_leads(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<Lead>, BackendError> {
        let store = self.enter("get_agent_leads")?;
        store.require_self_or_admin(caller, agent)?;
        Ok(store
            .leads
            .values()
            .filter(|l| &l.assigned_agent == agent)
            .cloned()
            .collect())
    }

    async fn get_lead(&self, caller: &Principal, id: LeadId) -> Result<Lead, BackendError> {
        let store = self.enter("get_lead")?;
        let lead = store
            .leads
            .get(&id)
            .ok_or_else(|| BackendError::NotFound(format!("lead {id}")))?;
        store.require_self_or_admin(caller, &lead.assigned_agent)?;
        Ok(lead.clone())
    }

    async fn create_lead(
        &self,
        caller: &Principal,
        input: &LeadInput,
    ) -> Result<LeadId, BackendError> {
        let mut store = self.enter(ops::CREATE_LEAD)?;
        let id = LeadId::new(store.next_id());
        store.leads.insert(
            id,
            Lead {
                id,
                name: input.name.clone(),
                mobile: input.mobile.clone(),
                property_type: input.property_type,
                lead_type: input.lead_type,
                price: input.price,
                assigned_agent: input.assigned_agent.clone(),
                lead_level: input.lead_level.clone(),
                source: input.source.clone(),
                status: input.status.clone(),
                requirements: input.requirements.clone(),
                created_at: Timestamp::from_nanos(CREATED_AT),
                created_by: caller.clone(),
            },
        );
        Ok(id)
    }

    async fn update_lead(
        &self,
        caller: &Principal,
        id: LeadId,
        input: &LeadInput,
    ) -> Result<(), BackendError> {
        let mut store = self.enter("update_lead")?;
        let assigned = store
            .leads
            .get(&id)
            .map(|l| l.assigned_agent.clone())
            .ok_or_else(|| BackendError::NotFound(format!("lead {id}")))?;
        store.require_self_or_admin(caller, &assigned)?;
        if let Some(lead) = store.leads.get_mut(&id) {
            lead.name.clone_from(&input.name);
            lead.mobile.clone_from(&input.mobile);
            lead.property_type = input.property_type;
            lead.lead_type = input.lead_type;
            lead.price = input.price;
            lead.assigned_agent = input.assigned_agent.clone();
            lead.lead_level.clone_from(&input.lead_level);
            lead.source.clone_from(&input.source);
            lead.status.clone_from(&input.status);
            lead.requirements.clone_from(&input.requirements);
        }
        Ok(())
    }

    async fn delete_lead(&self, caller: &Principal, id: LeadId) -> Result<(), BackendError> {
        let mut store = self.enter("delete_lead")?;
        let assigned = store
            .leads
            .get(&id)
            .map(|l| l.assigned_agent.clone())
            .ok_or_else(|| BackendError::NotFound(format!("lead {id}")))?;
        store.require_self_or_admin(caller, &assigned)?;
        store.leads.remove(&id);
        Ok(())
    }

    async fn get_all_owners(&self, caller: &Principal) -> Result<Vec<Owner>, BackendError> {
        let store = self.enter(ops::ALL_OWNERS)?;
        store.require_admin(caller)?;
        Ok(store.owners.values().cloned().collect())
    }

    async fn get_agent_owners(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<Owner>, BackendError> {
        let store = self.enter("get_agent_owners")?;
        store.require_self_or_admin(caller, agent)?;
        Ok(store
            .owners
            .values()
            .filter(|o| &o.created_by == agent)
            .cloned()
            .collect())
    }

    async fn get_owner(&self, caller: &Principal, id: OwnerId) -> Result<Owner, BackendError> {
        let store = self.enter("get_owner")?;
        let owner = store
            .owners
            .get(&id)
            .ok_or_else(|| BackendError::NotFound(format!("owner {id}")))?;
        store.require_self_or_admin(caller, &owner.created_by)?;
        Ok(owner.clone())
    }

    async fn create_owner(
        &self,
        caller: &Principal,
        input: &OwnerInput,
    ) -> Result<OwnerId, BackendError> {
        let mut store = self.enter("create_owner")?;
        let id = OwnerId::new(store.next_id());
        store.owners.insert(
            id,
            Owner {
                id,
                name: input.name.clone(),
                mobile: input.mobile.clone(),
                property_type: input.property_type,
                location: input.location.clone(),
                address: input.address.clone(),
                price: input.price,
                agent_commission: input.agent_commission,
                verification_status: input.verification_status.clone(),
                remarks: input.remarks.clone(),
                created_at: Timestamp::from_nanos(CREATED_AT),
                created_by: caller.clone(),
            },
        );
        Ok(id)
    }

    async fn update_owner(
        &self,
        caller: &Principal,
        id: OwnerId,
        input: &OwnerInput,
    ) -> Result<(), BackendError> {
        let mut store = self.enter("update_owner")?;
        let creator = store
            .owners
            .get(&id)
            .map(|o| o.created_by.clone())
            .ok_or_else(|| BackendError::NotFound(format!("owner {id}")))?;
        store.require_self_or_admin(caller, &creator)?;
        if let Some(owner) = store.owners.get_mut(&id) {
            owner.name.clone_from(&input.name);
            owner.mobile.clone_from(&input.mobile);
            owner.property_type = input.property_type;
            owner.location.clone_from(&input.location);
            owner.address.clone_from(&input.address);
            owner.price = input.price;
            owner.agent_commission = input.agent_commission;
            owner.verification_status.clone_from(&input.verification_status);
            owner.remarks.clone_from(&input.remarks);
        }
        Ok(())
    }

    async fn delete_owner(&self, caller: &Principal, id: OwnerId) -> Result<(), BackendError> {
        let mut store = self.enter("delete_owner")?;
        let creator = store
            .owners
            .get(&id)
            .map(|o| o.created_by.clone())
            .ok_or_else(|| BackendError::NotFound(format!("owner {id}")))?;
        store.require_self_or_admin(caller, &creator)?;
        store.owners.remove(&id);
        Ok(())
    }

    async fn get_all_follow_ups(&self, caller: &Principal) -> Result<Vec<FollowUp>, BackendError> {
        let store = self.enter("get_all_follow_ups")?;
        store.require_admin(caller)?;
        Ok(store.follow_ups.values().cloned().collect())
    }

    async fn get_agent_follow_ups(
        &self,
        caller: &Principal,
        agent: &Principal,
    ) -> Result<Vec<FollowUp>, BackendError> {
        let store = self.enter("get_agent_follow_ups")?;
        store.require_self_or_admin(caller, agent)?;
        Ok(store
            .follow_ups
            .values()
            .filter(|f| &f.agent_id == agent)
            .cloned()
            .collect())
    }

    async fn create_follow_up(
        &self,
        caller: &Principal,
        lead: LeadId,
        input: &FollowUpInput,
    ) -> Result<FollowUpId, BackendError> {
        let mut store = self.enter("create_follow_up")?;
        if !store.leads.contains_key(&lead) {
            return Err(BackendError::NotFound(format!("lead {lead}")));
        }
        let id = FollowUpId::new(store.next_id());
        store.follow_ups.insert(
            id,
            FollowUp {
                id,
                lead_id: lead,
                agent_id: caller.clone(),
                status: input.status,
                date: input.date,
                priority: input.priority.clone(),
                task_type: input.task_type.clone(),
                amount: input.amount,
                remarks: input.remarks.clone(),
            },
        );
        Ok(id)
    }

    async fn update_follow_up(
        &self,
        caller: &Principal,
        id: FollowUpId,
        input: &FollowUpInput,
    ) -> Result<(), BackendError> {
        let mut store = self.enter("update_follow_up")?;
        let agent = store
            .follow_ups
            .get(&id)
            .map(|f| f.agent_id.clone())
            .ok_or_else(|| BackendError::NotFound(format!("follow-up {id}")))?;
        store.require_self_or_admin(caller, &agent)?;
        if let Some(follow_up) = store.follow_ups.get_mut(&id) {
            follow_up.status = input.status;
            follow_up.date = input.date;
            follow_up.priority.clone_from(&input.priority);
            follow_up.task_type.clone_from(&input.task_type);
            follow_up.amount = input.amount;
            follow_up.remarks.clone_from(&input.remarks);
        }
        Ok(())
    }

    async fn delete_follow_up(
        &self,
        caller: &Principal,
        id: FollowUpId,
    ) -> Result<(), BackendError> {
        let mut store = self.enter("delete_follow_up")?;
        let agent = store
            .follow_ups
            .get(&id)
            .map(|f| f.agent_id.clone())
            .ok_or_else(|| BackendError::NotFound(format!("follow-up {id}")))?;
        store.require_self_or_admin(caller, &agent)?;
        store.follow_ups.remove(&id);
        Ok(())
    }
}

// =============================================================================
// Identity
// =============================================================================

/// In-memory identity provider.
///
/// A delegation is accepted when it was [`issued`](Self::issue); the
/// delegation `"cancel"` simulates the user closing the login window.
#[derive(Default)]
pub struct MemoryIdentity {
    issued: Mutex<HashMap<String, Principal>>,
    stale: Mutex<Option<Principal>>,
    logouts: Mutex<Vec<Principal>>,
}

impl MemoryIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a delegation that logs in as `principal`.
    #[must_use]
    pub fn issue(&self, principal: &Principal) -> String {
        let delegation = format!("delegation-{principal}");
        lock(&self.issued).insert(delegation.clone(), principal.clone());
        delegation
    }

    /// Pretend a provider session for `principal` is still live, so the
    /// next login reports "already authenticated".
    pub fn leave_stale_session(&self, principal: &Principal) {
        *lock(&self.stale) = Some(principal.clone());
    }

    /// Principals logged out so far, in order.
    #[must_use]
    pub fn logouts(&self) -> Vec<Principal> {
        lock(&self.logouts).clone()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn login(&self, request: &LoginRequest) -> Result<Principal, IdentityError> {
        if let Some(principal) = lock(&self.stale).clone() {
            return Err(IdentityError::AlreadyAuthenticated { principal });
        }

        let delegation = request.delegation.expose_secret();
        if delegation == "cancel" {
            return Err(IdentityError::Cancelled);
        }
        lock(&self.issued)
            .get(delegation)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("unknown delegation".to_owned()))
    }

    async fn logout(&self, principal: &Principal) -> Result<(), IdentityError> {
        let mut stale = lock(&self.stale);
        if stale.as_ref() == Some(principal) {
            *stale = None;
        }
        lock(&self.logouts).push(principal.clone());
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Application state over the given doubles, with the default cache.
#[must_use]
pub fn app_state(backend: Arc<MemoryBackend>, identity: Arc<MemoryIdentity>) -> AppState {
    AppState::new(backend, identity, &CacheConfig::default())
}

/// A lead assigned to `agent`.
#[must_use]
pub fn lead_input(name: &str, agent: &Principal) -> LeadInput {
    LeadInput {
        name: name.to_owned(),
        mobile: "9876543210".to_owned(),
        property_type: PropertyType::Apartment,
        lead_type: LeadType::Sale,
        price: 4_500_000,
        assigned_agent: agent.clone(),
        lead_level: "hot".to_owned(),
        source: "walk-in".to_owned(),
        status: "open".to_owned(),
        requirements: Some("2BHK, east facing".to_owned()),
    }
}

#[must_use]
pub fn owner_input(name: &str) -> OwnerInput {
    OwnerInput {
        name: name.to_owned(),
        mobile: "9000000001".to_owned(),
        property_type: PropertyType::Land,
        location: "Whitefield".to_owned(),
        verification_status: "verified".to_owned(),
        price: 12_000_000,
        agent_commission: 2,
        remarks: "corner plot".to_owned(),
        address: "Plot 12".to_owned(),
    }
}

#[must_use]
pub fn follow_up_input(task_type: &str) -> FollowUpInput {
    FollowUpInput {
        status: FollowUpStatus::Pending,
        remarks: String::new(),
        date: Timestamp::from_nanos(CREATED_AT),
        priority: "high".to_owned(),
        task_type: task_type.to_owned(),
        amount: 0,
    }
}
