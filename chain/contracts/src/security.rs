//! Shared security primitives for the ledger
//!
//! Provides the reentrancy guard, capability roles and the global pause
//! switch consulted by every mutating operation.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use types::ids::AccountId;

use crate::errors::LedgerError;

/// Reentrancy guard preventing nested calls into protected functions.
///
/// A ledger operation acquires the guard before executing state-changing
/// logic and releases it on completion. Any nested call attempt fails.
/// Callers go through `Bank::non_reentrant`, which releases on every exit.
#[derive(Debug, Clone)]
pub struct ReentrancyGuard {
    locked: bool,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self { locked: false }
    }

    /// Acquire the guard. Returns `true` if successfully acquired.
    /// Returns `false` if already locked (reentrancy attempt).
    pub fn acquire(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    /// Release the guard.
    pub fn release(&mut self) {
        self.locked = false;
    }

    /// Check if currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability roles. Independent sets: holding one implies nothing about
/// the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Pause, drain, emergency mode, role management
    Admin,
    /// Operational tasks
    Operator,
    /// Read access to conservation audits
    Auditor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Operator, Role::Auditor];
}

/// Role-based access control.
///
/// Each role is a membership set. The owner is seeded into `Admin` and can
/// never lose it.
#[derive(Debug, Clone)]
pub struct AccessControl {
    members: HashMap<Role, HashSet<AccountId>>,
    owner: AccountId,
}

impl AccessControl {
    /// Create access control with the owner holding `Admin`.
    pub fn new(owner: AccountId) -> Self {
        let mut members: HashMap<Role, HashSet<AccountId>> = HashMap::new();
        members.entry(Role::Admin).or_default().insert(owner);
        Self { members, owner }
    }

    /// Check if an identity is a member of the role.
    pub fn has_role(&self, identity: &AccountId, role: Role) -> bool {
        self.members
            .get(&role)
            .map_or(false, |set| set.contains(identity))
    }

    /// Fail with `UnauthorizedAccess` unless the caller holds `role`.
    pub fn require_role(&self, caller: &AccountId, role: Role) -> Result<(), LedgerError> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            Err(LedgerError::UnauthorizedAccess {
                caller: *caller,
                required_role: role,
            })
        }
    }

    /// Fail unless the caller holds at least one of `roles`. Each role is
    /// tested on its own; the error names the first one.
    pub fn require_any(&self, caller: &AccountId, roles: &[Role]) -> Result<(), LedgerError> {
        if roles.iter().any(|role| self.has_role(caller, *role)) {
            return Ok(());
        }
        Err(LedgerError::UnauthorizedAccess {
            caller: *caller,
            required_role: roles.first().copied().unwrap_or(Role::Admin),
        })
    }

    /// Grant `role` to `target`. Admin-only. Returns `true` if newly granted.
    pub fn grant_role(
        &mut self,
        caller: &AccountId,
        role: Role,
        target: AccountId,
    ) -> Result<bool, LedgerError> {
        self.require_role(caller, Role::Admin)?;
        Ok(self.members.entry(role).or_default().insert(target))
    }

    /// Revoke `role` from `target`. Admin-only. Returns `true` if the role was
    /// held. The owner's `Admin` role is never revoked.
    pub fn revoke_role(
        &mut self,
        caller: &AccountId,
        role: Role,
        target: &AccountId,
    ) -> Result<bool, LedgerError> {
        self.require_role(caller, Role::Admin)?;
        if role == Role::Admin && *target == self.owner {
            return Ok(false);
        }
        Ok(self
            .members
            .get_mut(&role)
            .map_or(false, |set| set.remove(target)))
    }

    /// All roles held by `identity`, in declaration order.
    pub fn roles_of(&self, identity: &AccountId) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.has_role(identity, *role))
            .collect()
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }
}

/// Global halt flag.
///
/// Pausing an already paused ledger (or unpausing a running one) is a no-op.
#[derive(Debug, Clone)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    /// Create a new unpaused guard.
    pub fn new() -> Self {
        Self { paused: false }
    }

    /// Pause operations. Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        !std::mem::replace(&mut self.paused, true)
    }

    /// Unpause operations. Returns `true` if the state changed.
    pub fn unpause(&mut self) -> bool {
        std::mem::replace(&mut self.paused, false)
    }

    /// Check if currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fail with `OperationPaused` while halted.
    pub fn ensure_running(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::OperationPaused);
        }
        Ok(())
    }
}

impl Default for PauseGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- ReentrancyGuard tests ---

    #[test]
    fn test_reentrancy_guard_acquire_release() {
        let mut guard = ReentrancyGuard::new();
        assert!(!guard.is_locked());
        assert!(guard.acquire());
        assert!(guard.is_locked());
        guard.release();
        assert!(!guard.is_locked());
    }

    #[test]
    fn test_reentrancy_guard_double_acquire_fails() {
        let mut guard = ReentrancyGuard::new();
        assert!(guard.acquire());
        assert!(!guard.acquire(), "Second acquire must fail");
    }

    // --- AccessControl tests ---

    #[test]
    fn test_owner_is_admin() {
        let owner = AccountId::new();
        let ac = AccessControl::new(owner);
        assert!(ac.has_role(&owner, Role::Admin));
        assert!(!ac.has_role(&owner, Role::Operator));
        assert_eq!(ac.owner(), owner);
    }

    #[test]
    fn test_roles_are_independent() {
        let owner = AccountId::new();
        let op = AccountId::new();
        let mut ac = AccessControl::new(owner);
        assert!(ac.grant_role(&owner, Role::Operator, op).unwrap());

        assert!(ac.has_role(&op, Role::Operator));
        assert!(!ac.has_role(&op, Role::Admin), "Operator must not imply Admin");
        assert!(!ac.has_role(&op, Role::Auditor));
        assert_eq!(ac.roles_of(&op), vec![Role::Operator]);
    }

    #[test]
    fn test_non_admin_cannot_grant() {
        let owner = AccountId::new();
        let eve = AccountId::new();
        let mut ac = AccessControl::new(owner);
        let err = ac.grant_role(&eve, Role::Admin, eve).unwrap_err();
        assert_eq!(
            err,
            LedgerError::UnauthorizedAccess {
                caller: eve,
                required_role: Role::Admin
            }
        );
        assert!(!ac.has_role(&eve, Role::Admin));
    }

    #[test]
    fn test_grant_twice_reports_existing() {
        let owner = AccountId::new();
        let bob = AccountId::new();
        let mut ac = AccessControl::new(owner);
        assert!(ac.grant_role(&owner, Role::Auditor, bob).unwrap());
        assert!(!ac.grant_role(&owner, Role::Auditor, bob).unwrap());
    }

    #[test]
    fn test_require_any_checks_each_role() {
        let owner = AccountId::new();
        let auditor = AccountId::new();
        let stranger = AccountId::new();
        let mut ac = AccessControl::new(owner);
        ac.grant_role(&owner, Role::Auditor, auditor).unwrap();

        let gate = [Role::Admin, Role::Auditor];
        assert!(ac.require_any(&owner, &gate).is_ok());
        assert!(ac.require_any(&auditor, &gate).is_ok());
        assert!(matches!(
            ac.require_any(&stranger, &gate),
            Err(LedgerError::UnauthorizedAccess { required_role: Role::Admin, .. })
        ));
    }

    #[test]
    fn test_revoke_role() {
        let owner = AccountId::new();
        let bob = AccountId::new();
        let mut ac = AccessControl::new(owner);
        ac.grant_role(&owner, Role::Operator, bob).unwrap();
        assert!(ac.revoke_role(&owner, Role::Operator, &bob).unwrap());
        assert!(!ac.has_role(&bob, Role::Operator));
        assert!(!ac.revoke_role(&owner, Role::Operator, &bob).unwrap());
    }

    #[test]
    fn test_cannot_revoke_owner_admin() {
        let owner = AccountId::new();
        let mut ac = AccessControl::new(owner);
        assert!(!ac.revoke_role(&owner, Role::Admin, &owner).unwrap());
        assert!(ac.has_role(&owner, Role::Admin));
    }

    // --- PauseGuard tests ---

    #[test]
    fn test_pause_guard() {
        let mut pg = PauseGuard::new();
        assert!(pg.ensure_running().is_ok());
        assert!(pg.pause());
        assert!(pg.is_paused());
        assert_eq!(pg.ensure_running(), Err(LedgerError::OperationPaused));
        assert!(pg.unpause());
        assert!(!pg.is_paused());
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut pg = PauseGuard::new();
        assert!(pg.pause());
        assert!(!pg.pause(), "Second pause is a no-op");
        assert!(pg.is_paused());
        assert!(pg.unpause());
        assert!(!pg.unpause(), "Second unpause is a no-op");
    }
}
