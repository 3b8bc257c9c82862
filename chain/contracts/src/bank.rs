//! Bank: accounts, aggregate statistics and the deposit/withdraw/transfer protocol
//!
//! The `Bank` is the single shared ledger store. Every public mutating
//! operation runs in this order:
//! 1. Reentrancy guard (held for the whole call)
//! 2. Pause state
//! 3. Access control (where applicable)
//! 4. Validation, then state effects, history and events
//! 5. Outbound payment, last
//!
//! An operation either commits all of its effects or none. Operations that
//! pay out take a checkpoint of everything they touch and restore it if the
//! payment fails.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};
use types::ids::AccountId;
use types::numeric::{to_native_decimal, U96};

use crate::config::{InitParams, LedgerConfig};
use crate::errors::LedgerError;
use crate::events::{
    AccountCreated, Deposited, EmergencyDrained, EmergencyModeToggled, LargeTransactionAlert,
    LedgerEvent, RoleChanged, Transferred, Withdrawn,
};
use crate::history::{HistoryRing, Transaction, TransactionHistory, TransactionKind};
use crate::oracle::{accrued_interest, quote_value, PriceFeed, PriceOracle, PriceReading};
use crate::payment::Payee;
use crate::profile::{ProfileRecord, ProfileStore};
use crate::security::{AccessControl, PauseGuard, ReentrancyGuard, Role};

/// Who is calling, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: AccountId,
    pub timestamp: i64,
    pub block_number: u64,
}

impl CallContext {
    pub fn new(caller: AccountId, timestamp: i64, block_number: u64) -> Self {
        Self {
            caller,
            timestamp,
            block_number,
        }
    }

    /// Context stamped with the current wall-clock time.
    pub fn now(caller: AccountId, block_number: u64) -> Self {
        Self::new(caller, Utc::now().timestamp(), block_number)
    }
}

/// Per-identity ledger entry. Never deleted once created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: u128,
    pub last_activity_time: i64,
    pub transaction_count: u32,
    pub created_at: i64,
    pub is_active: bool,
}

/// Aggregate statistics. `total_deposits` always equals the sum of balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankInfo {
    pub owner: AccountId,
    pub total_deposits: U96,
    pub total_users: u32,
    pub emergency_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStats {
    pub balance: u128,
    pub last_activity_time: i64,
    pub transaction_count: u32,
    pub created_at: i64,
    pub is_active: bool,
    pub age_secs: i64,
}

/// Snapshot polled by the monitoring process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStats {
    pub owner: AccountId,
    pub total_deposits: u128,
    pub total_users: u32,
    pub emergency_mode: bool,
    pub held_balance: u128,
}

impl BankStats {
    /// `total_deposits` in whole native units.
    pub fn total_deposits_native(&self) -> Option<Decimal> {
        to_native_decimal(self.total_deposits)
    }

    pub fn held_balance_native(&self) -> Option<Decimal> {
        to_native_decimal(self.held_balance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservationReport {
    pub sum_of_balances: u128,
    pub total_deposits: u128,
    pub accounts: usize,
    pub held_balance: u128,
    pub holds: bool,
}

/// Pre-images of everything a paying operation may touch.
struct Checkpoint {
    account: AccountId,
    account_state: Option<Account>,
    ring: Option<HistoryRing>,
    info: BankInfo,
    held_balance: u128,
    last_tx_id: u64,
    events_len: usize,
}

/// The custodial ledger.
#[derive(Debug)]
pub struct Bank {
    info: BankInfo,
    accounts: HashMap<AccountId, Account>,
    history: TransactionHistory,
    profiles: ProfileStore,
    oracle: PriceOracle,
    /// Security: reentrancy guard
    reentrancy_guard: ReentrancyGuard,
    /// Security: pause guard
    pause_guard: PauseGuard,
    /// Security: role-based access control
    access_control: AccessControl,
    config: LedgerConfig,
    /// Native value in custody, including unbooked receipts.
    held_balance: u128,
    /// Last issued global transaction id (0 = none yet).
    last_tx_id: u64,
    /// Emitted events log (append-only)
    events: Vec<LedgerEvent>,
}

impl Bank {
    /// One-time setup: owner, initial roles and the oracle source.
    pub fn initialize(params: InitParams, feed: Box<dyn PriceFeed>) -> Result<Self, LedgerError> {
        let InitParams {
            owner,
            initial_roles,
            config,
        } = params;
        config.validate()?;

        let mut access_control = AccessControl::new(owner);
        for (role, identity) in initial_roles {
            access_control.grant_role(&owner, role, identity)?;
        }

        info!(
            owner = %owner,
            max_receipts = config.max_receipts,
            oracle_max_age = config.oracle_max_age_secs,
            "Ledger initialized"
        );

        Ok(Self {
            info: BankInfo {
                owner,
                total_deposits: U96::ZERO,
                total_users: 0,
                emergency_mode: false,
            },
            accounts: HashMap::new(),
            history: TransactionHistory::new(),
            profiles: ProfileStore::new(config.max_receipts),
            oracle: PriceOracle::new(feed, config.oracle_max_age_secs),
            reentrancy_guard: ReentrancyGuard::new(),
            pause_guard: PauseGuard::new(),
            access_control,
            config,
            held_balance: 0,
            last_tx_id: 0,
            events: Vec::new(),
        })
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Deposit `amount` attached to the call into the caller's account.
    ///
    /// Returns the global transaction id.
    pub fn deposit(&mut self, ctx: &CallContext, amount: u128) -> Result<u64, LedgerError> {
        self.non_reentrant("deposit", |bank| {
            bank.pause_guard.ensure_running()?;
            if amount == 0 {
                return Err(LedgerError::InvalidAmount);
            }
            bank.book_deposit(ctx, amount)
        })
    }

    /// Value arrived without an explicit call. Books it like a deposit.
    /// Never fails: while paused or during an outbound payment the value is
    /// kept in custody but not credited to anyone.
    ///
    /// Returns the transaction id when the value was booked.
    pub fn receive_unsolicited(&mut self, ctx: &CallContext, amount: u128) -> Option<u64> {
        if amount == 0 {
            return None;
        }
        if self.pause_guard.is_paused() || self.reentrancy_guard.is_locked() {
            debug!(
                sender = %ctx.caller,
                amount = %amount,
                paused = self.pause_guard.is_paused(),
                "Unsolicited value held without bookkeeping"
            );
            self.held_balance = self.held_balance.saturating_add(amount);
            return None;
        }
        match self.book_deposit(ctx, amount) {
            Ok(tx_id) => Some(tx_id),
            Err(err) => {
                warn!(
                    sender = %ctx.caller,
                    amount = %amount,
                    error = %err,
                    "Unsolicited value could not be booked"
                );
                self.held_balance = self.held_balance.saturating_add(amount);
                None
            }
        }
    }

    fn book_deposit(&mut self, ctx: &CallContext, amount: u128) -> Result<u64, LedgerError> {
        let account = ctx.caller;
        if account.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        let total_deposits = self
            .info
            .total_deposits
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount)?;
        let held_balance = self
            .held_balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount)?;
        let (state, created) = self.credited(&account, amount, ctx.timestamp)?;
        let total_users = self.users_after(created)?;
        let (state, sequence) = Self::next_activity(state, ctx.timestamp)?;
        let tx_id = self.next_tx_id()?;

        // Effects
        self.commit_account(account, state, sequence, amount, TransactionKind::Deposit, ctx);
        self.info.total_deposits = total_deposits;
        self.info.total_users = total_users;
        self.held_balance = held_balance;
        self.last_tx_id = tx_id;

        if created {
            self.emit_account_created(account, ctx.timestamp);
        }
        self.events.push(LedgerEvent::Deposited(Deposited {
            tx_id,
            account,
            amount,
            new_balance: state.balance,
            timestamp: ctx.timestamp,
        }));
        self.maybe_alert(account, amount, TransactionKind::Deposit, ctx.timestamp);

        debug!(
            account = %account,
            amount = %amount,
            tx_id,
            "Deposit booked"
        );
        Ok(tx_id)
    }

    // ───────────────────────── Withdraw ─────────────────────────

    /// Withdraw `amount` from the caller's account and pay it to `payee`.
    ///
    /// Balances and aggregates are reduced before the payment runs. If the
    /// payment fails, every effect of this call is rolled back.
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        amount: u128,
        payee: &mut dyn Payee,
    ) -> Result<u64, LedgerError> {
        self.non_reentrant("withdraw", |bank| {
            bank.pause_guard.ensure_running()?;
            if amount == 0 {
                return Err(LedgerError::InvalidAmount);
            }
            let account = ctx.caller;
            let (state, sequence) = bank.debited(&account, amount, ctx.timestamp)?;
            let total_deposits = bank
                .info
                .total_deposits
                .checked_sub(amount)
                .ok_or(LedgerError::InvalidAmount)?;
            let tx_id = bank.next_tx_id()?;

            let checkpoint = bank.checkpoint(account);

            // Effects
            bank.commit_account(account, state, sequence, amount, TransactionKind::Withdrawal, ctx);
            bank.info.total_deposits = total_deposits;
            bank.last_tx_id = tx_id;
            bank.events.push(LedgerEvent::Withdrawn(Withdrawn {
                tx_id,
                account,
                amount,
                new_balance: state.balance,
                timestamp: ctx.timestamp,
            }));
            bank.maybe_alert(account, amount, TransactionKind::Withdrawal, ctx.timestamp);

            // Interaction
            if let Err(err) = bank.pay_out(amount, payee) {
                bank.rollback(checkpoint);
                warn!(
                    account = %account,
                    amount = %amount,
                    error = %err,
                    "Withdrawal rolled back"
                );
                return Err(err);
            }

            debug!(account = %account, amount = %amount, tx_id, "Withdrawal paid");
            Ok(tx_id)
        })
    }

    // ───────────────────────── Transfer ─────────────────────────

    /// Move `amount` from the caller to `recipient` inside the ledger.
    pub fn transfer_to(
        &mut self,
        ctx: &CallContext,
        recipient: AccountId,
        amount: u128,
    ) -> Result<u64, LedgerError> {
        self.non_reentrant("transfer", |bank| {
            bank.pause_guard.ensure_running()?;
            let sender = ctx.caller;
            if recipient.is_zero() {
                return Err(LedgerError::InvalidRecipient);
            }
            if recipient == sender {
                return Err(LedgerError::TransferToSelf);
            }
            if amount == 0 {
                return Err(LedgerError::InvalidAmount);
            }

            let (sender_state, sender_seq) = bank.debited(&sender, amount, ctx.timestamp)?;
            let (recipient_state, created) = bank.credited(&recipient, amount, ctx.timestamp)?;
            let (recipient_state, recipient_seq) =
                Self::next_activity(recipient_state, ctx.timestamp)?;
            let total_users = bank.users_after(created)?;
            let tx_id = bank.next_tx_id()?;

            // Effects
            bank.commit_account(sender, sender_state, sender_seq, amount, TransactionKind::Transfer, ctx);
            bank.commit_account(
                recipient,
                recipient_state,
                recipient_seq,
                amount,
                TransactionKind::Transfer,
                ctx,
            );
            bank.info.total_users = total_users;
            bank.last_tx_id = tx_id;

            if created {
                bank.emit_account_created(recipient, ctx.timestamp);
            }
            bank.events.push(LedgerEvent::Transferred(Transferred {
                tx_id,
                from: sender,
                to: recipient,
                amount,
                timestamp: ctx.timestamp,
            }));
            bank.maybe_alert(sender, amount, TransactionKind::Transfer, ctx.timestamp);

            debug!(
                from = %sender,
                to = %recipient,
                amount = %amount,
                tx_id,
                "Transfer booked"
            );
            Ok(tx_id)
        })
    }

    // ───────────────────────── Profiles ─────────────────────────

    pub fn set_profile(&mut self, ctx: &CallContext, hash: &str) -> Result<(), LedgerError> {
        self.non_reentrant("set_profile", |bank| {
            bank.pause_guard.ensure_running()?;
            let event = bank.profiles.set_profile(ctx.caller, hash, ctx.timestamp)?;
            bank.events.push(LedgerEvent::ProfileUpdated(event));
            Ok(())
        })
    }

    /// Append a receipt reference. Returns its index.
    pub fn add_receipt(&mut self, ctx: &CallContext, hash: &str) -> Result<usize, LedgerError> {
        self.non_reentrant("add_receipt", |bank| {
            bank.pause_guard.ensure_running()?;
            let event = bank.profiles.add_receipt(ctx.caller, hash, ctx.timestamp)?;
            let index = event.index;
            bank.events.push(LedgerEvent::ReceiptAdded(event));
            Ok(index)
        })
    }

    pub fn profile_of(&self, identity: &AccountId) -> &str {
        self.profiles.profile_of(identity)
    }

    pub fn profile_record_of(&self, identity: &AccountId) -> Option<&ProfileRecord> {
        self.profiles.record_of(identity)
    }

    pub fn receipts_of(&self, identity: &AccountId) -> &[String] {
        self.profiles.receipts_of(identity)
    }

    pub fn receipt_count_of(&self, identity: &AccountId) -> usize {
        self.profiles.receipt_count_of(identity)
    }

    // ───────────────────────── Balance Queries ─────────────────────────

    pub fn balance_of(&self, identity: &AccountId) -> u128 {
        self.accounts.get(identity).map_or(0, |a| a.balance)
    }

    pub fn account(&self, identity: &AccountId) -> Option<&Account> {
        self.accounts.get(identity)
    }

    /// Account statistics as of `now`. Unknown identities read as inactive.
    pub fn stats_of(&self, identity: &AccountId, now: i64) -> AccountStats {
        let account = self.accounts.get(identity).copied().unwrap_or_default();
        let age_secs = if account.is_active {
            now.saturating_sub(account.created_at)
        } else {
            0
        };
        AccountStats {
            balance: account.balance,
            last_activity_time: account.last_activity_time,
            transaction_count: account.transaction_count,
            created_at: account.created_at,
            is_active: account.is_active,
            age_secs,
        }
    }

    pub fn bank_stats(&self) -> BankStats {
        BankStats {
            owner: self.info.owner,
            total_deposits: self.info.total_deposits.get(),
            total_users: self.info.total_users,
            emergency_mode: self.info.emergency_mode,
            held_balance: self.held_balance,
        }
    }

    pub fn bank_info(&self) -> &BankInfo {
        &self.info
    }

    /// The last ten transactions as stored; vacant slots are default entries.
    pub fn recent_transactions_of(&self, identity: &AccountId) -> HistoryRing {
        self.history.recent(identity)
    }

    // ───────────────────────── Oracle ─────────────────────────

    pub fn latest_price(&self, now: i64) -> Result<PriceReading, LedgerError> {
        Ok(self.oracle.latest_price(now)?)
    }

    /// Balance valued in the quote currency, at the feed's price scale.
    pub fn balance_in_quote_currency(
        &self,
        identity: &AccountId,
        now: i64,
    ) -> Result<u128, LedgerError> {
        let reading = self.oracle.latest_price(now)?;
        quote_value(self.balance_of(identity), reading.price).ok_or(LedgerError::InvalidAmount)
    }

    /// Estimated interest accrued since the account's last activity.
    /// Read-only: touches no state and emits nothing.
    pub fn calculate_interest(&self, identity: &AccountId, now: i64) -> Result<u128, LedgerError> {
        let account = match self.accounts.get(identity) {
            Some(a) if a.is_active && a.balance > 0 => *a,
            _ => return Ok(0),
        };
        let reading = self.oracle.latest_price(now)?;
        let elapsed = now.saturating_sub(account.last_activity_time);
        accrued_interest(account.balance, reading.price, elapsed, &self.config)
            .ok_or(LedgerError::InvalidAmount)
    }

    /// Rewire the oracle source. Admin-only.
    pub fn set_price_feed(
        &mut self,
        ctx: &CallContext,
        feed: Box<dyn PriceFeed>,
    ) -> Result<(), LedgerError> {
        self.non_reentrant("set_price_feed", |bank| {
            bank.access_control.require_role(&ctx.caller, Role::Admin)?;
            bank.oracle = PriceOracle::new(feed, bank.config.oracle_max_age_secs);
            info!(by = %ctx.caller, "Price feed replaced");
            Ok(())
        })
    }

    // ───────────────────────── Administration ─────────────────────────

    /// Pause the ledger. Admin-only. Returns `false` if it was already paused.
    pub fn pause(&mut self, ctx: &CallContext) -> Result<bool, LedgerError> {
        self.non_reentrant("pause", |bank| {
            bank.access_control.require_role(&ctx.caller, Role::Admin)?;
            let changed = bank.pause_guard.pause();
            if changed {
                bank.events.push(LedgerEvent::Paused { by: ctx.caller });
                info!(by = %ctx.caller, "Ledger paused");
            }
            Ok(changed)
        })
    }

    /// Unpause the ledger. Admin-only. Returns `false` if it was not paused.
    pub fn unpause(&mut self, ctx: &CallContext) -> Result<bool, LedgerError> {
        self.non_reentrant("unpause", |bank| {
            bank.access_control.require_role(&ctx.caller, Role::Admin)?;
            let changed = bank.pause_guard.unpause();
            if changed {
                bank.events.push(LedgerEvent::Unpaused { by: ctx.caller });
                info!(by = %ctx.caller, "Ledger unpaused");
            }
            Ok(changed)
        })
    }

    pub fn is_paused(&self) -> bool {
        self.pause_guard.is_paused()
    }

    /// Flip the emergency flag. Admin-only; usable while paused.
    pub fn toggle_emergency_mode(&mut self, ctx: &CallContext) -> Result<bool, LedgerError> {
        self.non_reentrant("toggle_emergency_mode", |bank| {
            bank.access_control.require_role(&ctx.caller, Role::Admin)?;
            bank.info.emergency_mode = !bank.info.emergency_mode;
            let enabled = bank.info.emergency_mode;
            bank.events
                .push(LedgerEvent::EmergencyModeToggled(EmergencyModeToggled {
                    enabled,
                    by: ctx.caller,
                    timestamp: ctx.timestamp,
                }));
            warn!(enabled, by = %ctx.caller, "Emergency mode toggled");
            Ok(enabled)
        })
    }

    /// Pay the whole held balance to the owner via `owner_payee`.
    ///
    /// Admin-only, and only while paused: this is the one fund movement
    /// available during a halt. Account balances are left untouched.
    pub fn emergency_drain(
        &mut self,
        ctx: &CallContext,
        owner_payee: &mut dyn Payee,
    ) -> Result<u128, LedgerError> {
        self.non_reentrant("emergency_drain", |bank| {
            bank.access_control.require_role(&ctx.caller, Role::Admin)?;
            if !bank.pause_guard.is_paused() {
                return Err(LedgerError::NotPaused);
            }
            let owner = bank.info.owner;
            let amount = bank.held_balance;
            let checkpoint = bank.checkpoint(owner);

            bank.events.push(LedgerEvent::EmergencyDrained(EmergencyDrained {
                to: owner,
                amount,
                timestamp: ctx.timestamp,
            }));

            if let Err(err) = bank.pay_out(amount, owner_payee) {
                bank.rollback(checkpoint);
                warn!(amount = %amount, error = %err, "Emergency drain rolled back");
                return Err(err);
            }

            warn!(to = %owner, amount = %amount, by = %ctx.caller, "Emergency drain executed");
            Ok(amount)
        })
    }

    /// Grant a role. Admin-only. Returns `true` if newly granted.
    pub fn grant_role(
        &mut self,
        ctx: &CallContext,
        role: Role,
        identity: AccountId,
    ) -> Result<bool, LedgerError> {
        self.non_reentrant("grant_role", |bank| {
            let granted = bank.access_control.grant_role(&ctx.caller, role, identity)?;
            if granted {
                bank.events.push(LedgerEvent::RoleGranted(RoleChanged {
                    role,
                    account: identity,
                    by: ctx.caller,
                }));
                info!(role = ?role, account = %identity, by = %ctx.caller, "Role granted");
            }
            Ok(granted)
        })
    }

    /// Revoke a role. Admin-only. The owner keeps `Admin`.
    pub fn revoke_role(
        &mut self,
        ctx: &CallContext,
        role: Role,
        identity: AccountId,
    ) -> Result<bool, LedgerError> {
        self.non_reentrant("revoke_role", |bank| {
            let revoked = bank.access_control.revoke_role(&ctx.caller, role, &identity)?;
            if revoked {
                bank.events.push(LedgerEvent::RoleRevoked(RoleChanged {
                    role,
                    account: identity,
                    by: ctx.caller,
                }));
                info!(role = ?role, account = %identity, by = %ctx.caller, "Role revoked");
            }
            Ok(revoked)
        })
    }

    pub fn has_role(&self, identity: &AccountId, role: Role) -> bool {
        self.access_control.has_role(identity, role)
    }

    pub fn roles_of(&self, identity: &AccountId) -> Vec<Role> {
        self.access_control.roles_of(identity)
    }

    /// Recompute the conservation invariant. Admin or Auditor.
    pub fn audit_conservation(&self, caller: &AccountId) -> Result<ConservationReport, LedgerError> {
        self.access_control
            .require_any(caller, &[Role::Admin, Role::Auditor])?;
        let sum_of_balances = self
            .accounts
            .values()
            .fold(0u128, |acc, a| acc.saturating_add(a.balance));
        let total_deposits = self.info.total_deposits.get();
        Ok(ConservationReport {
            sum_of_balances,
            total_deposits,
            accounts: self.accounts.len(),
            held_balance: self.held_balance,
            holds: sum_of_balances == total_deposits,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    ///
    /// Returns nothing while an operation is in flight: its events are not
    /// final until the operation commits.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        if self.reentrancy_guard.is_locked() {
            warn!("Event drain refused during an in-flight operation");
            return Vec::new();
        }
        std::mem::take(&mut self.events)
    }

    // ───────────────────────── Internal ─────────────────────────

    /// Run `body` holding the reentrancy guard. The guard is released when
    /// `body` returns or unwinds.
    fn non_reentrant<T>(
        &mut self,
        operation: &'static str,
        body: impl FnOnce(&mut Self) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        if !self.reentrancy_guard.acquire() {
            warn!(operation, "Reentrant call rejected");
            return Err(LedgerError::Reentrancy);
        }
        let mut held = HeldGuard { bank: self };
        let result = body(&mut *held.bank);
        drop(held);
        result
    }

    /// Move `amount` out of custody to `payee`. The payee runs with the guard
    /// still held.
    fn pay_out(&mut self, amount: u128, payee: &mut dyn Payee) -> Result<(), LedgerError> {
        let held = self.held_balance;
        self.held_balance =
            held.checked_sub(amount)
                .ok_or_else(|| LedgerError::PaymentTransferFailed {
                    reason: format!("held balance {held} cannot cover {amount}"),
                })?;
        match panic::catch_unwind(AssertUnwindSafe(|| payee.accept(self, amount))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(rejected)) => Err(LedgerError::PaymentTransferFailed {
                reason: rejected.to_string(),
            }),
            Err(payload) => Err(LedgerError::PaymentTransferFailed {
                reason: format!("payee panicked: {}", panic_message(payload.as_ref())),
            }),
        }
    }

    fn checkpoint(&self, account: AccountId) -> Checkpoint {
        Checkpoint {
            account,
            account_state: self.accounts.get(&account).copied(),
            ring: self.history.snapshot(&account),
            info: self.info.clone(),
            held_balance: self.held_balance,
            last_tx_id: self.last_tx_id,
            events_len: self.events.len(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        match checkpoint.account_state {
            Some(state) => {
                self.accounts.insert(checkpoint.account, state);
            }
            None => {
                self.accounts.remove(&checkpoint.account);
            }
        }
        self.history.restore(checkpoint.account, checkpoint.ring);
        self.info = checkpoint.info;
        self.held_balance = checkpoint.held_balance;
        self.last_tx_id = checkpoint.last_tx_id;
        self.events.truncate(checkpoint.events_len);
    }

    /// State of `account` after crediting `amount`, activated if new.
    fn credited(
        &self,
        account: &AccountId,
        amount: u128,
        now: i64,
    ) -> Result<(Account, bool), LedgerError> {
        let mut state = self.accounts.get(account).copied().unwrap_or_default();
        let created = !state.is_active;
        if created {
            state.is_active = true;
            state.created_at = now;
        }
        state.balance = state
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount)?;
        Ok((state, created))
    }

    /// State of `account` after debiting `amount` and recording one activity.
    fn debited(
        &self,
        account: &AccountId,
        amount: u128,
        now: i64,
    ) -> Result<(Account, u32), LedgerError> {
        let mut state = self.accounts.get(account).copied().unwrap_or_default();
        if state.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: state.balance,
            });
        }
        state.balance -= amount;
        Self::next_activity(state, now)
    }

    /// Bump the activity counters; returns the history sequence to write.
    fn next_activity(mut state: Account, now: i64) -> Result<(Account, u32), LedgerError> {
        let sequence = state.transaction_count;
        state.transaction_count = sequence.checked_add(1).ok_or(LedgerError::InvalidAmount)?;
        state.last_activity_time = now;
        Ok((state, sequence))
    }

    fn users_after(&self, created: bool) -> Result<u32, LedgerError> {
        if !created {
            return Ok(self.info.total_users);
        }
        self.info
            .total_users
            .checked_add(1)
            .ok_or(LedgerError::InvalidAmount)
    }

    fn next_tx_id(&self) -> Result<u64, LedgerError> {
        self.last_tx_id
            .checked_add(1)
            .ok_or(LedgerError::InvalidAmount)
    }

    fn commit_account(
        &mut self,
        account: AccountId,
        state: Account,
        sequence: u32,
        amount: u128,
        kind: TransactionKind,
        ctx: &CallContext,
    ) {
        self.accounts.insert(account, state);
        self.history.record(
            account,
            sequence,
            Transaction {
                timestamp: ctx.timestamp,
                amount,
                kind,
                block_reference: ctx.block_number,
            },
        );
    }

    fn emit_account_created(&mut self, account: AccountId, timestamp: i64) {
        self.events
            .push(LedgerEvent::AccountCreated(AccountCreated { account, timestamp }));
    }

    fn maybe_alert(&mut self, account: AccountId, amount: u128, kind: TransactionKind, timestamp: i64) {
        if amount >= self.config.large_transaction_threshold {
            self.events
                .push(LedgerEvent::LargeTransactionAlert(LargeTransactionAlert {
                    account,
                    amount,
                    kind,
                    timestamp,
                }));
        }
    }
}

/// Releases the reentrancy guard on drop, including during unwinding.
struct HeldGuard<'a> {
    bank: &'a mut Bank,
}

impl Drop for HeldGuard<'_> {
    fn drop(&mut self) {
        self.bank.reentrancy_guard.release();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown cause"
    }
}
