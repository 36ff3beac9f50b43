//! In-memory ledger store
//!
//! Backs the test suite and doubles as the reference implementation of
//! the atomicity contract: every mutating operation runs under one write
//! lock over the whole ledger, so validation, balance mutation and row
//! recording are a single unit, and both legs of a transfer commit
//! together.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    account_no_for, rules, Account, Address, Amount, Balance, BankState, DomainError, LoanStatus,
    Transaction, TransactionKind, TransferRecord,
};

use super::{
    DateRange, LedgerReport, LedgerStore, NewProfile, Registration, StoreResult, TransferOutcome,
};

#[derive(Debug, Default)]
struct Inner {
    accounts: BTreeMap<i64, Account>,
    addresses: BTreeMap<i64, Address>,
    transactions: BTreeMap<i64, Transaction>,
    transfers: Vec<TransferRecord>,
    bank: BankState,
    next_account_id: i64,
    next_transaction_id: i64,
}

impl Inner {
    fn alloc_account_id(&mut self) -> i64 {
        self.next_account_id += 1;
        self.next_account_id
    }

    fn alloc_transaction_id(&mut self) -> i64 {
        self.next_transaction_id += 1;
        self.next_transaction_id
    }

    /// Append a ledger row capturing the balance at the moment of
    /// recording. Must be called after the mutation it records.
    fn record(
        &mut self,
        account_id: i64,
        amount: Decimal,
        balance_after: Decimal,
        kind: TransactionKind,
        loan_approve: bool,
    ) -> Transaction {
        let id = self.alloc_transaction_id();
        let transaction = Transaction {
            id,
            account_id,
            amount,
            balance_after,
            kind,
            timestamp: Utc::now(),
            loan_approve,
            loan_settled: false,
        };
        self.transactions.insert(id, transaction.clone());
        transaction
    }

    fn account(&self, account_id: i64) -> Result<&Account, DomainError> {
        self.accounts
            .get(&account_id)
            .ok_or(DomainError::AccountNotFound(account_id))
    }

    fn account_mut(&mut self, account_id: i64) -> Result<&mut Account, DomainError> {
        self.accounts
            .get_mut(&account_id)
            .ok_or(DomainError::AccountNotFound(account_id))
    }

    fn approved_loan_count(&self, account_id: i64) -> i64 {
        self.transactions
            .values()
            .filter(|t| {
                t.account_id == account_id && t.kind == TransactionKind::Loan && t.loan_approve
            })
            .count() as i64
    }
}

/// Lock-backed store over plain maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn balance_error(e: crate::domain::AmountError) -> DomainError {
    DomainError::validation("amount", e.to_string())
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn register(&self, profile: NewProfile) -> StoreResult<Registration> {
        let mut inner = self.write();

        if inner
            .accounts
            .values()
            .any(|a| a.owner.username == profile.username)
        {
            return Err(DomainError::validation(
                "username",
                "A user with that username already exists.",
            )
            .into());
        }

        let id = inner.alloc_account_id();
        let account = Account {
            id,
            account_no: account_no_for(id),
            owner: crate::domain::Owner {
                username: profile.username,
                first_name: profile.first_name,
                last_name: profile.last_name,
                email: profile.email,
            },
            account_type: profile.account_type,
            gender: profile.gender,
            birth_date: profile.birth_date,
            initial_deposit_date: Utc::now().date_naive(),
            balance: Balance::zero(),
        };
        let address = Address {
            account_id: id,
            street: profile.street,
            city: profile.city,
            post_code: profile.post_code,
            country: profile.country,
        };

        inner.accounts.insert(id, account.clone());
        inner.addresses.insert(id, address.clone());

        Ok(Registration { account, address })
    }

    async fn account(&self, account_id: i64) -> StoreResult<Account> {
        let inner = self.read();
        Ok(inner.account(account_id)?.clone())
    }

    async fn account_by_no(&self, account_no: i64) -> StoreResult<Option<Account>> {
        let inner = self.read();
        Ok(inner
            .accounts
            .values()
            .find(|a| a.account_no == account_no)
            .cloned())
    }

    async fn address(&self, account_id: i64) -> StoreResult<Address> {
        let inner = self.read();
        inner
            .addresses
            .get(&account_id)
            .cloned()
            .ok_or_else(|| DomainError::AccountNotFound(account_id).into())
    }

    async fn deposit(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction> {
        let mut inner = self.write();

        // Account resolution comes first; amount rules apply to accounts
        // that exist.
        let account = inner.account_mut(account_id)?;
        rules::deposit_amount(amount)?;
        let new_balance = account.balance.credit(amount).map_err(balance_error)?;
        account.balance = new_balance.clone();

        Ok(inner.record(
            account_id,
            amount.value(),
            new_balance.value(),
            TransactionKind::Deposit,
            false,
        ))
    }

    async fn withdraw(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction> {
        let mut inner = self.write();

        let bank = inner.bank;
        let account = inner.account_mut(account_id)?;
        rules::withdrawal_amount(amount, &account.balance, &bank)?;

        let new_balance = account.balance.debit(amount).map_err(balance_error)?;
        account.balance = new_balance.clone();

        Ok(inner.record(
            account_id,
            amount.value(),
            new_balance.value(),
            TransactionKind::Withdrawal,
            false,
        ))
    }

    async fn request_loan(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction> {
        let mut inner = self.write();

        let snapshot = inner.account(account_id)?.balance.value();
        rules::loan_amount(amount)?;
        rules::loan_cap(inner.approved_loan_count(account_id))?;

        Ok(inner.record(
            account_id,
            amount.value(),
            snapshot,
            TransactionKind::Loan,
            false,
        ))
    }

    async fn approve_loan(&self, loan_id: i64) -> StoreResult<Transaction> {
        let mut inner = self.write();

        let loan = inner
            .transactions
            .get(&loan_id)
            .cloned()
            .filter(|t| t.loan_status().is_some())
            .ok_or(DomainError::LoanNotFound(loan_id))?;

        if loan.loan_status() != Some(LoanStatus::Requested) {
            return Err(DomainError::LoanAlreadyApproved(loan_id).into());
        }

        let amount = Amount::new(loan.amount).map_err(balance_error)?;
        let account = inner.account_mut(loan.account_id)?;
        let new_balance = account.balance.credit(&amount).map_err(balance_error)?;
        account.balance = new_balance.clone();

        let row = inner
            .transactions
            .get_mut(&loan_id)
            .ok_or(DomainError::LoanNotFound(loan_id))?;
        row.loan_approve = true;
        row.balance_after = new_balance.value();

        Ok(row.clone())
    }

    async fn pay_loan(&self, loan_id: i64) -> StoreResult<Transaction> {
        let mut inner = self.write();

        let loan = inner
            .transactions
            .get(&loan_id)
            .cloned()
            .filter(|t| t.loan_status().is_some())
            .ok_or(DomainError::LoanNotFound(loan_id))?;

        if loan.loan_status() != Some(LoanStatus::Approved) {
            return Err(DomainError::LoanNotApproved(loan_id).into());
        }

        let available = inner.account(loan.account_id)?.balance.value();
        if loan.amount >= available {
            return Err(DomainError::insufficient_balance(loan.amount, available).into());
        }

        let amount = Amount::new(loan.amount).map_err(balance_error)?;
        let account = inner.account_mut(loan.account_id)?;
        let new_balance = account.balance.debit(&amount).map_err(balance_error)?;
        account.balance = new_balance.clone();

        let row = inner
            .transactions
            .get_mut(&loan_id)
            .ok_or(DomainError::LoanNotFound(loan_id))?;
        row.kind = TransactionKind::LoanPaid;
        row.balance_after = new_balance.value();
        row.loan_settled = true;

        Ok(row.clone())
    }

    async fn transfer(
        &self,
        sender_account_id: i64,
        receiver_account_no: i64,
        amount: &Amount,
    ) -> StoreResult<TransferOutcome> {
        let mut inner = self.write();

        let sender_balance = inner.account(sender_account_id)?.balance.clone();
        let receiver_id = inner
            .accounts
            .values()
            .find(|a| a.account_no == receiver_account_no)
            .map(|a| a.id)
            .ok_or(DomainError::ReceiverNotFound(receiver_account_no))?;

        rules::transfer_amount(amount, &sender_balance)?;

        // Both legs under the same lock: all-or-nothing.
        let sender = inner.account_mut(sender_account_id)?;
        sender.balance = sender.balance.debit(amount).map_err(balance_error)?;

        let receiver = inner.account_mut(receiver_id)?;
        receiver.balance = receiver.balance.credit(amount).map_err(balance_error)?;

        let record = TransferRecord {
            id: Uuid::new_v4(),
            sender_account_id,
            receiver_account_no,
            amount: amount.value(),
        };
        inner.transfers.push(record.clone());

        Ok(TransferOutcome {
            record,
            sender: inner.account(sender_account_id)?.clone(),
            receiver: inner.account(receiver_id)?.clone(),
        })
    }

    async fn transactions(
        &self,
        account_id: i64,
        range: Option<DateRange>,
    ) -> StoreResult<LedgerReport> {
        let inner = self.read();

        let account = inner.account(account_id)?;

        let mut transactions: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .filter(|t| match range {
                Some(r) => r.contains(t.timestamp.date_naive()),
                None => true,
            })
            .cloned()
            .collect();
        transactions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        let total = match range {
            Some(_) => transactions.iter().map(|t| t.amount).sum(),
            None => account.balance.value(),
        };

        Ok(LedgerReport {
            transactions,
            total,
        })
    }

    async fn loans(&self, account_id: i64) -> StoreResult<Vec<Transaction>> {
        let inner = self.read();

        inner.account(account_id)?;

        let mut loans: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|t| t.account_id == account_id && t.kind == TransactionKind::Loan)
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        Ok(loans)
    }

    async fn bank(&self) -> StoreResult<BankState> {
        Ok(self.read().bank)
    }

    async fn set_bankrupt(&self, is_bankrupt: bool) -> StoreResult<BankState> {
        let mut inner = self.write();
        inner.bank.is_bankrupt = is_bankrupt;
        Ok(inner.bank)
    }
}
