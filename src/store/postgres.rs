//! Postgres ledger store
//!
//! Production implementation of [`LedgerStore`]. Each mutating operation
//! runs in one database transaction with the affected account row(s)
//! locked via `SELECT ... FOR UPDATE`, so the rules see the state they
//! mutate and the balance update commits together with the ledger row.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as PgTransaction};
use uuid::Uuid;

use crate::domain::{
    rules, Account, AccountType, Address, Amount, Balance, BankState, DomainError, Gender,
    LoanStatus, Owner, Transaction, TransactionKind, TransferRecord,
};

use super::{
    DateRange, LedgerReport, LedgerStore, NewProfile, Registration, StoreError, StoreResult,
    TransferOutcome,
};

/// Store backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type AccountRow = (
    i64,       // id
    i64,       // account_no
    String,    // username
    String,    // first_name
    String,    // last_name
    String,    // email
    String,    // account_type
    String,    // gender
    NaiveDate, // birth_date
    NaiveDate, // initial_deposit_date
    Decimal,   // balance
);

type TransactionRow = (
    i64,           // id
    i64,           // account_id
    Decimal,       // amount
    Decimal,       // balance_after
    i16,           // kind
    DateTime<Utc>, // created_at
    bool,          // loan_approve
    bool,          // loan_settled
);

const ACCOUNT_COLUMNS: &str = "id, account_no, username, first_name, last_name, email, \
                               account_type, gender, birth_date, initial_deposit_date, balance";

const TRANSACTION_COLUMNS: &str =
    "id, account_id, amount, balance_after, kind, created_at, loan_approve, loan_settled";

fn decode_error(message: String) -> StoreError {
    StoreError::Database(sqlx::Error::Decode(message.into()))
}

fn account_from_row(row: AccountRow) -> StoreResult<Account> {
    let (
        id,
        account_no,
        username,
        first_name,
        last_name,
        email,
        account_type,
        gender,
        birth_date,
        initial_deposit_date,
        balance,
    ) = row;

    let account_type = AccountType::parse(&account_type)
        .ok_or_else(|| decode_error(format!("unknown account type '{account_type}'")))?;
    let gender = Gender::parse(&gender)
        .ok_or_else(|| decode_error(format!("unknown gender '{gender}'")))?;
    let balance =
        Balance::new(balance).map_err(|e| decode_error(format!("invalid balance: {e}")))?;

    Ok(Account {
        id,
        account_no,
        owner: Owner {
            username,
            first_name,
            last_name,
            email,
        },
        account_type,
        gender,
        birth_date,
        initial_deposit_date,
        balance,
    })
}

fn transaction_from_row(row: TransactionRow) -> StoreResult<Transaction> {
    let (id, account_id, amount, balance_after, kind, created_at, loan_approve, loan_settled) = row;

    let kind = TransactionKind::from_code(kind)
        .ok_or_else(|| decode_error(format!("unknown transaction kind code {kind}")))?;

    Ok(Transaction {
        id,
        account_id,
        amount,
        balance_after,
        kind,
        timestamp: created_at,
        loan_approve,
        loan_settled,
    })
}

/// Lock one account row for the duration of the enclosing transaction.
async fn lock_account(
    tx: &mut PgTransaction<'_, Postgres>,
    account_id: i64,
) -> StoreResult<Account> {
    let row: Option<AccountRow> = sqlx::query_as(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR UPDATE"
    ))
    .bind(account_id)
    .fetch_optional(&mut **tx)
    .await?;

    let row = row.ok_or(DomainError::AccountNotFound(account_id))?;
    account_from_row(row)
}

async fn update_balance(
    tx: &mut PgTransaction<'_, Postgres>,
    account_id: i64,
    balance: &Balance,
) -> StoreResult<()> {
    sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
        .bind(account_id)
        .bind(balance.value())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Append a ledger row capturing the balance at the moment of recording.
/// Must run after the mutation it records, inside the same transaction.
async fn record(
    tx: &mut PgTransaction<'_, Postgres>,
    account_id: i64,
    amount: Decimal,
    balance_after: Decimal,
    kind: TransactionKind,
    loan_approve: bool,
) -> StoreResult<Transaction> {
    let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
        r#"
        INSERT INTO transactions (account_id, amount, balance_after, kind, loan_approve)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, created_at
        "#,
    )
    .bind(account_id)
    .bind(amount)
    .bind(balance_after)
    .bind(kind.code())
    .bind(loan_approve)
    .fetch_one(&mut **tx)
    .await?;

    Ok(Transaction {
        id,
        account_id,
        amount,
        balance_after,
        kind,
        timestamp: created_at,
        loan_approve,
        loan_settled: false,
    })
}

async fn lock_loan(
    tx: &mut PgTransaction<'_, Postgres>,
    loan_id: i64,
) -> StoreResult<Transaction> {
    let row: Option<TransactionRow> = sqlx::query_as(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 FOR UPDATE"
    ))
    .bind(loan_id)
    .fetch_optional(&mut **tx)
    .await?;

    let loan = row
        .map(transaction_from_row)
        .transpose()?
        .filter(|t| t.loan_status().is_some())
        .ok_or(DomainError::LoanNotFound(loan_id))?;

    Ok(loan)
}

fn balance_error(e: crate::domain::AmountError) -> StoreError {
    DomainError::validation("amount", e.to_string()).into()
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn register(&self, profile: NewProfile) -> StoreResult<Registration> {
        let mut tx = self.pool.begin().await?;

        let inserted: Result<(i64, i64, NaiveDate), sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO accounts
                (username, first_name, last_name, email, account_type, gender, birth_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, account_no, initial_deposit_date
            "#,
        )
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(profile.account_type.as_str())
        .bind(profile.gender.as_str())
        .bind(profile.birth_date)
        .fetch_one(&mut *tx)
        .await;

        let (id, account_no, initial_deposit_date) = inserted.map_err(|e| {
            if e.as_database_error()
                .is_some_and(|d| d.is_unique_violation())
            {
                StoreError::Domain(DomainError::validation(
                    "username",
                    "A user with that username already exists.",
                ))
            } else {
                StoreError::Database(e)
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO addresses (account_id, street, city, post_code, country)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&profile.street)
        .bind(&profile.city)
        .bind(profile.post_code)
        .bind(&profile.country)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Registration {
            account: Account {
                id,
                account_no,
                owner: Owner {
                    username: profile.username,
                    first_name: profile.first_name,
                    last_name: profile.last_name,
                    email: profile.email,
                },
                account_type: profile.account_type,
                gender: profile.gender,
                birth_date: profile.birth_date,
                initial_deposit_date,
                balance: Balance::zero(),
            },
            address: Address {
                account_id: id,
                street: profile.street,
                city: profile.city,
                post_code: profile.post_code,
                country: profile.country,
            },
        })
    }

    async fn account(&self, account_id: i64) -> StoreResult<Account> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(DomainError::AccountNotFound(account_id))?;
        account_from_row(row)
    }

    async fn account_by_no(&self, account_no: i64) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_no = $1"
        ))
        .bind(account_no)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn address(&self, account_id: i64) -> StoreResult<Address> {
        let row: Option<(i64, String, String, i32, String)> = sqlx::query_as(
            "SELECT account_id, street, city, post_code, country FROM addresses WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        let (account_id, street, city, post_code, country) =
            row.ok_or(DomainError::AccountNotFound(account_id))?;

        Ok(Address {
            account_id,
            street,
            city,
            post_code,
            country,
        })
    }

    async fn deposit(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let account = lock_account(&mut tx, account_id).await?;
        rules::deposit_amount(amount)?;

        let new_balance = account.balance.credit(amount).map_err(balance_error)?;
        update_balance(&mut tx, account_id, &new_balance).await?;

        let transaction = record(
            &mut tx,
            account_id,
            amount.value(),
            new_balance.value(),
            TransactionKind::Deposit,
            false,
        )
        .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    async fn withdraw(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let bank = bank_state(&mut tx).await?;
        let account = lock_account(&mut tx, account_id).await?;
        rules::withdrawal_amount(amount, &account.balance, &bank)?;

        let new_balance = account.balance.debit(amount).map_err(balance_error)?;
        update_balance(&mut tx, account_id, &new_balance).await?;

        let transaction = record(
            &mut tx,
            account_id,
            amount.value(),
            new_balance.value(),
            TransactionKind::Withdrawal,
            false,
        )
        .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    async fn request_loan(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let account = lock_account(&mut tx, account_id).await?;
        rules::loan_amount(amount)?;

        let approved_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE account_id = $1 AND kind = $2 AND loan_approve = TRUE
            "#,
        )
        .bind(account_id)
        .bind(TransactionKind::Loan.code())
        .fetch_one(&mut *tx)
        .await?;

        rules::loan_cap(approved_count)?;

        let transaction = record(
            &mut tx,
            account_id,
            amount.value(),
            account.balance.value(),
            TransactionKind::Loan,
            false,
        )
        .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    async fn approve_loan(&self, loan_id: i64) -> StoreResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let mut loan = lock_loan(&mut tx, loan_id).await?;
        if loan.loan_status() != Some(LoanStatus::Requested) {
            return Err(DomainError::LoanAlreadyApproved(loan_id).into());
        }

        let amount = Amount::new(loan.amount).map_err(balance_error)?;
        let account = lock_account(&mut tx, loan.account_id).await?;
        let new_balance = account.balance.credit(&amount).map_err(balance_error)?;
        update_balance(&mut tx, loan.account_id, &new_balance).await?;

        sqlx::query(
            "UPDATE transactions SET loan_approve = TRUE, balance_after = $2 WHERE id = $1",
        )
        .bind(loan_id)
        .bind(new_balance.value())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        loan.loan_approve = true;
        loan.balance_after = new_balance.value();
        Ok(loan)
    }

    async fn pay_loan(&self, loan_id: i64) -> StoreResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let mut loan = lock_loan(&mut tx, loan_id).await?;
        if loan.loan_status() != Some(LoanStatus::Approved) {
            return Err(DomainError::LoanNotApproved(loan_id).into());
        }

        let account = lock_account(&mut tx, loan.account_id).await?;
        if loan.amount >= account.balance.value() {
            return Err(
                DomainError::insufficient_balance(loan.amount, account.balance.value()).into(),
            );
        }

        let amount = Amount::new(loan.amount).map_err(balance_error)?;
        let new_balance = account.balance.debit(&amount).map_err(balance_error)?;
        update_balance(&mut tx, loan.account_id, &new_balance).await?;

        sqlx::query(
            r#"
            UPDATE transactions
            SET kind = $2, balance_after = $3, loan_settled = TRUE
            WHERE id = $1
            "#,
        )
        .bind(loan_id)
        .bind(TransactionKind::LoanPaid.code())
        .bind(new_balance.value())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        loan.kind = TransactionKind::LoanPaid;
        loan.balance_after = new_balance.value();
        loan.loan_settled = true;
        Ok(loan)
    }

    async fn transfer(
        &self,
        sender_account_id: i64,
        receiver_account_no: i64,
        amount: &Amount,
    ) -> StoreResult<TransferOutcome> {
        let mut tx = self.pool.begin().await?;

        let receiver_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM accounts WHERE account_no = $1")
                .bind(receiver_account_no)
                .fetch_optional(&mut *tx)
                .await?;
        let receiver_id = receiver_id.ok_or(DomainError::ReceiverNotFound(receiver_account_no))?;

        // Lock both rows in id order so concurrent transfers cannot deadlock.
        let (first, second) = if sender_account_id <= receiver_id {
            (sender_account_id, receiver_id)
        } else {
            (receiver_id, sender_account_id)
        };
        let first_account = lock_account(&mut tx, first).await?;
        let second_account = if second == first {
            first_account.clone()
        } else {
            lock_account(&mut tx, second).await?
        };

        let (sender, receiver) = if first == sender_account_id {
            (first_account, second_account)
        } else {
            (second_account, first_account)
        };

        rules::transfer_amount(amount, &sender.balance)?;

        // Both legs inside this transaction: all-or-nothing.
        let sender_balance = sender.balance.debit(amount).map_err(balance_error)?;
        update_balance(&mut tx, sender.id, &sender_balance).await?;

        let receiver_balance = if receiver.id == sender.id {
            sender_balance.credit(amount).map_err(balance_error)?
        } else {
            receiver.balance.credit(amount).map_err(balance_error)?
        };
        update_balance(&mut tx, receiver.id, &receiver_balance).await?;

        let record = TransferRecord {
            id: Uuid::new_v4(),
            sender_account_id,
            receiver_account_no,
            amount: amount.value(),
        };

        sqlx::query(
            r#"
            INSERT INTO transfers (id, sender_account_id, receiver_account_no, amount)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.id)
        .bind(record.sender_account_id)
        .bind(record.receiver_account_no)
        .bind(record.amount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut sender = sender;
        let mut receiver = receiver;
        sender.balance = sender_balance;
        receiver.balance = receiver_balance;

        Ok(TransferOutcome {
            record,
            sender,
            receiver,
        })
    }

    async fn transactions(
        &self,
        account_id: i64,
        range: Option<DateRange>,
    ) -> StoreResult<LedgerReport> {
        let account = self.account(account_id).await?;

        let rows: Vec<TransactionRow> = match range {
            Some(r) => {
                sqlx::query_as(&format!(
                    r#"
                    SELECT {TRANSACTION_COLUMNS} FROM transactions
                    WHERE account_id = $1
                      AND created_at::date BETWEEN $2 AND $3
                    ORDER BY created_at ASC, id ASC
                    "#
                ))
                .bind(account_id)
                .bind(r.start)
                .bind(r.end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    r#"
                    SELECT {TRANSACTION_COLUMNS} FROM transactions
                    WHERE account_id = $1
                    ORDER BY created_at ASC, id ASC
                    "#
                ))
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let transactions = rows
            .into_iter()
            .map(transaction_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        // Total the rows actually returned, so the sum can never drift
        // from the listing under concurrent commits.
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
        // Existence check keeps the 404 semantics of the account lookup.
        self.account(account_id).await?;

        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM transactions
            WHERE account_id = $1 AND kind = $2
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(account_id)
        .bind(TransactionKind::Loan.code())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(transaction_from_row).collect()
    }

    async fn bank(&self) -> StoreResult<BankState> {
        let is_bankrupt: bool = sqlx::query_scalar("SELECT is_bankrupt FROM bank LIMIT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(BankState { is_bankrupt })
    }

    async fn set_bankrupt(&self, is_bankrupt: bool) -> StoreResult<BankState> {
        sqlx::query("UPDATE bank SET is_bankrupt = $1")
            .bind(is_bankrupt)
            .execute(&self.pool)
            .await?;
        Ok(BankState { is_bankrupt })
    }
}

async fn bank_state(tx: &mut PgTransaction<'_, Postgres>) -> StoreResult<BankState> {
    let is_bankrupt: bool = sqlx::query_scalar("SELECT is_bankrupt FROM bank LIMIT 1")
        .fetch_one(&mut **tx)
        .await?;
    Ok(BankState { is_bankrupt })
}
