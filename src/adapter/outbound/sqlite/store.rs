//! SQLite session store implementation.
//!
//! One store backs every storage port: sessions, bet records, the partner
//! hierarchy with its credentials, and the balance ledger. Diesel calls are
//! synchronous and short; they run inline on the calling task.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use rust_decimal::Decimal;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{
    CredentialRow, LedgerRow, NewBetRow, PartnerRow, ReconciliationRow, SessionRow, UserRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    bets, ledger, partners, provider_credentials, reconciliations, sessions, users,
};
use crate::domain::{
    GameSession, PartnerId, ProviderCredential, ProviderType, SessionId, SessionStatus,
    SessionUpdate, UserAccount, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::bets::BetActivityReader;
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::partner::PartnerDirectory;
use crate::port::outbound::store::SessionStore;

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Fixed-width RFC3339 so that text comparison orders chronologically.
pub(super) fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(super) fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("timestamp {raw:?}: {e}")))
}

fn parse_opt_ts(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_ts).transpose()
}

fn parse_decimal(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| Error::Parse(format!("decimal {raw:?}: {e}")))
}

/// SQLite-backed store for sessions, bets, partners and the ledger.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn> {
        self.pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))
    }

    fn to_row(session: &GameSession) -> SessionRow {
        SessionRow {
            id: session.id.to_string(),
            user_id: session.user_id.to_string(),
            provider: session.provider.as_str().to_string(),
            status: session.status.as_str().to_string(),
            launched_at: format_ts(session.launched_at),
            last_bet_at: session.last_bet_at.map(format_ts),
            last_bet_checked_at: session.last_bet_checked_at.map(format_ts),
            last_activity_at: format_ts(session.last_activity_at),
            balance_before: session.balance_before.map(|b| b.to_string()),
            ended_at: session.ended_at.map(format_ts),
            ready_marked_at: session.ready_marked_at.map(format_ts),
        }
    }

    fn from_row(row: SessionRow) -> Result<GameSession> {
        Ok(GameSession {
            id: SessionId::from(row.id),
            user_id: UserId::from(row.user_id),
            provider: ProviderType::from_str(&row.provider)?,
            status: SessionStatus::from_str(&row.status)?,
            launched_at: parse_ts(&row.launched_at)?,
            last_bet_at: parse_opt_ts(row.last_bet_at.as_deref())?,
            last_bet_checked_at: parse_opt_ts(row.last_bet_checked_at.as_deref())?,
            last_activity_at: parse_ts(&row.last_activity_at)?,
            balance_before: row.balance_before.as_deref().map(parse_decimal).transpose()?,
            ended_at: parse_opt_ts(row.ended_at.as_deref())?,
            ready_marked_at: parse_opt_ts(row.ready_marked_at.as_deref())?,
        })
    }

    /// Record a bet placed by `user`.
    pub fn record_bet(&self, user: &UserId, placed_at: DateTime<Utc>) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(bets::table)
            .values(&NewBetRow {
                user_id: user.to_string(),
                placed_at: format_ts(placed_at),
            })
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn upsert_account(&self, account: &UserAccount) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::replace_into(users::table)
            .values(&UserRow {
                id: account.user_id.to_string(),
                referrer_id: account.referrer.as_ref().map(ToString::to_string),
                external_username: account.external_username.clone(),
            })
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn upsert_partner(&self, partner: &PartnerId, parent: Option<&PartnerId>) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::replace_into(partners::table)
            .values(&PartnerRow {
                id: partner.to_string(),
                parent_id: parent.map(ToString::to_string),
            })
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    pub fn upsert_credential(&self, root: &PartnerId, credential: &ProviderCredential) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::replace_into(provider_credentials::table)
            .values(&CredentialRow {
                partner_id: root.to_string(),
                provider: credential.provider.as_str().to_string(),
                operator_code: credential.operator_code.clone(),
                secret_key: credential.secret_key.clone(),
                access_token: credential.access_token.clone(),
            })
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn insert(&self, session: &GameSession) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(sessions::table)
            .values(&Self::to_row(session))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<GameSession>> {
        let mut conn = self.conn()?;
        let row: Option<SessionRow> = sessions::table
            .find(id.as_str())
            .select(SessionRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(Self::from_row).transpose()
    }

    async fn list_by_status(&self, statuses: &[SessionStatus]) -> Result<Vec<GameSession>> {
        let mut conn = self.conn()?;
        let wanted: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let rows: Vec<SessionRow> = sessions::table
            .filter(sessions::status.eq_any(wanted))
            .order(sessions::launched_at.asc())
            .select(SessionRow::as_select())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::from_row).collect()
    }

    async fn compare_and_set(&self, update: &SessionUpdate) -> Result<bool> {
        let mut conn = self.conn()?;
        let row = Self::to_row(&update.next);
        let updated = diesel::update(
            sessions::table
                .filter(sessions::id.eq(&row.id))
                .filter(sessions::status.eq(update.expected.as_str())),
        )
        .set(&row)
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(updated > 0)
    }

    async fn mark_terminal(
        &self,
        id: &SessionId,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = self.conn()?;
        let live: Vec<&str> = SessionStatus::LIVE.iter().map(|s| s.as_str()).collect();
        let at = format_ts(at);
        let updated = diesel::update(
            sessions::table
                .filter(sessions::id.eq(id.as_str()))
                .filter(sessions::status.eq_any(live)),
        )
        .set((
            sessions::status.eq(status.as_str()),
            sessions::ended_at.eq(at.clone()),
            sessions::last_activity_at.eq(at),
        ))
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(updated > 0)
    }

    async fn claim_reconciliation(&self, id: &SessionId, at: DateTime<Utc>) -> Result<bool> {
        let mut conn = self.conn()?;
        let inserted = diesel::insert_or_ignore_into(reconciliations::table)
            .values(&ReconciliationRow {
                session_id: id.to_string(),
                claimed_at: format_ts(at),
            })
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(inserted == 1)
    }
}

#[async_trait]
impl BetActivityReader for SqliteStore {
    async fn latest_bet_after(
        &self,
        user: &UserId,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let mut conn = self.conn()?;
        let latest: Option<String> = bets::table
            .filter(bets::user_id.eq(user.as_str()))
            .filter(bets::placed_at.gt(format_ts(after)))
            .select(diesel::dsl::max(bets::placed_at))
            .first(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        parse_opt_ts(latest.as_deref())
    }
}

#[async_trait]
impl PartnerDirectory for SqliteStore {
    async fn account(&self, user: &UserId) -> Result<Option<UserAccount>> {
        let mut conn = self.conn()?;
        let row: Option<UserRow> = users::table
            .find(user.as_str())
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row.map(|row| UserAccount {
            user_id: UserId::from(row.id),
            referrer: row.referrer_id.map(PartnerId::from),
            external_username: row.external_username,
        }))
    }

    async fn parent_of(&self, partner: &PartnerId) -> Result<Option<PartnerId>> {
        let mut conn = self.conn()?;
        let row: Option<PartnerRow> = partners::table
            .find(partner.as_str())
            .select(PartnerRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row.and_then(|row| row.parent_id).map(PartnerId::from))
    }

    async fn credential(
        &self,
        root: &PartnerId,
        provider: ProviderType,
    ) -> Result<Option<ProviderCredential>> {
        let mut conn = self.conn()?;
        let row: Option<CredentialRow> = provider_credentials::table
            .find((root.as_str(), provider.as_str()))
            .select(CredentialRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(|row| {
            Ok(ProviderCredential {
                provider: ProviderType::from_str(&row.provider)?,
                operator_code: row.operator_code,
                secret_key: row.secret_key,
                access_token: row.access_token,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl Ledger for SqliteStore {
    async fn balance(&self, user: &UserId) -> Result<Decimal> {
        let mut conn = self.conn()?;
        let raw: Option<String> = ledger::table
            .find(user.as_str())
            .select(ledger::balance)
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        raw.as_deref()
            .map(parse_decimal)
            .transpose()
            .map(|b| b.unwrap_or(Decimal::ZERO))
    }

    async fn set_balance(&self, user: &UserId, balance: Decimal) -> Result<()> {
        let mut conn = self.conn()?;
        let row = LedgerRow {
            user_id: user.to_string(),
            balance: balance.to_string(),
            updated_at: format_ts(Utc::now()),
        };
        diesel::insert_into(ledger::table)
            .values(&row)
            .on_conflict(ledger::user_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}
