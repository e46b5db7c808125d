//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{
    bets, ledger, partners, presence, provider_credentials, reconciliations, sessions, users,
};

/// Database row for a game session.
///
/// `None` fields are written as `NULL` on update, so a changeset always
/// replaces the whole record.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = sessions)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub status: String,
    pub launched_at: String,
    pub last_bet_at: Option<String>,
    pub last_bet_checked_at: Option<String>,
    pub last_activity_at: String,
    pub balance_before: Option<String>,
    pub ended_at: Option<String>,
    pub ready_marked_at: Option<String>,
}

/// Database row for a bet record (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = bets)]
pub struct NewBetRow {
    pub user_id: String,
    pub placed_at: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: String,
    pub referrer_id: Option<String>,
    pub external_username: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = partners)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PartnerRow {
    pub id: String,
    pub parent_id: Option<String>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = provider_credentials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CredentialRow {
    pub partner_id: String,
    pub provider: String,
    pub operator_code: String,
    pub secret_key: String,
    pub access_token: String,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = ledger)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerRow {
    pub user_id: String,
    pub balance: String,
    pub updated_at: String,
}

/// Heartbeat row for one joined administrator.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = presence)]
#[diesel(primary_key(admin_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PresenceRow {
    pub admin_id: String,
    pub token: String,
    pub heartbeat_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = reconciliations)]
pub struct ReconciliationRow {
    pub session_id: String,
    pub claimed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};

    fn session_row(id: &str, status: &str) -> SessionRow {
        SessionRow {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            provider: "evolution".to_string(),
            status: status.to_string(),
            launched_at: "2026-01-01T00:00:00.000000000Z".to_string(),
            last_bet_at: Some("2026-01-01T00:00:05.000000000Z".to_string()),
            last_bet_checked_at: None,
            last_activity_at: "2026-01-01T00:00:00.000000000Z".to_string(),
            balance_before: Some("12.50".to_string()),
            ended_at: None,
            ready_marked_at: None,
        }
    }

    #[test]
    fn changeset_clears_nullable_columns() {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        let mut conn = pool.get().unwrap();

        diesel::insert_into(sessions::table)
            .values(&session_row("s-1", "active"))
            .execute(&mut conn)
            .unwrap();

        let mut changed = session_row("s-1", "paused");
        changed.last_bet_at = None;
        diesel::update(sessions::table.find("s-1"))
            .set(&changed)
            .execute(&mut conn)
            .unwrap();

        let loaded: SessionRow = sessions::table
            .find("s-1")
            .select(SessionRow::as_select())
            .first(&mut conn)
            .unwrap();
        assert_eq!(loaded, changed);
    }
}
