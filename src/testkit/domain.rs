//! Builders for domain values used across tests.

use chrono::{DateTime, Utc};

use crate::adapter::outbound::memory::MemoryStore;
use crate::domain::{
    GameSession, PartnerId, ProviderCredential, ProviderType, SessionStatus, UserAccount, UserId,
};

/// A session for `user` forced into `status`, launched at `launched_at`.
pub fn session(user: &str, status: SessionStatus, launched_at: DateTime<Utc>) -> GameSession {
    let mut session = GameSession::launch(UserId::new(user), ProviderType::Evolution, launched_at);
    session.status = status;
    if status != SessionStatus::Ready {
        session.ready_marked_at = None;
    }
    session
}

/// A credential with operator code `op-{root}`.
pub fn credential(root: &str, provider: ProviderType) -> ProviderCredential {
    ProviderCredential {
        provider,
        operator_code: format!("op-{root}"),
        secret_key: format!("secret-{root}"),
        access_token: format!("token-{root}"),
    }
}

/// Seed a player referred by `chain[0]`, where each partner's parent is the
/// next entry and the last entry is the root holding a `provider`
/// credential. The player's external username is `ext-{user}`.
pub fn seed_player(
    store: &MemoryStore,
    user: &str,
    chain: &[&str],
    provider: ProviderType,
) -> UserId {
    let user_id = UserId::new(user);
    store.add_account(UserAccount {
        user_id: user_id.clone(),
        referrer: chain.first().map(|p| PartnerId::new(*p)),
        external_username: format!("ext-{user}"),
    });
    for (i, partner) in chain.iter().enumerate() {
        let parent = chain.get(i + 1).map(|p| PartnerId::new(*p));
        store.add_partner(PartnerId::new(*partner), parent);
    }
    if let Some(root) = chain.last() {
        store.add_credential(PartnerId::new(*root), credential(root, provider));
    }
    user_id
}
