//! Credential and identity storage behind an enum-dispatched backend.
//!
//! The auth core is read-only against the user store except for
//! registration, which inserts the profile row and its credential row in one
//! transaction. Tokens and counters never land here. Backends follow the
//! `crate::kv` pattern: `Postgres` in production, `Memory` seeded with
//! fixtures for router tests.

use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::Instrument;

use super::types::RegisterRequest;
use super::utils::is_unique_violation;

/// Stored credential: a one-way salted hash. Never logged or returned to
/// callers.
pub(crate) struct CredentialRecord {
    pub(crate) password_hash: String,
}

/// Minimal identity fields returned with tokens and by the profile endpoint.
#[derive(Clone)]
pub(crate) struct UserRecord {
    pub(crate) user_id: i32,
    pub(crate) email: String,
    pub(crate) prenom: String,
    pub(crate) nom: String,
}

pub(crate) enum SignupOutcome {
    Created(UserRecord),
    Conflict,
}

pub(crate) enum UserStore {
    Postgres(PgPool),
    Memory(MemoryUsers),
}

impl UserStore {
    pub(crate) async fn find_credential(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, sqlx::Error> {
        match self {
            Self::Postgres(pool) => find_credential_row(pool, email).await,
            Self::Memory(users) => Ok(users.find_credential(email)),
        }
    }

    pub(crate) async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        match self {
            Self::Postgres(pool) => find_user_row(pool, email).await,
            Self::Memory(users) => Ok(users.find_user(email)),
        }
    }

    /// Insert the profile row and its bcrypt credential row atomically.
    /// A duplicate email maps to `Conflict`.
    pub(crate) async fn insert_user_with_credential(
        &self,
        request: &RegisterRequest,
        email_normalized: &str,
        password_hash: &str,
    ) -> Result<SignupOutcome, sqlx::Error> {
        match self {
            Self::Postgres(pool) => {
                insert_rows(pool, request, email_normalized, password_hash).await
            }
            Self::Memory(users) => Ok(users.insert(request, email_normalized, password_hash)),
        }
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres(_) => f.write_str("UserStore::Postgres"),
            Self::Memory(_) => f.write_str("UserStore::Memory"),
        }
    }
}

async fn find_credential_row(
    pool: &PgPool,
    email: &str,
) -> Result<Option<CredentialRecord>, sqlx::Error> {
    let query = "SELECT password_hash FROM acces_app WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.map(|row| CredentialRecord {
        password_hash: row.get("password_hash"),
    }))
}

async fn find_user_row(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
    let query = "SELECT user_id, email, prenom, nom FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.map(|row| UserRecord {
        user_id: row.get("user_id"),
        email: row.get("email"),
        prenom: row.get("prenom"),
        nom: row.get("nom"),
    }))
}

async fn insert_rows(
    pool: &PgPool,
    request: &RegisterRequest,
    email_normalized: &str,
    password_hash: &str,
) -> Result<SignupOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let query = r"
        INSERT INTO users (email, prenom, nom, date_naissance, rue, npa, localite, tel)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING user_id, email, prenom, nom
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT"
    );
    let row = sqlx::query(query)
        .bind(email_normalized)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(request.date_naissance)
        .bind(&request.rue)
        .bind(&request.npa)
        .bind(&request.localite)
        .bind(&request.tel)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user = match row {
        Ok(row) => UserRecord {
            user_id: row.get("user_id"),
            email: row.get("email"),
            prenom: row.get("prenom"),
            nom: row.get("nom"),
        },
        Err(err) if is_unique_violation(&err) => {
            let _ = tx.rollback().await;
            return Ok(SignupOutcome::Conflict);
        }
        Err(err) => return Err(err),
    };

    let query = "INSERT INTO acces_app (email, password_hash) VALUES ($1, $2)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT"
    );
    let inserted = sqlx::query(query)
        .bind(email_normalized)
        .bind(password_hash)
        .execute(&mut *tx)
        .instrument(span)
        .await;

    if let Err(err) = inserted {
        if is_unique_violation(&err) {
            let _ = tx.rollback().await;
            return Ok(SignupOutcome::Conflict);
        }
        return Err(err);
    }

    tx.commit().await?;
    Ok(SignupOutcome::Created(user))
}

struct Account {
    user: UserRecord,
    password_hash: String,
}

struct Inner {
    accounts: HashMap<String, Account>,
    next_user_id: i32,
}

/// In-memory account fixtures keyed by email, with sequential ids.
#[derive(Clone)]
pub(crate) struct MemoryUsers {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryUsers {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                accounts: HashMap::new(),
                next_user_id: 1,
            })),
        }
    }

    /// Seed an account and return its assigned id.
    pub(crate) fn seed(&self, email: &str, prenom: &str, nom: &str, password_hash: &str) -> i32 {
        let mut inner = self.lock();
        let user_id = inner.next_user_id;
        inner.next_user_id += 1;
        inner.accounts.insert(
            email.to_string(),
            Account {
                user: UserRecord {
                    user_id,
                    email: email.to_string(),
                    prenom: prenom.to_string(),
                    nom: nom.to_string(),
                },
                password_hash: password_hash.to_string(),
            },
        );
        user_id
    }

    fn find_credential(&self, email: &str) -> Option<CredentialRecord> {
        self.lock().accounts.get(email).map(|account| CredentialRecord {
            password_hash: account.password_hash.clone(),
        })
    }

    fn find_user(&self, email: &str) -> Option<UserRecord> {
        self.lock()
            .accounts
            .get(email)
            .map(|account| account.user.clone())
    }

    fn insert(
        &self,
        request: &RegisterRequest,
        email_normalized: &str,
        password_hash: &str,
    ) -> SignupOutcome {
        let mut inner = self.lock();
        if inner.accounts.contains_key(email_normalized) {
            return SignupOutcome::Conflict;
        }
        let user_id = inner.next_user_id;
        inner.next_user_id += 1;
        let user = UserRecord {
            user_id,
            email: email_normalized.to_string(),
            prenom: request.first_name.clone(),
            nom: request.last_name.clone(),
        };
        inner.accounts.insert(
            email_normalized.to_string(),
            Account {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        SignupOutcome::Created(user)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "SecurePass123!".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Blanc".to_string(),
            date_naissance: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            rue: "123 Test Street".to_string(),
            npa: "1000".to_string(),
            localite: "Lausanne".to_string(),
            tel: None,
        }
    }

    #[tokio::test]
    async fn seeded_account_is_found() {
        let users = MemoryUsers::new();
        let user_id = users.seed("a@b.com", "Ana", "Blanc", "hash");
        let store = UserStore::Memory(users);

        let credential = store.find_credential("a@b.com").await.unwrap().unwrap();
        assert_eq!(credential.password_hash, "hash");
        let user = store.find_user("a@b.com").await.unwrap().unwrap();
        assert_eq!(user.user_id, user_id);
        assert!(store.find_user("z@z.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = UserStore::Memory(MemoryUsers::new());
        let request = register_request("a@b.com");

        let outcome = store
            .insert_user_with_credential(&request, "a@b.com", "hash")
            .await
            .unwrap();
        assert!(matches!(outcome, SignupOutcome::Created(_)));

        let outcome = store
            .insert_user_with_credential(&request, "a@b.com", "hash")
            .await
            .unwrap();
        assert!(matches!(outcome, SignupOutcome::Conflict));
    }
}
