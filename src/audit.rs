//! Best-effort audit trail for security-relevant events.
//!
//! Records are appended to `audit_logs`; there is no update or delete path.
//! Writes are fire-and-forget relative to the request they describe: the
//! insert runs on a spawned task so a caller disconnect never aborts it, and
//! a failed write is logged for operational monitoring instead of failing
//! the request. The `Memory` sink records synchronously so tests can assert
//! on emitted events.

use sqlx::PgPool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{Instrument, error};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditAction {
    Register,
    Login,
    LoginFailed,
    Logout,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub user_id: Option<i32>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<String>,
}

/// In-memory event log for tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuditLog {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().clone()
    }

    fn push(&self, event: AuditEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AuditEvent>> {
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum AuditSink {
    Postgres(PgPool),
    Memory(MemoryAuditLog),
}

#[derive(Clone, Debug)]
pub struct AuditRecorder {
    sink: AuditSink,
}

impl AuditRecorder {
    #[must_use]
    pub fn new(sink: AuditSink) -> Self {
        Self { sink }
    }

    /// Append one audit event. `user_id` is `None` when the actor could not
    /// be identified (e.g. a failed login with an unknown email).
    pub fn record(
        &self,
        action: AuditAction,
        user_id: Option<i32>,
        ip_address: Option<String>,
        user_agent: Option<String>,
        details: Option<String>,
    ) {
        match &self.sink {
            AuditSink::Memory(log) => log.push(AuditEvent {
                action,
                user_id,
                ip_address,
                user_agent,
                details,
            }),
            AuditSink::Postgres(pool) => {
                let pool = pool.clone();
                let span = tracing::info_span!("audit.record", action = action.as_str());
                tokio::spawn(
                    async move {
                        if let Err(err) =
                            insert_event(&pool, action, user_id, ip_address, user_agent, details)
                                .await
                        {
                            error!(
                                "Failed to write audit record for {}: {err}",
                                action.as_str()
                            );
                        }
                    }
                    .instrument(span),
                );
            }
        }
    }
}

async fn insert_event(
    pool: &PgPool,
    action: AuditAction,
    user_id: Option<i32>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    details: Option<String>,
) -> Result<(), sqlx::Error> {
    let query = r"
        INSERT INTO audit_logs (user_id, action, ip_address, user_agent, details, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
    ";
    sqlx::query(query)
        .bind(user_id)
        .bind(action.as_str())
        .bind(ip_address)
        .bind(user_agent)
        .bind(details)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_match_log_schema() {
        assert_eq!(AuditAction::Register.as_str(), "register");
        assert_eq!(AuditAction::Login.as_str(), "login");
        assert_eq!(AuditAction::LoginFailed.as_str(), "login_failed");
        assert_eq!(AuditAction::Logout.as_str(), "logout");
    }

    #[test]
    fn memory_sink_records_null_subject() {
        let log = MemoryAuditLog::new();
        let recorder = AuditRecorder::new(AuditSink::Memory(log.clone()));

        recorder.record(
            AuditAction::LoginFailed,
            None,
            Some("1.2.3.4".to_string()),
            None,
            Some("email: a@b.com".to_string()),
        );

        let events = log.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::LoginFailed);
        assert_eq!(events[0].user_id, None);
        assert_eq!(events[0].ip_address.as_deref(), Some("1.2.3.4"));
    }
}
