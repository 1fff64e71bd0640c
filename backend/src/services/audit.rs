use sqlx::PgPool;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::{is_undefined_table, HISTORY_LOGS_MIGRATION};
use crate::models::auth::AuthenticatedUser;

/// Who performed an audited action, as known from the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: Option<i64>,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

impl From<&AuthenticatedUser> for Actor {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            user_id: Some(user.id),
            full_name: Some(user.full_name.clone()),
            role: Some(user.role.clone()),
        }
    }
}

/// An action line to append, emitted after the business operation committed.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor: Actor,
    /// Predicate without subject, e.g. "created a new resident: Juan Dela Cruz".
    pub action: String,
}

/// Events waiting for the consumer. Beyond this, new events are dropped.
pub const AUDIT_QUEUE_CAPACITY: usize = 1024;

/// Handle for emitting audit events. Cheap to clone; sending never blocks.
#[derive(Clone)]
pub struct AuditLog {
    tx: mpsc::Sender<AuditEvent>,
}

impl AuditLog {
    /// Spawns the consumer task that writes events to `history_logs`.
    pub fn start(pool: PgPool) -> Self {
        let (tx, rx) = mpsc::channel(AUDIT_QUEUE_CAPACITY);
        tokio::spawn(consume(pool, rx));
        Self { tx }
    }

    /// A handle whose events are delivered to the returned receiver instead of the database.
    pub fn detached() -> (Self, mpsc::Receiver<AuditEvent>) {
        let (tx, rx) = mpsc::channel(AUDIT_QUEUE_CAPACITY);
        (Self { tx }, rx)
    }

    pub fn record(&self, user: &AuthenticatedUser, action: impl Into<String>) {
        let event = AuditEvent {
            actor: Actor::from(user),
            action: action.into(),
        };
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(action = %event.action, "audit queue full; dropping entry");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("audit log consumer stopped; dropping entry");
            }
        }
    }
}

async fn consume(pool: PgPool, mut rx: mpsc::Receiver<AuditEvent>) {
    while let Some(event) = rx.recv().await {
        write_event(&pool, event).await;
    }
}

/// Resolves the display role, formats the sentence and inserts it.
/// Failures are logged and swallowed.
pub async fn write_event(pool: &PgPool, event: AuditEvent) {
    let AuditEvent { actor, action } = event;
    let user_name = actor.full_name.clone().unwrap_or_else(|| "Unknown".into());

    let position = match &actor.full_name {
        Some(name) => resolve_position(pool, name).await,
        None => None,
    };
    let user_role = position.clone().or_else(|| actor.role.clone());
    let sentence = format_action(
        &user_name,
        actor.role.as_deref(),
        position.as_deref(),
        &action,
    );

    let res = sqlx::query(
        "INSERT INTO history_logs (user_id, user_name, user_role, action)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(actor.user_id)
    .bind(&user_name)
    .bind(&user_role)
    .bind(&sentence)
    .execute(pool)
    .await;

    if let Err(e) = res {
        if is_undefined_table(&e) {
            tracing::warn!(
                "history_logs table does not exist; run {HISTORY_LOGS_MIGRATION}"
            );
        } else {
            tracing::warn!("audit log insert failed: {e}");
        }
    }
}

/// Position title of the official whose name matches, if any.
/// Ties on the name go to the lowest `order_no`.
async fn resolve_position(pool: &PgPool, full_name: &str) -> Option<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT position FROM officials WHERE full_name = $1 ORDER BY order_no, id LIMIT 1",
    )
    .bind(full_name)
    .fetch_optional(pool)
    .await
    .unwrap_or_else(|e| {
        tracing::debug!("official lookup for audit role failed: {e}");
        None
    })
}

/// Builds the stored sentence with a role-aware subject.
pub fn format_action(
    full_name: &str,
    session_role: Option<&str>,
    official_position: Option<&str>,
    action: &str,
) -> String {
    let role = official_position.or(session_role);
    let titled = role.is_some_and(|r| {
        ["Barangay", "Punong", "Chairman"]
            .iter()
            .any(|word| r.contains(word))
    });

    match role {
        Some(r) if titled => format!("The {r} {action}"),
        _ if session_role == Some("Admin") => format!("The Chairman {action}"),
        _ => format!("{full_name} {action}"),
    }
}
