//! PostgreSQL implementation of the persistence gateway.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::PersistenceGateway;
use super::models::{ChatEvent, HistoryRow, Identity, Room, RoomActivityRow};
use crate::domain::event::EventKind;
use crate::domain::session_id::SessionId;
use crate::error::ChatError;

/// PostgreSQL-backed gateway using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    /// Creates a new gateway with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_kind(kind: &str) -> Result<EventKind, ChatError> {
    EventKind::parse(kind).ok_or_else(|| ChatError::Storage(format!("unknown event kind: {kind}")))
}

impl PersistenceGateway for PgGateway {
    async fn resolve_identity(&self, name: &str) -> Result<Identity, ChatError> {
        // Single-statement upsert: concurrent first use of the same name
        // resolves to one row. The no-op DO UPDATE makes RETURNING yield
        // the existing row on conflict.
        let (id, name) = sqlx::query_as::<_, (i64, String)>(
            "INSERT INTO identities (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(Identity { id, name })
    }

    async fn create_room(&self, title: &str, session_id: SessionId) -> Result<Room, ChatError> {
        let (id, session_id, title) = sqlx::query_as::<_, (i64, Uuid, String)>(
            "INSERT INTO rooms (title, session_id) VALUES ($1, $2) \
             RETURNING id, session_id, title",
        )
        .bind(title)
        .bind(session_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(Room {
            id,
            session_id: session_id.into(),
            title,
        })
    }

    async fn find_room_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Room>, ChatError> {
        let row = sqlx::query_as::<_, (i64, Uuid, String)>(
            "SELECT id, session_id, title FROM rooms WHERE session_id = $1",
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, session_id, title)| Room {
            id,
            session_id: session_id.into(),
            title,
        }))
    }

    async fn append_event(
        &self,
        identity_id: i64,
        room_id: i64,
        kind: EventKind,
        payload: Option<&str>,
    ) -> Result<ChatEvent, ChatError> {
        let (id, identity_id, room_id, kind, payload, created_at) = sqlx::query_as::<
            _,
            (i64, i64, i64, String, Option<String>, DateTime<Utc>),
        >(
            "INSERT INTO room_events (identity_id, room_id, kind, payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, identity_id, room_id, kind, payload, created_at",
        )
        .bind(identity_id)
        .bind(room_id)
        .bind(kind.as_str())
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChatEvent {
            id,
            identity_id,
            room_id,
            kind: parse_kind(&kind)?,
            payload,
            created_at,
        })
    }

    async fn latest_non_chat_event(
        &self,
        room_id: i64,
        identity_id: i64,
    ) -> Result<Option<ChatEvent>, ChatError> {
        let row = sqlx::query_as::<_, (i64, i64, i64, String, Option<String>, DateTime<Utc>)>(
            "SELECT id, identity_id, room_id, kind, payload, created_at \
             FROM room_events \
             WHERE room_id = $1 AND identity_id = $2 AND kind <> 'chat' \
             ORDER BY id DESC LIMIT 1",
        )
        .bind(room_id)
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, identity_id, room_id, kind, payload, created_at)| {
            Ok(ChatEvent {
                id,
                identity_id,
                room_id,
                kind: parse_kind(&kind)?,
                payload,
                created_at,
            })
        })
        .transpose()
    }

    async fn rooms_with_activity(
        &self,
        window_minutes: u32,
    ) -> Result<Vec<RoomActivityRow>, ChatError> {
        // Latest chat payload per room and the recent-leaver count join
        // against the rooms table; `DISTINCT ON` resolves "latest row per
        // partition" for both subqueries.
        let rows = sqlx::query_as::<_, (i64, Uuid, String, String, i64)>(
            "SELECT r.id, r.session_id, r.title, \
                    COALESCE(lc.payload, '') AS last_message, \
                    COALESCE(rl.cnt, 0) AS recent_leavers \
             FROM rooms r \
             LEFT JOIN ( \
                 SELECT DISTINCT ON (room_id) room_id, payload \
                 FROM room_events \
                 WHERE kind = 'chat' \
                 ORDER BY room_id, created_at DESC, id DESC \
             ) lc ON lc.room_id = r.id \
             LEFT JOIN ( \
                 SELECT room_id, COUNT(*) AS cnt \
                 FROM ( \
                     SELECT DISTINCT ON (room_id, identity_id) \
                            room_id, identity_id, kind, created_at \
                     FROM room_events \
                     WHERE kind <> 'chat' \
                     ORDER BY room_id, identity_id, created_at DESC, id DESC \
                 ) latest \
                 WHERE latest.kind = 'leave' \
                   AND latest.created_at >= now() - make_interval(mins => $1) \
                 GROUP BY room_id \
             ) rl ON rl.room_id = r.id \
             ORDER BY r.id",
        )
        .bind(i32::try_from(window_minutes).unwrap_or(i32::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, session_id, title, last_message, recent_leavers)| RoomActivityRow {
                    id,
                    session_id: session_id.into(),
                    title,
                    last_message,
                    recent_leavers: u64::try_from(recent_leavers).unwrap_or(0),
                },
            )
            .collect())
    }

    async fn event_history(&self, room_id: i64) -> Result<Vec<HistoryRow>, ChatError> {
        let rows = sqlx::query_as::<_, (i64, i64, String, String, Option<String>, DateTime<Utc>)>(
            "SELECT e.id, u.id, u.name, e.kind, e.payload, e.created_at \
             FROM room_events e \
             JOIN identities u ON u.id = e.identity_id \
             WHERE e.room_id = $1 \
             ORDER BY e.id ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, identity_id, nick, kind, payload, created_at)| {
                Ok(HistoryRow {
                    id,
                    identity_id,
                    nick,
                    kind: parse_kind(&kind)?,
                    payload,
                    created_at,
                })
            })
            .collect()
    }
}
