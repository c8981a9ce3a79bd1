use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use graphlog_core::{
    Action, ActionDraft, ActionId, ActionType, PayloadCapture, StatementSet, Timestamp,
};

use crate::error::StorageError;
use crate::traits::{ActionLog, HistoryWindow};

/// Convert Vec<u8> to fixed-size array with proper error handling.
fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

const ACTION_COLUMNS: &str = "action_id, action_type, user, graph, resource, tstamp, rollback_of";

/// Raw column values of one `actions` row, decoded outside the rusqlite closure.
type RawAction = (
    Vec<u8>,
    String,
    Option<String>,
    String,
    Option<String>,
    Vec<u8>,
    Option<Vec<u8>>,
);

fn read_raw(row: &rusqlite::Row) -> rusqlite::Result<RawAction> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn decode_action(raw: RawAction) -> Result<Action, StorageError> {
    let (id_bytes, action_type, user, graph, resource, tstamp_bytes, rollback_of) = raw;
    let rollback_of = match rollback_of {
        Some(bytes) => Some(ActionId::from_bytes(to_array::<16>(bytes, "rollback_of")?)),
        None => None,
    };
    Ok(Action {
        id: ActionId::from_bytes(to_array::<16>(id_bytes, "action_id")?),
        action_type: ActionType::parse(&action_type)?,
        user,
        graph,
        resource,
        timestamp: Timestamp::from_bytes(&to_array::<12>(tstamp_bytes, "tstamp")?),
        rollback_of,
    })
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_actions<P: rusqlite::Params>(
        &self,
        filter: &str,
        params: P,
    ) -> Result<Vec<Action>, StorageError> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM actions WHERE {filter} ORDER BY tstamp DESC, rowid DESC LIMIT ? OFFSET ?"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, read_raw)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(decode_action(row?)?);
        }
        Ok(result)
    }
}

fn sql_window(window: HistoryWindow) -> (i64, i64) {
    let limit = i64::try_from(window.limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(window.offset).unwrap_or(i64::MAX);
    (limit, offset)
}

impl ActionLog for SqliteStorage {
    fn append_action(
        &mut self,
        draft: &ActionDraft,
        payload: &PayloadCapture,
    ) -> Result<ActionId, StorageError> {
        let tx = self.conn.transaction()?;

        let payload_id = match payload {
            PayloadCapture::Captured(statements) => {
                let bytes = statements.to_msgpack()?;
                let checksum = StatementSet::checksum(&bytes);
                tx.execute(
                    "INSERT INTO payloads (statements, checksum, statement_count) VALUES (?1, ?2, ?3)",
                    rusqlite::params![bytes, &checksum[..], statements.len() as i64],
                )?;
                Some(tx.last_insert_rowid())
            }
            PayloadCapture::Suppressed => None,
        };

        let action_id = ActionId::new();
        tx.execute(
            "INSERT INTO actions (action_id, action_type, user, graph, resource, tstamp, payload_id, rollback_of) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                action_id.as_bytes().as_slice(),
                draft.action_type.as_str(),
                draft.user.as_deref(),
                draft.graph,
                draft.resource.as_deref(),
                &draft.timestamp.to_bytes()[..],
                payload_id,
                draft.rollback_of.map(|id| id.as_bytes().to_vec()),
            ],
        )?;

        tx.commit()?;
        tracing::debug!(
            action_id = %action_id,
            graph = %draft.graph,
            has_payload = payload_id.is_some(),
            "action appended"
        );
        Ok(action_id)
    }

    fn get_action(&self, id: ActionId) -> Result<Option<Action>, StorageError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {ACTION_COLUMNS} FROM actions WHERE action_id = ?1"),
                rusqlite::params![id.as_bytes().as_slice()],
                read_raw,
            )
            .optional()?;
        raw.map(decode_action).transpose()
    }

    fn get_payload(&self, id: ActionId) -> Result<Option<StatementSet>, StorageError> {
        let row: Option<(Vec<u8>, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT p.statements, p.checksum FROM actions a JOIN payloads p ON p.payload_id = a.payload_id WHERE a.action_id = ?1",
                rusqlite::params![id.as_bytes().as_slice()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((bytes, checksum)) = row else {
            return Ok(None);
        };
        if StatementSet::checksum(&bytes)[..] != checksum[..] {
            return Err(StorageError::CorruptPayload(format!(
                "checksum mismatch for action {id}"
            )));
        }
        Ok(Some(StatementSet::from_msgpack(&bytes)?))
    }

    fn actions_for_graph(
        &self,
        graph: &str,
        window: HistoryWindow,
    ) -> Result<Vec<Action>, StorageError> {
        let (limit, offset) = sql_window(window);
        self.query_actions("graph = ?1", rusqlite::params![graph, limit, offset])
    }

    fn actions_for_resource(
        &self,
        resource: &str,
        graph: &str,
        window: HistoryWindow,
    ) -> Result<Vec<Action>, StorageError> {
        let (limit, offset) = sql_window(window);
        self.query_actions(
            "resource = ?1 AND graph = ?2",
            rusqlite::params![resource, graph, limit, offset],
        )
    }

    fn actions_for_user(
        &self,
        user: &str,
        window: HistoryWindow,
    ) -> Result<Vec<Action>, StorageError> {
        let (limit, offset) = sql_window(window);
        self.query_actions("user = ?1", rusqlite::params![user, limit, offset])
    }

    fn action_count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM actions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn latest_timestamp(&self) -> Result<Option<Timestamp>, StorageError> {
        let bytes: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT tstamp FROM actions ORDER BY tstamp DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        match bytes {
            Some(bytes) => Ok(Some(Timestamp::from_bytes(&to_array::<12>(bytes, "tstamp")?))),
            None => Ok(None),
        }
    }
}
