use rusqlite::{Connection, OptionalExtension, Result, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use trawl_scanner::CrawlOutcome;

pub struct Database {
    conn: Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub status: String,
    pub seed_url: String,
    pub configuration: Option<String>,
}

/// A graph node as archived. Referenced-but-unfetched URLs have no status,
/// content type or depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNode {
    pub url: String,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub depth: Option<usize>,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

impl Database {
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS crawl_sessions (
    id TEXT PRIMARY KEY,
    start_time INTEGER NOT NULL,
    end_time INTEGER,
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'cancelled', 'failed')),
    seed_url TEXT NOT NULL,
    configuration TEXT        -- JSON configuration used
);

CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    url TEXT NOT NULL,

    -- NULL for nodes that were referenced but never fetched
    status_code INTEGER,
    content_type TEXT,
    depth INTEGER,

    FOREIGN KEY(session_id) REFERENCES crawl_sessions(id) ON DELETE CASCADE,
    UNIQUE(session_id, url)
);

CREATE INDEX IF NOT EXISTS idx_nodes_session ON nodes(session_id);
CREATE INDEX IF NOT EXISTS idx_nodes_depth ON nodes(session_id, depth);

CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    source_node_id INTEGER NOT NULL,
    target_node_id INTEGER NOT NULL,

    FOREIGN KEY(session_id) REFERENCES crawl_sessions(id) ON DELETE CASCADE,
    FOREIGN KEY(source_node_id) REFERENCES nodes(id) ON DELETE CASCADE,
    FOREIGN KEY(target_node_id) REFERENCES nodes(id) ON DELETE CASCADE,
    UNIQUE(source_node_id, target_node_id)
);

CREATE INDEX IF NOT EXISTS idx_edges_session ON edges(session_id);
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_node_id);
            ",
        )?;
        Ok(())
    }

    // Session management
    pub fn create_session(&self, seed_url: &str, configuration: Option<&str>) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();

        self.conn.execute(
            "INSERT INTO crawl_sessions (id, start_time, status, seed_url, configuration) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &session_id,
                current_timestamp(),
                SessionStatus::Running.as_str(),
                seed_url,
                configuration
            ],
        )?;

        Ok(session_id)
    }

    pub fn finish_session(&self, session_id: &str, status: SessionStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE crawl_sessions SET status = ?1, end_time = ?2 WHERE id = ?3",
            params![status.as_str(), current_timestamp(), session_id],
        )?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        self.conn
            .query_row(
                "SELECT id, start_time, end_time, status, seed_url, configuration
                 FROM crawl_sessions WHERE id = ?1",
                params![session_id],
                |row| {
                    Ok(SessionInfo {
                        id: row.get(0)?,
                        start_time: row.get(1)?,
                        end_time: row.get(2)?,
                        status: row.get(3)?,
                        seed_url: row.get(4)?,
                        configuration: row.get(5)?,
                    })
                },
            )
            .optional()
    }

    /// Archive every graph node (with its record, if any) and every edge of
    /// `outcome` under `session_id`, in one transaction.
    pub fn insert_outcome(&self, session_id: &str, outcome: &CrawlOutcome) -> Result<(usize, usize)> {
        let tx = self.conn.unchecked_transaction()?;
        let mut node_ids: HashMap<&str, i64> = HashMap::new();

        {
            let mut insert_node = tx.prepare(
                "INSERT INTO nodes (session_id, url, status_code, content_type, depth)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for url in outcome.graph.nodes() {
                let record = outcome.records.get(url);
                insert_node.execute(params![
                    session_id,
                    url,
                    record.map(|r| r.status_code),
                    record.and_then(|r| r.content_type.as_deref()),
                    record.map(|r| r.depth as i64),
                ])?;
                node_ids.insert(url, tx.last_insert_rowid());
            }

            let mut insert_edge = tx.prepare(
                "INSERT INTO edges (session_id, source_node_id, target_node_id) VALUES (?1, ?2, ?3)",
            )?;
            for (source, target) in outcome.graph.edges() {
                if let (Some(source_id), Some(target_id)) = (node_ids.get(source), node_ids.get(target)) {
                    insert_edge.execute(params![session_id, source_id, target_id])?;
                }
            }
        }

        tx.commit()?;
        Ok((outcome.graph.node_count(), outcome.graph.edge_count()))
    }

    // Query methods
    pub fn get_nodes_by_session(&self, session_id: &str) -> Result<Vec<StoredNode>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, status_code, content_type, depth
             FROM nodes
             WHERE session_id = ?1
             ORDER BY url",
        )?;

        let nodes = stmt
            .query_map(params![session_id], |row| {
                Ok(StoredNode {
                    url: row.get(0)?,
                    status_code: row.get(1)?,
                    content_type: row.get(2)?,
                    depth: row.get::<_, Option<i64>>(3)?.map(|d| d as usize),
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(nodes)
    }

    pub fn get_edges_by_session(&self, session_id: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.url, t.url
             FROM edges e
             JOIN nodes s ON e.source_node_id = s.id
             JOIN nodes t ON e.target_node_id = t.id
             WHERE e.session_id = ?1
             ORDER BY s.url, t.url",
        )?;

        let edges = stmt
            .query_map(params![session_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;

        Ok(edges)
    }
}
