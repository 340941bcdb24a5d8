use crate::compiler::Compiler;
use crate::error::{FormDbError, Result};
use crate::schema::Document;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Revision number of the single draft slot kept per schema name
pub const DRAFT_REVISION: i32 = -1;

/// Summary of a registered document schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    /// Highest non-draft revision, if any revision was added
    pub latest_revision: Option<i32>,
    pub has_draft: bool,
}

/// DDL produced for one schema revision
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedDdl {
    pub name: String,
    pub revision: i32,
    pub ddl: String,
    pub published_at: DateTime<Utc>,
}

/// Stores schema definitions by name and revision.
pub struct SchemaRegistry {
    conn: Connection,
}

impl SchemaRegistry {
    /// Open or create the registry database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let registry = SchemaRegistry { conn };
        registry.initialize_tables()?;
        Ok(registry)
    }

    /// Open an in-memory registry (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let registry = SchemaRegistry { conn };
        registry.initialize_tables()?;
        Ok(registry)
    }

    fn initialize_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS doc_schema_info (
                id TEXT NOT NULL,
                name TEXT PRIMARY KEY,
                description TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS doc_schema (
                name TEXT NOT NULL,
                revision INTEGER NOT NULL,
                definition TEXT NOT NULL,
                remark TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (name, revision)
            );

            CREATE TABLE IF NOT EXISTS published_ddl (
                name TEXT NOT NULL,
                revision INTEGER NOT NULL,
                ddl TEXT NOT NULL,
                published_at TEXT NOT NULL,
                PRIMARY KEY (name, revision)
            );
            "
        )?;
        Ok(())
    }

    // ── Schema Info ──────────────────────────────────────────────────

    /// Register a new schema name. The schema id that names its data tables
    /// is assigned here and never changes.
    pub fn add_schema_info(&self, name: &str, description: &str) -> Result<SchemaInfo> {
        if self.get_schema_info(name)?.is_some() {
            return Err(FormDbError::SchemaInfoAlreadyExists(name.to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO doc_schema_info (id, name, description, is_active)
             VALUES (?1, ?2, ?3, 1)",
            params![id, name, description],
        )?;
        log::info!("Registered schema '{}' ({})", name, id);

        Ok(SchemaInfo {
            id,
            name: name.to_string(),
            description: description.to_string(),
            is_active: true,
            latest_revision: None,
            has_draft: false,
        })
    }

    pub fn get_schema_info(&self, name: &str) -> Result<Option<SchemaInfo>> {
        let result = self.conn.query_row(
            &format!("{INFO_QUERY} WHERE a.name = ?1 GROUP BY a.name"),
            params![name],
            info_from_row,
        ).optional()?;
        Ok(result)
    }

    pub fn get_schema_info_by_id(&self, id: &str) -> Result<Option<SchemaInfo>> {
        let result = self.conn.query_row(
            &format!("{INFO_QUERY} WHERE a.id = ?1 GROUP BY a.name"),
            params![id],
            info_from_row,
        ).optional()?;
        Ok(result)
    }

    /// Change the description and active flag of a registered schema. The
    /// schema id is left untouched.
    pub fn update_schema_info(
        &self,
        name: &str,
        description: &str,
        is_active: bool,
    ) -> Result<SchemaInfo> {
        let changed = self.conn.execute(
            "UPDATE doc_schema_info SET description = ?1, is_active = ?2 WHERE name = ?3",
            params![description, is_active, name],
        )?;
        if changed == 0 {
            return Err(FormDbError::SchemaInfoNotFound(name.to_string()));
        }
        log::info!("Updated schema '{}' (active: {})", name, is_active);

        self.get_schema_info(name)?
            .ok_or_else(|| FormDbError::SchemaInfoNotFound(name.to_string()))
    }

    pub fn list_schema_info(&self) -> Result<Vec<SchemaInfo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INFO_QUERY} GROUP BY a.name ORDER BY a.name"))?;
        let rows = stmt.query_map([], info_from_row)?;

        let mut infos = Vec::new();
        for row in rows {
            infos.push(row?);
        }
        Ok(infos)
    }

    // ── Schema Revisions ─────────────────────────────────────────────

    /// Store `doc` as the next revision of its schema and return that
    /// revision. The stored copy carries the registered schema id.
    pub fn add_schema(&self, doc: &Document, remark: &str) -> Result<i32> {
        let info = self
            .get_schema_info(&doc.name)?
            .ok_or_else(|| FormDbError::SchemaInfoNotFound(doc.name.clone()))?;

        let tx = self.conn.unchecked_transaction()?;
        let latest: Option<i32> = tx.query_row(
            "SELECT MAX(revision) FROM doc_schema WHERE name = ?1 AND revision > 0",
            params![doc.name],
            |row| row.get(0),
        )?;
        let revision = latest.unwrap_or(0) + 1;

        let mut stored = doc.clone();
        stored.id = info.id;
        stored.revision = revision;
        let definition = serde_yaml::to_string(&stored)?;

        tx.execute(
            "INSERT INTO doc_schema (name, revision, definition, remark) VALUES (?1, ?2, ?3, ?4)",
            params![doc.name, revision, definition, remark],
        )?;
        tx.commit()?;

        log::info!("Added schema '{}' revision {}", doc.name, revision);
        Ok(revision)
    }

    /// Save `doc` into the draft slot, replacing any existing draft.
    pub fn save_draft(&self, doc: &Document, remark: &str) -> Result<()> {
        let info = self
            .get_schema_info(&doc.name)?
            .ok_or_else(|| FormDbError::SchemaInfoNotFound(doc.name.clone()))?;

        let mut stored = doc.clone();
        stored.id = info.id;
        stored.revision = DRAFT_REVISION;
        let definition = serde_yaml::to_string(&stored)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO doc_schema (name, revision, definition, remark)
             VALUES (?1, ?2, ?3, ?4)",
            params![doc.name, DRAFT_REVISION, definition, remark],
        )?;
        log::info!("Saved draft of schema '{}'", doc.name);
        Ok(())
    }

    /// The latest non-draft revision of a schema.
    pub fn get_schema(&self, name: &str) -> Result<Option<Document>> {
        let definition: Option<String> = self.conn.query_row(
            "SELECT definition FROM doc_schema WHERE name = ?1 AND revision > 0
             ORDER BY revision DESC LIMIT 1",
            params![name],
            |row| row.get(0),
        ).optional()?;
        definition.map(|d| parse_definition(&d)).transpose()
    }

    pub fn get_schema_by_revision(&self, name: &str, revision: i32) -> Result<Option<Document>> {
        let definition: Option<String> = self.conn.query_row(
            "SELECT definition FROM doc_schema WHERE name = ?1 AND revision = ?2",
            params![name, revision],
            |row| row.get(0),
        ).optional()?;
        definition.map(|d| parse_definition(&d)).transpose()
    }

    pub fn get_draft(&self, name: &str) -> Result<Option<Document>> {
        self.get_schema_by_revision(name, DRAFT_REVISION)
    }

    // ── Publishing ───────────────────────────────────────────────────

    /// Compile the latest revision of a schema and record the resulting DDL.
    /// Running the DDL against the data database is left to the caller.
    pub fn publish(&self, name: &str, compiler: &Compiler) -> Result<PublishedDdl> {
        let doc = self.get_schema(name)?.ok_or_else(|| FormDbError::NotFound {
            name: name.to_string(),
            revision: 0,
        })?;

        let ddl = compiler.compile(&doc)?;
        let published = PublishedDdl {
            name: doc.name.clone(),
            revision: doc.revision,
            ddl,
            published_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT OR REPLACE INTO published_ddl (name, revision, ddl, published_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                published.name,
                published.revision,
                published.ddl,
                published.published_at.to_rfc3339()
            ],
        )?;
        log::info!("Published schema '{}' revision {}", published.name, published.revision);

        Ok(published)
    }

    pub fn get_published(&self, name: &str, revision: i32) -> Result<Option<PublishedDdl>> {
        let row: Option<(String, String)> = self.conn.query_row(
            "SELECT ddl, published_at FROM published_ddl WHERE name = ?1 AND revision = ?2",
            params![name, revision],
            |row| Ok((row.get(0)?, row.get(1)?)),
        ).optional()?;

        let Some((ddl, published_at)) = row else {
            return Ok(None);
        };
        let published_at = DateTime::parse_from_rfc3339(&published_at)
            .map_err(|e| FormDbError::Schema(format!("Invalid publish timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(PublishedDdl {
            name: name.to_string(),
            revision,
            ddl,
            published_at,
        }))
    }
}

const INFO_QUERY: &str = "SELECT a.id, a.name, a.description, a.is_active,
        MAX(CASE WHEN b.revision > 0 THEN b.revision END),
        SUM(CASE WHEN b.revision = -1 THEN 1 ELSE 0 END)
    FROM doc_schema_info a
    LEFT JOIN doc_schema b ON a.name = b.name";

fn info_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SchemaInfo> {
    Ok(SchemaInfo {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_active: row.get::<_, i64>(3)? == 1,
        latest_revision: row.get(4)?,
        has_draft: row.get::<_, Option<i64>>(5)?.unwrap_or(0) > 0,
    })
}

fn parse_definition(definition: &str) -> Result<Document> {
    Ok(serde_yaml::from_str(definition)?)
}
