use crate::types::{AggregatorError, NewThreatRecord, Result, ThreatRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection, Transaction};
use std::str::FromStr;
use tracing::{debug, info};

const RECORD_COLUMNS: &str = "id, source, title, link, published_date, summary, \
     threat_type, severity, threat_score, target_sector";

/// Flat table of classified records. Rows are only ever appended.
///
/// The pool holds a single connection, so a scan's transaction is the only
/// writer while it is open and the dedup check cannot race another insert.
pub struct ThreatStore {
    db: SqlitePool,
}

impl ThreatStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { db };
        store.create_schema().await?;

        info!("Opened threat store at {}", database_url);
        Ok(store)
    }

    /// Private database that lives as long as the store does.
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS threats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                title TEXT NOT NULL,
                link TEXT NOT NULL,
                published_date TEXT NOT NULL,
                summary TEXT NOT NULL,
                threat_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                threat_score INTEGER NOT NULL,
                target_sector TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        // Lookup index only; uniqueness is checked by the ingestion pipeline.
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_threats_link ON threats (link)")
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn insert(&self, record: &NewThreatRecord) -> Result<i64> {
        let mut conn = self.db.acquire().await?;
        insert_record(&mut conn, record).await
    }

    pub async fn exists_by_link(&self, link: &str) -> Result<bool> {
        let mut conn = self.db.acquire().await?;
        link_exists(&mut conn, link).await
    }

    /// Most recent records first (descending identity).
    pub async fn recent(&self, limit: usize) -> Result<Vec<ThreatRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM threats ORDER BY id DESC LIMIT ?",
            RECORD_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    pub async fn all(&self) -> Result<Vec<ThreatRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM threats ORDER BY id ASC",
            RECORD_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threats")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// Start a batch of inserts that becomes visible all at once on commit.
    /// Dropping the batch without committing discards every insert made
    /// through it.
    pub async fn begin_scan(&self) -> Result<ScanBatch> {
        let tx = self.db.begin().await?;
        Ok(ScanBatch { tx, inserted: 0 })
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// An open scan transaction. Lookups through it also see its own uncommitted
/// inserts, so duplicate links within one scan are caught too.
pub struct ScanBatch {
    tx: Transaction<'static, Sqlite>,
    inserted: usize,
}

impl ScanBatch {
    pub async fn exists_by_link(&mut self, link: &str) -> Result<bool> {
        link_exists(&mut self.tx, link).await
    }

    pub async fn insert(&mut self, record: &NewThreatRecord) -> Result<i64> {
        let id = insert_record(&mut self.tx, record).await?;
        self.inserted += 1;
        Ok(id)
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub async fn commit(self) -> Result<usize> {
        self.tx.commit().await?;
        debug!("Committed scan batch with {} new records", self.inserted);
        Ok(self.inserted)
    }
}

async fn insert_record(conn: &mut SqliteConnection, record: &NewThreatRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO threats (source, title, link, published_date, summary, threat_type, severity, threat_score, target_sector)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.source)
    .bind(&record.title)
    .bind(&record.link)
    .bind(&record.published_date)
    .bind(&record.summary)
    .bind(record.threat_type.label())
    .bind(record.severity.label())
    .bind(i64::from(record.threat_score))
    .bind(record.target_sector.label())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn link_exists(conn: &mut SqliteConnection, link: &str) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM threats WHERE link = ?)")
        .bind(link)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists != 0)
}

fn record_from_row(row: &SqliteRow) -> Result<ThreatRecord> {
    let score: i64 = row.try_get("threat_score")?;
    let threat_score = u8::try_from(score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| AggregatorError::InvalidRecord(format!("threat score out of range: {}", score)))?;

    Ok(ThreatRecord {
        id: row.try_get("id")?,
        source: row.try_get("source")?,
        title: row.try_get("title")?,
        link: row.try_get("link")?,
        published_date: row.try_get("published_date")?,
        summary: row.try_get("summary")?,
        threat_type: row.try_get::<String, _>("threat_type")?.parse()?,
        severity: row.try_get::<String, _>("severity")?.parse()?,
        threat_score,
        target_sector: row.try_get::<String, _>("target_sector")?.parse()?,
    })
}
