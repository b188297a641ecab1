//! PostGIS-backed feature source
//!
//! [`PgSource`] holds one connection for the whole run. sqlx is async, so the source owns a
//! small current-thread tokio runtime and blocks on every query; callers see a plain
//! synchronous [`FeatureSource`].
//!
//! All layer queries of a run execute inside one read-only `REPEATABLE READ` transaction, so
//! the layers of a collection come from a single snapshot of the database.

use crate::{DatabaseConfig, FeatureClass, FeatureSource, RawRow, Result, SourceQuery};
use geojson::{Geometry, JsonObject};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Connection, Row};
use tokio::runtime::Runtime;

/// Application name reported to the server (`pg_stat_activity`)
const APPLICATION_NAME: &str = "ahti-export";

/// Opens the snapshot every query of a run reads from
pub const BEGIN_SNAPSHOT: &str = "BEGIN ISOLATION LEVEL REPEATABLE READ READ ONLY";

/// Ends the snapshot; nothing was written, so there is nothing to commit
pub const END_SNAPSHOT: &str = "ROLLBACK";

/// A [`FeatureSource`] reading from a PostGIS database
pub struct PgSource {
    runtime: Runtime,
    conn: PgConnection,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PgSource {
    /// Open a connection to the configured database
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let options = connect_options(config)?;
        tracing::info!("Connecting to {config}");
        let conn = runtime.block_on(async {
            let mut conn = PgConnection::connect_with(&options).await?;
            sqlx::raw_sql(BEGIN_SNAPSHOT).execute(&mut conn).await?;
            Ok::<_, sqlx::Error>(conn)
        })?;
        tracing::debug!("Reading from snapshot: {BEGIN_SNAPSHOT}");

        Ok(Self { runtime, conn })
    }

    /// End the snapshot and close the connection gracefully
    pub fn close(self) -> Result<()> {
        let Self { runtime, mut conn } = self;
        runtime.block_on(async {
            sqlx::raw_sql(END_SNAPSHOT).execute(&mut conn).await?;
            conn.close().await
        })?;
        Ok(())
    }
}

impl FeatureSource for PgSource {
    fn fetch(&mut self, query: &SourceQuery) -> Result<Vec<RawRow>> {
        let Self { runtime, conn } = self;
        runtime.block_on(fetch_rows(conn, query))
    }
}

/// Translate the configuration into sqlx connect options
fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    if let Some(url) = &config.url {
        let options: PgConnectOptions = url.parse()?;
        return Ok(options.application_name(APPLICATION_NAME));
    }

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .application_name(APPLICATION_NAME);
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    Ok(options)
}

async fn fetch_rows(conn: &mut PgConnection, query: &SourceQuery) -> Result<Vec<RawRow>> {
    let sql = query.to_sql();
    tracing::debug!("Querying {} layer: {sql}", query.class);

    let mut statement = sqlx::query(&sql);
    if let Some(value) = query.bind_value() {
        statement = statement.bind(value);
    }

    let rows = statement.fetch_all(&mut *conn).await?;
    tracing::debug!("{} layer returned {} rows", query.class, rows.len());

    rows.iter().map(|row| decode_row(query.class, row)).collect()
}

/// Decode the `(geometry, attributes)` pair of one result row
fn decode_row(class: FeatureClass, row: &PgRow) -> Result<RawRow> {
    let geometry: Option<String> = row.try_get("geometry")?;
    let attributes: Option<Value> = row.try_get("attributes")?;

    let geometry = geometry.and_then(|text| parse_geometry(class, &text));

    let attributes = match attributes {
        Some(Value::Object(map)) => map,
        _ => JsonObject::new(),
    };

    Ok(RawRow::new(class, geometry, attributes))
}

/// Parse GeoJSON geometry text
///
/// Text that is not a GeoJSON geometry is treated like a null geometry; the pipeline skips
/// such rows.
fn parse_geometry(class: FeatureClass, text: &str) -> Option<Geometry> {
    match serde_json::from_str::<Geometry>(text) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            tracing::warn!("Unreadable {class} geometry: {e}");
            None
        }
    }
}
