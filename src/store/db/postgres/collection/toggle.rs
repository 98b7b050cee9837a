use sea_query::{ColumnDef, Expr as SeaExpr, Func as SeaFunc, Iden, OnConflict, Order as SeaOrder, PostgresQueryBuilder, Query as SeaQuery, Table};
use sea_query_binder::{SqlxBinder, SqlxValues};
use sqlx::{Error as DbError, Row, postgres::PgRow};
use tracing::trace;

use crate::{
    ParamError, Result,
    model::ToggleRecord,
    store::{
        RecordStore,
        db::postgres::{DbInit, DbRow},
        map_db_err,
    },
};

use super::DbConnection;

#[derive(Debug)]
pub struct ToggleCollection {
    conn: DbConnection,
}

#[derive(Iden, Clone, Copy)]
#[iden = "parametrization"]
enum CollectionIden {
    Table,

    Id,
    #[iden = "key_ref"]
    Key,
    Description,
    Enabled,
    CreatedAt,
}

const COLUMNS: [CollectionIden; 5] = [CollectionIden::Id, CollectionIden::Key, CollectionIden::Description, CollectionIden::Enabled, CollectionIden::CreatedAt];

/// Moves the id sequence past every stored id. Never moves it backwards.
const SYNC_ID_SEQUENCE: &str = r#"SELECT setval(pg_get_serial_sequence('parametrization', 'id'), GREATEST((SELECT MAX("id") FROM "parametrization"), nextval(pg_get_serial_sequence('parametrization', 'id'))))"#;

fn find_by_id_statement(id: i64) -> (String, SqlxValues) {
    SeaQuery::select().columns(COLUMNS).from(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Id).eq(id)).build_sqlx(PostgresQueryBuilder)
}

fn find_by_key_statement(key: &str) -> (String, SqlxValues) {
    SeaQuery::select().columns(COLUMNS).from(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Key).eq(key)).build_sqlx(PostgresQueryBuilder)
}

fn save_statement(record: &ToggleRecord) -> Result<(String, SqlxValues)> {
    let mut insert = SeaQuery::insert();
    insert.into_table(CollectionIden::Table);

    match record.id {
        None => {
            insert
                .columns([CollectionIden::Key, CollectionIden::Description, CollectionIden::Enabled, CollectionIden::CreatedAt])
                .values([record.key.clone().into(), record.description.clone().into(), record.enabled.into(), record.created_at.into()])
                .map_err(map_db_err)?;
        }
        Some(id) => {
            insert
                .columns(COLUMNS)
                .values([id.into(), record.key.clone().into(), record.description.clone().into(), record.enabled.into(), record.created_at.into()])
                .map_err(map_db_err)?
                .on_conflict(
                    OnConflict::column(CollectionIden::Id).update_columns([CollectionIden::Key, CollectionIden::Description, CollectionIden::Enabled]).to_owned(),
                );
        }
    }

    Ok(insert.returning(SeaQuery::returning().columns(COLUMNS)).build_sqlx(PostgresQueryBuilder))
}

fn update_enabled_statement(
    id: i64,
    enabled: bool,
) -> (String, SqlxValues) {
    SeaQuery::update()
        .table(CollectionIden::Table)
        .values([(CollectionIden::Enabled, enabled.into())])
        .and_where(SeaExpr::col(CollectionIden::Id).eq(id))
        .build_sqlx(PostgresQueryBuilder)
}

fn delete_statement(id: i64) -> (String, SqlxValues) {
    SeaQuery::delete().from_table(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Id).eq(id)).build_sqlx(PostgresQueryBuilder)
}

impl RecordStore for ToggleCollection {
    fn find_by_id(
        &self,
        id: i64,
    ) -> Result<Option<ToggleRecord>> {
        trace!("postgres::find_by_id({})", id);
        let (sql, values) = find_by_id_statement(id);
        let row = self.conn.query_optional(&sql, values)?;
        row.map(|row| ToggleRecord::from_row(&row)).transpose().map_err(ParamError::from)
    }

    fn find_by_key(
        &self,
        key: &str,
    ) -> Result<Option<ToggleRecord>> {
        trace!("postgres::find_by_key({})", key);
        let (sql, values) = find_by_key_statement(key);
        let row = self.conn.query_optional(&sql, values)?;
        row.map(|row| ToggleRecord::from_row(&row)).transpose().map_err(ParamError::from)
    }

    fn find_all(&self) -> Result<Vec<ToggleRecord>> {
        trace!("postgres::find_all");
        let (sql, values) = SeaQuery::select().columns(COLUMNS).from(CollectionIden::Table).order_by(CollectionIden::Id, SeaOrder::Asc).build_sqlx(PostgresQueryBuilder);
        let rows = self.conn.query(&sql, values)?;
        rows.iter().map(ToggleRecord::from_row).collect::<std::result::Result<Vec<_>, _>>().map_err(ParamError::from)
    }

    fn count(&self) -> Result<usize> {
        let (sql, values) = SeaQuery::select().from(CollectionIden::Table).expr(SeaFunc::count(SeaExpr::col(CollectionIden::Id))).build_sqlx(PostgresQueryBuilder);
        let count = self.conn.query_one(sql.as_str(), values)?.try_get::<i64, usize>(0)?;
        Ok(count as usize)
    }

    fn save(
        &self,
        record: &ToggleRecord,
    ) -> Result<ToggleRecord> {
        trace!("postgres::save({:?}, {})", record.id, record.key);
        let (sql, values) = save_statement(record)?;
        let row = match record.id {
            Some(_) => self.conn.query_one_then(&sql, values, SYNC_ID_SEQUENCE)?,
            None => self.conn.query_one(&sql, values)?,
        };
        Ok(ToggleRecord::from_row(&row)?)
    }

    fn update_enabled_state(
        &self,
        id: i64,
        enabled: bool,
    ) -> Result<()> {
        trace!("postgres::update_enabled_state({}, {})", id, enabled);
        let (sql, values) = update_enabled_statement(id, enabled);
        let result = self.conn.execute(sql.as_str(), values)?;
        trace!("postgres::update_enabled_state({}) affected {} rows", id, result.rows_affected());
        Ok(())
    }

    fn delete_by_id(
        &self,
        id: i64,
    ) -> Result<()> {
        trace!("postgres::delete_by_id({})", id);
        let (sql, values) = delete_statement(id);
        let result = self.conn.execute(sql.as_str(), values)?;
        trace!("postgres::delete_by_id({}) affected {} rows", id, result.rows_affected());
        Ok(())
    }
}

impl DbRow for ToggleRecord {
    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        Ok(Self {
            id: Some(row.try_get("id")?),
            key: row.try_get("key_ref")?,
            description: row.try_get("description")?,
            enabled: row.try_get("enabled")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl DbInit for ToggleCollection {
    fn init(&self) -> Result<()> {
        let sql = [Table::create()
            .table(CollectionIden::Table)
            .if_not_exists()
            .col(ColumnDef::new(CollectionIden::Id).big_integer().not_null().auto_increment().primary_key())
            .col(ColumnDef::new(CollectionIden::Key).string().not_null().unique_key())
            .col(ColumnDef::new(CollectionIden::Description).text().not_null())
            .col(ColumnDef::new(CollectionIden::Enabled).boolean().not_null())
            .col(ColumnDef::new(CollectionIden::CreatedAt).timestamp_with_time_zone().not_null())
            .build(PostgresQueryBuilder)];

        self.conn.batch_execute(&sql)?;
        Ok(())
    }
}

impl ToggleCollection {
    pub fn new(conn: &DbConnection) -> Self {
        Self {
            conn: conn.clone(),
        }
    }
}
