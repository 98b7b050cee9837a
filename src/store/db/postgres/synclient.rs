use std::{future::Future, sync::Arc, time::Duration};

use sqlx::{
    Database, Error, IntoArguments, PgPool, Postgres,
    postgres::{PgPoolOptions, PgRow},
};
use tokio::{
    runtime::{Handle, Runtime},
    task::block_in_place,
};

use crate::config::PostgresConfig;

/// Blocking facade over an async sqlx pool.
///
/// Each call runs to completion on the owned runtime. When the caller is
/// already inside a runtime the call is wrapped in `block_in_place`, which
/// needs a multi-thread runtime.
#[derive(Debug, Clone)]
pub struct SynClient {
    pool: PgPool,

    runtime: Arc<Runtime>,
}

impl SynClient {
    pub fn connect(
        config: &PostgresConfig,
        runtime: Arc<Runtime>,
    ) -> Result<Self, Error> {
        let options = PgPoolOptions::new().acquire_timeout(Duration::from_secs(config.acquire_timeout_secs)).max_connections(config.max_connections);
        let url = config.database_url.clone();
        let pool = Self::run(&runtime, async move { options.connect(&url).await })?;

        Ok(Self {
            pool,
            runtime,
        })
    }

    fn run<F: Future>(
        runtime: &Runtime,
        fut: F,
    ) -> F::Output {
        if Handle::try_current().is_ok() {
            block_in_place(|| runtime.block_on(fut))
        } else {
            runtime.block_on(fut)
        }
    }

    pub fn query_optional<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<Option<PgRow>, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        Self::run(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).fetch_optional(&mut *conn).await
        })
    }

    pub fn query_one<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<PgRow, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        Self::run(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).fetch_one(&mut *conn).await
        })
    }

    /// Runs `sql` and then `follow_up` in one transaction, returning the
    /// row produced by `sql`.
    pub fn query_one_then<'q, A>(
        &self,
        sql: &'q str,
        params: A,
        follow_up: &'q str,
    ) -> Result<PgRow, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        Self::run(&self.runtime, async move {
            let mut tx = self.pool.begin().await?;

            let row = sqlx::query_with(sql, params).fetch_one(&mut *tx).await?;
            sqlx::query(follow_up).execute(&mut *tx).await?;
            tx.commit().await?;
            Ok(row)
        })
    }

    pub fn query<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<Vec<PgRow>, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        Self::run(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).fetch_all(&mut *conn).await
        })
    }

    pub fn execute<'q, A>(
        &self,
        sql: &'q str,
        params: A,
    ) -> Result<<Postgres as Database>::QueryResult, Error>
    where
        A: IntoArguments<'q, Postgres> + 'q,
    {
        Self::run(&self.runtime, async move {
            let mut conn = self.pool.acquire().await?;

            sqlx::query_with(sql, params).execute(&mut *conn).await
        })
    }

    pub fn batch_execute(
        &self,
        sqls: &[String],
    ) -> Result<(), Error> {
        Self::run(&self.runtime, async move {
            let mut tx = self.pool.begin().await?;

            for sql in sqls {
                sqlx::query(sql).execute(&mut *tx).await?;
            }
            tx.commit().await
        })
    }
}
