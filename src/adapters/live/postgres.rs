//! Live Postgres adapter for the `Connector` port.

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection as _;
use tokio::runtime::{Builder, Runtime};

use crate::config::ConnectionSettings;
use crate::ports::{Connection, Connector};

/// Opens Postgres connections through sqlx.
pub struct LivePostgresConnector;

impl Connector for LivePostgresConnector {
    fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, Box<dyn std::error::Error + Send + Sync>> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.dbname);
        let conn = runtime.block_on(PgConnection::connect_with(&options))?;
        Ok(Box::new(LivePostgresConnection { runtime, conn, in_transaction: false }))
    }
}

struct LivePostgresConnection {
    runtime: Runtime,
    conn: PgConnection,
    in_transaction: bool,
}

impl Connection for LivePostgresConnection {
    fn execute(&mut self, sql: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Self { runtime, conn, in_transaction } = self;
        runtime.block_on(async {
            if !*in_transaction {
                sqlx::raw_sql("BEGIN").execute(&mut *conn).await?;
                *in_transaction = true;
            }
            sqlx::raw_sql(sql).execute(&mut *conn).await?;
            Ok::<_, sqlx::Error>(())
        })?;
        Ok(())
    }

    fn fetch_count(&mut self, sql: &str) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let rows = self.runtime.block_on(sqlx::raw_sql(sql).fetch_all(&mut self.conn))?;
        Ok(rows.len() as u64)
    }

    fn commit(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.in_transaction {
            self.runtime.block_on(sqlx::raw_sql("COMMIT").execute(&mut self.conn))?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Self { runtime, conn, .. } = *self;
        runtime.block_on(conn.close())?;
        Ok(())
    }
}
