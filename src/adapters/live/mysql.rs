//! Live MySQL adapter for the `Connector` port.

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection as _;
use tokio::runtime::{Builder, Runtime};

use crate::config::ConnectionSettings;
use crate::ports::{Connection, Connector};

/// Opens MySQL connections through sqlx.
pub struct LiveMySqlConnector;

impl Connector for LiveMySqlConnector {
    fn connect(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<Box<dyn Connection>, Box<dyn std::error::Error + Send + Sync>> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.dbname);
        let conn = runtime.block_on(MySqlConnection::connect_with(&options))?;
        Ok(Box::new(LiveMySqlConnection { runtime, conn, in_transaction: false }))
    }
}

// DDL commits implicitly on MySQL; COMMIT is still issued.
struct LiveMySqlConnection {
    runtime: Runtime,
    conn: MySqlConnection,
    in_transaction: bool,
}

impl Connection for LiveMySqlConnection {
    fn execute(&mut self, sql: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Self { runtime, conn, in_transaction } = self;
        runtime.block_on(async {
            if !*in_transaction {
                sqlx::raw_sql("START TRANSACTION").execute(&mut *conn).await?;
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
