//! MySQL implementation of the session traits.

use crate::db::session::{ControlStatement, SessionConnection};
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::{JsonRow, QueryParam};
use sqlx::mysql::MySqlArguments;
use sqlx::pool::PoolConnection;
use sqlx::{Executor, MySql};

impl SessionConnection for PoolConnection<MySql> {
    async fn execute_control(&mut self, statement: ControlStatement) -> DbResult<()> {
        // Text protocol; control statements take no parameters
        (&mut **self)
            .execute(statement.sql())
            .await
            .map(|_| ())
            .map_err(DbError::from)
    }

    async fn fetch_rows(&mut self, sql: &str, params: &[QueryParam]) -> DbResult<Vec<JsonRow>> {
        // Always a server-side prepared statement, which only accepts a
        // single statement. Not cached: the SQL is arbitrary.
        let mut query = sqlx::query(sql).persistent(false);
        for param in params {
            query = bind_param(query, param);
        }

        let rows = query.fetch_all(&mut **self).await?;
        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    fn poison(&mut self) {
        self.close_on_drop();
    }
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q QueryParam,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        QueryParam::Null => query.bind(None::<String>),
        QueryParam::Bool(v) => query.bind(*v),
        QueryParam::Int(v) => query.bind(*v),
        QueryParam::Float(v) => query.bind(*v),
        QueryParam::String(v) => query.bind(v.as_str()),
        QueryParam::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}
