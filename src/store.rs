//! The todo store: a pooled SQLite connection plus the five operations the
//! handlers need. Every write runs inside a transaction and is rolled back on
//! error.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rocket::fairing::{self, AdHoc};
use rocket::{Build, Rocket};
use rocket_sync_db_pools::database;

use crate::config::AppConfig;
use crate::models::{NewTodo, Todo, TodoChanges};
use crate::schema::todos;

#[database("todo_db")]
pub struct Db(SqliteConnection);

const CREATE_TODOS: &str = "\
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    completed BOOLEAN NOT NULL DEFAULT 0,
    deadline_at TIMESTAMP,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
)";

pub fn insert(conn: &mut SqliteConnection, new: NewTodo) -> QueryResult<Todo> {
    conn.transaction(|conn| {
        diesel::insert_into(todos::table)
            .values(&new)
            .returning(Todo::as_returning())
            .get_result(conn)
    })
}

pub fn get(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Todo>> {
    todos::table
        .find(id)
        .select(Todo::as_select())
        .first(conn)
        .optional()
}

pub fn list_all(conn: &mut SqliteConnection) -> QueryResult<Vec<Todo>> {
    todos::table
        .order(todos::id.asc())
        .select(Todo::as_select())
        .load(conn)
}

/// Applies `changes` to an existing row; `None` when the id is unknown. An
/// empty changeset leaves the row as it is.
pub fn update(conn: &mut SqliteConnection, id: i32, changes: TodoChanges) -> QueryResult<Option<Todo>> {
    if changes.is_empty() {
        return get(conn, id);
    }

    conn.transaction(|conn| {
        diesel::update(todos::table.find(id))
            .set(&changes)
            .returning(Todo::as_returning())
            .get_result(conn)
            .optional()
    })
}

/// Removes a row and hands it back; `None` when there was nothing to remove.
pub fn delete(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Todo>> {
    conn.transaction(|conn| {
        diesel::delete(todos::table.find(id))
            .returning(Todo::as_returning())
            .get_result(conn)
            .optional()
    })
}

fn create_schema(conn: &mut SqliteConnection) -> QueryResult<usize> {
    diesel::sql_query(CREATE_TODOS).execute(conn)
}

async fn bootstrap(rocket: Rocket<Build>) -> fairing::Result {
    let init_schema = rocket
        .state::<AppConfig>()
        .map_or(true, |config| config.init_schema);
    if !init_schema {
        return Ok(rocket);
    }

    let Some(db) = Db::get_one(&rocket).await else {
        tracing::error!("no todo_db connection available for schema bootstrap");
        return Err(rocket);
    };

    match db.run(create_schema).await {
        Ok(_) => {
            tracing::info!("todos schema ready");
            Ok(rocket)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to create todos schema");
            Err(rocket)
        }
    }
}

/// Attaches the connection pool and, unless disabled, creates the `todos`
/// table on ignition.
pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Todo store", |rocket| async {
        rocket
            .attach(Db::fairing())
            .attach(AdHoc::try_on_ignite("Todo schema", bootstrap))
    })
}
