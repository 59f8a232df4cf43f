//! HTTP handlers, mounted under `/api/v1`.
//!
//! | Method | Path            | Success          |
//! |--------|-----------------|------------------|
//! | GET    | `/health`       | 200              |
//! | GET    | `/todos`        | 200 array        |
//! | GET    | `/todos/<id>`   | 200 / 404        |
//! | POST   | `/todos`        | 201 / 400 / 500  |
//! | PUT    | `/todos/<id>`   | 200 / 400 / 404 / 500 |
//! | DELETE | `/todos/<id>`   | 200 (todo or `{}`) |

use chrono::{Local, NaiveDateTime};
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::Route;
use serde::Serialize;

use crate::error::ApiError;
use crate::filter::ListFilter;
use crate::models::Todo;
use crate::payload::TodoPayload;
use crate::store::{self, Db};

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Body of `DELETE /todos/<id>`: the removed todo, or `{}` if there was none.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Deleted {
    Todo(Todo),
    Nothing {},
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn read_failed(e: diesel::result::Error) -> ApiError {
    tracing::error!(error = %e, "todo store read failed");
    ApiError::Store(e.to_string())
}

#[get("/health")]
fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[get("/todos?<completed>&<window>")]
async fn list_todos(
    db: Db,
    completed: Option<&str>,
    window: Option<&str>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let filter = ListFilter::from_query(completed, window)?;
    let todos = db.run(store::list_all).await.map_err(read_failed)?;
    let todos = filter.apply(todos, now());

    tracing::debug!(?filter, count = todos.len(), "listed todos");
    Ok(Json(todos))
}

#[get("/todos/<id>")]
async fn get_todo(db: Db, id: i32) -> Result<Json<Todo>, ApiError> {
    db.run(move |conn| store::get(conn, id))
        .await
        .map_err(read_failed)?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[post("/todos", data = "<body>")]
async fn create_todo(
    db: Db,
    body: Result<TodoPayload, ApiError>,
) -> Result<Created<Json<Todo>>, ApiError> {
    let new = body?.into_new_todo(now())?;

    let todo = db
        .run(move |conn| store::insert(conn, new))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to insert todo");
            ApiError::Store(e.to_string())
        })?;

    tracing::info!(todo_id = todo.id, "todo created");
    let location = format!("{API_PREFIX}/todos/{}", todo.id);
    Ok(Created::new(location).body(Json(todo)))
}

#[put("/todos/<id>", data = "<body>")]
async fn update_todo(
    db: Db,
    id: i32,
    body: Result<TodoPayload, ApiError>,
) -> Result<Json<Todo>, ApiError> {
    // An unknown id is reported before anything about the body.
    if db
        .run(move |conn| store::get(conn, id))
        .await
        .map_err(read_failed)?
        .is_none()
    {
        return Err(ApiError::NotFound);
    }

    let changes = body?.into_changes(now())?;

    let todo = db
        .run(move |conn| store::update(conn, id, changes))
        .await
        .map_err(|e| {
            tracing::error!(todo_id = id, error = %e, "failed to update todo");
            ApiError::Store(format!("Database error: {e}"))
        })?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(todo_id = id, "todo updated");
    Ok(Json(todo))
}

#[delete("/todos/<id>")]
async fn delete_todo(db: Db, id: i32) -> Result<Json<Deleted>, ApiError> {
    let deleted = db
        .run(move |conn| store::delete(conn, id))
        .await
        .map_err(|e| {
            tracing::error!(todo_id = id, error = %e, "failed to delete todo");
            ApiError::Store(e.to_string())
        })?;

    Ok(Json(match deleted {
        Some(todo) => {
            tracing::info!(todo_id = id, "todo deleted");
            Deleted::Todo(todo)
        }
        None => Deleted::Nothing {},
    }))
}

// An id that does not parse as an integer names no todo. These catch what the
// typed routes above forward.
#[get("/todos/<_>", rank = 2)]
fn get_todo_bad_id() -> ApiError {
    ApiError::NotFound
}

#[put("/todos/<_>", rank = 2)]
fn update_todo_bad_id() -> ApiError {
    ApiError::NotFound
}

#[delete("/todos/<_>", rank = 2)]
fn delete_todo_bad_id() -> ApiError {
    ApiError::NotFound
}

pub fn routes() -> Vec<Route> {
    routes![
        health,
        list_todos,
        get_todo,
        create_todo,
        update_todo,
        delete_todo,
        get_todo_bad_id,
        update_todo_bad_id,
        delete_todo_bad_id
    ]
}
