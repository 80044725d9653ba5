//! Todo API Example
//!
//! Demonstrates courier's typed request pipeline against JSONPlaceholder.

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]

use courier::ValueSchema;
use courier::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Data Types
// ============================================================================

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub completed: bool,
}

/// Payload to create a todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub user_id: u64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// List filter, sent as query parameters.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(rename = "_limit", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

const MAX_LIMIT: u64 = 100;

// ============================================================================
// Schemas
// ============================================================================

/// Clamp `_limit` to the server maximum.
fn filter_schema() -> impl ValueSchema {
    schema_fn(|mut query: Value| -> std::result::Result<Value, SchemaError> {
        if let Some(limit) = query.get_mut("_limit") {
            let value = limit
                .as_u64()
                .ok_or_else(|| Issue::at("_limit", "expected a positive integer"))?;
            *limit = Value::from(value.clamp(1, MAX_LIMIT));
        }
        Ok(query)
    })
}

/// Reject blank titles, trim the others.
fn new_todo_schema() -> impl ValueSchema {
    schema_fn(|body: Value| -> std::result::Result<NewTodo, SchemaError> {
        let mut todo: NewTodo = typed::<NewTodo>().parse(body)?;
        todo.title = todo.title.trim().to_string();
        if todo.title.is_empty() {
            return Err(SchemaError::new(Issue::at("title", "must not be blank")));
        }
        Ok(todo)
    })
}

// ============================================================================
// Client
// ============================================================================

/// JSONPlaceholder todo client.
#[derive(Debug, Clone)]
pub struct TodoApi<T> {
    client: ApiClient<T, kind::Json>,
}

impl TodoApi<HyperTransport> {
    /// Client over a logging hyper transport.
    #[must_use]
    pub fn connect(base_url: impl Into<String>, token: Option<&str>) -> Self {
        let transport = HyperTransport::builder().with_logging().build();
        Self::new(base_url, token, transport)
    }
}

impl<T: Transport> TodoApi<T> {
    pub fn new(base_url: impl Into<String>, token: Option<&str>, transport: T) -> Self {
        let mut config = ClientConfig::builder(base_url)
            .header("Accept", "application/json")
            .response_type::<kind::Json>();
        if let Some(token) = token {
            config = config.authorization(BearerAuth::new(token));
        }
        Self {
            client: create_client(config.build(), transport),
        }
    }

    pub async fn list(&self, filter: &TodoFilter) -> courier::Result<Vec<Todo>> {
        let request = ApiRequest::get("/todos")
            .query(serde_json::to_value(filter).unwrap_or_default())
            .query_schema(filter_schema())
            .output(typed::<Vec<Todo>>());
        self.client.send(request).await
    }

    pub async fn get(&self, id: u64) -> courier::Result<Todo> {
        self.client
            .send(ApiRequest::get(format!("/todos/{id}")).output(typed::<Todo>()))
            .await
    }

    pub async fn create(&self, todo: &NewTodo) -> courier::Result<Todo> {
        let request = ApiRequest::post("/todos")
            .header("Content-Type", "application/json; charset=UTF-8")
            .body(serde_json::to_value(todo).unwrap_or_default())
            .body_schema(new_todo_schema())
            .output(typed::<Todo>());
        self.client.send(request).await
    }

    pub async fn delete(&self, id: u64) -> courier::Result<Response> {
        self.client
            .send(ApiRequest::delete(format!("/todos/{id}")).response_type::<kind::Raw>())
            .await
    }
}

// ============================================================================
// Main: Demonstrate usage
// ============================================================================

#[tokio::main]
async fn main() -> courier::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,courier=debug")),
        )
        .init();

    let token = std::env::var("TODO_API_TOKEN").ok();
    let api = TodoApi::connect("https://jsonplaceholder.typicode.com", token.as_deref());

    let filter = TodoFilter {
        user_id: Some(1),
        completed: Some(false),
        limit: Some(500),
    };
    let todos = api.list(&filter).await?;
    println!("{} open todos for user 1", todos.len());

    let todo = api.get(1).await?;
    println!("todo #1: {} (completed: {})", todo.title, todo.completed);

    let created = api
        .create(&NewTodo {
            user_id: 1,
            title: "  Try courier  ".to_string(),
            completed: false,
        })
        .await?;
    println!("created todo #{}: {:?}", created.id, created.title);

    match api.get(9_999).await {
        Err(err @ courier::Error::Http { .. }) => println!("expected failure: {err}"),
        other => println!("unexpected outcome: {other:?}"),
    }

    let deleted = api.delete(1).await?;
    println!("delete status: {}", deleted.status());

    Ok(())
}

// ============================================================================
// Tests using wiremock
// ============================================================================
