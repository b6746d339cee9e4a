use crate::domain::ports::DatabaseAdmin;
use crate::utils::error::{Result, TaskError};
use async_trait::async_trait;
use base64::Engine;
use chrono::{Datelike, NaiveDate};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// trytond JSON-RPC 客戶端
pub struct RpcClient {
    client: Client,
    base_url: Url,
    authorization: Option<String>,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            authorization: None,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.authorization.is_some()
    }

    /// Calls a server-wide method such as `common.db.create`.
    pub async fn call_root(&self, method: &str, params: Value) -> Result<Value> {
        self.post(self.base_url.clone(), method, params).await
    }

    /// Calls a method on `database`, authenticated once `login` succeeded.
    pub async fn call(&self, database: &str, method: &str, params: Value) -> Result<Value> {
        let url = self
            .base_url
            .join(&format!("{}/", database))
            .map_err(|e| TaskError::InvalidConfigValueError {
                field: "database".to_string(),
                value: database.to_string(),
                reason: e.to_string(),
            })?;
        self.post(url, method, params).await
    }

    pub async fn login(&mut self, database: &str, user: &str, password: &str) -> Result<i64> {
        let result = self
            .call(database, "common.db.login", json!([user, {"password": password}]))
            .await?;

        let (user_id, session) = match &result {
            Value::Array(items) if items.len() >= 2 => match (items[0].as_i64(), items[1].as_str()) {
                (Some(id), Some(session)) => (id, session.to_string()),
                _ => return Err(TaskError::protocol("common.db.login", result.to_string())),
            },
            _ => {
                return Err(TaskError::remote(
                    "common.db.login",
                    format!("login rejected for user '{}'", user),
                ))
            }
        };

        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}:{}", user, user_id, session));
        self.authorization = Some(format!("Session {}", token));
        tracing::debug!("🔑 Logged in to {} as {} (id {})", database, user, user_id);
        Ok(user_id)
    }

    async fn post(&self, url: Url, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({"id": id, "method": method, "params": params});

        tracing::debug!("📡 {} {}", url, method);
        let mut request = self.client.post(url).json(&body);
        if let Some(authorization) = &self.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TaskError::remote(
                method,
                format!("HTTP {}: {}", status, text.trim()),
            ));
        }

        let reply: RpcReply = response.json().await?;
        if let Some(error) = reply.error {
            return Err(TaskError::remote(method, describe_error(&error)));
        }
        Ok(reply.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl DatabaseAdmin for RpcClient {
    async fn create_database(
        &self,
        database: &str,
        password: &str,
        language: &str,
        admin_password: &str,
    ) -> Result<()> {
        self.call_root(
            "common.db.create",
            json!([database, password, language, admin_password]),
        )
        .await?;
        Ok(())
    }
}

/// trytond 的錯誤格式為 `[exception, [message, description]]` 或字串
fn describe_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Array(items) => {
            let kind = items.first().and_then(Value::as_str).unwrap_or("Error");
            let message = match items.get(1) {
                Some(Value::Array(args)) => args
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(": "),
                Some(Value::String(message)) => message.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            if message.is_empty() {
                kind.to_string()
            } else {
                format!("{}: {}", kind, message)
            }
        }
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

pub fn date_value(date: NaiveDate) -> Value {
    json!({
        "__class__": "date",
        "year": date.year(),
        "month": date.month(),
        "day": date.day(),
    })
}

pub fn decimal_value(decimal: &str) -> Value {
    json!({"__class__": "Decimal", "decimal": decimal})
}
