use crate::adapters::rpc::RpcClient;
use crate::config::ConnectionSettings;
use crate::domain::model::{ConfigWizardItem, Module, ModuleState, WizardItemState};
use crate::domain::ports::{ConfigWizardItems, ModuleRepository};
use crate::utils::error::{Result, TaskError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{RwLock, RwLockReadGuard};

pub const DEFAULT_LANGUAGE: &str = "en_US";

/// 一次命令執行期間的遠端連線
pub struct Session {
    client: RpcClient,
    database: String,
    user: String,
    user_id: i64,
    context: RwLock<Map<String, Value>>,
}

impl Session {
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let mut client = RpcClient::new(settings.server_url.clone(), settings.timeout)?;
        let user_id = client
            .login(&settings.database, &settings.user, &settings.password)
            .await?;

        let session = Self {
            client,
            database: settings.database.clone(),
            user: settings.user.clone(),
            user_id,
            context: RwLock::new(Map::new()),
        };
        session.refresh_context().await?;

        tracing::info!(
            "🔌 Connected to {} as {} (language {})",
            session.database,
            session.user,
            session.language()?
        );
        Ok(session)
    }

    /// Re-reads the user preferences; needed after the user's company changes.
    pub async fn refresh_context(&self) -> Result<()> {
        let preferences = self
            .client
            .call(
                &self.database,
                "model.res.user.get_preferences",
                json!([true, {}]),
            )
            .await?;
        let map = match preferences {
            Value::Object(map) => map,
            other => {
                return Err(TaskError::protocol(
                    "model.res.user.get_preferences",
                    other.to_string(),
                ))
            }
        };
        self.store_context(map)
    }

    fn store_context(&self, map: Map<String, Value>) -> Result<()> {
        let mut context = self.context.write().map_err(|e| TaskError::StateError {
            details: format!("context lock poisoned: {}", e),
        })?;
        *context = map;
        Ok(())
    }

    fn read_context(&self) -> Result<RwLockReadGuard<'_, Map<String, Value>>> {
        self.context.read().map_err(|e| TaskError::StateError {
            details: format!("context lock poisoned: {}", e),
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn context(&self) -> Result<Value> {
        Ok(Value::Object(self.read_context()?.clone()))
    }

    pub fn context_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_context()?.get(key).cloned())
    }

    pub fn language(&self) -> Result<String> {
        Ok(self
            .context_value("language")?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()))
    }

    /// `model.<model>.<method>(*args, context)`
    pub async fn execute(&self, model: &str, method: &str, mut args: Vec<Value>) -> Result<Value> {
        args.push(self.context()?);
        self.client
            .call(
                &self.database,
                &format!("model.{}.{}", model, method),
                Value::Array(args),
            )
            .await
    }

    pub async fn search(&self, model: &str, domain: Value, limit: Option<u32>) -> Result<Vec<i64>> {
        let result = self
            .execute(model, "search", vec![domain, json!(0), json!(limit), Value::Null])
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn search_read<T: DeserializeOwned>(
        &self,
        model: &str,
        domain: Value,
        limit: Option<u32>,
        fields: &[&str],
    ) -> Result<Vec<T>> {
        let result = self
            .execute(
                model,
                "search_read",
                vec![domain, json!(0), json!(limit), Value::Null, json!(fields)],
            )
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn create(&self, model: &str, records: Vec<Value>) -> Result<Vec<i64>> {
        let result = self.execute(model, "create", vec![Value::Array(records)]).await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn create_one(&self, model: &str, record: Value) -> Result<i64> {
        self.create(model, vec![record])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TaskError::protocol(format!("model.{}.create", model), "no id returned"))
    }

    pub async fn write(&self, model: &str, ids: &[i64], values: Value) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.execute(model, "write", vec![json!(ids), values]).await?;
        Ok(())
    }

    /// Clicks a button (workflow transition) on every record in `ids`.
    pub async fn button(&self, model: &str, button: &str, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.execute(model, button, vec![json!(ids)]).await?;
        Ok(())
    }

    /// Database id of the XML record `module.fs_id`.
    pub async fn model_data_id(&self, module: &str, fs_id: &str) -> Result<i64> {
        #[derive(Deserialize)]
        struct ModelData {
            db_id: i64,
        }

        let rows: Vec<ModelData> = self
            .search_read(
                "ir.model.data",
                json!([["module", "=", module], ["fs_id", "=", fs_id]]),
                Some(1),
                &["db_id"],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(|r| r.db_id)
            .ok_or_else(|| TaskError::missing_record("ir.model.data", format!("{}.{}", module, fs_id)))
    }

    pub async fn start_wizard(&self, name: &str) -> Result<Wizard<'_>> {
        let result = self
            .client
            .call(
                &self.database,
                &format!("wizard.{}.create", name),
                json!([self.context()?]),
            )
            .await?;
        let session_id = result
            .get(0)
            .and_then(Value::as_i64)
            .ok_or_else(|| TaskError::protocol(format!("wizard.{}.create", name), result.to_string()))?;
        Ok(Wizard {
            session: self,
            name: name.to_string(),
            session_id,
        })
    }

    /// Runs `name` through `states` in order and deletes the wizard session.
    pub async fn run_wizard(&self, name: &str, states: &[(&str, Value)]) -> Result<()> {
        let wizard = self.start_wizard(name).await?;
        for (state, data) in states {
            wizard.execute(state, data.clone()).await?;
        }
        wizard.finish().await
    }
}

pub struct Wizard<'a> {
    session: &'a Session,
    name: String,
    session_id: i64,
}

impl Wizard<'_> {
    pub async fn execute(&self, state: &str, data: Value) -> Result<Value> {
        self.session
            .client
            .call(
                &self.session.database,
                &format!("wizard.{}.execute", self.name),
                json!([self.session_id, data, state, self.session.context()?]),
            )
            .await
    }

    pub async fn finish(self) -> Result<()> {
        self.session
            .client
            .call(
                &self.session.database,
                &format!("wizard.{}.delete", self.name),
                json!([self.session_id, self.session.context()?]),
            )
            .await?;
        Ok(())
    }
}

const MODULE_FIELDS: &[&str] = &["id", "name", "state"];

#[async_trait]
impl ModuleRepository for Session {
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Module>> {
        self.search_read("ir.module", json!([["name", "in", names]]), None, MODULE_FIELDS)
            .await
    }

    async fn find_by_state(&self, state: ModuleState) -> Result<Vec<Module>> {
        self.search_read(
            "ir.module",
            json!([["state", "=", state.as_str()]]),
            None,
            MODULE_FIELDS,
        )
        .await
    }

    async fn request_install(&self, ids: &[i64]) -> Result<()> {
        self.button("ir.module", "install", ids).await
    }

    async fn request_upgrade(&self, ids: &[i64]) -> Result<()> {
        self.button("ir.module", "upgrade", ids).await
    }

    async fn apply_pending(&self) -> Result<()> {
        tracing::info!("⚙️ Running install/upgrade wizard");
        self.run_wizard("ir.module.install_upgrade", &[("upgrade", json!({}))])
            .await
    }
}

#[async_trait]
impl ConfigWizardItems for Session {
    async fn find_pending(&self) -> Result<Vec<ConfigWizardItem>> {
        self.search_read(
            "ir.module.config_wizard.item",
            json!([["state", "!=", "done"]]),
            None,
            &["id", "state"],
        )
        .await
    }

    async fn mark_done(&self, ids: &[i64]) -> Result<()> {
        self.write(
            "ir.module.config_wizard.item",
            ids,
            json!({"state": WizardItemState::Done}),
        )
        .await
    }
}
