use crate::utils::error::{Result, TaskError};
use crate::utils::validation::{self, Validate};
use ini::{Ini, ParseOption, Properties};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "./trytond.conf";
pub const DEFAULT_JSONRPC_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_USER: &str = "admin";
pub const DEFAULT_COMPANY_NAME: &str = "TrytonERP";
pub const DEFAULT_CURRENCY: &str = "EUR";

/// `trytond.conf` 的內容 (與 trytond 相同的 INI 格式)
///
/// Only `[database] uri` is required. `[jsonrpc] url` and `[tasks]` are read
/// by this tool alone; trytond ignores options it does not know.
#[derive(Debug, Clone)]
pub struct TrytondConfig {
    pub database: DatabaseSection,
    pub jsonrpc: JsonRpcSection,
    pub tasks: TasksSection,
}

#[derive(Debug, Clone)]
pub struct DatabaseSection {
    pub uri: String,
}

#[derive(Debug, Clone, Default)]
pub struct JsonRpcSection {
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct TasksSection {
    pub user: Option<String>,
    pub company_name: Option<String>,
    pub currency: Option<String>,
    pub extensions: Vec<String>,
}

impl TrytondConfig {
    /// 從檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TaskError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_ini_str(&content)
    }

    pub fn from_ini_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        // trytond values are taken verbatim: no quoting, no backslash escapes
        let mut options = ParseOption::default();
        options.enabled_quote = false;
        options.enabled_escape = false;
        let ini = Ini::load_from_str_opt(&processed_content, options).map_err(|e| {
            TaskError::ConfigError {
                message: format!("INI parsing error: {}", e),
            }
        })?;

        let uri = option(&ini, "database", "uri").ok_or_else(|| TaskError::MissingConfigError {
            field: "database.uri".to_string(),
        })?;

        let url = option(&ini, "jsonrpc", "url").or_else(|| {
            option(&ini, "web", "listen")
                .or_else(|| option(&ini, "jsonrpc", "listen"))
                .map(|listen| listen_to_url(&listen))
        });
        let timeout_seconds = option(&ini, "jsonrpc", "timeout_seconds")
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|e| TaskError::InvalidConfigValueError {
                        field: "jsonrpc.timeout_seconds".to_string(),
                        value: raw.clone(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        let tasks = TasksSection {
            user: option(&ini, "tasks", "user"),
            company_name: option(&ini, "tasks", "company_name"),
            currency: option(&ini, "tasks", "currency"),
            extensions: option(&ini, "tasks", "extensions")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        };

        Ok(Self {
            database: DatabaseSection { uri },
            jsonrpc: JsonRpcSection {
                url,
                timeout_seconds,
            },
            tasks,
        })
    }

    /// 替換環境變數 (例如 ${TRYTOND_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TaskError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url_scheme(
            "database.uri",
            &self.database.uri,
            &["postgresql", "postgres", "sqlite"],
        )?;
        validation::validate_url("jsonrpc.url", self.jsonrpc_url())?;
        validation::validate_positive_number("jsonrpc.timeout_seconds", self.timeout_seconds(), 1)?;
        validation::validate_non_empty_string("tasks.user", self.user())?;
        Ok(())
    }

    /// `[database] uri` 中的使用者名稱；沒有就交給 PostgreSQL 預設
    pub fn database_username(&self) -> Result<Option<String>> {
        let uri = Url::parse(&self.database.uri).map_err(|e| TaskError::InvalidConfigValueError {
            field: "database.uri".to_string(),
            value: self.database.uri.clone(),
            reason: e.to_string(),
        })?;
        let username = uri.username();
        if username.is_empty() {
            Ok(None)
        } else {
            Ok(Some(username.to_string()))
        }
    }

    pub fn jsonrpc_url(&self) -> &str {
        self.jsonrpc.url.as_deref().unwrap_or(DEFAULT_JSONRPC_URL)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.jsonrpc
            .timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds())
    }

    pub fn user(&self) -> &str {
        self.tasks.user.as_deref().unwrap_or(DEFAULT_USER)
    }

    pub fn company_name(&self) -> &str {
        self.tasks
            .company_name
            .as_deref()
            .unwrap_or(DEFAULT_COMPANY_NAME)
    }

    pub fn currency(&self) -> &str {
        self.tasks.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn extensions(&self) -> &[String] {
        &self.tasks.extensions
    }
}

impl Validate for TrytondConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

fn option(ini: &Ini, section: &str, key: &str) -> Option<String> {
    ini.section(Some(section))
        .and_then(|props: &Properties| props.get(key))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// `listen = *:8000` / `0.0.0.0:8000` 轉成可連線的 URL
fn listen_to_url(listen: &str) -> String {
    let (host, port) = match listen.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (listen, None),
    };
    let host = match host {
        "" | "*" | "0.0.0.0" | "[::]" => "localhost",
        other => other,
    };
    match port {
        Some(port) => format!("http://{}:{}", host, port),
        None => format!("http://{}", host),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
