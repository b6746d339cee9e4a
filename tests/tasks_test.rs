use httpmock::prelude::*;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use tryton_demo_tasks::app::tasks::{self, InstallOptions};
use tryton_demo_tasks::TaskError;

fn write_config(server: &MockServer) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[database]
uri = postgresql://tryton@localhost:5432/

[jsonrpc]
url = {}
timeout_seconds = 5
"#,
        server.base_url()
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_create_task_uses_configured_server() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("common.db.create")
            .body_contains("\"es_ES\"");
        then.status(200).json_body(json!({"id": 1, "result": true}));
    });
    let file = write_config(&server);

    let config = tasks::load_config(file.path()).unwrap();
    tasks::create(&config, "gal_demo", "es_ES", "admin").await.unwrap();

    create.assert();
}

#[tokio::test]
async fn test_install_with_empty_modules_runs_no_fixtures() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/demo/")
            .body_contains("common.db.login");
        then.status(200).json_body(json!({"id": 1, "result": [1, "abc"]}));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/demo/")
            .body_contains("model.res.user.get_preferences");
        then.status(200)
            .json_body(json!({"id": 2, "result": {"language": "en_US"}}));
    });
    let installed = server.mock(|when, then| {
        when.method(POST)
            .path("/demo/")
            .body_contains("model.ir.module.search_read")
            .body_contains("\"installed\"");
        then.status(200).json_body(json!({"id": 3, "result": [
            {"id": 1, "name": "ir", "state": "installed"},
        ]}));
    });
    let file = write_config(&server);
    let config = tasks::load_config(file.path()).unwrap();

    let options = InstallOptions {
        database: "demo".to_string(),
        password: "admin".to_string(),
        modules: String::new(),
        extensions: Vec::new(),
    };
    let outcome = tasks::install(&config, &options).await.unwrap();

    installed.assert();
    assert!(outcome.report.to_install.is_empty());
    assert!(outcome.steps.iter().all(|s| !s.executed()));
}

#[tokio::test]
async fn test_invalid_database_name_rejected_before_shell() {
    let server = MockServer::start();
    let file = write_config(&server);
    let config = tasks::load_config(file.path()).unwrap();

    let err = tasks::dump(&config, "demo; rm -rf /").await.unwrap_err();

    assert!(matches!(err, TaskError::InvalidConfigValueError { .. }));
}

#[test]
fn test_missing_config_file() {
    let err = tasks::load_config("/nonexistent/trytond.conf").unwrap_err();
    assert!(matches!(err, TaskError::ConfigError { .. }));
}
