use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Connection failed: {0}")]
    ConnectionError(#[from] reqwest::Error),

    #[error("Remote call '{method}' failed: {message}")]
    RemoteError { method: String, message: String },

    #[error("Unexpected response from '{method}': {details}")]
    ProtocolError { method: String, details: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Command '{command}' exited with {code:?}: {stderr}")]
    CommandError {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("No {model} record matching {criteria}")]
    MissingRecordError { model: String, criteria: String },

    #[error("Fixture step '{step}' failed: {details}")]
    FixtureError { step: String, details: String },

    #[error("Session state unavailable: {details}")]
    StateError { details: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connection,
    Remote,
    Configuration,
    Process,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskError {
    pub fn remote(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteError {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn protocol(method: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ProtocolError {
            method: method.into(),
            details: details.into(),
        }
    }

    pub fn missing_record(model: impl Into<String>, criteria: impl Into<String>) -> Self {
        Self::MissingRecordError {
            model: model.into(),
            criteria: criteria.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConnectionError(_) => ErrorCategory::Connection,
            Self::RemoteError { .. }
            | Self::ProtocolError { .. }
            | Self::MissingRecordError { .. }
            | Self::FixtureError { .. } => ErrorCategory::Remote,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::CommandError { .. } => ErrorCategory::Process,
            Self::IoError(_) | Self::SerializationError(_) | Self::StateError { .. } => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Connection => ErrorSeverity::Medium,
            ErrorCategory::Remote | ErrorCategory::Process => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConnectionError(_) => {
                "Check that trytond is running and that [jsonrpc] url points to it"
            }
            Self::RemoteError { .. } | Self::ProtocolError { .. } => {
                "Check the trytond server log; the database may be partially seeded"
            }
            Self::MissingRecordError { .. } => {
                "Make sure the module providing this record is installed"
            }
            Self::FixtureError { .. } => {
                "Drop the database and run create/install again"
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Review ./trytond.conf ([database] uri, [jsonrpc] url)"
            }
            Self::CommandError { .. } => {
                "Make sure the PostgreSQL client tools are on PATH and the user can connect"
            }
            Self::IoError(_) => "Check file permissions in the working directory",
            Self::SerializationError(_) => "The server answered with unexpected data",
            Self::StateError { .. } => "Run the command again; an earlier task panicked",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConnectionError(_) => format!("Cannot reach the Tryton server: {}", self),
            Self::CommandError { command, .. } => format!("Shell command failed: {}", command),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
