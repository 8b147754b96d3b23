use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

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

    #[error("Unexpected response from {source_name}: HTTP {status}")]
    SourceResponseError { source_name: String, status: u16 },

    #[error("Webhook rejected the message: HTTP {status}")]
    WebhookError { status: u16 },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NotifierError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::SourceResponseError { .. } | Self::WebhookError { .. } => {
                ErrorCategory::Network
            }
            Self::IoError(_) | Self::CsvError(_) => ErrorCategory::Storage,
            Self::SerializationError(_) | Self::ProcessingError { .. } => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 遠端暫時性錯誤，下次排程通常就會恢復
            Self::ApiError(_) | Self::SourceResponseError { .. } | Self::WebhookError { .. } => {
                ErrorSeverity::Medium
            }
            Self::SerializationError(_) | Self::ProcessingError { .. } | Self::CsvError(_) => {
                ErrorSeverity::High
            }
            Self::IoError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ApiError(_) => "Check the network connection and try again later".to_string(),
            Self::SourceResponseError { status, .. } if *status == 401 || *status == 403 => {
                "The session looks expired, refresh BGA_REQUEST_TOKEN and BGA_SESSION_COOKIE"
                    .to_string()
            }
            Self::SourceResponseError { .. } => {
                "The remote site may be down or rate limiting, retry later".to_string()
            }
            Self::WebhookError { .. } => {
                "Verify that DISCORD_WEBHOOK points to an existing webhook".to_string()
            }
            Self::IoError(_) => "Check file permissions and that the data directory exists".to_string(),
            Self::CsvError(_) => "Check that the CSV export path is writable".to_string(),
            Self::SerializationError(_) => {
                "The database file may be corrupt, move it aside and run again".to_string()
            }
            Self::ConfigError { .. } => "Review the configuration file".to_string(),
            Self::MissingConfigError { field } => {
                format!("Set '{}' in the config file or environment", field)
            }
            Self::InvalidConfigValueError { field, .. } => format!("Fix the value of '{}'", field),
            Self::ProcessingError { .. } => "Run again with --verbose for details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Storage => format!("Could not read or write local data: {}", self),
            ErrorCategory::Data => format!("Could not process data: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }

    /// 依嚴重程度對應的程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    /// 記錄詳細錯誤並輸出使用者訊息，回傳結束碼
    pub fn report(&self, job: &str) -> i32 {
        tracing::error!(
            "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
            job,
            self,
            self.category(),
            self.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", self.recovery_suggestion());

        eprintln!("❌ {}", self.user_friendly_message());
        eprintln!("💡 建議: {}", self.recovery_suggestion());
        self.exit_code()
    }
}

pub type Result<T> = std::result::Result<T, NotifierError>;
