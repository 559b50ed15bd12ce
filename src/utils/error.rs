use std::fmt;
use thiserror::Error;

/// Result code the processor flow reports when no usable detail came back.
pub const TOKEN_PROCESSING_ERROR_CODE: &str = "001599";
pub const TOKEN_PROCESSING_ERROR_MESSAGE: &str = "Token processing error";

/// Result code for payment API failures and unusable API responses.
pub const API_ERROR_CODE: &str = "101699";

/// Result code the payment API uses for a successful registration.
pub const SUCCESS_RESULT_CODE: &str = "000000";

/// Client-side card validation failures, in the order the checks run.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("CARD_NUMBER_FORMAT_ERROR")]
    CardNumberFormat,

    #[error("EXPIRY_DATE_FORMAT_ERROR")]
    ExpiryDateFormat,

    #[error("PAST_EXPIRY_DATE_ERROR")]
    PastExpiryDate,

    #[error("CVV_FORMAT_ERROR")]
    CvvFormat,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::CardNumberFormat => "105202",
            ValidationError::ExpiryDateFormat | ValidationError::PastExpiryDate => "105203",
            ValidationError::CvvFormat => "105204",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::CardNumberFormat => "CARD_NUMBER_FORMAT_ERROR",
            ValidationError::ExpiryDateFormat => "EXPIRY_DATE_FORMAT_ERROR",
            ValidationError::PastExpiryDate => "PAST_EXPIRY_DATE_ERROR",
            ValidationError::CvvFormat => "CVV_FORMAT_ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The client cannot talk to another origin at all.
    CrossOriginUnsupported,
    CrossOriginRequestFailed,
    RequestFailed,
}

/// Failure of the underlying HTTP exchange, before any response body was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: TransportErrorKind,
    detail: Option<String>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: TransportErrorKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            kind,
            detail: (!detail.is_empty()).then_some(detail),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            TransportErrorKind::CrossOriginUnsupported => "009999",
            TransportErrorKind::CrossOriginRequestFailed => "001598",
            TransportErrorKind::RequestFailed => "001597",
        }
    }

    pub fn message(&self) -> String {
        let base = match self.kind {
            TransportErrorKind::CrossOriginUnsupported => {
                "Client does not support making cross-origin HTTP calls"
            }
            TransportErrorKind::CrossOriginRequestFailed => "A cross-origin HTTP request failed",
            TransportErrorKind::RequestFailed => "An HTTP request failed",
        };
        match &self.detail {
            Some(detail) => format!("{}: {}", base, detail),
            None => base.to_string(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for TransportError {}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Card validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Token processing error (code {code})")]
    TokenProcessing { code: String },

    #[error("Malformed {context} response: {detail}")]
    MalformedResponse { context: &'static str, detail: String },

    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Registration attempt cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Transport,
    Processor,
    Api,
    Cancelled,
    Configuration,
}

impl RegistrationError {
    pub fn token_processing(code: impl Into<String>) -> Self {
        RegistrationError::TokenProcessing { code: code.into() }
    }

    /// The payment-API style result code, when the failure has one.
    pub fn result_code(&self) -> Option<&str> {
        match self {
            RegistrationError::Validation(e) => Some(e.code()),
            RegistrationError::Transport(e) => Some(e.code()),
            RegistrationError::TokenProcessing { code } => Some(code.as_str()),
            RegistrationError::MalformedResponse { .. } => Some(API_ERROR_CODE),
            RegistrationError::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn result_message(&self) -> String {
        match self {
            RegistrationError::Validation(e) => e.message().to_string(),
            RegistrationError::Transport(e) => e.message(),
            RegistrationError::TokenProcessing { .. } => TOKEN_PROCESSING_ERROR_MESSAGE.to_string(),
            RegistrationError::MalformedResponse { context, .. } => {
                format!("{} should return a valid JSON response", context)
            }
            RegistrationError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RegistrationError::Validation(_) => ErrorCategory::Validation,
            RegistrationError::Transport(_) => ErrorCategory::Transport,
            RegistrationError::TokenProcessing { .. } => ErrorCategory::Processor,
            RegistrationError::MalformedResponse { .. } | RegistrationError::Api { .. } => {
                ErrorCategory::Api
            }
            RegistrationError::Cancelled => ErrorCategory::Cancelled,
            RegistrationError::IoError(_)
            | RegistrationError::ConfigError { .. }
            | RegistrationError::MissingConfigError { .. }
            | RegistrationError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Validation => "Check the card details and start the registration again",
            ErrorCategory::Transport => "Check network connectivity and the configured endpoints",
            ErrorCategory::Processor => {
                "The card was refused by the processor; start a new registration"
            }
            ErrorCategory::Api => "Inspect the payment API response and the client credentials",
            ErrorCategory::Cancelled => "Start a new registration when ready",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
