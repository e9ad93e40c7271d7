use crate::domain::replay::ReplayMode;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Root error type for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Domain(DomainError),
    Application(ApplicationError),
    Infrastructure(InfrastructureError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    Validation(ValidationError),
    Replay(ReplayError),
}

/// Rejections raised at the configuration and input boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidCandle(String),
    InvalidSymbol(String),
    InvalidTimeInterval(String),
    InvalidSpeed(f64),
    InvalidPrice(String),
    UnknownTool(String),
}

/// Requests the replay state machine refuses to interpret.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayError {
    /// Replay was requested over an empty history.
    NoData,
    /// The request only makes sense while replay is active.
    NotActive,
    InvalidTransition { from: ReplayMode, action: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationError {
    Configuration(ConfigurationError),
    /// Alert creation needs a current price and the store is empty.
    NoPriceData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    InvalidParameter(String),
    Parse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfrastructureError {
    Network(NetworkError),
    Parse(String),
    Subscription(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    HttpRequestFailed(String),
    WebSocketConnectionFailed(String),
    Aborted,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AppError::Domain(e) => write!(f, "Domain Error: {}", e),
            AppError::Application(e) => write!(f, "Application Error: {}", e),
            AppError::Infrastructure(e) => write!(f, "Infrastructure Error: {}", e),
        }
    }
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(e) => write!(f, "Validation: {}", e),
            DomainError::Replay(e) => write!(f, "Replay: {}", e),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ValidationError::InvalidCandle(msg) => write!(f, "Invalid candle: {}", msg),
            ValidationError::InvalidSymbol(msg) => write!(f, "Invalid symbol: {}", msg),
            ValidationError::InvalidTimeInterval(msg) => {
                write!(f, "Invalid time interval: {}", msg)
            }
            ValidationError::InvalidSpeed(speed) => {
                write!(f, "Invalid playback speed: {}", speed)
            }
            ValidationError::InvalidPrice(msg) => write!(f, "Invalid price: {}", msg),
            ValidationError::UnknownTool(name) => write!(f, "Unknown drawing tool: {}", name),
        }
    }
}

impl Display for ReplayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ReplayError::NoData => write!(f, "no data to replay"),
            ReplayError::NotActive => write!(f, "replay mode is not active"),
            ReplayError::InvalidTransition { from, action } => {
                write!(f, "cannot {} while in {}", action, from)
            }
        }
    }
}

impl Display for ApplicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ApplicationError::Configuration(e) => write!(f, "Configuration: {}", e),
            ApplicationError::NoPriceData => write!(f, "No price data available"),
        }
    }
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfigurationError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ConfigurationError::Parse(msg) => write!(f, "Parse failed: {}", msg),
        }
    }
}

impl Display for InfrastructureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InfrastructureError::Network(e) => write!(f, "Network: {}", e),
            InfrastructureError::Parse(msg) => write!(f, "Parse: {}", msg),
            InfrastructureError::Subscription(msg) => write!(f, "Subscription: {}", msg),
        }
    }
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NetworkError::HttpRequestFailed(msg) => write!(f, "HTTP request failed: {}", msg),
            NetworkError::WebSocketConnectionFailed(msg) => {
                write!(f, "WebSocket connection failed: {}", msg)
            }
            NetworkError::Aborted => write!(f, "request aborted"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DomainError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for ReplayError {}
impl std::error::Error for ApplicationError {}
impl std::error::Error for ConfigurationError {}
impl std::error::Error for InfrastructureError {}
impl std::error::Error for NetworkError {}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        AppError::Domain(error)
    }
}

impl From<ApplicationError> for AppError {
    fn from(error: ApplicationError) -> Self {
        AppError::Application(error)
    }
}

impl From<InfrastructureError> for AppError {
    fn from(error: InfrastructureError) -> Self {
        AppError::Infrastructure(error)
    }
}

impl From<ValidationError> for DomainError {
    fn from(error: ValidationError) -> Self {
        DomainError::Validation(error)
    }
}

impl From<ReplayError> for DomainError {
    fn from(error: ReplayError) -> Self {
        DomainError::Replay(error)
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Domain(DomainError::Validation(error))
    }
}

impl From<ReplayError> for AppError {
    fn from(error: ReplayError) -> Self {
        AppError::Domain(DomainError::Replay(error))
    }
}

impl From<ConfigurationError> for ApplicationError {
    fn from(error: ConfigurationError) -> Self {
        ApplicationError::Configuration(error)
    }
}

impl From<ConfigurationError> for AppError {
    fn from(error: ConfigurationError) -> Self {
        AppError::Application(ApplicationError::Configuration(error))
    }
}

impl From<NetworkError> for InfrastructureError {
    fn from(error: NetworkError) -> Self {
        InfrastructureError::Network(error)
    }
}
