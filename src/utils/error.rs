use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("Plot rendering error: {message}")]
    PlotError { message: String },

    #[error("Simulation error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Output,
    Simulation,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SimError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SimError::ConfigValidationError { .. }
            | SimError::InvalidConfigValueError { .. }
            | SimError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SimError::InputError { .. } => ErrorCategory::Input,
            SimError::CsvError(_) | SimError::SerializationError(_) | SimError::PlotError { .. } => {
                ErrorCategory::Output
            }
            SimError::ProcessingError { .. } => ErrorCategory::Simulation,
            SimError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Output | ErrorCategory::Simulation => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SimError::IoError(_) => "Check that the output directory exists and is writable",
            SimError::CsvError(_) | SimError::SerializationError(_) => {
                "Retry with a different output format or a smaller trace_limit"
            }
            SimError::ConfigValidationError { .. } => {
                "Check the TOML syntax and section names of the configuration file"
            }
            SimError::InvalidConfigValueError { .. } => {
                "Correct the highlighted value and run again"
            }
            SimError::MissingConfigError { .. } => "Add the missing key to the configuration",
            SimError::InputError { .. } => {
                "Use 'speed <kmh>', 'dist <rpm>' or 'quit' on the control panel"
            }
            SimError::PlotError { .. } => "Disable the svg output format and run again",
            SimError::ProcessingError { .. } => "Run with --verbose to inspect each tick",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SimError::IoError(e) => format!("Could not read or write a file: {}", e),
            SimError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is not valid: {}", field, reason)
            }
            SimError::MissingConfigError { field } => format!("Setting '{}' is required", field),
            other => other.to_string(),
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
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_medium_severity() {
        let err = SimError::InvalidConfigValueError {
            field: "simulation.dt".to_string(),
            value: "0".to_string(),
            reason: "Value must be positive".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.exit_code(), 2);
        assert!(err.user_friendly_message().contains("simulation.dt"));
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = SimError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }
}
