use thiserror::Error;

use crate::domain::product::ProductId;
use crate::ranking::Signal;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("no {signal} data available to rank")]
    EmptyInput { signal: Signal },
    #[error("measure {measure} for product `{product_id}` must be finite and non-negative")]
    InvalidMeasure { product_id: ProductId, measure: f64 },
    #[error("invalid ranking scope: {0}")]
    InvalidScope(String),
    #[error("unknown {kind} `{value}`")]
    UnknownValue { kind: &'static str, value: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FactSourceError {
    #[error("fact source unavailable: {0}")]
    DataAccess(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("data access failure: {0}")]
    DataAccess(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<FactSourceError> for ApplicationError {
    fn from(value: FactSourceError) -> Self {
        match value {
            FactSourceError::DataAccess(message) => Self::DataAccess(message),
        }
    }
}

impl ApplicationError {
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::Domain(DomainError::EmptyInput { .. }))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("no ranking available: {message}")]
    NoRanking { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NoRanking { .. } => "There is not enough data yet to rank popular products.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::NoRanking { .. } => "no_ranking",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Internal { .. } => "internal",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NoRanking { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error @ DomainError::EmptyInput { .. }) => {
                Self::NoRanking { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(
                error @ (DomainError::InvalidMeasure { .. }
                | DomainError::InvalidScope(_)
                | DomainError::UnknownValue { .. }),
            ) => Self::BadRequest { message: error.to_string(), correlation_id },
            ApplicationError::DataAccess(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, FactSourceError, InterfaceError};
    use crate::ranking::Signal;

    #[test]
    fn empty_input_maps_to_no_ranking() {
        let interface = ApplicationError::from(DomainError::EmptyInput { signal: Signal::Views })
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::NoRanking {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("view")
        ));
        assert_eq!(interface.error_class(), "no_ranking");
    }

    #[test]
    fn invalid_scope_maps_to_bad_request_with_user_safe_message() {
        let interface = ApplicationError::from(DomainError::InvalidScope(
            "`shop` and `shops` are mutually exclusive".to_owned(),
        ))
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn fact_source_error_maps_to_service_unavailable() {
        let interface =
            ApplicationError::from(FactSourceError::DataAccess("database lock timeout".to_owned()))
                .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("invalid database url".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
