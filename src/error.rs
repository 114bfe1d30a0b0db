use std::fmt;

#[derive(Debug)]
pub enum LedgerPressError {
    MissingField(&'static str),
    MissingPageTemplate,
    UnplaceableFlowable(String),
    InvalidConfiguration(String),
    Asset(String),
    Io(std::io::Error),
}

impl fmt::Display for LedgerPressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerPressError::MissingField(field) => {
                write!(f, "missing required invoice field: {}", field)
            }
            LedgerPressError::MissingPageTemplate => write!(f, "no page template available"),
            LedgerPressError::UnplaceableFlowable(message) => {
                write!(f, "flowable cannot fit on any page: {}", message)
            }
            LedgerPressError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            LedgerPressError::Asset(message) => write!(f, "asset error: {}", message),
            LedgerPressError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for LedgerPressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerPressError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LedgerPressError {
    fn from(value: std::io::Error) -> Self {
        LedgerPressError::Io(value)
    }
}
