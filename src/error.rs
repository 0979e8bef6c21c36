//! Error taxonomy for the HTJ2K core (spec.md §7).
//!
//! Every fallible core operation returns `Result<T, CoreError>`. Each variant
//! carries a numeric code for traceability plus a short message describing
//! the error site; long diagnostic text is left to the `log` crate.

use thiserror::Error;

/// The site (file, line) an error was raised at, captured with `error_site!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSite {
    pub file: &'static str,
    pub line: u32,
}

impl std::fmt::Display for ErrorSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

macro_rules! error_site {
    () => {
        $crate::error::ErrorSite {
            file: file!(),
            line: line!(),
        }
    };
}
pub(crate) use error_site;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("[{site}] malformed codestream (code {code}): {message}")]
    MalformedCodestream {
        code: u32,
        message: String,
        site: ErrorSite,
    },

    #[error("[{site}] unsupported feature (code {code}): {message}")]
    UnsupportedFeature {
        code: u32,
        message: String,
        site: ErrorSite,
    },

    #[error("[{site}] profile violation (code {code}): {message}")]
    ProfileViolation {
        code: u32,
        message: String,
        site: ErrorSite,
    },

    #[error("[{site}] HT block decode failure (code {code}): {message}")]
    BlockDecodeFailure {
        code: u32,
        message: String,
        site: ErrorSite,
    },

    #[error("[{site}] I/O failure (code {code}): {message}")]
    IoFailure {
        code: u32,
        message: String,
        site: ErrorSite,
    },

    #[error("[{site}] configuration error (code {code}): {message}")]
    ConfigurationError {
        code: u32,
        message: String,
        site: ErrorSite,
    },
}

impl CoreError {
    /// Numeric error code, stable across variants for external traceability.
    pub fn code(&self) -> u32 {
        match self {
            CoreError::MalformedCodestream { code, .. }
            | CoreError::UnsupportedFeature { code, .. }
            | CoreError::ProfileViolation { code, .. }
            | CoreError::BlockDecodeFailure { code, .. }
            | CoreError::IoFailure { code, .. }
            | CoreError::ConfigurationError { code, .. } => *code,
        }
    }

    /// Whether this error kind is always surfaced immediately, even in
    /// resilient mode (spec.md §7 propagation policy).
    pub fn always_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::UnsupportedFeature { .. }
                | CoreError::ProfileViolation { .. }
                | CoreError::ConfigurationError { .. }
                | CoreError::IoFailure { .. }
        )
    }
}

macro_rules! malformed {
    ($code:expr, $($arg:tt)*) => {
        $crate::error::CoreError::MalformedCodestream {
            code: $code,
            message: format!($($arg)*),
            site: $crate::error::error_site!(),
        }
    };
}
pub(crate) use malformed;

macro_rules! unsupported {
    ($code:expr, $($arg:tt)*) => {
        $crate::error::CoreError::UnsupportedFeature {
            code: $code,
            message: format!($($arg)*),
            site: $crate::error::error_site!(),
        }
    };
}
pub(crate) use unsupported;

macro_rules! profile_violation {
    ($code:expr, $($arg:tt)*) => {
        $crate::error::CoreError::ProfileViolation {
            code: $code,
            message: format!($($arg)*),
            site: $crate::error::error_site!(),
        }
    };
}
pub(crate) use profile_violation;

macro_rules! block_decode_failure {
    ($code:expr, $($arg:tt)*) => {
        $crate::error::CoreError::BlockDecodeFailure {
            code: $code,
            message: format!($($arg)*),
            site: $crate::error::error_site!(),
        }
    };
}
pub(crate) use block_decode_failure;

macro_rules! io_failure {
    ($code:expr, $($arg:tt)*) => {
        $crate::error::CoreError::IoFailure {
            code: $code,
            message: format!($($arg)*),
            site: $crate::error::error_site!(),
        }
    };
}
pub(crate) use io_failure;

macro_rules! config_error {
    ($code:expr, $($arg:tt)*) => {
        $crate::error::CoreError::ConfigurationError {
            code: $code,
            message: format!($($arg)*),
            site: $crate::error::error_site!(),
        }
    };
}
pub(crate) use config_error;

/// Non-fatal notice recorded in resilient mode instead of a hard error
/// (spec.md §7: "recorded as information... decoding continues").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub code: u32,
    pub message: String,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "notice {}: {}", self.code, self.message)
    }
}
