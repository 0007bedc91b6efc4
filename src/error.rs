//! Application error carrying the process exit code.
//!
//! Exit codes:
//! - `2`: bad input (missing directory or column, unknown series, invalid flags)
//! - `4`: output or runtime failure (writing files, RNG setup)

pub const EXIT_INPUT: u8 = 2;
pub const EXIT_OUTPUT: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_exit_codes() {
        let err = AppError::input("missing column `day`");
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert_eq!(err.message(), "missing column `day`");
        assert_eq!(err.to_string(), "error: missing column `day`");
        assert_eq!(AppError::output("disk full").exit_code(), EXIT_OUTPUT);
    }
}
