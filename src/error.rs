/// Broad failure category. Each kind maps to one process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid selector, inconsistent telescope setup, header/schema mismatch.
    Config,
    /// Raw light-curve file missing, unreadable, or malformed.
    Load,
    /// Output directory or snapshot file could not be created or written.
    Filesystem,
    /// Non-finite results where a finite number is required.
    Numerical,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Load => 3,
            ErrorKind::Filesystem => 4,
            ErrorKind::Numerical => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    pub fn filesystem(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Filesystem, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::config("x").exit_code(), 2);
        assert_eq!(AppError::load("x").exit_code(), 3);
        assert_eq!(AppError::filesystem("x").exit_code(), 4);
        assert_eq!(AppError::new(ErrorKind::Numerical, "x").exit_code(), 5);
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = AppError::load("Failed to open 'a.DAT'");
        assert_eq!(err.to_string(), "Failed to open 'a.DAT'");
        assert_eq!(err.kind(), ErrorKind::Load);
    }
}
