//! POSIX permission bits for synthesized files

use std::fmt;

/// Permission bits applied to a file after it is written.
///
/// Derived from the `(readonly, executable)` flags of a file:
///
/// | readonly | executable | mode  |
/// |----------|------------|-------|
/// | true     | true       | `500` |
/// | true     | false      | `400` |
/// | false    | true       | `755` |
/// | false    | false      | `644` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

impl FileMode {
    pub const READONLY_EXECUTABLE: Self = Self(0o500);
    pub const READONLY: Self = Self(0o400);
    pub const EXECUTABLE: Self = Self(0o755);
    pub const WRITABLE: Self = Self(0o644);

    /// Pick the mode for the given flags.
    pub fn from_flags(readonly: bool, executable: bool) -> Self {
        match (readonly, executable) {
            (true, true) => Self::READONLY_EXECUTABLE,
            (true, false) => Self::READONLY,
            (false, true) => Self::EXECUTABLE,
            (false, false) => Self::WRITABLE,
        }
    }

    /// Raw permission bits, e.g. `0o644`.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// True when the owner has no write permission.
    pub fn is_readonly(self) -> bool {
        self.0 & 0o200 == 0
    }
}

/// Renders as octal without prefix (`"644"`).
impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, true, "500")]
    #[case(true, false, "400")]
    #[case(false, true, "755")]
    #[case(false, false, "644")]
    fn test_mode_matrix(#[case] readonly: bool, #[case] executable: bool, #[case] expected: &str) {
        let mode = FileMode::from_flags(readonly, executable);
        assert_eq!(mode.to_string(), expected);
        assert_eq!(mode.is_readonly(), readonly);
    }
}
