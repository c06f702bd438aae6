//! Exit code constants for the CLI (spec.md sec 6.5: "Exit code 0 on
//! success, non-zero on fatal failure").

/// Exit code constants for cobbler.
pub mod codes {
    /// Success - operation completed successfully.
    pub const SUCCESS: i32 = 0;
    /// CLI arguments or loaded configuration was invalid (spec.md sec 7 `config`).
    pub const CONFIG: i32 = 2;
    /// A required external tool or credential was unavailable (sec 7 `environment`).
    pub const ENVIRONMENT: i32 = 3;
    /// A proposal failed schema/granularity validation in enforce mode (sec 7 `validation`).
    pub const VALIDATION: i32 = 4;
    /// A merge conflict surfaced to the operator, unresolved (sec 7 `conflict`).
    pub const CONFLICT: i32 = 5;
    /// An impossible scheduler/lifecycle state was observed (sec 7 `invariant`).
    pub const INVARIANT: i32 = 6;
    /// Another generation already holds the single-active-generation lock.
    pub const LOCK_HELD: i32 = 9;
    /// An LLM invocation hit its wall-clock budget (sec 7 `timeout`).
    pub const TIMEOUT: i32 = 10;
    /// A subprocess/network/label-mutation failure the caller could not recover from this run (sec 7 `transient`).
    pub const TRANSIENT: i32 = 70;
    /// Anything not classified above.
    pub const UNKNOWN: i32 = 1;
}

/// Simple newtype so `main` only ever has to call [`ExitCode::as_i32`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    #[must_use]
    pub const fn success() -> Self {
        Self(codes::SUCCESS)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<&crate::error::CobblerError> for ExitCode {
    fn from(err: &crate::error::CobblerError) -> Self {
        Self(err.display_for_user().exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_constants_are_distinct_and_nonzero_except_success() {
        let all = [
            codes::CONFIG,
            codes::ENVIRONMENT,
            codes::VALIDATION,
            codes::CONFLICT,
            codes::INVARIANT,
            codes::LOCK_HELD,
            codes::TIMEOUT,
            codes::TRANSIENT,
            codes::UNKNOWN,
        ];
        assert!(all.iter().all(|&c| c != codes::SUCCESS));
    }
}
