//! Status codes returned in every response.

use core::fmt;

/// Signed status code from the response's second word.
///
/// The catalogue below is closed for comparison purposes, but any `i32` is
/// representable so that a non-conforming platform can be reported
/// faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(0);
    pub const NOT_SUPPORTED: StatusCode = StatusCode(-1);
    pub const INVALID_PARAMETERS: StatusCode = StatusCode(-2);
    pub const DENIED: StatusCode = StatusCode(-3);
    pub const NOT_FOUND: StatusCode = StatusCode(-4);
    pub const OUT_OF_RANGE: StatusCode = StatusCode(-5);
    pub const BUSY: StatusCode = StatusCode(-6);
    pub const COMMS_ERROR: StatusCode = StatusCode(-7);
    pub const GENERIC_ERROR: StatusCode = StatusCode(-8);
    pub const HARDWARE_ERROR: StatusCode = StatusCode(-9);
    pub const PROTOCOL_ERROR: StatusCode = StatusCode(-10);
    pub const IN_USE: StatusCode = StatusCode(-11);

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::SUCCESS
    }

    /// Catalogue name, or `None` for a code outside the catalogue.
    pub fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "SUCCESS",
            -1 => "NOT_SUPPORTED",
            -2 => "INVALID_PARAMETERS",
            -3 => "DENIED",
            -4 => "NOT_FOUND",
            -5 => "OUT_OF_RANGE",
            -6 => "BUSY",
            -7 => "COMMS_ERROR",
            -8 => "GENERIC_ERROR",
            -9 => "HARDWARE_ERROR",
            -10 => "PROTOCOL_ERROR",
            -11 => "IN_USE",
            _ => return None,
        })
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        StatusCode(code)
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> i32 {
        status.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "UNKNOWN ({})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_names() {
        assert_eq!(StatusCode::SUCCESS.name(), Some("SUCCESS"));
        assert_eq!(StatusCode::DENIED.name(), Some("DENIED"));
        assert_eq!(StatusCode::IN_USE.name(), Some("IN_USE"));
        assert_eq!(StatusCode(-12).name(), None);
        assert_eq!(StatusCode(7).name(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::NOT_FOUND.to_string(), "NOT_FOUND (-4)");
        assert_eq!(StatusCode(-99).to_string(), "UNKNOWN (-99)");
    }
}
