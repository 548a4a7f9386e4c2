use std::fmt;

/// Exception raised by the framework itself (resolution, routing, codec).
pub const EXCEPTION_TYPE_FRAMEWORK: i32 = 0;
/// Exception raised by the remote service's business logic.
pub const EXCEPTION_TYPE_BIZ: i32 = 1;

/// Application-level error descriptor.
///
/// An `Exception` travels on an otherwise well-formed response and means "the
/// call reached the service and the service reported an error". Transport and
/// protocol failures are reported as ordinary `Result` errors instead, never
/// as an `Exception`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    /// Numeric error code, service-defined.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// Category of the error, see the `EXCEPTION_TYPE_*` constants.
    pub err_type: i32,
}

impl Exception {
    /// Create a framework-level exception.
    pub fn framework(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            err_type: EXCEPTION_TYPE_FRAMEWORK,
        }
    }

    /// Create a business-level exception.
    pub fn biz(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            err_type: EXCEPTION_TYPE_BIZ,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exception (code {}, type {}): {}",
            self.code, self.err_type, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_type() {
        let e = Exception::framework(503, "no endpoint");
        assert_eq!(e.err_type, EXCEPTION_TYPE_FRAMEWORK);

        let e = Exception::biz(400, "bad account id");
        assert_eq!(e.err_type, EXCEPTION_TYPE_BIZ);
        assert_eq!(e.to_string(), "exception (code 400, type 1): bad account id");
    }
}
