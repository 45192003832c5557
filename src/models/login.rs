use serde::Serialize;
use std::fmt;

/// Result of a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoginReason {
    #[serde(rename = "no parameters")]
    NoParameters,
    #[serde(rename = "no user")]
    NoUser,
    #[serde(rename = "invalid password")]
    InvalidPassword,
    #[serde(rename = "logged")]
    Logged,
}

impl LoginReason {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginReason::NoParameters => "no parameters",
            LoginReason::NoUser => "no user",
            LoginReason::InvalidPassword => "invalid password",
            LoginReason::Logged => "logged",
        }
    }

    pub fn is_logged(self) -> bool {
        self == LoginReason::Logged
    }
}

impl fmt::Display for LoginReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub reason: LoginReason,
}
