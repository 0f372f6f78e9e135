use std::env;

/// Environment variable the CLI reads the backend credential from.
pub const ACCESS_TOKEN_VAR: &str = "REDPANDA_ACCESS_TOKEN";

/// Source of the bearer credential attached to every backend call.
///
/// Token acquisition and refresh live outside this crate; the client only
/// asks for the current value right before a request goes out. `None` (or
/// an empty string) means the Authorization header is omitted.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Fixed token, mainly for tests and one-shot scripts.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// Reads the token from the environment on every call, so a rotated
/// credential is picked up without rebuilding the client.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new() -> Self {
        Self::from_var(ACCESS_TOKEN_VAR)
    }

    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenProvider for EnvToken {
    fn token(&self) -> Option<String> {
        env::var(&self.var).ok().filter(|token| !token.is_empty())
    }
}

/// Absent credential; requests go out unauthenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenProvider for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}
