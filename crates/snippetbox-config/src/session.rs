/// Session cookie configuration.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Sessions expire this many hours after they are created.
    pub lifetime_hours: i64,
    /// Whether the session cookie carries the `Secure` attribute.
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_hours: 12,
            secure_cookie: true,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lifetime_hours: crate::env_or("SESSION_LIFETIME_HOURS", defaults.lifetime_hours),
            secure_cookie: crate::env_or("SESSION_SECURE_COOKIE", defaults.secure_cookie),
        }
    }
}
