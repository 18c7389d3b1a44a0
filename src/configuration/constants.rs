pub mod cargo_env {
    pub const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
    pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
}

pub mod common {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
    pub const DEFAULT_TIMEOUT: &str = "10s";
    /// Environment variables overriding manifest keys, e.g. `VOLLEY_BASE_URL`.
    pub const ENV_PREFIX: &str = "VOLLEY";
    /// Characters of a response body kept in failure messages.
    pub const EXCERPT_LENGTH: usize = 200;
}
