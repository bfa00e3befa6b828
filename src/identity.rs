//! Who and where we are, for decorating notification text.

/// Host and user the process runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub hostname: String,
    pub username: String,
}

impl HostIdentity {
    /// Resolve from the OS, falling back to `"unknown"` for the hostname.
    pub fn resolve() -> Self {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".into());
        let username = whoami::username();
        Self { hostname, username }
    }
}
