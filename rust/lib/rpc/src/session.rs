use crate::types::Uid;

/// Authenticated connection parameters.
///
/// Built once by [`RecordClient::authenticate`](crate::RecordClient::authenticate)
/// (or restored from a stored uid) and never mutated afterwards.
#[derive(Clone)]
pub struct Session {
    /// Server base URL (e.g. "http://localhost:8069").
    pub endpoint: String,
    /// Database (tenant) name.
    pub db: String,
    pub login: String,
    /// Password or API key; sent with every object call.
    pub password: String,
    pub uid: Uid,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("db", &self.db)
            .field("login", &self.login)
            .field("password", &"***")
            .field("uid", &self.uid)
            .finish()
    }
}
