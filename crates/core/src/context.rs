use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol-level caller context attached to every record's metadata.
///
/// All fields are optional; extraction never fails. Whatever the calling
/// layer can supply is kept, the rest is simply omitted from the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_path: Option<String>,
    pub request_method: Option<String>,
    pub session_id: Option<String>,
}

impl CallContext {
    /// An empty context, for callers with no protocol-level information.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    #[must_use]
    pub fn with_request(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.request_method = Some(method.into());
        self.request_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_session_id(mut self, session: impl Into<String>) -> Self {
        self.session_id = Some(session.into());
        self
    }

    /// Project the context into a JSON object, omitting absent fields.
    ///
    /// This is the seed for a record's `metadata` bag; action-specific
    /// extras are merged on top by the recorder.
    #[must_use]
    pub fn metadata_object(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let fields = [
            ("ip_address", &self.ip_address),
            ("user_agent", &self.user_agent),
            ("request_path", &self.request_path),
            ("request_method", &self.request_method),
            ("session_id", &self.session_id),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                map.insert(key.to_owned(), Value::String(v.clone()));
            }
        }
        map
    }
}
