use uuid::Uuid;

/// Correlation id that follows a request, dispatcher tick, or monitor tick
/// through the logs.
#[derive(Clone, Debug)]
pub struct TraceId(String);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}
