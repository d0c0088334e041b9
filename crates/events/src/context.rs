//! Trigger firing context.

use merx_core::render::VariableMap;

/// Context key carrying the email address sends are addressed to.
pub const KEY_RECIPIENT_EMAIL: &str = "recipient_email";

/// Context key carrying the phone number SMS sends are addressed to.
pub const KEY_RECIPIENT_PHONE: &str = "recipient_phone";

/// Arbitrary key/value pairs describing the event a trigger fires for.
///
/// The same map feeds `{{variable}}` rendering of every template linked to
/// the trigger, so callers put both delivery addressing
/// ([`KEY_RECIPIENT_EMAIL`], [`KEY_RECIPIENT_PHONE`]) and display values
/// (owner name, company name, URLs) in here.
///
/// Built with the chained [`with`](TriggerContext::with) method:
///
/// ```rust
/// use merx_events::TriggerContext;
///
/// let ctx = TriggerContext::new()
///     .with("recipient_email", "owner@example.com")
///     .with("company_name", "Acme Foods");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TriggerContext {
    values: VariableMap,
}

impl TriggerContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The underlying variable map, as consumed by the renderer.
    pub fn values(&self) -> &VariableMap {
        &self.values
    }
}
