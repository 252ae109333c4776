use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// An opaque value attached to a session by a handler.
///
/// The value is type-erased but keeps the name of its concrete type, so a read
/// that names the wrong type can be reported instead of silently misread.
#[derive(Clone)]
pub struct DataValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl DataValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Fully qualified name of the stored type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.value).is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }
}

impl fmt::Debug for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Conversation state of a single user.
///
/// `data` is independent of `state`: moving to another state keeps it, only
/// removing the whole session drops it.
#[derive(Debug, Clone)]
pub struct UserSession {
    /// Current conversation label, e.g. `"wait_name"`.
    pub state: String,
    pub data: HashMap<String, DataValue>,
    /// Refreshed on every state change; drives idle expiry.
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserSession {
    pub fn new(state: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            state: state.into(),
            data: HashMap::new(),
            last_activity: now,
            created_at: now,
        }
    }

    /// Typed read from the data bag; `None` on a missing key or another type.
    pub fn get<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.data.get(key).and_then(|v| v.downcast_ref::<T>()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_value_keeps_type_name() {
        let v = DataValue::new(42u32);
        assert!(v.is::<u32>());
        assert!(!v.is::<i64>());
        assert_eq!(v.type_name(), "u32");
        assert_eq!(v.downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn session_get_ignores_wrong_type() {
        let mut session = UserSession::new("wait_name", Utc::now());
        session
            .data
            .insert("name".to_string(), DataValue::new("Alice".to_string()));
        assert_eq!(session.get::<String>("name").as_deref(), Some("Alice"));
        assert_eq!(session.get::<i32>("name"), None);
        assert_eq!(session.get::<String>("missing"), None);
    }

    #[test]
    fn debug_does_not_require_debug_payload() {
        struct Opaque;
        let v = DataValue::new(Opaque);
        assert!(format!("{v:?}").contains("Opaque"));
    }
}
