use uuid::Uuid;

/// Allocate an opaque session identifier for a new conversation.
///
/// Follow-up plan requests within the same conversation must reuse the
/// returned value so the managed runtime can maintain continuity.
pub fn allocate_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Key under which a client groups all trace rows of one invocation.
pub fn supervisor_session_key(session_id: &str) -> String {
    format!("supervisor_{}", session_id)
}

/// Counted invocation identifier: `{session_id}_{name}_{counter}`.
pub fn call_id(session_id: &str, name: &str, counter: u32) -> String {
    format!("{}_{}_{}", session_id, name, counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique_and_unhyphenated() {
        let a = allocate_session_id();
        let b = allocate_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(!a.contains('-'));
    }

    #[test]
    fn test_supervisor_key_shape() {
        assert_eq!(supervisor_session_key("abc"), "supervisor_abc");
    }

    #[test]
    fn test_call_id_shape() {
        assert_eq!(call_id("abc", "JobMarket", 3), "abc_JobMarket_3");
    }
}
