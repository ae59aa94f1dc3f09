//! Domain event abstraction.

/// A domain event: an immutable fact named by its qualified type name.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **named**: `qualname()` is the stable dispatch key used by aggregates,
///   projections, position tracking and the infrastructure `event_type` field
/// - designed to be **append-only**
///
/// A bounded context usually models its events as one enum, each variant
/// returning its own qualified name.
pub trait DomainEvent: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Qualified type name (e.g. `"UserRegistered"` or `"identity.UserRegistered"`).
    fn qualname(&self) -> &'static str;

    /// Short type name: the last dotted segment of [`qualname`](Self::qualname).
    fn name(&self) -> &'static str {
        short_name(self.qualname())
    }
}

/// Last dotted segment of a qualified name.
pub fn short_name(qualname: &str) -> &str {
    qualname.rsplit('.').next().unwrap_or(qualname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct OfficialNameUpdated;

    impl DomainEvent for OfficialNameUpdated {
        fn qualname(&self) -> &'static str {
            "registry.officials.OfficialNameUpdated"
        }
    }

    #[test]
    fn name_is_last_segment_of_qualname() {
        assert_eq!(OfficialNameUpdated.name(), "OfficialNameUpdated");
        assert_eq!(short_name("UserRegistered"), "UserRegistered");
        assert_eq!(short_name(""), "");
    }
}
