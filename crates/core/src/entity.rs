//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Two entities are the same entity when their identifiers are equal, whatever
/// their other attributes hold.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Identity comparison (attributes are ignored).
    fn same_identity_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::entity_id! {
        pub struct CountryId;
    }

    struct Country {
        id: CountryId,
        name: String,
    }

    impl Entity for Country {
        type Id = CountryId;

        fn id(&self) -> &CountryId {
            &self.id
        }
    }

    #[test]
    fn entities_with_same_id_are_the_same_entity() {
        let id = CountryId::new();
        let a = Country { id, name: "Dominican Rep.".into() };
        let b = Country { id, name: "Dominican Republic".into() };
        assert_ne!(a.name, b.name);
        assert!(a.same_identity_as(&b));
    }

    #[test]
    fn entities_with_different_ids_are_different() {
        let a = Country { id: CountryId::new(), name: "Dominican Republic".into() };
        let b = Country { id: CountryId::new(), name: "Dominican Republic".into() };
        assert!(!a.same_identity_as(&b));
    }
}
