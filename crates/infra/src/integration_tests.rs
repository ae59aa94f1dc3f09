//! Integration tests for the full event-sourced pipeline.
//!
//! Tests: Aggregate → Repository → EventStore → EventDispatcher → Projector → ReadModel
//!
//! Verifies:
//! - Saved events update read models exactly once, in stream order
//! - Redelivery is a no-op and gaps are rejected
//! - Read models can be rebuilt by replaying the store

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use sharedkernel_core::{
        Aggregate, DomainError, DomainEvent, DomainResult, Entity, EventBuffer, ReadModel, ReadModelList,
    };
    use sharedkernel_events::{
        DispatchError, EventDispatcher, JsonMapper, MappersChain, MappingPipeline, PositionStore,
        Projection, ProjectionError, Projector,
    };

    use crate::event_store::{EventStore, InMemoryEventStore};
    use crate::projections::{InMemoryPositionStore, PositionScope, replay_streams};
    use crate::repository::EventSourcedRepository;

    sharedkernel_core::entity_id! {
        pub struct UserId;
    }

    const REGISTERED: &str = "identity.UserRegistered";
    const NAME_UPDATED: &str = "identity.UserNameUpdated";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct UserRegistered {
        user_id: UserId,
        name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct UserNameUpdated {
        user_id: UserId,
        new_name: String,
        previous_name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(untagged)]
    enum UserEvent {
        Registered(UserRegistered),
        NameUpdated(UserNameUpdated),
    }

    impl From<UserRegistered> for UserEvent {
        fn from(e: UserRegistered) -> Self {
            UserEvent::Registered(e)
        }
    }

    impl From<UserNameUpdated> for UserEvent {
        fn from(e: UserNameUpdated) -> Self {
            UserEvent::NameUpdated(e)
        }
    }

    impl DomainEvent for UserEvent {
        fn qualname(&self) -> &'static str {
            match self {
                UserEvent::Registered(_) => REGISTERED,
                UserEvent::NameUpdated(_) => NAME_UPDATED,
            }
        }
    }

    #[derive(Debug)]
    struct User {
        id: UserId,
        name: String,
        events: EventBuffer<UserEvent>,
    }

    impl User {
        fn register(id: UserId, name: &str) -> DomainResult<Self> {
            let mut user = Self::empty(id);
            user.raise_event(UserRegistered { user_id: id, name: name.into() }.into())?;
            Ok(user)
        }

        fn rename(&mut self, new_name: &str) -> DomainResult<()> {
            self.raise_event(
                UserNameUpdated {
                    user_id: self.id,
                    new_name: new_name.into(),
                    previous_name: self.name.clone(),
                }
                .into(),
            )
        }
    }

    impl Entity for User {
        type Id = UserId;

        fn id(&self) -> &UserId {
            &self.id
        }
    }

    impl Aggregate for User {
        const TYPE: &'static str = "User";
        type Event = UserEvent;

        fn empty(id: UserId) -> Self {
            Self {
                id,
                name: String::new(),
                events: EventBuffer::new(),
            }
        }

        fn events(&self) -> &EventBuffer<UserEvent> {
            &self.events
        }

        fn events_mut(&mut self) -> &mut EventBuffer<UserEvent> {
            &mut self.events
        }

        fn when(&mut self, event: &UserEvent) -> DomainResult<()> {
            match event {
                UserEvent::Registered(e) => self.name = e.name.clone(),
                UserEvent::NameUpdated(e) => self.name = e.new_name.clone(),
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct UserModel {
        name: String,
        renames: u32,
    }

    impl ReadModel for UserModel {}

    type ReadModels = Arc<RwLock<HashMap<UserId, UserModel>>>;

    struct UserDetailsProjection {
        models: ReadModels,
        positions: Arc<InMemoryPositionStore>,
    }

    impl Projection for UserDetailsProjection {
        const NAME: &'static str = "UserDetailsProjection";
        const MODEL_TYPE: &'static str = "UserModel";
        const HANDLES: &'static [&'static str] = &[REGISTERED, NAME_UPDATED];

        type Event = UserEvent;
        type Id = UserId;

        fn apply(&mut self, event: &UserEvent) -> Result<(), ProjectionError> {
            let mut models = self
                .models
                .write()
                .map_err(|_| ProjectionError::read_model("lock poisoned"))?;
            match event {
                UserEvent::Registered(e) => {
                    models.insert(e.user_id, UserModel { name: e.name.clone(), renames: 0 });
                }
                UserEvent::NameUpdated(e) => {
                    let model = models
                        .get_mut(&e.user_id)
                        .ok_or(DomainError::NotFound)?;
                    model.name = e.new_name.clone();
                    model.renames += 1;
                }
            }
            Ok(())
        }

        fn get_position(&self, entity_id: &UserId, event_type: &str) -> Result<u64, ProjectionError> {
            Ok(self
                .positions
                .get_position(Self::NAME, &entity_id.to_string(), event_type)?)
        }

        fn update_position(
            &mut self,
            entity_id: &UserId,
            event_type: &str,
            position: u64,
        ) -> Result<(), ProjectionError> {
            Ok(self
                .positions
                .update_position(Self::NAME, &entity_id.to_string(), event_type, position)?)
        }
    }

    struct Harness {
        store: Arc<InMemoryEventStore>,
        repository: EventSourcedRepository<Arc<InMemoryEventStore>, User>,
        dispatcher: EventDispatcher<UserEvent>,
        models: ReadModels,
        positions: Arc<InMemoryPositionStore>,
    }

    fn user_mappers() -> MappingPipeline<UserEvent> {
        let mut pipeline = MappingPipeline::new();
        pipeline.register(
            MappersChain::new()
                .with(JsonMapper::<UserRegistered, UserEvent>::new(REGISTERED))
                .with(JsonMapper::<UserNameUpdated, UserEvent>::new(NAME_UPDATED)),
        );
        pipeline
    }

    fn setup() -> Harness {
        let store = Arc::new(InMemoryEventStore::new());
        let models = ReadModels::default();
        // Store positions are numbered per stream, across event types.
        let positions = Arc::new(InMemoryPositionStore::new(PositionScope::PerEntity));

        let mut dispatcher = EventDispatcher::new(user_mappers());
        dispatcher
            .subscribe(Projector::new(UserDetailsProjection {
                models: Arc::clone(&models),
                positions: Arc::clone(&positions),
            }))
            .unwrap();

        Harness {
            repository: EventSourcedRepository::new(Arc::clone(&store), user_mappers()),
            store,
            dispatcher,
            models,
            positions,
        }
    }

    fn model(h: &Harness, id: UserId) -> Option<UserModel> {
        h.models.read().unwrap().get(&id).cloned()
    }

    fn list_users(h: &Harness, offset: u64, limit: u64) -> ReadModelList<UserModel> {
        let mut all: Vec<UserModel> = h.models.read().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        ReadModelList::paginate(all, offset, limit)
    }

    fn deliver_stream(h: &mut Harness, id: UserId) -> Result<usize, DispatchError> {
        let events = h.store.get_all(*id.as_uuid(), 0).unwrap();
        h.dispatcher.dispatch_all(&events)
    }

    #[test]
    fn saved_events_update_read_model() {
        let mut h = setup();
        let id = UserId::new();
        let mut user = User::register(id, "John Doe").unwrap();
        user.rename("John Doe Jr.").unwrap();
        h.repository.save(&mut user, Uuid::now_v7()).unwrap();

        assert_eq!(deliver_stream(&mut h, id).unwrap(), 2);

        assert_eq!(
            model(&h, id),
            Some(UserModel { name: "John Doe Jr.".into(), renames: 1 })
        );
        assert_eq!(
            h.positions
                .get_position("UserDetailsProjection", &id.to_string(), NAME_UPDATED)
                .unwrap(),
            2
        );
    }

    #[test]
    fn redelivered_stream_is_not_reapplied() {
        let mut h = setup();
        let id = UserId::new();
        let mut user = User::register(id, "John Doe").unwrap();
        user.rename("John Doe Jr.").unwrap();
        h.repository.save(&mut user, Uuid::now_v7()).unwrap();
        deliver_stream(&mut h, id).unwrap();

        assert_eq!(deliver_stream(&mut h, id).unwrap(), 0);
        assert_eq!(model(&h, id).unwrap().renames, 1);
    }

    #[test]
    fn skipped_event_is_rejected_as_out_of_order() {
        let mut h = setup();
        let id = UserId::new();
        let mut user = User::register(id, "John Doe").unwrap();
        user.rename("John Doe Jr.").unwrap();
        user.rename("John Doe III").unwrap();
        h.repository.save(&mut user, Uuid::now_v7()).unwrap();

        let events = h.store.get_all(*id.as_uuid(), 0).unwrap();
        h.dispatcher.dispatch(&events[0]).unwrap();
        let err = h.dispatcher.dispatch(&events[2]).unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Projection(ProjectionError::OutOfOrderEvent { position: 3, expected: 2, .. })
        ));
        assert_eq!(model(&h, id).unwrap().name, "John Doe");

        // The gap is recoverable by delivering from the source again.
        assert_eq!(h.dispatcher.dispatch_all(&events).unwrap(), 2);
        assert_eq!(model(&h, id).unwrap().name, "John Doe III");
    }

    #[test]
    fn loaded_aggregate_continues_the_stream() {
        let mut h = setup();
        let id = UserId::new();
        let mut user = User::register(id, "John Doe").unwrap();
        h.repository.save(&mut user, Uuid::now_v7()).unwrap();
        deliver_stream(&mut h, id).unwrap();

        let mut loaded = h.repository.load(id).unwrap().unwrap();
        loaded.rename("Johnny").unwrap();
        h.repository.save(&mut loaded, Uuid::now_v7()).unwrap();

        let new_events = h.store.get_all(*id.as_uuid(), 1).unwrap();
        assert_eq!(h.dispatcher.dispatch_all(&new_events).unwrap(), 1);
        assert_eq!(model(&h, id).unwrap().name, "Johnny");
    }

    #[test]
    fn read_model_is_rebuilt_by_replay() {
        let mut h = setup();
        let ids = [UserId::new(), UserId::new()];
        for (n, id) in ids.iter().enumerate() {
            let mut user = User::register(*id, &format!("user-{n}")).unwrap();
            user.rename(&format!("renamed-{n}")).unwrap();
            h.repository.save(&mut user, Uuid::now_v7()).unwrap();
        }

        let first = replay_streams(h.store.as_ref(), User::TYPE, &mut h.dispatcher).unwrap();
        assert_eq!((first.streams, first.events, first.applied), (2, 4, 4));

        // Live replay only skips.
        let again = replay_streams(h.store.as_ref(), User::TYPE, &mut h.dispatcher).unwrap();
        assert_eq!(again.applied, 0);

        // Rebuild: drop the read model and its positions, then replay.
        h.models.write().unwrap().clear();
        h.positions.clear("UserDetailsProjection").unwrap();
        let rebuilt = replay_streams(h.store.as_ref(), User::TYPE, &mut h.dispatcher).unwrap();

        assert_eq!(rebuilt.applied, 4);
        assert_eq!(model(&h, ids[1]).unwrap().name, "renamed-1");
    }

    #[test]
    fn projected_users_are_listed_page_by_page() {
        let mut h = setup();
        for name in ["carol", "alice", "bob"] {
            let mut user = User::register(UserId::new(), name).unwrap();
            h.repository.save(&mut user, Uuid::now_v7()).unwrap();
            deliver_stream(&mut h, *user.id()).unwrap();
        }

        let first = list_users(&h, 0, 2);
        let names: Vec<_> = first.items.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
        assert_eq!(first.total, 3);
        assert!(first.has_more());

        let second = list_users(&h, 2, 2);
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].name, "carol");
        assert!(!second.has_more());
    }

    #[test]
    fn streams_of_other_types_are_not_replayed() {
        let mut h = setup();
        let mut user = User::register(UserId::new(), "John Doe").unwrap();
        h.repository.save(&mut user, Uuid::now_v7()).unwrap();

        let report = replay_streams(h.store.as_ref(), "Order", &mut h.dispatcher).unwrap();
        assert_eq!(report.streams, 0);
        assert!(h.models.read().unwrap().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: at-least-once delivery of every saved batch converges on the aggregate state.
        #[test]
        fn duplicated_delivery_converges(
            batches in proptest::collection::vec(proptest::collection::vec("[a-z]{1,8}", 1..4), 0..6)
        ) {
            let mut h = setup();
            let id = UserId::new();
            let mut user = User::register(id, "start").unwrap();
            h.repository.save(&mut user, Uuid::now_v7()).unwrap();
            deliver_stream(&mut h, id).unwrap();

            let mut renames = 0u32;
            for batch in &batches {
                for name in batch {
                    user.rename(name).unwrap();
                    renames += 1;
                }
                h.repository.save(&mut user, Uuid::now_v7()).unwrap();
                // Deliver the whole stream twice: old positions are skipped.
                deliver_stream(&mut h, id).unwrap();
                prop_assert_eq!(deliver_stream(&mut h, id).unwrap(), 0);
            }

            let model = model(&h, id).unwrap();
            prop_assert_eq!(&model.name, &user.name);
            prop_assert_eq!(model.renames, renames);
            prop_assert_eq!(user.version(), u64::from(renames) + 1);
        }
    }
}
