//! Entity model collection: creates, owns and resolves every live model.
//!
//! Models are built once, when the collection is constructed, and live until
//! it is torn down. Nothing is added or removed in between.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use spacehub_domain::description::{EntityDescription, EntityKind};
use spacehub_domain::error::{NotFoundError, SpaceHubError, ValidationError};
use spacehub_domain::id::{CollectionId, EntityId};

use super::occupancy::OccupancyEvent;
use super::person::PersonModel;
use super::physical_space::PhysicalSpaceModel;
use super::sensed_entity::SensedEntityModel;
use super::updater::ModelUpdater;
use crate::event_bus::{LogErrorSink, Subscriber, SubscriberError, Subscription};
use crate::ports::ErrorSink;
use crate::registry::SensorRegistry;

/// Any model held by the collection.
#[derive(Debug, Clone)]
pub enum ModelRef {
    Person(Arc<PersonModel>),
    PhysicalSpace(Arc<PhysicalSpaceModel>),
    Object(Arc<SensedEntityModel>),
}

impl ModelRef {
    #[must_use]
    pub fn entity(&self) -> &SensedEntityModel {
        match self {
            Self::Person(person) => person.entity(),
            Self::PhysicalSpace(space) => space.entity(),
            Self::Object(object) => object,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.entity().kind()
    }
}

#[derive(Debug)]
pub struct EntityModelCollection {
    id: CollectionId,
    spaces: HashMap<EntityId, Arc<PhysicalSpaceModel>>,
    persons: HashMap<EntityId, Arc<PersonModel>>,
    objects: HashMap<EntityId, Arc<SensedEntityModel>>,
    persons_by_marker: HashMap<String, Arc<PersonModel>>,
}

impl EntityModelCollection {
    /// Build one model per description. Space buses log subscriber failures.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateId`] when two descriptions share an id.
    pub fn new(
        descriptions: impl IntoIterator<Item = EntityDescription>,
    ) -> Result<Self, SpaceHubError> {
        Self::with_error_sink(descriptions, Arc::new(LogErrorSink))
    }

    /// Build one model per description, with every space bus reporting
    /// subscriber failures to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateId`] when two descriptions share an id.
    pub fn with_error_sink(
        descriptions: impl IntoIterator<Item = EntityDescription>,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Self, SpaceHubError> {
        let mut collection = Self {
            id: CollectionId::new(),
            spaces: HashMap::new(),
            persons: HashMap::new(),
            objects: HashMap::new(),
            persons_by_marker: HashMap::new(),
        };
        for description in descriptions {
            collection.add(description, &sink)?;
        }
        tracing::info!(
            collection = %collection.id,
            spaces = collection.spaces.len(),
            persons = collection.persons.len(),
            objects = collection.objects.len(),
            "entity model collection ready"
        );
        Ok(collection)
    }

    /// Build the models of every sensed entity in `registry` and index
    /// persons by the hardware ids of the markers they carry.
    ///
    /// # Errors
    ///
    /// Same as [`EntityModelCollection::with_error_sink`].
    pub fn from_registry(
        registry: &SensorRegistry,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Self, SpaceHubError> {
        let mut collection = Self::with_error_sink(registry.sensed_entities().cloned(), sink)?;
        for (marker_id, person_id) in registry.marker_index() {
            let person = collection.person(person_id)?;
            collection.persons_by_marker.insert(marker_id.to_string(), person);
        }
        Ok(collection)
    }

    fn add(
        &mut self,
        description: EntityDescription,
        sink: &Arc<dyn ErrorSink>,
    ) -> Result<(), SpaceHubError> {
        let id = description.id().clone();
        if self.contains(&id) {
            return Err(ValidationError::DuplicateId(id.to_string()).into());
        }
        match description.kind() {
            EntityKind::PhysicalSpace => {
                let space = PhysicalSpaceModel::new(description, self.id, Arc::clone(sink));
                self.spaces.insert(id, space);
            }
            EntityKind::Person => {
                let person = PersonModel::new(description, self.id);
                self.persons.insert(id, Arc::new(person));
            }
            EntityKind::Object => {
                let object = SensedEntityModel::new(description, self.id);
                self.objects.insert(id, Arc::new(object));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> CollectionId {
        self.id
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.spaces.contains_key(id)
            || self.persons.contains_key(id)
            || self.objects.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spaces.len() + self.persons.len() + self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the model of `description` by identity.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no model has that id.
    pub fn get(&self, description: &EntityDescription) -> Result<ModelRef, SpaceHubError> {
        self.model(description.id())
    }

    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no model has `id`.
    pub fn model(&self, id: &EntityId) -> Result<ModelRef, SpaceHubError> {
        if let Some(space) = self.spaces.get(id) {
            return Ok(ModelRef::PhysicalSpace(Arc::clone(space)));
        }
        if let Some(person) = self.persons.get(id) {
            return Ok(ModelRef::Person(Arc::clone(person)));
        }
        self.objects
            .get(id)
            .map(|object| ModelRef::Object(Arc::clone(object)))
            .ok_or_else(|| not_found("SensedEntity", id))
    }

    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no physical space has `id`.
    pub fn physical_space(&self, id: &EntityId) -> Result<Arc<PhysicalSpaceModel>, SpaceHubError> {
        self.spaces
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("PhysicalSpace", id))
    }

    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no person has `id`.
    pub fn person(&self, id: &EntityId) -> Result<Arc<PersonModel>, SpaceHubError> {
        self.persons
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Person", id))
    }

    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no plain sensed object has `id`.
    pub fn object(&self, id: &EntityId) -> Result<Arc<SensedEntityModel>, SpaceHubError> {
        self.objects
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Object", id))
    }

    /// The person carrying the marker the hardware reported as `marker_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when no person carries it.
    pub fn person_by_marker(&self, marker_id: &str) -> Result<Arc<PersonModel>, SpaceHubError> {
        self.persons_by_marker
            .get(marker_id)
            .cloned()
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Marker",
                    id: marker_id.to_string(),
                }
                .into()
            })
    }

    /// Wire an updater for `person` in `space`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceHubError::NotFound`] when either id does not resolve to
    /// a model of the right kind.
    pub fn updater(
        &self,
        space: &EntityId,
        person: &EntityId,
    ) -> Result<ModelUpdater, SpaceHubError> {
        ModelUpdater::new(self.physical_space(space)?, self.person(person)?)
    }

    pub fn physical_spaces(&self) -> impl Iterator<Item = &Arc<PhysicalSpaceModel>> {
        self.spaces.values()
    }

    pub fn persons(&self) -> impl Iterator<Item = &Arc<PersonModel>> {
        self.persons.values()
    }

    pub fn objects(&self) -> impl Iterator<Item = &Arc<SensedEntityModel>> {
        self.objects.values()
    }

    /// Subscribe one handler to the occupancy events of every space.
    ///
    /// Events from different spaces are not ordered with respect to each
    /// other. The handler sees `on_completed` once, after teardown has
    /// completed the last space bus, or right away when there is no space.
    /// An aggregate that was unsubscribed is never completed.
    pub fn subscribe_all(
        &self,
        subscriber: impl Subscriber<OccupancyEvent> + 'static,
    ) -> AggregateSubscription {
        if self.spaces.is_empty() {
            subscriber.on_completed();
            return AggregateSubscription {
                subscriptions: Vec::new(),
            };
        }
        let fan_in = Arc::new(FanIn {
            inner: subscriber,
            remaining: AtomicUsize::new(self.spaces.len()),
        });
        let mut spaces: Vec<&Arc<PhysicalSpaceModel>> = self.spaces.values().collect();
        spaces.sort_by(|a, b| a.id().cmp(b.id()));
        let subscriptions = spaces
            .into_iter()
            .map(|space| space.subscribe(Arc::clone(&fan_in)))
            .collect();
        AggregateSubscription { subscriptions }
    }

    /// Complete every space bus and release all models.
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.is_empty() {
            return;
        }
        for space in self.spaces.values() {
            space.complete();
        }
        let released = self.len();
        self.persons_by_marker.clear();
        self.spaces.clear();
        self.persons.clear();
        self.objects.clear();
        tracing::info!(collection = %self.id, released, "entity model collection torn down");
    }
}

impl Drop for EntityModelCollection {
    fn drop(&mut self) {
        self.release();
    }
}

/// Forwards events from several buses to one subscriber, completing it only
/// once every bus has completed. Legs are only ever unsubscribed together,
/// through [`AggregateSubscription::unsubscribe`].
struct FanIn<S> {
    inner: S,
    remaining: AtomicUsize,
}

impl<S: Subscriber<OccupancyEvent>> Subscriber<OccupancyEvent> for FanIn<S> {
    fn on_next(&self, event: &OccupancyEvent) -> Result<(), SubscriberError> {
        self.inner.on_next(event)
    }

    fn on_error(&self, error: &SubscriberError) {
        self.inner.on_error(error);
    }

    fn on_completed(&self) {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.on_completed();
        }
    }
}

/// The set of per-space subscriptions created by
/// [`EntityModelCollection::subscribe_all`].
#[derive(Debug, Clone)]
pub struct AggregateSubscription {
    subscriptions: Vec<Subscription>,
}

impl AggregateSubscription {
    /// Unsubscribe from every space.
    pub fn unsubscribe(&self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.subscriptions.iter().any(Subscription::is_active)
    }

    /// Number of spaces the handler is subscribed to.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

fn not_found(entity: &'static str, id: &EntityId) -> SpaceHubError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{OccupancyRecorder, Seen};
    use spacehub_domain::error::InvalidReferenceError;
    use std::sync::atomic::AtomicBool;

    fn id(value: &str) -> EntityId {
        EntityId::new(value).unwrap()
    }

    fn descriptions() -> Vec<EntityDescription> {
        vec![
            EntityDescription::physical_space()
                .id("space.kitchen")
                .display_name("Kitchen")
                .build()
                .unwrap(),
            EntityDescription::physical_space()
                .id("space.hallway")
                .display_name("Hallway")
                .build()
                .unwrap(),
            EntityDescription::person()
                .id("person.alice")
                .display_name("Alice")
                .build()
                .unwrap(),
            EntityDescription::builder(EntityKind::Object)
                .id("object.door")
                .display_name("Front door")
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn should_build_one_model_per_description() {
        let collection = EntityModelCollection::new(descriptions()).unwrap();

        assert_eq!(collection.len(), 4);
        assert_eq!(collection.physical_spaces().count(), 2);
        assert_eq!(collection.persons().count(), 1);
        assert_eq!(collection.objects().count(), 1);
    }

    #[test]
    fn should_reject_duplicate_descriptions() {
        let mut all = descriptions();
        all.push(all[0].clone());

        let result = EntityModelCollection::new(all);

        assert!(matches!(
            result,
            Err(SpaceHubError::Validation(ValidationError::DuplicateId(_)))
        ));
    }

    #[test]
    fn should_resolve_model_by_description() {
        let all = descriptions();
        let collection = EntityModelCollection::new(all.clone()).unwrap();

        let model = collection.get(&all[2]).unwrap();

        assert!(matches!(model, ModelRef::Person(_)));
        assert_eq!(model.entity().id().as_str(), "person.alice");
        assert_eq!(model.kind(), EntityKind::Person);
    }

    #[test]
    fn should_return_not_found_for_unknown_description() {
        let collection = EntityModelCollection::new(descriptions()).unwrap();
        let stranger = EntityDescription::person()
            .id("person.mallory")
            .display_name("Mallory")
            .build()
            .unwrap();

        let result = collection.get(&stranger);

        assert!(matches!(result, Err(SpaceHubError::NotFound(_))));
    }

    #[test]
    fn should_return_not_found_when_kind_does_not_match() {
        let collection = EntityModelCollection::new(descriptions()).unwrap();

        let result = collection.person(&id("space.kitchen"));

        assert!(matches!(
            result,
            Err(SpaceHubError::NotFound(NotFoundError { entity: "Person", .. }))
        ));
    }

    #[test]
    fn should_wire_updater_from_ids() {
        let collection = EntityModelCollection::new(descriptions()).unwrap();
        let updater = collection
            .updater(&id("space.kitchen"), &id("person.alice"))
            .unwrap();

        updater.enter_space().unwrap();

        let kitchen = collection.physical_space(&id("space.kitchen")).unwrap();
        assert_eq!(kitchen.occupant_count(), 1);
    }

    #[test]
    fn should_fail_wiring_updater_when_person_unknown() {
        let collection = EntityModelCollection::new(descriptions()).unwrap();

        let result = collection.updater(&id("space.kitchen"), &id("person.nobody"));

        assert!(matches!(result, Err(SpaceHubError::NotFound(_))));
    }

    #[test]
    fn should_reject_models_mixed_across_collections() {
        let ours = EntityModelCollection::new(descriptions()).unwrap();
        let theirs = EntityModelCollection::new(descriptions()).unwrap();

        let kitchen = ours.physical_space(&id("space.kitchen")).unwrap();
        let their_alice = theirs.person(&id("person.alice")).unwrap();

        assert!(matches!(
            kitchen.occupant_entered(&their_alice),
            Err(SpaceHubError::InvalidReference(
                InvalidReferenceError::ForeignModel { .. }
            ))
        ));
    }

    #[test]
    fn should_fan_in_events_from_every_space() {
        let collection = EntityModelCollection::new(descriptions()).unwrap();
        let recorder = Arc::new(OccupancyRecorder::default());
        let aggregate = collection.subscribe_all(Arc::clone(&recorder));

        collection
            .updater(&id("space.kitchen"), &id("person.alice"))
            .unwrap()
            .enter_space()
            .unwrap();
        collection
            .updater(&id("space.hallway"), &id("person.alice"))
            .unwrap()
            .enter_space()
            .unwrap();

        assert_eq!(aggregate.len(), 2);
        assert_eq!(
            recorder.seen(),
            vec![
                Seen::entered("space.kitchen", "person.alice"),
                Seen::entered("space.hallway", "person.alice"),
            ]
        );

        aggregate.unsubscribe();
        collection
            .updater(&id("space.kitchen"), &id("person.alice"))
            .unwrap()
            .exit_space()
            .unwrap();

        assert!(!aggregate.is_active());
        assert_eq!(recorder.seen().len(), 2);
    }

    #[derive(Default)]
    struct CompletionCounter {
        completions: AtomicUsize,
        seen_any: AtomicBool,
    }

    impl Subscriber<OccupancyEvent> for CompletionCounter {
        fn on_next(&self, _event: &OccupancyEvent) -> Result<(), SubscriberError> {
            self.seen_any.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn on_completed(&self) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn should_complete_aggregate_subscriber_once_on_teardown() {
        let collection = EntityModelCollection::new(descriptions()).unwrap();
        let counter = Arc::new(CompletionCounter::default());
        collection.subscribe_all(Arc::clone(&counter));
        let kitchen = collection.physical_space(&id("space.kitchen")).unwrap();

        collection.teardown();

        assert_eq!(counter.completions.load(Ordering::SeqCst), 1);
        assert_eq!(kitchen.occupancy().subscriber_count(), 0);
        assert!(!counter.seen_any.load(Ordering::SeqCst));
    }

    #[test]
    fn should_complete_aggregate_subscriber_immediately_when_no_space() {
        let collection = EntityModelCollection::new(Vec::new()).unwrap();
        let counter = Arc::new(CompletionCounter::default());

        let aggregate = collection.subscribe_all(Arc::clone(&counter));

        assert_eq!(counter.completions.load(Ordering::SeqCst), 1);
        assert!(aggregate.is_empty());
        assert!(!aggregate.is_active());
        collection.teardown();
        assert_eq!(counter.completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_not_complete_aggregate_subscriber_after_unsubscribe() {
        let collection = EntityModelCollection::new(descriptions()).unwrap();
        let counter = Arc::new(CompletionCounter::default());
        let aggregate = collection.subscribe_all(Arc::clone(&counter));

        aggregate.unsubscribe();
        collection.teardown();

        assert_eq!(counter.completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn should_complete_space_subscribers_when_dropped() {
        let counter = Arc::new(CompletionCounter::default());
        {
            let collection = EntityModelCollection::new(descriptions()).unwrap();
            collection
                .physical_space(&id("space.hallway"))
                .unwrap()
                .subscribe(Arc::clone(&counter));
        }
        assert_eq!(counter.completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_resolve_person_by_marker_from_registry() {
        use spacehub_domain::sensor::MarkerDescription;

        let mut registry = SensorRegistry::new();
        for description in descriptions() {
            registry.register_sensed_entity(description).unwrap();
        }
        registry
            .register_marker(MarkerDescription::new("marker.alice", "Tag", "", "ble:aa:bb").unwrap())
            .unwrap();
        registry
            .associate_marker(&id("marker.alice"), &id("person.alice"))
            .unwrap();

        let collection =
            EntityModelCollection::from_registry(&registry, Arc::new(LogErrorSink)).unwrap();

        let alice = collection.person_by_marker("ble:aa:bb").unwrap();
        assert_eq!(alice.id().as_str(), "person.alice");
        assert!(matches!(
            collection.person_by_marker("ble:00:00"),
            Err(SpaceHubError::NotFound(_))
        ));
    }
}
