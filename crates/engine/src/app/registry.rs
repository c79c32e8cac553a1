use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// A closed sum type of every component a game attaches to entities.
///
/// Each variant maps to one distinct `Kind`, so an entity holds at most one
/// component per kind.
pub trait ComponentSet: Sized {
    type Kind: Copy + Eq + Ord + Hash + Debug;

    fn kind(&self) -> Self::Kind;
}

/// Typed view onto one variant of a [`ComponentSet`].
pub trait TypedComponent<C: ComponentSet>: Sized {
    const KIND: C::Kind;

    fn from_ref(component: &C) -> Option<&Self>;
    fn from_mut(component: &mut C) -> Option<&mut Self>;
    fn into_set(self) -> C;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent<K> {
    EntityCreated(EntityId),
    ComponentAdded { entity: EntityId, kind: K },
    ComponentRemoved { entity: EntityId, kind: K },
    EntityDestroyed(EntityId),
}

#[derive(Debug, Default)]
struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug)]
struct EntityRecord<C: ComponentSet> {
    components: BTreeMap<C::Kind, C>,
}

#[derive(Debug)]
pub struct Registry<C: ComponentSet> {
    allocator: EntityIdAllocator,
    entities: BTreeMap<EntityId, EntityRecord<C>>,
    events: Vec<RegistryEvent<C::Kind>>,
}

impl<C: ComponentSet> Default for Registry<C> {
    fn default() -> Self {
        Self {
            allocator: EntityIdAllocator::default(),
            entities: BTreeMap::new(),
            events: Vec::new(),
        }
    }
}

impl<C: ComponentSet> Registry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_entity(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.insert(
            id,
            EntityRecord {
                components: BTreeMap::new(),
            },
        );
        self.events.push(RegistryEvent::EntityCreated(id));
        id
    }

    pub fn spawn(&mut self, components: impl IntoIterator<Item = C>) -> EntityId {
        let id = self.create_entity();
        for component in components {
            self.add_component(id, component);
        }
        id
    }

    /// Returns false when the entity is unknown; destroying twice is harmless.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let Some(record) = self.entities.remove(&id) else {
            return false;
        };
        for kind in record.components.keys() {
            self.events.push(RegistryEvent::ComponentRemoved {
                entity: id,
                kind: *kind,
            });
        }
        self.events.push(RegistryEvent::EntityDestroyed(id));
        true
    }

    /// Attaches `component`, replacing any existing component of the same kind.
    /// Returns false when the entity is unknown.
    pub fn add_component(&mut self, id: EntityId, component: C) -> bool {
        let Some(record) = self.entities.get_mut(&id) else {
            return false;
        };
        let kind = component.kind();
        record.components.insert(kind, component);
        self.events
            .push(RegistryEvent::ComponentAdded { entity: id, kind });
        true
    }

    pub fn insert<T: TypedComponent<C>>(&mut self, id: EntityId, component: T) -> bool {
        self.add_component(id, component.into_set())
    }

    pub fn remove_component(&mut self, id: EntityId, kind: C::Kind) -> Option<C> {
        let removed = self.entities.get_mut(&id)?.components.remove(&kind)?;
        self.events
            .push(RegistryEvent::ComponentRemoved { entity: id, kind });
        Some(removed)
    }

    pub fn remove<T: TypedComponent<C>>(&mut self, id: EntityId) -> bool {
        self.remove_component(id, T::KIND).is_some()
    }

    pub fn get<T: TypedComponent<C>>(&self, id: EntityId) -> Option<&T> {
        self.entities
            .get(&id)?
            .components
            .get(&T::KIND)
            .and_then(T::from_ref)
    }

    pub fn get_mut<T: TypedComponent<C>>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(&id)?
            .components
            .get_mut(&T::KIND)
            .and_then(T::from_mut)
    }

    pub fn has(&self, id: EntityId, kind: C::Kind) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|record| record.components.contains_key(&kind))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities carrying every listed kind, in spawn order.
    pub fn query(&self, kinds: &[C::Kind]) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, record)| {
                kinds
                    .iter()
                    .all(|kind| record.components.contains_key(kind))
            })
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn iter_with<'a, T: TypedComponent<C> + 'a>(&'a self) -> impl Iterator<Item = (EntityId, &'a T)> {
        self.entities.iter().filter_map(|(id, record)| {
            record
                .components
                .get(&T::KIND)
                .and_then(T::from_ref)
                .map(|component| (*id, component))
        })
    }

    pub fn iter_with_mut<'a, T: TypedComponent<C> + 'a>(
        &'a mut self,
    ) -> impl Iterator<Item = (EntityId, &'a mut T)> {
        self.entities.iter_mut().filter_map(|(id, record)| {
            record
                .components
                .get_mut(&T::KIND)
                .and_then(T::from_mut)
                .map(|component| (*id, component))
        })
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn drain_events(&mut self) -> Vec<RegistryEvent<C::Kind>> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        let ids = self.entity_ids();
        for id in ids {
            self.destroy_entity(id);
        }
    }
}
