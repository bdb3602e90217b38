//! The surrogate key directory: `(entity, business key) -> surrogate key`.
//!
//! The directory is built by the dimension phase through
//! [`KeyDirectoryBuilder`] and only becomes readable once frozen into a
//! [`KeyDirectory`]. The fact phase accepts nothing but a frozen directory, so
//! fact resolution can never observe a partially loaded one.

use std::collections::{BTreeMap, HashMap};

use crate::entity::{EntityType, SurrogateKey};

type Entries = BTreeMap<EntityType, HashMap<String, SurrogateKey>>;

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Write side of the directory, owned by the dimension loader for one run.
#[derive(Debug, Default)]
pub struct KeyDirectoryBuilder {
  entries: Entries,
}

impl KeyDirectoryBuilder {
  /// Record a mapping.
  ///
  /// # Panics
  ///
  /// Panics if `business_key` is already mapped to a different key. Surrogate
  /// keys are assigned once per business key, so a conflicting entry means
  /// the loader is broken.
  pub fn put(
    &mut self,
    entity: EntityType,
    business_key: impl Into<String>,
    key: SurrogateKey,
  ) {
    let business_key = business_key.into();
    let map = self.entries.entry(entity).or_default();
    if let Some(previous) = map.get(&business_key) {
      assert_eq!(
        *previous, key,
        "{entity} {business_key:?} already mapped to surrogate key {previous}"
      );
      return;
    }
    map.insert(business_key, key);
  }

  /// Record every mapping from one processed chunk.
  pub fn merge(
    &mut self,
    entity: EntityType,
    keys: impl IntoIterator<Item = (String, SurrogateKey)>,
  ) {
    for (business_key, key) in keys {
      self.put(entity, business_key, key);
    }
  }

  pub fn len(&self, entity: EntityType) -> usize {
    self.entries.get(&entity).map_or(0, HashMap::len)
  }

  /// Finish the dimension phase and hand out the read-only snapshot.
  pub fn freeze(self) -> KeyDirectory { KeyDirectory { entries: self.entries } }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Read-only directory consumed by fact resolution.
#[derive(Debug, Clone, Default)]
pub struct KeyDirectory {
  entries: Entries,
}

impl KeyDirectory {
  pub fn get(&self, entity: EntityType, business_key: &str) -> Option<SurrogateKey> {
    self.entries.get(&entity)?.get(business_key).copied()
  }

  pub fn len(&self, entity: EntityType) -> usize {
    self.entries.get(&entity).map_or(0, HashMap::len)
  }

  pub fn is_empty(&self) -> bool { self.entries.values().all(HashMap::is_empty) }

  /// Number of mapped business keys per entity type.
  pub fn counts(&self) -> BTreeMap<EntityType, usize> {
    self
      .entries
      .iter()
      .map(|(entity, map)| (*entity, map.len()))
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn frozen_directory_resolves_per_entity() {
    let mut builder = KeyDirectoryBuilder::default();
    builder.put(EntityType::Customer, "C1", SurrogateKey(1));
    builder.put(EntityType::Agent, "C1", SurrogateKey(9));
    let dir = builder.freeze();

    assert_eq!(dir.get(EntityType::Customer, "C1"), Some(SurrogateKey(1)));
    assert_eq!(dir.get(EntityType::Agent, "C1"), Some(SurrogateKey(9)));
    assert_eq!(dir.get(EntityType::Policy, "C1"), None);
    assert_eq!(dir.len(EntityType::Customer), 1);
  }

  #[test]
  fn repeated_identical_put_is_a_no_op() {
    let mut builder = KeyDirectoryBuilder::default();
    builder.put(EntityType::Policy, "P001", SurrogateKey(7));
    builder.merge(EntityType::Policy, [("P001".to_owned(), SurrogateKey(7))]);
    assert_eq!(builder.len(EntityType::Policy), 1);
  }

  #[test]
  #[should_panic(expected = "already mapped")]
  fn conflicting_put_panics() {
    let mut builder = KeyDirectoryBuilder::default();
    builder.put(EntityType::Policy, "P001", SurrogateKey(7));
    builder.put(EntityType::Policy, "P001", SurrogateKey(8));
  }

  #[test]
  fn counts_cover_every_loaded_entity() {
    let mut builder = KeyDirectoryBuilder::default();
    builder.merge(
      EntityType::Book,
      [
        ("111-1".to_owned(), SurrogateKey(1)),
        ("222-2".to_owned(), SurrogateKey(2)),
      ],
    );
    let dir = builder.freeze();
    assert_eq!(dir.counts().get(&EntityType::Book), Some(&2));
    assert!(!dir.is_empty());
    assert!(KeyDirectory::default().is_empty());
  }
}
