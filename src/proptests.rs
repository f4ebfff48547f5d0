use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::{Store, StoreError};

/// Reference model: a BTreeMap, from which the accounting the store
/// maintains incrementally can be recomputed from scratch.
#[derive(Default)]
struct Model {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Model {
    fn write(&mut self, key: &[u8], value: &[u8]) {
        self.map.insert(key.to_vec(), value.to_vec());
    }

    fn read(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.map.get(key)
    }

    fn delete(&mut self, key: &[u8]) -> bool {
        self.map.remove(key).is_some()
    }

    fn live_size(&self) -> usize {
        self.map.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn entry_count(&self) -> usize {
        self.map.len()
    }
}

/// Actions to test against both implementations.
#[derive(Arbitrary, Debug, Clone)]
enum Action {
    Write(KeyValue),
    Read(Key),
    Delete(Key),
    Contains(Key),
}

/// Wrapper for key generation with a custom strategy.
#[derive(Debug, Clone)]
struct Key(Vec<u8>);

/// Wrapper for a key-value pair.
#[derive(Debug, Clone)]
struct KeyValue {
    key: Key,
    value: Vec<u8>,
}

impl Arbitrary for Key {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            // Empty key, which every operation must reject
            Just(Key(vec![])),
            // Tiny alphabet so sequences collide, exercising the
            // update and delete-then-reinsert paths
            prop::collection::vec(0u8..4, 1..3).prop_map(Key),
            // Short arbitrary keys
            prop::collection::vec(any::<u8>(), 1..8).prop_map(Key),
            // Keys with shared prefixes to stress byte-wise ordering
            "[a-d]{1,3}".prop_map(|s| {
                let mut key = b"prefix/".to_vec();
                key.extend_from_slice(s.as_bytes());
                Key(key)
            }),
        ]
        .boxed()
    }
}

impl Arbitrary for KeyValue {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<Key>(), prop::collection::vec(any::<u8>(), 0..48))
            .prop_map(|(key, value)| KeyValue { key, value })
            .boxed()
    }
}

/// Test harness that executes actions on both the store and the model.
#[derive(Default)]
struct Test {
    store: Store,
    model: Model,
}

impl Test {
    fn execute(&mut self, action: Action) {
        match action {
            Action::Write(kv) => {
                let key = kv.key.0;
                if key.is_empty() {
                    assert_eq!(
                        self.store.write(&key, &kv.value),
                        Err(StoreError::MissingKey)
                    );
                } else {
                    self.store.write(&key, &kv.value).unwrap();
                    self.model.write(&key, &kv.value);
                }
            }
            Action::Read(key) => {
                let key = key.0;
                let store_result = self.store.read(&key);
                if key.is_empty() {
                    assert_eq!(store_result, Err(StoreError::MissingKey));
                } else {
                    match self.model.read(&key) {
                        Some(value) => assert_eq!(
                            store_result.as_deref(),
                            Ok(&value[..]),
                            "read mismatch for key {:?}",
                            key
                        ),
                        None => assert_eq!(store_result, Err(StoreError::KeyNotFound)),
                    }
                }
            }
            Action::Delete(key) => {
                let key = key.0;
                let store_result = self.store.delete(&key);
                if key.is_empty() {
                    assert_eq!(store_result, Err(StoreError::MissingKey));
                } else if self.model.delete(&key) {
                    assert_eq!(store_result, Ok(()), "delete missed live key {:?}", key);
                } else {
                    assert_eq!(store_result, Err(StoreError::KeyNotFound));
                }
            }
            Action::Contains(key) => {
                let key = key.0;
                assert_eq!(
                    self.store.contains(&key),
                    !key.is_empty() && self.model.read(&key).is_some(),
                    "contains mismatch for key {:?}",
                    key
                );
            }
        }
        // The incremental accounting must always agree with a from-scratch
        // recomputation over the model.
        assert_eq!(
            self.store.entry_count(),
            self.model.entry_count(),
            "entry count mismatch"
        );
        assert_eq!(
            self.store.live_size(),
            self.model.live_size(),
            "live size mismatch"
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn proptest_vs_btreemap(actions in prop::collection::vec(any::<Action>(), 1..128)) {
        let mut test = Test::default();
        for action in actions {
            test.execute(action);
        }
    }
}
