//! This module provides a string-keyed map with attribute-style access and
//! automatic creation of nested maps.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::ops::Index;

use anyhow::anyhow;

use crate::core::Result;
use crate::map::Value;

/// Names reserved for the map's own operations. Attribute-style access never
/// stores or removes data under these names; they stay available as methods
/// only. Kept as an explicit constant rather than derived at runtime.
const PROTECTED: &[&str] = &[
    "attr",
    "clear",
    "contains_key",
    "del_attr",
    "get",
    "get_mut",
    "get_or",
    "insert",
    "is_empty",
    "items",
    "iter",
    "keys",
    "len",
    "pop",
    "remove",
    "set_attr",
    "to_plain",
    "update",
    "values",
];

/// A string-keyed map that supports both strict bracket-style access and
/// vivifying attribute-style access, where reading a missing attribute
/// creates an empty nested `FlexMap` instead of failing.
///
/// ### Internal state
///
/// * `entries` — The key/value bindings.
///   - Key: `String` attribute/key name.
///   - Value: [`Value`], where nested mappings are themselves `FlexMap`s.
///   - Uses `BTreeMap` for deterministic, sorted-key iteration.
///
/// ### Invariants
///
/// 1. **Recursive coercion**: any plain [`Value::Map`] supplied at
///    construction, via [`update()`](Self::update), [`insert()`](Self::insert)
///    or [`set_attr()`](Self::set_attr) is stored as [`Value::Flex`],
///    recursively at every depth. Mappings inside a [`Value::List`] are not
///    descended into.
/// 2. **Vivification is attribute-only**: [`attr()`](Self::attr) on a missing
///    name creates and stores an empty `FlexMap`; [`get()`](Self::get) and
///    indexing follow the ordinary map contract and never create anything.
/// 3. **Protected names**: names of the map's own operations and names with a
///    leading underscore are never stored or removed through attribute syntax.
///    They remain reachable through bracket-style access if a caller really
///    wants such keys.
///
/// ### Vivification side effect
///
/// `attr()` is a read that writes: merely looking at `m.attr("x")?` inserts an
/// empty map under `"x"` when the key is absent. This is what makes chained
/// assignment work without pre-declaring intermediate levels, and it also
/// means an emptiness probe through `attr()` mutates the map. Use
/// [`get()`](Self::get) or [`contains_key()`](Self::contains_key) when you
/// only want to inspect.
///
/// ### Thread Safety
///
/// This struct is **not thread-safe by default**, no more than any mutable
/// map. Vivification is a read-then-write, so concurrent callers must wrap
/// the whole structure in a synchronization primitive (e.g.
/// `Arc<Mutex<FlexMap>>`) at the application level.
///
/// ### Example
///
/// ```
/// use flex_kit::{FlexMap, Value};
///
/// let mut m = FlexMap::new();
/// m.attr("database")?.set_attr("host", "localhost")?;
/// m.attr("database")?.set_attr("port", 5432)?;
///
/// assert_eq!(m.attr("database")?.attr("host")?, &Value::from("localhost"));
/// assert_eq!(m.to_plain()["database"].as_map().unwrap().len(), 2);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlexMap {
    entries: BTreeMap<String, Value>,
}

/// Converts a plain mapping value into its vivifying shape. All insertion
/// paths funnel through here so they cannot diverge.
fn coerce(value: Value) -> Value {
    match value {
        Value::Map(map) => Value::Flex(FlexMap::from(map)),
        other => other,
    }
}

impl FlexMap {
    /// Creates a new empty map.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// True if `name` is reserved for the map's own operations or starts
    /// with an underscore.
    pub fn is_protected(name: &str) -> bool {
        name.starts_with('_') || PROTECTED.contains(&name)
    }

    /// Attribute-style read.
    ///
    /// * A protected `name` is an error; protected names never resolve to
    ///   stored data (the operations themselves stay reachable as methods).
    /// * An existing key returns the stored value unchanged.
    /// * A missing key is **vivified**: an empty `FlexMap` is inserted under
    ///   `name` and returned. See the type-level note on this side effect.
    pub fn attr(&mut self, name: &str) -> Result<&mut Value> {
        if Self::is_protected(name) {
            return Err(anyhow!("protected name: `{name}`"));
        }
        Ok(self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| Value::Flex(FlexMap::new())))
    }

    /// Attribute-style write.
    ///
    /// Fails with a "protected name" error for reserved names, leaving the
    /// map unchanged. Plain mapping values are recursively converted to
    /// `FlexMap` before being stored.
    pub fn set_attr<V: Into<Value>>(&mut self, name: &str, value: V) -> Result<()> {
        if Self::is_protected(name) {
            return Err(anyhow!("protected name: `{name}`"));
        }
        self.entries.insert(name.to_string(), coerce(value.into()));
        Ok(())
    }

    /// Attribute-style delete. Returns the removed value.
    ///
    /// Deleting a protected name or a name that was never set is an error;
    /// unlike reads, deletes do not vivify.
    pub fn del_attr(&mut self, name: &str) -> Result<Value> {
        if Self::is_protected(name) {
            return Err(anyhow!("protected name: `{name}`"));
        }
        self.entries
            .remove(name)
            .ok_or_else(|| anyhow!("key not found: `{name}`"))
    }

    /// Returns the value for `key`, if present. Never vivifies.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Mutable variant of [`get()`](Self::get). Never vivifies.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Returns the value for `key`, or `default` when the key is absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.entries.get(key).unwrap_or(default)
    }

    /// Inserts a key/value binding, returning the previous value if any.
    /// Plain mapping values are recursively converted to `FlexMap`.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        self.entries.insert(key.into(), coerce(value.into()))
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over key/value pairs in sorted key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Inserts every pair from `pairs`, overwriting existing keys. Mapping
    /// values are converted exactly as in [`insert()`](Self::insert).
    pub fn update<K, V, I>(&mut self, pairs: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }

    /// Produces a plain (non-vivifying) nested mapping.
    ///
    /// Every nested `FlexMap`, at any depth, becomes a plain map; all other
    /// values are cloned structurally. This is the bridge to serializers that
    /// do not understand the vivifying type.
    pub fn to_plain(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|(key, value)| {
                let plain = match value {
                    Value::Flex(map) => Value::Map(map.to_plain()),
                    other => other.clone(),
                };
                (key.clone(), plain)
            })
            .collect()
    }
}

impl From<BTreeMap<String, Value>> for FlexMap {
    /// Builds a `FlexMap` from a plain mapping, converting every direct
    /// mapping value to `FlexMap`, recursively at every depth.
    fn from(map: BTreeMap<String, Value>) -> Self {
        let mut out = FlexMap::new();
        for (key, value) in map {
            out.entries.insert(key, coerce(value));
        }
        out
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for FlexMap {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FlexMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let mut out = FlexMap::new();
        out.update(pairs);
        out
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for FlexMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, pairs: I) {
        self.update(pairs);
    }
}

impl TryFrom<Value> for FlexMap {
    type Error = anyhow::Error;

    /// Succeeds for both mapping shapes; any other value is rejected.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Flex(map) => Ok(map),
            Value::Map(map) => Ok(FlexMap::from(map)),
            other => Err(anyhow!("expected a mapping, got {}", other.kind())),
        }
    }
}

impl Index<&str> for FlexMap {
    type Output = Value;

    /// Bracket-style access. Follows the ordinary map contract: missing keys
    /// panic, nothing is vivified.
    fn index(&self, key: &str) -> &Value {
        self.entries
            .get(key)
            .unwrap_or_else(|| panic!("key not found: `{key}`"))
    }
}

impl IntoIterator for FlexMap {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a FlexMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for FlexMap {
    /// Renders as `FlexMap({...})`, visually distinct from a plain mapping.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("FlexMap()");
        }
        f.write_str("FlexMap({")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key:?}: {value}")?;
        }
        f.write_str("})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn test_new_is_empty() {
            let m = FlexMap::new();
            assert_eq!(m.len(), 0);
            assert!(m.is_empty());
        }

        #[test]
        fn test_from_pairs() {
            let m = FlexMap::from([("name", Value::from("John Doe")), ("age", Value::from(40))]);
            assert_eq!(m["name"], Value::from("John Doe"));
            assert_eq!(m["age"], Value::from(40));
        }

        #[test]
        fn test_from_plain_map_converts_nested() -> Result<()> {
            let profile = BTreeMap::from([
                ("age".to_string(), Value::from(30)),
                ("city".to_string(), Value::from("New York")),
            ]);
            let user = BTreeMap::from([
                ("name".to_string(), Value::from("John")),
                ("profile".to_string(), Value::from(profile)),
            ]);
            let plain = BTreeMap::from([("user".to_string(), Value::from(user))]);

            let mut m = FlexMap::from(plain);

            // every interior mapping node is itself a FlexMap
            assert!(matches!(m["user"], Value::Flex(_)));
            let user = m.attr("user")?;
            assert!(matches!(user.attr("profile")?, Value::Flex(_)));
            assert_eq!(
                m.attr("user")?.attr("profile")?.attr("age")?,
                &Value::from(30)
            );
            Ok(())
        }

        #[test]
        fn test_kwargs_style_with_nested_map() -> Result<()> {
            let abilities =
                BTreeMap::from([("english".to_string(), Value::from("strong"))]);
            let mut m = FlexMap::from([
                ("name", Value::from("John")),
                ("abilities", Value::from(abilities)),
            ]);

            assert!(matches!(m["abilities"], Value::Flex(_)));
            assert_eq!(
                m.attr("abilities")?.attr("english")?,
                &Value::from("strong")
            );
            Ok(())
        }

        #[test]
        fn test_lists_of_maps_stay_plain() {
            let inner = BTreeMap::from([("k".to_string(), Value::from(1))]);
            let m = FlexMap::from([("items", Value::List(vec![Value::from(inner)]))]);

            // only direct mapping values are converted
            let items = m["items"].as_list().unwrap();
            assert!(matches!(items[0], Value::Map(_)));
        }

        #[test]
        fn test_try_from_value() {
            let plain = BTreeMap::from([("k".to_string(), Value::from(1))]);
            let m = FlexMap::try_from(Value::from(plain)).unwrap();
            assert_eq!(m["k"], Value::from(1));

            let result = FlexMap::try_from(Value::from(40));
            assert!(result.is_err());
            assert!(
                result
                    .unwrap_err()
                    .to_string()
                    .contains("expected a mapping"),
                "non-mapping values must be rejected"
            );
        }
    }

    mod attr_access {
        use super::*;

        #[test]
        fn test_read_existing_key() -> Result<()> {
            let mut m = FlexMap::from([("name", Value::from("Jane"))]);
            assert_eq!(m.attr("name")?, &Value::from("Jane"));
            Ok(())
        }

        #[test]
        fn test_read_missing_key_vivifies() -> Result<()> {
            let mut m = FlexMap::new();
            assert!(!m.contains_key("settings"));

            let created = m.attr("settings")?;
            assert_eq!(created, &Value::Flex(FlexMap::new()));

            // the read stored the empty map in place
            assert!(m.contains_key("settings"));
            Ok(())
        }

        #[test]
        fn test_chained_assignment() -> Result<()> {
            let mut m = FlexMap::new();
            m.attr("user")?
                .attr("profile")?
                .attr("settings")?
                .set_attr("theme", "dark")?;

            assert_eq!(
                m.attr("user")?.attr("profile")?.attr("settings")?.attr("theme")?,
                &Value::from("dark")
            );
            assert!(matches!(m["user"], Value::Flex(_)));
            let user = m.attr("user")?.as_flex().unwrap();
            assert!(matches!(user["profile"], Value::Flex(_)));
            Ok(())
        }

        #[test]
        fn test_set_attr_converts_plain_map() -> Result<()> {
            let database = BTreeMap::from([
                ("host".to_string(), Value::from("localhost")),
                ("port".to_string(), Value::from(5432)),
            ]);
            let mut m = FlexMap::new();
            m.set_attr("config", BTreeMap::from([("database".to_string(), Value::from(database))]))?;

            assert!(matches!(m["config"], Value::Flex(_)));
            assert_eq!(
                m.attr("config")?.attr("database")?.attr("host")?,
                &Value::from("localhost")
            );
            Ok(())
        }

        #[test]
        fn test_delete_then_read_vivifies_again() -> Result<()> {
            let mut m = FlexMap::new();
            m.attr("database")?.set_attr("host", "localhost")?;

            m.del_attr("database")?;
            assert!(!m.contains_key("database"));

            // reading after deletion yields a fresh empty map, not an error
            let fresh = m.attr("database")?.as_flex().unwrap();
            assert!(fresh.is_empty());
            Ok(())
        }

        #[test]
        fn test_delete_missing_key_fails() {
            let mut m = FlexMap::new();
            let result = m.del_attr("nonexistent");
            assert!(result.is_err());
            assert!(
                result.unwrap_err().to_string().contains("key not found"),
                "deleting something never set is an error"
            );
        }

        #[test]
        fn test_protected_names_rejected() {
            let mut m = FlexMap::new();
            for name in ["keys", "values", "items", "get", "pop", "update", "clear"] {
                let result = m.set_attr(name, "something");
                assert!(result.is_err());
                assert!(
                    result.unwrap_err().to_string().contains("protected name"),
                    "`{name}` must be rejected as an attribute target"
                );
                assert!(!m.contains_key(name), "`{name}` must not be stored");

                assert!(m.attr(name).is_err());
                assert!(m.del_attr(name).is_err());
            }
            assert!(m.is_empty());
        }

        #[test]
        fn test_underscore_names_rejected() {
            let mut m = FlexMap::new();
            assert!(m.attr("_private").is_err());
            assert!(m.set_attr("_private", 1).is_err());
            assert!(m.del_attr("_private").is_err());
            assert!(m.is_empty());
        }

        #[test]
        fn test_protected_names_reachable_by_bracket() {
            // bracket syntax is the ordinary map contract, protection applies
            // to attribute syntax only
            let mut m = FlexMap::new();
            m.insert("update", Value::from(1));
            assert_eq!(m["update"], Value::from(1));
        }
    }

    mod bracket_access {
        use super::*;

        #[test]
        fn test_get_missing_key_is_none() {
            let m = FlexMap::new();
            assert!(m.get("missing").is_none());
            // no vivification happened
            assert!(m.is_empty());
        }

        #[test]
        #[should_panic(expected = "key not found")]
        fn test_index_missing_key_panics() {
            let m = FlexMap::new();
            let _ = &m["missing"];
        }

        #[test]
        fn test_insert_and_remove() {
            let mut m = FlexMap::new();
            assert!(m.insert("a", 1).is_none());
            assert_eq!(m.insert("a", 2), Some(Value::from(1)));
            assert_eq!(m.remove("a"), Some(Value::from(2)));
            assert!(m.remove("a").is_none());
        }

        #[test]
        fn test_insert_converts_plain_map() {
            let mut m = FlexMap::new();
            m.insert("nested", BTreeMap::from([("k".to_string(), Value::from(1))]));
            assert!(matches!(m["nested"], Value::Flex(_)));
        }

        #[test]
        fn test_get_or_default() {
            let m = FlexMap::from([("a", 1)]);
            let default = Value::from("fallback");
            assert_eq!(m.get_or("a", &default), &Value::from(1));
            assert_eq!(m.get_or("b", &default), &default);
        }

        #[test]
        fn test_len_and_iteration() {
            let m = FlexMap::from([("a", 1), ("b", 2), ("c", 3)]);
            assert_eq!(m.len(), 3);

            let keys: Vec<_> = m.keys().cloned().collect();
            assert_eq!(keys, vec!["a", "b", "c"]);

            let values: Vec<_> = m.values().cloned().collect();
            assert_eq!(values, vec![Value::from(1), Value::from(2), Value::from(3)]);

            let pairs: Vec<_> = m.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
            assert_eq!(pairs[0], ("a", Value::from(1)));
        }

        #[test]
        fn test_clear() {
            let mut m = FlexMap::from([("a", 1)]);
            m.clear();
            assert!(m.is_empty());
        }
    }

    mod update {
        use super::*;

        #[test]
        fn test_update_inserts_and_overwrites() {
            let mut m = FlexMap::from([("a", 1), ("b", 2)]);
            m.update([("b", 20), ("c", 30)]);

            assert_eq!(m["a"], Value::from(1));
            assert_eq!(m["b"], Value::from(20));
            assert_eq!(m["c"], Value::from(30));
        }

        #[test]
        fn test_update_with_another_flex_map() {
            let mut m1 = FlexMap::from([("a", 1), ("b", 2)]);
            let m2 = FlexMap::from([("b", 20), ("c", 30)]);

            m1.update(m2);
            assert_eq!(m1["b"], Value::from(20));
            assert_eq!(m1["c"], Value::from(30));
        }

        #[test]
        fn test_update_converts_mapping_values() -> Result<()> {
            let mut m = FlexMap::new();
            m.update([(
                "db",
                Value::from(BTreeMap::from([("host".to_string(), Value::from("localhost"))])),
            )]);

            assert!(matches!(m["db"], Value::Flex(_)));
            assert_eq!(m.attr("db")?.attr("host")?, &Value::from("localhost"));
            Ok(())
        }

        #[test]
        fn test_sequential_updates_accumulate() {
            let mut m = FlexMap::new();
            m.update([("x", 1)]);
            m.update([("y", 2)]);

            let keys: Vec<_> = m.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["x", "y"]);
        }
    }

    mod conversion {
        use super::*;

        #[test]
        fn test_to_plain_round_trip() {
            let profile = BTreeMap::from([
                ("age".to_string(), Value::from(30)),
                ("scores".to_string(), Value::List(vec![Value::from(90), Value::from(85)])),
            ]);
            let plain = BTreeMap::from([
                ("name".to_string(), Value::from("John")),
                ("profile".to_string(), Value::from(profile)),
            ]);

            let restored = FlexMap::from(plain.clone()).to_plain();
            assert_eq!(restored, plain);
        }

        #[test]
        fn test_to_plain_contains_no_flex_nodes() -> Result<()> {
            let mut m = FlexMap::new();
            m.attr("database")?.set_attr("host", "localhost")?;
            m.attr("database")?.set_attr("port", 5432)?;

            let plain = m.to_plain();
            assert!(matches!(plain["database"], Value::Map(_)));

            let database = plain["database"].as_map().unwrap();
            assert_eq!(database["host"], Value::from("localhost"));
            assert_eq!(database["port"], Value::from(5432));
            Ok(())
        }

        #[test]
        fn test_attr_and_kwargs_builds_agree() -> Result<()> {
            let abilities =
                BTreeMap::from([("english".to_string(), Value::from("strong"))]);
            let from_pairs = FlexMap::from([
                ("name", Value::from("John Doe")),
                ("age", Value::from(40)),
                ("abilities", Value::from(abilities)),
            ]);

            let mut built = FlexMap::new();
            built.set_attr("name", "John Doe")?;
            built.set_attr("age", 40)?;
            built.attr("abilities")?.set_attr("english", "strong")?;

            assert_eq!(from_pairs, built);
            assert_eq!(from_pairs.to_plain(), built.to_plain());
            Ok(())
        }
    }

    mod copy_eq_display {
        use super::*;

        #[test]
        fn test_deep_copy_isolation() -> Result<()> {
            let mut m = FlexMap::new();
            m.attr("user")?.set_attr("name", "John")?;
            m.attr("user")?
                .set_attr("scores", Value::List(vec![Value::from(90), Value::from(85)]))?;

            let copy = m.clone();

            // mutate the original, including a nested mutable leaf
            m.attr("user")?.set_attr("name", "Jane")?;
            m.attr("user")?
                .attr("scores")?
                .as_list_mut()
                .unwrap()
                .push(Value::from(92));

            let copied_user = copy["user"].as_flex().unwrap();
            assert_eq!(copied_user["name"], Value::from("John"));
            assert_eq!(copied_user["scores"].as_list().unwrap().len(), 2);

            // and the other way around
            let mut copy = copy;
            copy.attr("user")?
                .attr("scores")?
                .as_list_mut()
                .unwrap()
                .clear();
            assert_eq!(
                m["user"].as_flex().unwrap()["scores"].as_list().unwrap().len(),
                3
            );
            Ok(())
        }

        #[test]
        fn test_structural_equality() -> Result<()> {
            let mut a = FlexMap::new();
            a.attr("x")?.set_attr("y", 1)?;
            let mut b = FlexMap::new();
            b.attr("x")?.set_attr("y", 1)?;
            assert_eq!(a, b);

            b.attr("x")?.set_attr("y", 2)?;
            assert_ne!(a, b);
            Ok(())
        }

        #[test]
        fn test_display() -> Result<()> {
            let mut m = FlexMap::new();
            assert_eq!(m.to_string(), "FlexMap()");

            m.set_attr("name", "John")?;
            let rendered = m.to_string();
            assert!(rendered.contains("FlexMap"));
            assert!(rendered.contains("name"));
            assert!(rendered.contains("John"));
            Ok(())
        }
    }
}
