use serde::ser::{Serialize, SerializeMap, Serializer};
use std::str::FromStr;

/// Separator used when [`CollisionPolicy::Collect`] keeps more than one value for a path.
pub const COLLECT_SEPARATOR: &str = " | ";

/// What happens when a path is written into a mapping that already holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Later leaf replaces the earlier value (keeps the original key position).
    #[default]
    LastWins,
    /// First leaf is kept, later ones are dropped.
    FirstWins,
    /// Present texts are concatenated with [`COLLECT_SEPARATOR`].
    Collect,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" | "last-wins" | "last_wins" => Ok(Self::LastWins),
            "first" | "first-wins" | "first_wins" => Ok(Self::FirstWins),
            "collect" => Ok(Self::Collect),
            other => Err(format!(
                "Unknown collision policy '{}' (expected last, first or collect)",
                other
            )),
        }
    }
}

/// Value of one column in one row as seen by consumers.
///
/// `Absent` covers both "row does not carry the column" and "carried without text";
/// an empty string is a present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    Absent,
    Text(&'a str),
}

impl<'a> Cell<'a> {
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Cell::Absent => None,
            Cell::Text(s) => Some(*s),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }
}

/// Insertion-ordered path → text mapping.
///
/// Used both for a flattened document section and for an output row.
/// Overwriting a key keeps its original position, so column order follows
/// first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, Option<String>)>,
}

/// One output row of the batch table.
pub type Row = FieldMap;

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Insert or overwrite (last wins).
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.insert_with(key, value, CollisionPolicy::LastWins);
    }

    /// Insert honouring `policy` when `key` is already present.
    pub fn insert_with(
        &mut self,
        key: impl Into<String>,
        value: Option<String>,
        policy: CollisionPolicy,
    ) {
        let key = key.into();
        let Some(idx) = self.position(&key) else {
            self.entries.push((key, value));
            return;
        };
        let slot = &mut self.entries[idx].1;
        match policy {
            CollisionPolicy::LastWins => *slot = value,
            CollisionPolicy::FirstWins => {}
            CollisionPolicy::Collect => {
                *slot = match (slot.take(), value) {
                    (Some(old), Some(new)) => Some(format!("{}{}{}", old, COLLECT_SEPARATOR, new)),
                    (old, new) => old.or(new),
                }
            }
        }
    }

    /// Raw stored value: `None` when the key is missing, `Some(None)` when carried without text.
    pub fn get(&self, key: &str) -> Option<&Option<String>> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn cell(&self, key: &str) -> Cell<'_> {
        match self.get(key) {
            Some(Some(text)) => Cell::Text(text.as_str()),
            _ => Cell::Absent,
        }
    }

    /// Whether the row carries `key` at all (possibly as an absent placeholder).
    pub fn carries(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Right-favouring union: values from `other` win, new keys are appended.
    pub fn merge(&mut self, other: &FieldMap) {
        for (key, value) in &other.entries {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Same keys in the same order, every value absent.
    pub fn blank_copy(&self) -> FieldMap {
        FieldMap {
            entries: self.entries.iter().map(|(k, _)| (k.clone(), None)).collect(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for FieldMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn overwrite_keeps_first_position() {
        let mut map = FieldMap::new();
        map.insert("a", text("1"));
        map.insert("b", text("2"));
        map.insert("a", text("3"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.cell("a"), Cell::Text("3"));
    }

    #[test]
    fn first_wins_ignores_later_values() {
        let mut map = FieldMap::new();
        map.insert_with("Imposta", text("22.00"), CollisionPolicy::FirstWins);
        map.insert_with("Imposta", text("4.00"), CollisionPolicy::FirstWins);
        assert_eq!(map.cell("Imposta"), Cell::Text("22.00"));
    }

    #[test]
    fn collect_joins_present_values() {
        let mut map = FieldMap::new();
        map.insert_with("Imposta", text("22.00"), CollisionPolicy::Collect);
        map.insert_with("Imposta", None, CollisionPolicy::Collect);
        map.insert_with("Imposta", text("4.00"), CollisionPolicy::Collect);
        assert_eq!(map.cell("Imposta"), Cell::Text("22.00 | 4.00"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn absent_and_empty_are_distinct() {
        let mut map = FieldMap::new();
        map.insert("empty", text(""));
        map.insert("none", None);
        assert_eq!(map.cell("empty"), Cell::Text(""));
        assert!(map.cell("none").is_absent());
        assert!(map.cell("missing").is_absent());
        assert!(map.carries("none"));
        assert!(!map.carries("missing"));
    }

    #[test]
    fn merge_favours_right_and_appends() {
        let mut left: FieldMap = vec![("a", text("1")), ("b", text("2"))].into_iter().collect();
        let right: FieldMap = vec![("b", text("x")), ("c", None)].into_iter().collect();
        left.merge(&right);
        assert_eq!(left.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(left.cell("b"), Cell::Text("x"));
    }

    #[test]
    fn blank_copy_keeps_keys_only() {
        let map: FieldMap = vec![("a", text("1")), ("b", text("2"))].into_iter().collect();
        let blank = map.blank_copy();
        assert_eq!(blank.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(blank.iter().all(|(_, v)| v.is_none()));
    }

    #[test]
    fn serializes_absent_as_null() {
        let map: FieldMap = vec![("Numero", text("42")), ("Data", None)].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Numero":"42","Data":null}"#);
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("last".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::LastWins);
        assert_eq!("First".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::FirstWins);
        assert_eq!("collect".parse::<CollisionPolicy>().unwrap(), CollisionPolicy::Collect);
        assert!("list".parse::<CollisionPolicy>().is_err());
    }
}
