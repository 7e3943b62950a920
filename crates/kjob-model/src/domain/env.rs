use serde::{Deserialize, Serialize};

use crate::KeyValue;

/// Ordered environment of a unit of work.
///
/// Serialized as a plain array of `{key, value}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(Vec<KeyValue>);

impl Env {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(vec![KeyValue::new(key, value)])
    }

    /// Value for `key`; the last matching entry wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }

    /// Entries with later keys shadowing earlier ones, in first-seen order.
    ///
    /// Backends that cannot express duplicates (a process environment, a container spec) use this.
    pub fn resolved(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::with_capacity(self.0.len());
        for kv in &self.0 {
            match out.iter_mut().find(|(k, _)| *k == kv.key()) {
                Some(slot) => slot.1 = kv.value(),
                None => out.push((kv.key(), kv.value())),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::Env;

    #[test]
    fn last_entry_wins_on_get() {
        let mut env = Env::new();
        env.push("FOO", "one");
        env.push("BAR", "x");
        env.push("FOO", "two");

        assert_eq!(env.get("FOO"), Some("two"));
        assert_eq!(env.get("BAR"), Some("x"));
        assert!(env.get("BAZ").is_none());
    }

    #[test]
    fn resolved_keeps_first_position_and_last_value() {
        let mut env = Env::new();
        env.push("FOO", "one");
        env.push("BAR", "x");
        env.push("FOO", "two");

        assert_eq!(env.resolved(), vec![("FOO", "two"), ("BAR", "x")]);
    }

    #[test]
    fn serializes_as_array() {
        let env = Env::single("QUEUE_MESSAGE", "{}");
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, r#"[{"key":"QUEUE_MESSAGE","value":"{}"}]"#);
    }
}
