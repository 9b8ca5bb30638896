use std::fmt::Display;

/// Ordered parameter list of a PHC record.
///
/// Keys are unique and keep their insertion order, which is also the order they are
/// written in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, u64)>);

impl Params {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Sets `key` to `value`, keeping the original position when the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        let key = key.into();

        if let Some(entry) = self.0.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: u64) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<u64> {
        self.0.iter().find(|(k, _)| k == key).map(|&(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, u64)>>(iter: T) -> Self {
        let mut params = Self::new();

        for (key, value) in iter {
            params.insert(key, value);
        }

        params
    }
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let params = Params::new().with("n", 16384).with("r", 8).with("p", 1);

        assert_eq!(params.keys().collect::<Vec<_>>(), ["n", "r", "p"]);
        assert_eq!(params.to_string(), "n=16384,r=8,p=1");
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let params = Params::new().with("m", 1).with("t", 2).with("m", 3);

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("m"), Some(3));
        assert_eq!(params.to_string(), "m=3,t=2");
    }

    #[test]
    fn missing_key() {
        let params = [("r", 10)].into_iter().collect::<Params>();

        assert_eq!(params.get("v"), None);
        assert!(!params.contains("v"));
        assert!(params.contains("r"));
    }
}
