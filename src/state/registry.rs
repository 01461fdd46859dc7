use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Set of addresses that have been fully processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedRegistry {
    addresses: HashSet<String>,
}

impl CompletedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an address, returning true if it was not yet present
    pub fn insert(&mut self, address: impl Into<String>) -> bool {
        self.addresses.insert(address.into())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addresses.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CompletedRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Serialized as a map of `address -> true`, sorted for stable output
impl Serialize for CompletedRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut sorted: Vec<&str> = self.iter().collect();
        sorted.sort_unstable();

        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for address in sorted {
            map.serialize_entry(address, &true)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CompletedRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RegistryVisitor;

        impl<'de> Visitor<'de> for RegistryVisitor {
            type Value = CompletedRegistry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of addresses to boolean markers")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> Result<CompletedRegistry, A::Error> {
                let mut registry = CompletedRegistry::new();
                while let Some((address, _marker)) = access.next_entry::<String, bool>()? {
                    registry.insert(address);
                }
                Ok(registry)
            }
        }

        deserializer.deserialize_map(RegistryVisitor)
    }
}
