//! Frontier of discovered-but-unprocessed addresses
//!
//! The frontier is an insertion-ordered set. Batches are taken from the most
//! recently inserted end, which gives an approximate depth-first traversal
//! without recursion: links found on a page are explored before older
//! pending addresses.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// An address taken out of the frontier by [`Frontier::pop_batch`]
///
/// It remembers its original position so that [`Frontier::restore`] can put
/// it back without disturbing the traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAddress {
    seq: u64,
    address: String,
}

impl PendingAddress {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn into_address(self) -> String {
        self.address
    }
}

/// Insertion-ordered set of pending addresses
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    /// Sequence number -> address, oldest first
    order: BTreeMap<u64, String>,
    /// Address -> sequence number
    index: HashMap<String, u64>,
    next_seq: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an address unless it is already pending
    ///
    /// Returns true if the address was inserted.
    pub fn push(&mut self, address: impl Into<String>) -> bool {
        let address = address.into();
        if self.index.contains_key(&address) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(address.clone(), seq);
        self.order.insert(seq, address);
        true
    }

    /// Removes and returns up to `n` of the most recently pushed addresses
    ///
    /// The result is ordered most recent first.
    pub fn pop_batch(&mut self, n: usize) -> Vec<PendingAddress> {
        let mut batch = Vec::with_capacity(n.min(self.order.len()));
        while batch.len() < n {
            let Some((seq, address)) = self.order.pop_last() else {
                break;
            };
            self.index.remove(&address);
            batch.push(PendingAddress { seq, address });
        }
        batch
    }

    /// Puts a popped address back at its original position
    ///
    /// Returns false if the address was pushed again in the meantime, in
    /// which case the newer entry is kept.
    pub fn restore(&mut self, pending: PendingAddress) -> bool {
        if self.index.contains_key(&pending.address) {
            return false;
        }

        self.index.insert(pending.address.clone(), pending.seq);
        self.order.insert(pending.seq, pending.address);
        true
    }

    /// Removes an address wherever it sits in the order
    pub fn remove(&mut self, address: &str) -> bool {
        match self.index.remove(address) {
            Some(seq) => {
                self.order.remove(&seq);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates pending addresses, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Frontier {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut frontier = Frontier::new();
        for address in iter {
            frontier.push(address);
        }
        frontier
    }
}

/// Serialized as a map of `address -> true`, oldest first
impl Serialize for Frontier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for address in self.iter() {
            map.serialize_entry(address, &true)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Frontier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FrontierVisitor;

        impl<'de> Visitor<'de> for FrontierVisitor {
            type Value = Frontier;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of addresses to boolean markers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Frontier, A::Error> {
                let mut frontier = Frontier::new();
                while let Some((address, _marker)) = access.next_entry::<String, bool>()? {
                    frontier.push(address);
                }
                Ok(frontier)
            }
        }

        deserializer.deserialize_map(FrontierVisitor)
    }
}
