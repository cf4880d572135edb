//! In-memory store used by tests: deterministic pagination without S3.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use async_trait::async_trait;

use super::{ObjectPage, ObjectRef, Store};

/// Keys are served in lexicographic order, `page_size` at a time.
///
/// `resend_marker` reproduces S3-compatible stores that include the marker
/// key itself at the head of the next page; the driver's marker filter is
/// what keeps those keys from being imported twice. A `None` body is a key
/// that lists but cannot be fetched.
#[derive(Debug, Default)]
pub(crate) struct InMemoryStore {
    objects: BTreeMap<String, Option<Vec<u8>>>,
    page_size: usize,
    resend_marker: bool,
    fail_listing: bool,
}

impl InMemoryStore {
    pub(crate) fn new(page_size: usize) -> Self {
        Self {
            objects: BTreeMap::new(),
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub(crate) fn insert(&mut self, key: &str, body: &[u8]) {
        self.objects.insert(key.to_string(), Some(body.to_vec()));
    }

    /// A key that appears in listings but errors on fetch.
    pub(crate) fn insert_unfetchable(&mut self, key: &str) {
        self.objects.insert(key.to_string(), None);
    }

    pub(crate) fn resend_marker(mut self) -> Self {
        self.resend_marker = true;
        self
    }

    pub(crate) fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list(&self, _bucket: &str, prefix: &str, marker: Option<&str>) -> Result<ObjectPage> {
        if self.fail_listing {
            bail!("listing capability is down");
        }

        let matching: Vec<&String> = self
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter(|key| match marker {
                Some(marker) if self.resend_marker => key.as_str() >= marker,
                Some(marker) => key.as_str() > marker,
                None => true,
            })
            .collect();

        let keys: Vec<String> = matching
            .iter()
            .take(self.page_size)
            .map(|key| key.to_string())
            .collect();

        Ok(ObjectPage {
            truncated: matching.len() > self.page_size,
            keys,
        })
    }

    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        match self.objects.get(&object.key) {
            Some(Some(body)) => Ok(body.clone()),
            _ => bail!("no such object '{object}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(page_size: usize) -> InMemoryStore {
        let mut store = InMemoryStore::new(page_size);
        for key in ["a.json", "b.json", "c.json"] {
            store.insert(key, b"[]");
        }
        store
    }

    #[tokio::test]
    async fn pages_are_cut_at_page_size() {
        let store = seeded(2);

        let first = store.list("bucket", "", None).await.unwrap();
        assert_eq!(first.keys, vec!["a.json", "b.json"]);
        assert!(first.truncated);

        let second = store.list("bucket", "", Some("b.json")).await.unwrap();
        assert_eq!(second.keys, vec!["c.json"]);
        assert!(!second.truncated);
    }

    #[tokio::test]
    async fn resend_marker_repeats_the_boundary_key() {
        let store = seeded(2).resend_marker();

        let page = store.list("bucket", "", Some("b.json")).await.unwrap();
        assert_eq!(page.keys, vec!["b.json", "c.json"]);
    }

    #[tokio::test]
    async fn prefix_narrows_the_listing() {
        let mut store = InMemoryStore::new(10);
        store.insert("app/one.json", b"[]");
        store.insert("other/two.json", b"[]");

        let page = store.list("bucket", "app/", None).await.unwrap();
        assert_eq!(page.keys, vec!["app/one.json"]);
    }
}
