//! In-process generation store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, EntrySummary};
use crate::Error;
use crate::request::ResourceId;
use crate::response::ResponseSnapshot;

struct StoredEntry {
    url: String,
    response: ResponseSnapshot,
    stored_at: String,
}

#[derive(Default)]
struct Generation {
    tag: String,
    entries: HashMap<String, StoredEntry>,
}

/// Generation store held in memory.
///
/// Generations are kept in creation order behind a tokio RwLock; each
/// operation takes the lock once, so single writes are atomic.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    generations: Arc<RwLock<Vec<Generation>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_or_create<'a>(generations: &'a mut Vec<Generation>, tag: &str) -> &'a mut Generation {
    let index = match generations.iter().position(|g| g.tag == tag) {
        Some(index) => index,
        None => {
            generations.push(Generation { tag: tag.to_string(), ..Default::default() });
            generations.len() - 1
        }
    };
    &mut generations[index]
}

fn stored(id: &ResourceId, response: &ResponseSnapshot) -> StoredEntry {
    StoredEntry {
        url: id.url().to_string(),
        response: response.clone().with_url(id.url().as_str()),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        find_or_create(&mut generations, generation);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|g| g.tag.clone()).collect())
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|g| g.tag != generation);
        Ok(generations.len() != before)
    }

    async fn put(&self, generation: &str, id: &ResourceId, response: &ResponseSnapshot) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        find_or_create(&mut generations, generation)
            .entries
            .insert(id.key(), stored(id, response));
        Ok(())
    }

    async fn put_all(&self, generation: &str, entries: &[(ResourceId, ResponseSnapshot)]) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        let target = find_or_create(&mut generations, generation);
        for (id, response) in entries {
            target.entries.insert(id.key(), stored(id, response));
        }
        Ok(())
    }

    async fn lookup(&self, generation: &str, id: &ResourceId) -> Result<Option<ResponseSnapshot>, Error> {
        let generations = self.generations.read().await;
        Ok(generations
            .iter()
            .find(|g| g.tag == generation)
            .and_then(|g| g.entries.get(&id.key()))
            .map(|entry| entry.response.clone()))
    }

    async fn entries(&self, generation: &str) -> Result<Vec<EntrySummary>, Error> {
        let generations = self.generations.read().await;
        let mut rows: Vec<EntrySummary> = generations
            .iter()
            .find(|g| g.tag == generation)
            .map(|g| {
                g.entries
                    .values()
                    .map(|entry| EntrySummary {
                        url: entry.url.clone(),
                        status: entry.response.status,
                        size: entry.response.body.len() as u64,
                        stored_at: entry.stored_at.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str) -> ResourceId {
        ResourceId::parse(url).unwrap()
    }

    #[tokio::test]
    async fn test_put_creates_generation() {
        let store = MemoryStorage::new();
        store
            .put("v1", &id("https://example.com/"), &ResponseSnapshot::new(200, "root"))
            .await
            .unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["v1".to_string()]);
        let found = store.lookup("v1", &id("https://example.com/")).await.unwrap().unwrap();
        assert_eq!(found.text(), "root");
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let store = MemoryStorage::new();
        store.open("v0").await.unwrap();
        store.open("v1").await.unwrap();

        assert!(store.delete("v0").await.unwrap());
        assert!(!store.delete("v0").await.unwrap());
        assert_eq!(store.keys().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_shared_between_clones() {
        let store = MemoryStorage::new();
        let other = store.clone();
        store.put_all("v1", &[(id("https://example.com/a.css"), ResponseSnapshot::new(200, "a"))]).await.unwrap();

        assert_eq!(other.entries("v1").await.unwrap().len(), 1);
    }
}
