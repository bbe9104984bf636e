use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{ClassifiedRequirement, RequirementStats, RequirementStatus};

/// In-memory collection of classified requirements shared between requests
///
/// Nothing is persisted; the collection lives until the process exits.
#[derive(Debug, Default)]
pub struct RequirementStore {
    requirements: Mutex<Vec<ClassifiedRequirement>>,
}

impl RequirementStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ClassifiedRequirement>> {
        // Every operation leaves the Vec consistent, so poisoning is ignored.
        self.requirements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the whole collection, returning stats for the new contents
    pub fn replace_all(&self, requirements: Vec<ClassifiedRequirement>) -> RequirementStats {
        let mut guard = self.lock();
        *guard = requirements;
        RequirementStats::from_requirements(&guard)
    }

    /// Appends a single requirement
    pub fn push(&self, requirement: ClassifiedRequirement) {
        self.lock().push(requirement);
    }

    /// Returns a snapshot of every requirement
    pub fn list(&self) -> Vec<ClassifiedRequirement> {
        self.lock().clone()
    }

    /// Overwrites the status of the requirement with the given ID
    ///
    /// Returns the updated stats, or `None` if no requirement has that ID.
    /// IDs that are not valid UUIDs never match.
    pub fn update_status(&self, id: &str, status: RequirementStatus) -> Option<RequirementStats> {
        let id = Uuid::parse_str(id.trim()).ok()?;
        let mut guard = self.lock();
        let req = guard.iter_mut().find(|r| r.id == id)?;
        req.status = status;
        Some(RequirementStats::from_requirements(&guard))
    }

    /// Review counts over the current collection
    pub fn stats(&self) -> RequirementStats {
        RequirementStats::from_requirements(&self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn sample(text: &str) -> ClassifiedRequirement {
        ClassifiedRequirement::new("Functional".to_string(), text.to_string())
    }

    #[test]
    fn test_replace_all_discards_previous_contents() {
        let store = RequirementStore::new();
        store.push(sample("The old requirement"));

        let stats = store.replace_all(vec![sample("First new one"), sample("Second new one")]);

        assert_eq!(stats.total, 2);
        assert_eq!(store.len(), 2);
        assert!(store.list().iter().all(|r| r.requirement.contains("new")));
    }

    #[test]
    fn test_update_status_known_id() {
        let store = RequirementStore::new();
        let req = sample("Users can log in");
        let id = req.id.to_string();
        store.push(req);

        let stats = store.update_status(&id, RequirementStatus::Approved).unwrap();
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.in_review, 0);
        assert_eq!(store.list()[0].status, RequirementStatus::Approved);
    }

    #[test]
    fn test_update_status_unknown_id() {
        let store = RequirementStore::new();
        store.push(sample("Users can log in"));

        assert!(store
            .update_status(&Uuid::new_v4().to_string(), RequirementStatus::Approved)
            .is_none());
        assert!(store.update_status("not-a-uuid", RequirementStatus::Approved).is_none());
        assert_eq!(store.stats().in_review, 1);
    }

    #[test]
    fn test_concurrent_pushes_are_all_kept() {
        let store = Arc::new(RequirementStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..25 {
                        store.push(sample(&format!("Requirement {} {}", i, j)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 200);
        assert_eq!(store.stats().total, 200);
    }
}
