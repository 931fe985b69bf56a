use tracing::warn;

use crate::error::DiskError;
use crate::resource::Resource;

/// Number of newest backups to keep in a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep: usize,
}

impl RetentionPolicy {
    pub fn keep(keep: usize) -> Self {
        Self { keep }
    }

    /// Split a newest-first listing into (kept, expired).
    pub fn split<'a>(&self, newest_first: &'a [Resource]) -> (&'a [Resource], &'a [Resource]) {
        newest_first.split_at(self.keep.min(newest_first.len()))
    }
}

/// Sort newest first by creation time. Stable, so a listing the provider
/// already ordered is left untouched.
pub fn order_newest_first(items: &mut [Resource]) {
    if !items.is_sorted_by(|a, b| a.created >= b.created) {
        warn!(
            items = items.len(),
            "provider listing not ordered by creation time, re-sorting"
        );
        items.sort_by(|a, b| b.created.cmp(&a.created));
    }
}

/// Outcome of one retention pass.
#[derive(Debug, Default)]
pub struct RetentionReport {
    pub kept: Vec<String>,
    pub deleted: Vec<String>,
    pub failed: Vec<(String, DiskError)>,
}

impl RetentionReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset};

    use super::*;
    use crate::resource::ResourceType;

    fn file(name: &str, created: &str) -> Resource {
        Resource {
            name: name.to_string(),
            path: format!("disk:/app/backups/{name}"),
            created: DateTime::<FixedOffset>::parse_from_rfc3339(created).unwrap(),
            resource_id: None,
            kind: ResourceType::File,
            mime_type: Some("application/zip".to_string()),
            size: None,
            embedded: None,
        }
    }

    fn names(items: &[Resource]) -> Vec<&str> {
        items.iter().map(|r| r.name.as_str()).collect()
    }

    fn listing() -> Vec<Resource> {
        vec![
            file("d", "2024-03-04T03:00:00+00:00"),
            file("c", "2024-03-03T03:00:00+00:00"),
            file("b", "2024-03-02T03:00:00+00:00"),
            file("a", "2024-03-01T03:00:00+00:00"),
        ]
    }

    #[test]
    fn split_keeps_newest() {
        let items = listing();
        let (kept, expired) = RetentionPolicy::keep(2).split(&items);
        assert_eq!(names(kept), ["d", "c"]);
        assert_eq!(names(expired), ["b", "a"]);
    }

    #[test]
    fn keep_zero_expires_everything() {
        let items = listing();
        let (kept, expired) = RetentionPolicy::keep(0).split(&items);
        assert!(kept.is_empty());
        assert_eq!(expired.len(), 4);
    }

    #[test]
    fn keep_more_than_present_expires_nothing() {
        let items = listing();
        let (kept, expired) = RetentionPolicy::keep(10).split(&items);
        assert_eq!(kept.len(), 4);
        assert!(expired.is_empty());
    }

    #[test]
    fn out_of_order_listing_is_resorted() {
        let mut items = listing();
        items.swap(0, 3);
        order_newest_first(&mut items);
        assert_eq!(names(&items), ["d", "c", "b", "a"]);
    }

    #[test]
    fn timezone_offsets_compare_by_instant() {
        let mut items = vec![
            file("utc", "2024-03-01T03:00:00+00:00"),
            // same wall clock, three hours earlier in absolute time
            file("msk", "2024-03-01T03:00:00+03:00"),
            file("later", "2024-03-01T05:00:00+03:00"),
        ];
        order_newest_first(&mut items);
        assert_eq!(names(&items), ["utc", "later", "msk"]);
    }
}
