//! Catalog reconciliation
//!
//! Merges the remote species list with the user's custom fish into one
//! ordered view, and answers filter/progress queries against a seen-set.

use serde::{Deserialize, Serialize};

use crate::models::{Fish, FishOrigin, Rarity, SeenFilter};
use crate::store::SeenSet;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub fish: Fish,
    pub origin: FishOrigin,
}

/// Spotted counts shown above the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProgress {
    pub total: usize,
    pub seen: usize,
    pub unseen: usize,
    /// Rounded to the nearest whole percent
    pub percent: u32,
}

/// In-memory merged species collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Remote fish first, custom fish appended, each in source order.
    ///
    /// Ids are not de-duplicated: a custom fish sharing an id with a remote
    /// fish appears twice.
    pub fn reconcile(remote: Vec<Fish>, custom: Vec<Fish>) -> Self {
        let mut entries = Vec::with_capacity(remote.len() + custom.len());
        entries.extend(remote.into_iter().map(|fish| CatalogEntry { fish, origin: FishOrigin::Remote }));
        entries.extend(custom.into_iter().map(|fish| CatalogEntry { fish, origin: FishOrigin::Custom }));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn fishes(&self) -> impl Iterator<Item = &Fish> {
        self.entries.iter().map(|e| &e.fish)
    }

    pub fn get(&self, fish_id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.fish.id == fish_id)
    }

    pub fn contains(&self, fish_id: &str) -> bool {
        self.get(fish_id).is_some()
    }

    pub fn into_fishes(self) -> Vec<Fish> {
        self.entries.into_iter().map(|e| e.fish).collect()
    }

    pub fn push_custom(&mut self, fish: Fish) {
        self.entries.push(CatalogEntry { fish, origin: FishOrigin::Custom });
    }

    /// Swap in an updated fish wherever its id appears.
    ///
    /// Returns `Some(FishOrigin::Custom)` if any replaced entry came from
    /// the custom collection (and therefore needs persisting), the origin of
    /// the replaced entries otherwise, or `None` when the id is unknown.
    pub fn replace(&mut self, fish: &Fish) -> Option<FishOrigin> {
        let mut origin = None;
        for entry in self.entries.iter_mut().filter(|e| e.fish.id == fish.id) {
            entry.fish = fish.clone();
            if origin != Some(FishOrigin::Custom) {
                origin = Some(entry.origin);
            }
        }
        origin
    }

    /// Fish whose seen-set membership matches `mode`, in catalog order
    pub fn filter(&self, seen: &SeenSet, mode: SeenFilter) -> Vec<&Fish> {
        filter_by_seen(self.fishes(), seen, mode)
    }

    pub fn progress(&self, seen: &SeenSet) -> CatalogProgress {
        let total = self.len();
        let seen_count = self.fishes().filter(|f| seen.contains(&f.id)).count();
        let percent = if total > 0 {
            (seen_count as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };
        CatalogProgress {
            total,
            seen: seen_count,
            unseen: total - seen_count,
            percent,
        }
    }
}

/// Merge two fish lists: `remote ++ custom`
pub fn reconcile(remote: Vec<Fish>, custom: Vec<Fish>) -> Vec<Fish> {
    Catalog::reconcile(remote, custom).into_fishes()
}

pub fn filter_by_seen<'a, I>(fishes: I, seen: &SeenSet, mode: SeenFilter) -> Vec<&'a Fish>
where
    I: IntoIterator<Item = &'a Fish>,
{
    fishes
        .into_iter()
        .filter(|f| mode.matches(seen.contains(&f.id)))
        .collect()
}

/// Keep only the given rarity, compared case-insensitively; `None` keeps
/// every species
pub fn filter_by_rarity<'a, I>(fishes: I, rarity: Option<&Rarity>) -> Vec<&'a Fish>
where
    I: IntoIterator<Item = &'a Fish>,
{
    let wanted = rarity.map(|r| r.label().trim());
    fishes
        .into_iter()
        .filter(|f| wanted.map_or(true, |w| f.rarity.label().trim().eq_ignore_ascii_case(w)))
        .collect()
}

/// Stable sort, rarest first
pub fn sort_by_rarity(fishes: &mut [&Fish]) {
    fishes.sort_by_key(|f| f.rarity.order());
}
