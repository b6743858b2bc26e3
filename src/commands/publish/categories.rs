use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::fields;
use crate::woo::{Storefront, WooError};

/// `(name, parent id) -> category id`, shared by every publish worker.
///
/// Misses are resolved one at a time under `creating`, so two workers never
/// create the same level twice.
#[derive(Debug, Default)]
pub struct CategoryCache {
    ids: Mutex<HashMap<(String, u64), u64>>,
    creating: Mutex<()>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn lookup(&self, name: &str, parent: u64) -> Option<u64> {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(name.to_string(), parent))
            .copied()
    }

    fn remember(&self, name: &str, parent: u64, id: u64) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((name.to_string(), parent), id);
    }

    /// Walks `A|||B|||C`, finding or creating each level under the previous.
    ///
    /// Returns the deepest category id reached. A level that cannot be
    /// created is skipped and the walk continues under the last good parent.
    pub fn resolve_path<S: Storefront + ?Sized>(&self, store: &S, path: &str) -> Option<u64> {
        let mut parent = 0;

        for name in fields::split_multi(path) {
            if let Some(id) = self.lookup(&name, parent) {
                parent = id;
                continue;
            }

            let _creating = self.creating.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(id) = self.find(store, &name, parent) {
                parent = id;
                continue;
            }

            match store.create_category(&name, parent) {
                Ok(category) => {
                    info!(name = %name, parent, id = category.id, "created category");
                    self.remember(&name, parent, category.id);
                    parent = category.id;
                }
                Err(WooError::TermExists { term_id }) => {
                    info!(name = %name, parent, id = term_id, "category already exists, reusing");
                    self.remember(&name, parent, term_id);
                    parent = term_id;
                }
                Err(err) => {
                    warn!(name = %name, parent, error = %err, "category create failed, keeping parent");
                }
            }
        }

        (parent != 0).then_some(parent)
    }

    /// Cache first, then a full listing from the store.
    fn find<S: Storefront + ?Sized>(&self, store: &S, name: &str, parent: u64) -> Option<u64> {
        if let Some(id) = self.lookup(name, parent) {
            return Some(id);
        }

        let categories = match store.list_categories() {
            Ok(categories) => categories,
            Err(err) => {
                warn!(error = %err, "failed to list categories");
                return None;
            }
        };

        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        for category in categories {
            ids.entry((category.name, category.parent))
                .or_insert(category.id);
        }
        ids.get(&(name.to_string(), parent)).copied()
    }
}
