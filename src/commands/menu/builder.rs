use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use crate::fields;
use crate::woo::{MenuApi, MenuItemPayload, WooError, WooResult};

use super::tree::MenuNode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuTally {
    pub created: usize,
    pub failed: usize,
}

/// Creates taxonomy terms and nested menu items for a category tree.
pub struct MenuBuilder<'a, A: MenuApi + ?Sized> {
    api: &'a A,
    menu_id: u64,
    taxonomy: String,
    terms: HashMap<(String, u64), u64>,
}

impl<'a, A: MenuApi + ?Sized> MenuBuilder<'a, A> {
    pub fn new(api: &'a A, menu_id: u64, taxonomy: &str) -> Self {
        Self {
            api,
            menu_id,
            taxonomy: taxonomy.to_string(),
            terms: HashMap::new(),
        }
    }

    /// Loads every existing term into the `(name, parent)` cache.
    pub fn preload_terms(&mut self) -> WooResult<usize> {
        for term in self.api.list_terms(&self.taxonomy)? {
            self.terms.insert((term.name, term.parent), term.id);
        }
        Ok(self.terms.len())
    }

    pub fn cached_terms(&self) -> usize {
        self.terms.len()
    }

    /// Term id of the last segment of `path`, creating missing levels.
    pub fn ensure_term_for_path(&mut self, path: &str) -> Option<u64> {
        let parts = fields::split_multi(path);
        if parts.is_empty() {
            return None;
        }

        let mut parent = 0;
        for name in parts {
            let key = (name, parent);
            if let Some(id) = self.terms.get(&key) {
                parent = *id;
                continue;
            }

            let id = match self.api.create_term(&self.taxonomy, &key.0, parent) {
                Ok(term) => {
                    info!(name = %key.0, parent, term_id = term.id, "created term");
                    term.id
                }
                Err(WooError::TermExists { term_id }) => {
                    info!(name = %key.0, parent, term_id, "term exists, reusing");
                    term_id
                }
                Err(err) => {
                    warn!(name = %key.0, parent, error = %err, "term create failed");
                    return None;
                }
            };
            self.terms.insert(key, id);
            parent = id;
        }

        Some(parent)
    }

    /// Creates items for `nodes` under `parent_item`, depth first.
    ///
    /// `menu_order` counts from 1 within each sibling list. A node whose term
    /// or item fails is counted and its subtree skipped.
    pub fn create_nodes(
        &mut self,
        nodes: &BTreeMap<String, MenuNode>,
        parent_item: u64,
        tally: &mut MenuTally,
    ) {
        let mut order = 1;
        for node in nodes.values() {
            let Some(term_id) = self.ensure_term_for_path(&node.full_path) else {
                warn!(path = %node.full_path, "no term for path, skipping subtree");
                tally.failed += 1;
                continue;
            };

            let payload = MenuItemPayload {
                title: node.name.clone(),
                status: "publish".to_string(),
                menu_order: order,
                menus: self.menu_id,
                parent: parent_item,
                kind: "taxonomy".to_string(),
                object: self.taxonomy.clone(),
                object_id: term_id,
            };
            order += 1;

            match self.api.create_menu_item(&payload) {
                Ok(item) => {
                    tally.created += 1;
                    info!(path = %node.full_path, item_id = item.id, parent = parent_item, "menu item created");
                    self.create_nodes(&node.children, item.id, tally);
                }
                Err(err) => {
                    tally.failed += 1;
                    warn!(path = %node.full_path, error = %err, "menu item create failed, skipping subtree");
                }
            }
        }
    }
}
