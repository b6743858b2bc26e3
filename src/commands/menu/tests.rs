use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::builder::{MenuBuilder, MenuTally};
use super::tree::{build_tree, count_nodes, render};
use crate::woo::{MenuApi, MenuItem, MenuItemPayload, Term, WooError, WooResult};

#[derive(Default)]
struct FakeMenu {
    existing: Vec<Term>,
    /// Names the server reports as existing, with their ids.
    conflicts: HashMap<String, u64>,
    reject_terms: Vec<String>,
    reject_items: Vec<String>,
    created_terms: RefCell<Vec<(String, u64)>>,
    items: RefCell<Vec<MenuItemPayload>>,
    next_id: Cell<u64>,
}

impl FakeMenu {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 500;
        self.next_id.set(self.next_id.get() + 1);
        id
    }
}

impl MenuApi for FakeMenu {
    fn list_terms(&self, _taxonomy: &str) -> WooResult<Vec<Term>> {
        Ok(self.existing.clone())
    }

    fn create_term(&self, _taxonomy: &str, name: &str, parent: u64) -> WooResult<Term> {
        if let Some(term_id) = self.conflicts.get(name) {
            return Err(WooError::TermExists { term_id: *term_id });
        }
        if self.reject_terms.iter().any(|rejected| rejected == name) {
            return Err(WooError::Status {
                status: 500,
                body: "error".to_string(),
            });
        }
        self.created_terms
            .borrow_mut()
            .push((name.to_string(), parent));
        Ok(Term {
            id: self.next_id(),
            name: name.to_string(),
            parent,
        })
    }

    fn create_menu_item(&self, payload: &MenuItemPayload) -> WooResult<MenuItem> {
        if self.reject_items.contains(&payload.title) {
            return Err(WooError::Status {
                status: 400,
                body: "rejected".to_string(),
            });
        }
        self.items.borrow_mut().push(payload.clone());
        Ok(MenuItem { id: self.next_id() })
    }
}

fn term(id: u64, name: &str, parent: u64) -> Term {
    Term {
        id,
        name: name.to_string(),
        parent,
    }
}

#[test]
fn tree_nests_paths_and_sorts_siblings() {
    let roots = build_tree([
        "Women|||Dresses",
        "Men|||Tops|||Shirts",
        "Men|||Tops|||Polos",
        "Men||| |||Shoes",
        "  ",
    ]);

    assert_eq!(roots.keys().collect::<Vec<_>>(), vec!["Men", "Women"]);
    let men = &roots["Men"];
    assert_eq!(men.children.keys().collect::<Vec<_>>(), vec!["Shoes", "Tops"]);
    assert_eq!(men.children["Tops"].children["Polos"].full_path, "Men|||Tops|||Polos");
    assert_eq!(count_nodes(&roots), 7);

    assert_eq!(
        render(&roots),
        vec![
            "1. Men",
            "  1. Shoes",
            "  2. Tops",
            "    1. Polos",
            "    2. Shirts",
            "2. Women",
            "  1. Dresses",
        ]
    );
}

#[test]
fn preloaded_terms_are_reused() {
    let api = FakeMenu {
        existing: vec![term(1, "Men", 0), term(2, "Tops", 1)],
        ..FakeMenu::default()
    };
    let mut builder = MenuBuilder::new(&api, 9, "product_cat");
    assert_eq!(builder.preload_terms().expect("preload"), 2);

    assert_eq!(builder.ensure_term_for_path("Men|||Tops"), Some(2));
    let shirts = builder
        .ensure_term_for_path("Men|||Tops|||Shirts")
        .expect("shirts term");
    assert_eq!(builder.ensure_term_for_path("Men|||Tops|||Shirts"), Some(shirts));

    assert_eq!(
        api.created_terms.borrow().clone(),
        vec![("Shirts".to_string(), 2)]
    );
    assert_eq!(builder.ensure_term_for_path(" ||| "), None);
}

#[test]
fn term_exists_reuses_the_reported_id() {
    let api = FakeMenu {
        conflicts: HashMap::from([("Men".to_string(), 77)]),
        ..FakeMenu::default()
    };
    let mut builder = MenuBuilder::new(&api, 9, "product_cat");

    builder.ensure_term_for_path("Men|||Hats").expect("hats term");
    assert_eq!(
        api.created_terms.borrow().clone(),
        vec![("Hats".to_string(), 77)]
    );
    assert_eq!(builder.cached_terms(), 2);
}

#[test]
fn menu_items_nest_with_per_level_order() {
    let api = FakeMenu::default();
    let roots = build_tree(["Men|||Tops", "Men|||Shoes", "Women"]);
    let mut builder = MenuBuilder::new(&api, 42, "product_cat");

    let mut tally = MenuTally::default();
    builder.create_nodes(&roots, 0, &mut tally);
    assert_eq!(tally, MenuTally { created: 4, failed: 0 });

    let items = api.items.borrow();
    let titles: Vec<(&str, usize)> = items
        .iter()
        .map(|item| (item.title.as_str(), item.menu_order))
        .collect();
    assert_eq!(
        titles,
        vec![("Men", 1), ("Shoes", 1), ("Tops", 2), ("Women", 2)]
    );
    assert!(items.iter().all(|item| item.menus == 42));
    assert!(items.iter().all(|item| item.kind == "taxonomy"));
    assert_eq!(items[0].parent, 0);
    assert_eq!(items[1].parent, items[2].parent);
    assert_ne!(items[1].parent, 0);
    assert_eq!(items[3].parent, 0);
}

#[test]
fn failures_skip_the_subtree() {
    let api = FakeMenu {
        reject_terms: vec!["Kids".to_string()],
        reject_items: vec!["Men".to_string()],
        ..FakeMenu::default()
    };
    let roots = build_tree(["Kids|||Toys", "Men|||Tops", "Women"]);
    let mut builder = MenuBuilder::new(&api, 1, "product_cat");

    let mut tally = MenuTally::default();
    builder.create_nodes(&roots, 0, &mut tally);

    assert_eq!(tally, MenuTally { created: 1, failed: 2 });
    let items = api.items.borrow();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Women");
    // Kids never got a term, so it did not take an order slot.
    assert_eq!(items[0].menu_order, 2);
}
