use std::collections::BTreeSet;

use crate::models::Product;

/// Products picked for export in the current browser session.
///
/// Lives only in memory: a page reload starts an empty selection, and
/// nothing here is ever persisted.
#[derive(Debug, Default)]
pub struct Session {
    selected: BTreeSet<i64>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the selection for one product; returns whether it is selected
    /// afterwards.
    pub fn toggle(&mut self, woo_id: i64) -> bool {
        if self.selected.remove(&woo_id) {
            false
        } else {
            self.selected.insert(woo_id);
            true
        }
    }

    #[must_use]
    pub fn is_selected(&self, woo_id: i64) -> bool {
        self.selected.contains(&woo_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    #[must_use]
    pub fn ids(&self) -> Vec<i64> {
        self.selected.iter().copied().collect()
    }

    /// The selected subset of `products`, preserving the list's order.
    #[must_use]
    pub fn selected_from<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products
            .iter()
            .filter(|p| self.selected.contains(&p.woo_id))
            .collect()
    }
}

/// Compensating action recorded before an optimistic price edit.
///
/// The UI applies the new price to its in-memory list immediately, then
/// writes through to the store; when the write fails, `revert` restores the
/// recorded previous value without reloading the whole list.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceEdit {
    pub woo_id: i64,
    pub previous: Option<f64>,
}

impl PriceEdit {
    pub fn revert(&self, products: &mut [Product]) {
        if let Some(p) = products.iter_mut().find(|p| p.woo_id == self.woo_id) {
            p.catalog_price = self.previous;
        }
    }
}

/// Optimistically set `catalog_price` on the in-memory list, returning the
/// compensating action. `None` when the product is not in the list.
pub fn apply_price_edit(
    products: &mut [Product],
    woo_id: i64,
    price: Option<f64>,
) -> Option<PriceEdit> {
    let product = products.iter_mut().find(|p| p.woo_id == woo_id)?;
    let edit = PriceEdit {
        woo_id,
        previous: product.catalog_price,
    };
    product.catalog_price = price;
    Some(edit)
}
