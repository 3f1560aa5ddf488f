//! Row selection for the key table

use indexmap::IndexSet;
use keyconsole_core::KeyId;

/// State of the "select all" checkbox in the table header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCheckbox {
    /// Every row of the current page is selected
    Checked,
    /// Some rows of the current page are selected
    Indeterminate,
    /// No row of the current page is selected
    Unchecked,
}

/// Selected key ids, in selection order
///
/// The selection survives page changes; "select all" only ever covers the
/// rows of the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: IndexSet<KeyId>,
}

impl Selection {
    /// Empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the selection of one row
    pub fn toggle(&mut self, id: KeyId) {
        if !self.ids.shift_remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Select or deselect one row
    pub fn set(&mut self, id: KeyId, selected: bool) {
        if selected {
            self.ids.insert(id);
        } else {
            self.ids.shift_remove(&id);
        }
    }

    /// Header checkbox: select exactly the rows of the current page, or nothing
    pub fn select_all(&mut self, checked: bool, page_ids: &[KeyId]) {
        self.ids.clear();
        if checked {
            self.ids.extend(page_ids.iter().copied());
        }
    }

    /// Drop ids that no longer exist
    pub fn remove_all(&mut self, ids: &[KeyId]) {
        for id in ids {
            self.ids.shift_remove(id);
        }
    }

    /// Replace the selection
    pub fn replace(&mut self, ids: impl IntoIterator<Item = KeyId>) {
        self.ids = ids.into_iter().collect();
    }

    /// Deselect everything
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Whether `id` is selected
    pub fn contains(&self, id: &KeyId) -> bool {
        self.ids.contains(id)
    }

    /// Selected ids in selection order
    pub fn ids(&self) -> Vec<KeyId> {
        self.ids.iter().copied().collect()
    }

    /// Number of selected ids
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Header checkbox state for a page showing `page_ids`
    pub fn header_state(&self, page_ids: &[KeyId]) -> HeaderCheckbox {
        let on_page = page_ids.iter().filter(|id| self.ids.contains(*id)).count();
        match on_page {
            0 => HeaderCheckbox::Unchecked,
            n if n == page_ids.len() => HeaderCheckbox::Checked,
            _ => HeaderCheckbox::Indeterminate,
        }
    }
}
