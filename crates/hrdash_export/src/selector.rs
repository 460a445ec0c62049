//! Field selection for a single export dialog session.

use crate::catalog::FieldCatalog;

/// Ordered set of field keys chosen for one export.
///
/// Every required key of the catalog it was built from is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    keys: Vec<String>,
}

impl Selection {
    /// Seed a selection with every required field, in catalog order.
    pub fn initialize(catalog: &FieldCatalog) -> Self {
        Self {
            keys: catalog.required_keys(),
        }
    }

    /// Same as [`Selection::initialize`].
    pub fn reset(catalog: &FieldCatalog) -> Self {
        Self::initialize(catalog)
    }

    /// Every catalog key, in catalog order.
    pub fn all(catalog: &FieldCatalog) -> Self {
        Self {
            keys: catalog.keys(),
        }
    }

    /// Build a selection from caller-supplied keys, keeping the catalog's
    /// required keys in front and dropping unknown or repeated keys.
    pub fn from_keys<I, S>(catalog: &FieldCatalog, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::initialize(catalog);
        for key in keys {
            let key = key.as_ref();
            if catalog.contains(key) && !selection.contains(key) {
                selection.keys.push(key.to_string());
            }
        }
        selection
    }

    /// Add `key` at the end if absent, remove it if present.
    ///
    /// Removing a required key is a silent no-op.
    pub fn toggle(&self, catalog: &FieldCatalog, key: &str) -> Self {
        let mut next = self.clone();
        next.toggle_in_place(catalog, key);
        next
    }

    pub fn toggle_in_place(&mut self, catalog: &FieldCatalog, key: &str) {
        match self.keys.iter().position(|k| k == key) {
            Some(_) if catalog.is_required(key) => {}
            Some(idx) => {
                self.keys.remove(idx);
            }
            None => self.keys.push(key.to_string()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldSpec;

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(vec![
            FieldSpec::optional("email", "Email"),
            FieldSpec::required("name", "Name"),
            FieldSpec::optional("phone", "Phone"),
            FieldSpec::required("id", "ID"),
        ])
        .unwrap()
    }

    #[test]
    fn test_initialize_is_required_subset_in_catalog_order() {
        let selection = Selection::initialize(&catalog());
        assert_eq!(selection.keys(), ["name", "id"]);
    }

    #[test]
    fn test_initialize_without_required_fields_is_empty() {
        let catalog = FieldCatalog::new(vec![FieldSpec::optional("a", "A")]).unwrap();
        assert!(Selection::initialize(&catalog).is_empty());
    }

    #[test]
    fn test_toggle_appends_absent_key_at_end() {
        let catalog = catalog();
        let selection = Selection::initialize(&catalog)
            .toggle(&catalog, "phone")
            .toggle(&catalog, "email");
        assert_eq!(selection.keys(), ["name", "id", "phone", "email"]);
    }

    #[test]
    fn test_toggle_required_key_is_noop() {
        let catalog = catalog();
        let selection = Selection::initialize(&catalog).toggle(&catalog, "phone");
        for key in ["name", "id"] {
            assert_eq!(selection.toggle(&catalog, key), selection);
        }
    }

    #[test]
    fn test_toggle_optional_key_is_self_inverse() {
        let catalog = catalog();
        let base = Selection::initialize(&catalog);
        for key in ["email", "phone"] {
            assert_eq!(base.toggle(&catalog, key).toggle(&catalog, key), base);
        }

        let with_phone = base.toggle(&catalog, "phone");
        assert_eq!(
            with_phone.toggle(&catalog, "email").toggle(&catalog, "email"),
            with_phone
        );
    }

    #[test]
    fn test_reset_matches_initialize() {
        let catalog = catalog();
        let toggled = Selection::initialize(&catalog).toggle(&catalog, "email");
        assert_ne!(toggled, Selection::reset(&catalog));
        assert_eq!(Selection::reset(&catalog), Selection::initialize(&catalog));
    }

    #[test]
    fn test_from_keys_keeps_required_and_skips_unknown() {
        let catalog = catalog();
        let selection = Selection::from_keys(&catalog, ["phone", "salary", "name", "phone"]);
        assert_eq!(selection.keys(), ["name", "id", "phone"]);
    }

    #[test]
    fn test_from_keys_without_required_still_contains_them() {
        let catalog = catalog();
        let selection = Selection::from_keys(&catalog, ["email"]);
        assert_eq!(selection.keys(), ["name", "id", "email"]);
        let empty = Selection::from_keys(&catalog, Vec::<String>::new());
        assert_eq!(empty, Selection::initialize(&catalog));
    }

    #[test]
    fn test_all_uses_catalog_order() {
        let selection = Selection::all(&catalog());
        assert_eq!(selection.keys(), ["email", "name", "phone", "id"]);
    }
}
