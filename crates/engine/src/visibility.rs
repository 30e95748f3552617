//! Shows exactly one variant element of a container and hides the rest.
//!
//! All variants are already rendered; only their inline display changes.

use std::sync::Arc;

use optimize_core::dom::{Display, VariantElement};

use crate::markup::VARIANT_ID_ATTR;

/// Shows the element whose `variantId` equals `winner`. Returns its index.
pub fn apply_visibility(winner: &str, elements: &[Arc<dyn VariantElement>]) -> Option<usize> {
    let index = elements
        .iter()
        .position(|el| el.data(VARIANT_ID_ATTR).as_deref() == Some(winner))?;
    show_only(index, elements);
    Some(index)
}

/// Shows the element at `index` and hides every other one.
pub fn show_only(index: usize, elements: &[Arc<dyn VariantElement>]) {
    for (i, element) in elements.iter().enumerate() {
        element.set_display(if i == index {
            Display::Block
        } else {
            Display::None
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimize_core::dom::MemoryVariant;

    fn elements(ids: &[&str]) -> Vec<Arc<MemoryVariant>> {
        ids.iter()
            .map(|id| Arc::new(MemoryVariant::new().with_data(VARIANT_ID_ATTR, *id)))
            .collect()
    }

    fn as_dyn(elements: &[Arc<MemoryVariant>]) -> Vec<Arc<dyn VariantElement>> {
        elements
            .iter()
            .map(|e| e.clone() as Arc<dyn VariantElement>)
            .collect()
    }

    #[test]
    fn test_exactly_one_visible() {
        let els = elements(&["a", "b", "c"]);
        assert_eq!(apply_visibility("b", &as_dyn(&els)), Some(1));
        let shown: Vec<Display> = els.iter().map(|e| e.display()).collect();
        assert_eq!(shown, vec![Display::None, Display::Block, Display::None]);
    }

    #[test]
    fn test_unknown_winner_leaves_elements_untouched() {
        let els = elements(&["a", "b"]);
        assert_eq!(apply_visibility("z", &as_dyn(&els)), None);
        assert!(els.iter().all(|e| e.display() == Display::Unset));
    }

    #[test]
    fn test_elements_without_id_are_hidden() {
        let mut els = elements(&["a"]);
        els.push(Arc::new(MemoryVariant::new()));
        apply_visibility("a", &as_dyn(&els));
        assert_eq!(els[0].display(), Display::Block);
        assert_eq!(els[1].display(), Display::None);
    }
}
