//! Hands reward bundles to the inventory collaborator.

use crate::domain::bag::Inventory;
use crate::domain::rewards::RewardBundle;

/// Adds every item of `bundle` to `inventory`, returning the number of stacks.
///
/// Callers are responsible for granting a bundle only once per completion.
pub fn grant_bundle(inventory: &dyn Inventory, quest_id: &str, bundle: &RewardBundle) -> usize {
    for item in &bundle.items {
        inventory.add(&item.id, &item.name, &item.image, item.qty);
    }
    if !bundle.is_empty() {
        tracing::info!(quest_id, stacks = bundle.items.len(), "granted quest rewards");
    }
    bundle.items.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bag::Bag;
    use crate::domain::rewards::RewardItem;

    #[test]
    fn test_grant_bundle_adds_every_item() {
        // Arrange
        let bag = Bag::new();
        let bundle = RewardBundle {
            items: vec![
                RewardItem {
                    id: "oath_ring".to_owned(),
                    name: "Oath Ring".to_owned(),
                    image: "/img/ring.png".to_owned(),
                    qty: 1,
                },
                RewardItem {
                    id: "mead".to_owned(),
                    name: "Mead".to_owned(),
                    image: "/img/mead.png".to_owned(),
                    qty: 3,
                },
            ],
        };

        // Act
        let granted = grant_bundle(&bag, "q_sign_oath", &bundle);

        // Assert
        assert_eq!(granted, 2);
        assert_eq!(bag.quantity("oath_ring"), 1);
        assert_eq!(bag.quantity("mead"), 3);
    }
}
