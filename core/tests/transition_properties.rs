//! Property tests: arbitrary seller action sequences never break the
//! one-order-per-listing invariant or resurrect a sold order.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use dogworld_core::error::MarketError;
use dogworld_core::repository::OrderLedger;
use dogworld_core::types::OrderStatus;
use dogworld_testing::fixtures::Marketplace;
use dogworld_testing::properties::seller_actions;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn seller_actions_respect_the_status_graph(actions in seller_actions(8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let market = Marketplace::new();
            let listing = market.listing().await;
            let mut current = Some(
                market.engine.request_adoption(listing.id, market.buyer).await.unwrap(),
            );
            let mut was_sold = false;

            for action in actions {
                let Some(order) = current.clone() else {
                    // Listing is free again: a new buyer may reserve it.
                    let buyer = market.add_buyer("Next");
                    current = Some(market.engine.request_adoption(listing.id, buyer).await.unwrap());
                    continue;
                };

                match action {
                    Some(next) => {
                        let result = market
                            .engine
                            .transition_order(order.id, next, market.seller)
                            .await;
                        if order.status.can_transition_to(next) {
                            prop_assert!(result.is_ok());
                            was_sold |= next == OrderStatus::Sold;
                            current = Some(dogworld_core::types::Order { status: next, ..order });
                        } else {
                            let is_invalid = matches!(result, Err(MarketError::InvalidTransition { .. }));
                            prop_assert!(is_invalid);
                        }
                    }
                    None => {
                        let result = market.engine.cancel_order(order.id, market.seller).await;
                        if order.status.is_terminal() {
                            let is_invalid = matches!(result, Err(MarketError::InvalidTransition { .. }));
                            prop_assert!(is_invalid);
                        } else {
                            prop_assert!(result.is_ok());
                            current = None;
                        }
                    }
                }

                prop_assert!(market.ledger.len() <= 1);
                let stored = market.ledger.find_by_listing(listing.id).await.unwrap();
                prop_assert_eq!(stored.as_ref().map(|o| o.status), current.as_ref().map(|o| o.status));
                if was_sold {
                    prop_assert_eq!(stored.map(|o| o.status), Some(OrderStatus::Sold));
                }
            }
            Ok(())
        })?;
    }
}
