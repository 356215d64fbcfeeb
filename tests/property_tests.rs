use proptest::prelude::*;
use rust_decimal::Decimal;
use storefront_rs::models::{
    Address, Cart, CreateProductRequest, Order, OrderStatus, PlaceOrderRequest, Product,
    UpdateProductRequest,
};

// Property-based test strategies
prop_compose! {
    fn arb_product_id()(suffix in "[0-9a-f]{8}") -> String {
        format!("P{}", suffix)
    }
}

prop_compose! {
    fn arb_price()(cents in 1u32..100000) -> Decimal {
        // Generate prices as cents so every value has exactly 2 decimal places
        Decimal::from_parts(cents, 0, 0, false, 2)
    }
}

prop_compose! {
    fn arb_quantity()(quantity in 1u32..100) -> u32 {
        quantity
    }
}

prop_compose! {
    fn arb_line_items()(
        items in prop::collection::vec((arb_product_id(), arb_quantity(), arb_price()), 1..10)
    ) -> Vec<(String, u32, Decimal)> {
        items
    }
}

prop_compose! {
    fn arb_order_status()(status in prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Dispatched),
        Just(OrderStatus::Delivered),
        Just(OrderStatus::Cancelled),
    ]) -> OrderStatus {
        status
    }
}

fn test_address() -> Address {
    Address {
        street: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "KA".to_string(),
        pincode: "560001".to_string(),
    }
}

proptest! {
    #[test]
    fn cart_totals_match_line_items(items in arb_line_items()) {
        let mut cart = Cart::new("C12345678".to_string());

        for (product_id, quantity, price) in &items {
            cart.add_item(product_id.clone(), *quantity, *price);
        }

        // Adding the same product twice merges rather than duplicates,
        // so the line count never exceeds the distinct product count
        let mut distinct: Vec<&str> = items.iter().map(|(id, _, _)| id.as_str()).collect();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(cart.items.len(), distinct.len());

        let expected_items: u32 = items.iter().map(|(_, quantity, _)| quantity).sum();
        prop_assert_eq!(cart.total_items(), expected_items);
    }

    #[test]
    fn cart_merge_accumulates_quantity(
        product_id in arb_product_id(),
        first in arb_quantity(),
        second in arb_quantity(),
        price in arb_price(),
    ) {
        let mut cart = Cart::new("C12345678".to_string());
        cart.add_item(product_id.clone(), first, price);
        cart.add_item(product_id.clone(), second, price);

        prop_assert_eq!(cart.items.len(), 1);
        prop_assert_eq!(cart.total_items(), first + second);
        prop_assert_eq!(cart.total_price(), price * Decimal::from(first + second));
    }

    #[test]
    fn cart_remove_round_trip(items in arb_line_items()) {
        let mut cart = Cart::new("C12345678".to_string());
        for (product_id, quantity, price) in &items {
            cart.add_item(product_id.clone(), *quantity, *price);
        }

        let (first_id, _, _) = &items[0];
        prop_assert!(cart.contains_item(first_id));
        prop_assert!(cart.remove_item(first_id));
        prop_assert!(!cart.contains_item(first_id));
        // Removing it again is a no-op
        prop_assert!(!cart.remove_item(first_id));
    }

    #[test]
    fn order_snapshot_preserves_cart_totals(items in arb_line_items()) {
        let mut cart = Cart::new("C12345678".to_string());
        for (product_id, quantity, price) in &items {
            cart.add_item(product_id.clone(), *quantity, *price);
        }

        let names: Vec<(String, String)> = cart
            .items
            .iter()
            .map(|item| (item.product_id.clone(), format!("name-{}", item.product_id)))
            .collect();

        let order = Order::from_cart(
            &cart,
            &names,
            PlaceOrderRequest {
                card_number: "4111111111111111".to_string(),
                shipping_address: test_address(),
            },
        );

        prop_assert_eq!(order.order_status, OrderStatus::Pending);
        prop_assert_eq!(order.items.len(), cart.items.len());
        prop_assert_eq!(order.total_items(), cart.total_items());
        prop_assert_eq!(order.total, cart.total_price());

        // Every line carries the joined-in product name
        for item in &order.items {
            prop_assert_eq!(&item.product_name, &format!("name-{}", item.product_id));
        }
    }

    #[test]
    fn only_pending_and_dispatched_orders_cancel(status in arb_order_status()) {
        let expected = matches!(status, OrderStatus::Pending | OrderStatus::Dispatched);
        prop_assert_eq!(status.is_cancellable(), expected);
    }

    #[test]
    fn product_stock_drives_availability(
        initial in arb_quantity(),
        price in arb_price(),
    ) {
        let mut product = Product::new(
            "S12345678".to_string(),
            CreateProductRequest {
                product_name: "Test Product".to_string(),
                manufacturer: None,
                description: None,
                category: None,
                price,
                quantity: initial,
            },
        );
        prop_assert!(product.is_available());

        product.set_stock(0);
        prop_assert!(!product.is_available());

        product.set_stock(initial);
        prop_assert!(product.is_available());
    }

    #[test]
    fn product_update_keeps_unset_fields(
        price in arb_price(),
        new_price in arb_price(),
        quantity in arb_quantity(),
    ) {
        let mut product = Product::new(
            "S12345678".to_string(),
            CreateProductRequest {
                product_name: "Test Product".to_string(),
                manufacturer: Some("Acme".to_string()),
                description: None,
                category: Some("general".to_string()),
                price,
                quantity,
            },
        );

        product.update(UpdateProductRequest {
            product_id: product.product_id.clone(),
            price: Some(new_price),
            ..Default::default()
        });

        prop_assert_eq!(product.price, new_price);
        prop_assert_eq!(product.quantity, quantity);
        prop_assert_eq!(product.product_name, "Test Product");
        prop_assert_eq!(product.manufacturer, Some("Acme".to_string()));
    }
}
