use storefront_api::{
    dto::orders::OrderItemInput,
    error::AppError,
    services::{
        order_service::{compute_total, validate_order_status},
        product_service::price_from_request,
    },
};

fn item(price: Option<i64>, quantity: Option<i32>) -> OrderItemInput {
    OrderItemInput {
        product_id: None,
        title: "Tee".into(),
        sku: None,
        quantity,
        unit_price_cents: price,
        attributes: None,
    }
}

#[test]
fn total_sums_price_times_quantity() {
    let items = vec![item(Some(500), Some(2)), item(Some(250), Some(4))];
    assert_eq!(compute_total(&items), 2000);
}

#[test]
fn total_defaults_missing_price_to_zero_and_quantity_to_one() {
    let items = vec![item(Some(500), None), item(None, Some(3))];
    assert_eq!(compute_total(&items), 500);
}

#[test]
fn total_of_no_items_is_zero() {
    assert_eq!(compute_total(&[]), 0);
}

#[test]
fn known_statuses_pass_validation() {
    for status in ["pending", "paid", "shipped", "completed", "cancelled"] {
        assert!(validate_order_status(status).is_ok());
    }
}

#[test]
fn unknown_status_fails_validation() {
    assert!(matches!(
        validate_order_status("refunded"),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn price_accepts_minor_units_directly() {
    assert_eq!(price_from_request(Some(350000), None).unwrap(), 350000);
}

#[test]
fn price_converts_major_units_to_cents() {
    assert_eq!(price_from_request(None, Some(3500.0)).unwrap(), 350000);
    assert_eq!(price_from_request(None, Some(49.99)).unwrap(), 4999);
}

#[test]
fn minor_units_win_when_both_are_supplied() {
    assert_eq!(price_from_request(Some(100), Some(3500.0)).unwrap(), 100);
}

#[test]
fn negative_or_missing_price_is_rejected() {
    assert!(matches!(
        price_from_request(Some(-1), None),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        price_from_request(None, Some(-10.0)),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        price_from_request(None, None),
        Err(AppError::Validation(_))
    ));
}
