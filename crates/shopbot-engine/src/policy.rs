use serde_json::Value;

use shopbot_core::FunctionCallResult;
use shopbot_functions::PRODUCT_SEARCH_FUNCTIONS;

fn listed_products(result: &FunctionCallResult) -> Option<&[Value]> {
    if !PRODUCT_SEARCH_FUNCTIONS.contains(&result.function()) {
        return None;
    }
    result
        .payload()?
        .as_array()
        .map(Vec::as_slice)
        .filter(|products| !products.is_empty())
}

/// True when a turn found products the customer might want to add to the cart.
pub fn should_offer_cart(results: &[FunctionCallResult]) -> bool {
    results.iter().any(|result| listed_products(result).is_some())
}

/// Product ids from the product listings in `results`, in listing order.
pub fn suggested_products(results: &[FunctionCallResult]) -> Vec<String> {
    results
        .iter()
        .filter_map(listed_products)
        .flatten()
        .filter_map(|product| product.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shopbot_core::FunctionError;

    fn search(payload: Value) -> FunctionCallResult {
        FunctionCallResult::success("search_products", json!({"query": "football"}), payload)
    }

    #[test]
    fn test_offer_after_non_empty_search() {
        let results = vec![search(json!([{"id": "FB001", "name": "Football Cleats"}]))];
        assert!(should_offer_cart(&results));
        assert_eq!(suggested_products(&results), vec!["FB001"]);
    }

    #[test]
    fn test_no_offer_for_empty_or_failed_search() {
        assert!(!should_offer_cart(&[]));
        assert!(!should_offer_cart(&[search(json!([]))]));

        let failed = FunctionCallResult::failure(
            "search_products",
            json!({}),
            &FunctionError::StorageUnavailable("disk gone".into()),
        );
        assert!(!should_offer_cart(&[failed]));
    }

    #[test]
    fn test_no_offer_for_other_functions() {
        let cart = FunctionCallResult::success(
            "view_cart",
            json!({}),
            json!({"items": [{"product_id": "FB001"}], "total": 49.99, "item_count": 1}),
        );
        let orders = FunctionCallResult::success("get_user_orders", json!({}), json!([{"id": "ORD001"}]));
        assert!(!should_offer_cart(&[cart, orders]));
    }

    #[test]
    fn test_suggestions_keep_listing_order() {
        let results = vec![search(json!([{"id": "FB002"}, {"id": "FB001"}]))];
        assert_eq!(suggested_products(&results), vec!["FB002", "FB001"]);
    }
}
