//! Target order-number input parsing

use serde_json::Value;

/// Known order numbers used by `--test`
pub const TEST_ORDER_NUMBERS: [&str; 3] = [
    "111-4868416-8480200",
    "110-8215202-5748241",
    "114-4539098-5260231",
];

/// Parse a target list given on the command line.
///
/// Accepted forms:
/// - JSON list of strings: `["111-...", "112-..."]`
/// - JSON list of objects keyed by order number: `[{"111-...": "gift"}]`;
///   the first key as written is taken
/// - JSON string: `"111-..."`
/// - comma-separated list: `111-..., 112-...`
/// - a single order number
///
/// Valid JSON of any other shape yields no targets. Blank entries are dropped.
pub fn parse_order_numbers(input: &str) -> Vec<String> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }

    let numbers = match serde_json::from_str::<Value>(input) {
        Ok(Value::Array(items)) => from_json_list(&items),
        Ok(Value::String(number)) => vec![number],
        Ok(_) => Vec::new(),
        Err(_) => input.split(',').map(str::to_string).collect(),
    };

    numbers
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

fn from_json_list(items: &[Value]) -> Vec<String> {
    if items.iter().all(Value::is_object) {
        items
            .iter()
            .filter_map(|item| item.as_object()?.keys().next().cloned())
            .collect()
    } else if items.iter().all(Value::is_string) {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"["111-1-1", "222-2-2"]"#, &["111-1-1", "222-2-2"])]
    #[case(r#"[{"111-1-1": "desk"}, {}, {"333-3-3": null}]"#, &["111-1-1", "333-3-3"])]
    #[case(r#"[{"999-9-9": "a", "111-1-1": "b"}]"#, &["999-9-9"])]
    #[case(r#""444-4-4""#, &["444-4-4"])]
    #[case("111-1-1, 222-2-2 ,,", &["111-1-1", "222-2-2"])]
    #[case("  555-5-5  ", &["555-5-5"])]
    #[case(r#"["111-1-1", 5]"#, &[])]
    #[case("42", &[])]
    #[case("[]", &[])]
    #[case("   ", &[])]
    fn test_parse_order_numbers(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(parse_order_numbers(input), expected);
    }

    #[test]
    fn test_order_numbers_are_canonical() {
        for number in TEST_ORDER_NUMBERS {
            assert_eq!(
                crate::infrastructure::parsing::field_parsers::extract_order_id(number),
                number
            );
        }
    }
}
