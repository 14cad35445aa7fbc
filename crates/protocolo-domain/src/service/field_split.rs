//! Splitting of composite order/shipment/invoice fields

/// Delimiters in priority order. Only the first one present is used.
pub const DELIMITERS: [char; 7] = ['/', '-', ',', '.', ':', ';', '_'];

/// Split a composite field such as `"123/456"` into its sub-values.
///
/// The first delimiter from [`DELIMITERS`] that occurs anywhere in the value
/// is used for every split; the remaining delimiters are left untouched, so
/// `"123/456-789"` yields `["123", "456-789"]`. A value with no delimiter is a
/// single-element list.
pub fn split_composite(value: &str) -> Vec<String> {
    match DELIMITERS.iter().find(|d| value.contains(**d)) {
        Some(delimiter) => value.split(*delimiter).map(str::to_string).collect(),
        None => vec![value.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_delimiter_only() {
        assert_eq!(split_composite("123/456-789"), vec!["123", "456-789"]);
    }

    #[test]
    fn test_priority_not_position() {
        // '-' outranks '.', even though '.' appears first
        assert_eq!(split_composite("1.2-3"), vec!["1.2", "3"]);
    }

    #[test]
    fn test_splits_every_occurrence() {
        assert_eq!(split_composite("10;20;30"), vec!["10", "20", "30"]);
    }

    #[test]
    fn test_no_delimiter() {
        assert_eq!(split_composite("98765"), vec!["98765"]);
        assert_eq!(split_composite(""), vec![""]);
    }

    #[test]
    fn test_edge_delimiters_keep_empty_parts() {
        assert_eq!(split_composite("/123"), vec!["", "123"]);
        assert_eq!(split_composite("a_b_"), vec!["a", "b", ""]);
    }
}
