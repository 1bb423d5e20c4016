pub const MAX_SUGGESTIONS: usize = 8;
pub const MIN_QUERY_CHARS: usize = 2;

/// Suggests up to eight names for a partial query.
///
/// Names starting with the query come first, then names containing it
/// further in. Both groups keep list order and matching ignores case.
pub fn suggest<S: AsRef<str>>(names: &[S], query: &str) -> Vec<String> {
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    let query = query.to_lowercase();

    let mut prefixed = Vec::new();
    let mut inner = Vec::new();
    for name in names {
        let name = name.as_ref();
        let lower = name.to_lowercase();
        if lower.starts_with(&query) {
            prefixed.push(name);
        } else if lower.contains(&query) {
            inner.push(name);
        }
    }

    prefixed.truncate(MAX_SUGGESTIONS);
    let room = MAX_SUGGESTIONS - prefixed.len();
    prefixed
        .into_iter()
        .chain(inner.into_iter().take(room))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UNIVERSITIES;

    #[test]
    fn test_prefix_before_contains() {
        let names = ["Edith Cowan University", "UWA", "Curtin University"];
        assert_eq!(
            suggest(&names, "uw"),
            vec!["UWA".to_string()]
        );
        assert_eq!(
            suggest(&names, "UNI"),
            vec!["Edith Cowan University".to_string(), "Curtin University".to_string()]
        );

        let names = ["Newcastle Uni", "UNSW", "Uni of Sydney"];
        assert_eq!(suggest(&names, "un"), vec!["UNSW", "Uni of Sydney", "Newcastle Uni"]);
    }

    #[test]
    fn test_short_query_returns_nothing() {
        assert!(suggest(UNIVERSITIES, "").is_empty());
        assert!(suggest(UNIVERSITIES, "u").is_empty());
        assert!(suggest(UNIVERSITIES, "é").is_empty());
    }

    #[test]
    fn test_caps_at_eight() {
        let results = suggest(UNIVERSITIES, "university");
        assert_eq!(results.len(), MAX_SUGGESTIONS);
        assert_eq!(results[0], "University of South Australia");
    }

    #[test]
    fn test_prefix_matches_fill_first() {
        let names: Vec<String> = (0..10).map(|i| format!("Alpha {i}")).collect();
        let mut with_inner = names.clone();
        with_inner.insert(0, "Beta Alpha".to_string());
        let results = suggest(&with_inner, "alpha");
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.starts_with("Alpha")));
    }

    #[test]
    fn test_no_duplicates_between_groups() {
        let names = ["Curtin", "Not Curtin"];
        assert_eq!(suggest(&names, "curtin"), vec!["Curtin", "Not Curtin"]);
    }
}
