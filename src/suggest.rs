//! "Did you mean" suggestions for mistyped directive names.

/// Directive names further than this from every known name get no suggestion.
pub const MAX_DISTANCE: usize = 2;

/// The closest entry of `vocabulary` to `query`, if any is within
/// [`MAX_DISTANCE`] edits. Ties go to the earliest entry.
pub fn suggest<'a>(query: &str, vocabulary: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    vocabulary
        .into_iter()
        .map(|candidate| (candidate, levenshtein_distance(query, candidate)))
        .filter(|(_, dist)| *dist <= MAX_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(candidate, _)| candidate)
}

/// Edit distance between two strings, counted in chars.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let chars1: Vec<char> = s1.chars().collect();
    let chars2: Vec<char> = s2.chars().collect();

    if chars1.is_empty() {
        return chars2.len();
    }
    if chars2.is_empty() {
        return chars1.len();
    }

    // Two rolling rows instead of the full matrix.
    let mut prev: Vec<usize> = (0..=chars2.len()).collect();
    let mut curr = vec![0; chars2.len() + 1];
    for (i, c1) in chars1.iter().enumerate() {
        curr[0] = i + 1;
        for (j, c2) in chars2.iter().enumerate() {
            let cost = usize::from(c1 != c2);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[chars2.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("sleep", "sleep"), 0);
        assert_eq!(levenshtein_distance("slep", "sleep"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_suggest_within_threshold() {
        let vocab = ["sleep", "set", "source", "show"];
        assert_eq!(suggest("slep", vocab), Some("sleep"));
        assert_eq!(suggest("sourc", vocab), Some("source"));
        assert_eq!(suggest("teleport", vocab), None);
    }
}
