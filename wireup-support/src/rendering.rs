//! Text rendering utilities for human-friendly diagnostics.
//!
//! Formats construction chains, shortens Rust type paths into class names,
//! and ranks identifiers that look like a mistyped request.

/// Renders a construction chain as a readable string.
///
/// # Examples
/// ```
/// use wireup_support::rendering::render_chain;
///
/// let chain = vec!["ClassY", "ClassX", "ClassY"];
/// assert_eq!(render_chain(&chain), "ClassY → ClassX → ClassY");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified Rust type name into a class-like name.
///
/// ```
/// use wireup_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::Mailer"), "Mailer");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
///     "Arc<dyn Logger>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | ',' | ' ' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Edit distance between two strings, giving up once it exceeds `limit`.
///
/// Returns `None` when the distance is larger than `limit`.
pub fn bounded_distance(a: &str, b: &str, limit: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > limit {
        return None;
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        let mut row_min = current[0];

        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
            row_min = row_min.min(current[j + 1]);
        }

        if row_min > limit {
            return None;
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[b.len()];
    (distance <= limit).then_some(distance)
}

/// Suggests known names that are close to `requested`.
///
/// Case-insensitive substring matches rank first, then names within a
/// small edit distance. At most `max_suggestions` names are returned.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    if requested_lower.is_empty() {
        return Vec::new();
    }
    let limit = (requested_lower.chars().count() / 3).max(1);

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 0));
            }

            bounded_distance(&requested_lower, &name_lower, limit).map(|d| (name, d))
        })
        .collect();

    scored.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_cycle_chain() {
        let chain = vec!["A", "B", "C", "A"];
        assert_eq!(render_chain(&chain), "A → B → C → A");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn shorten_plain_name() {
        assert_eq!(shorten_type_name("String"), "String");
        assert_eq!(shorten_type_name("crate::app::Mailer"), "Mailer");
    }

    #[test]
    fn distance_within_limit() {
        assert_eq!(bounded_distance("mailer", "mailer", 2), Some(0));
        assert_eq!(bounded_distance("mailer", "maler", 2), Some(1));
        assert_eq!(bounded_distance("kitten", "sitting", 3), Some(3));
    }

    #[test]
    fn distance_beyond_limit() {
        assert_eq!(bounded_distance("database", "logger", 2), None);
        assert_eq!(bounded_distance("a", "abcdef", 2), None);
    }

    #[test]
    fn suggest_typo() {
        let available = vec!["UserService", "UserRepository", "Logger", "Database"];
        let suggestions = suggest_similar("UserServise", &available, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("UserService"));
    }

    #[test]
    fn suggest_substring_first() {
        let available = vec!["app.logger", "Logger"];
        let suggestions = suggest_similar("logger", &available, 5);
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn suggest_nothing_close() {
        let available = vec!["Database"];
        assert!(suggest_similar("XyzAbcDef", &available, 3).is_empty());
    }
}
