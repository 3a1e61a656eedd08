//! String transformation utilities for code generation

/// Python keywords that cannot be used as generated identifiers
const RESERVED_IDENTIFIERS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "false", "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "none", "nonlocal", "not", "or", "pass", "raise", "return", "true", "try", "while",
    "with", "yield",
];

/// Converts a string to snake_case format for generated identifiers.
///
/// This function handles camelCase, PascalCase, kebab-case, space-separated
/// strings and HTTP route text, converting them all to snake_case. Every run of
/// non-alphanumeric characters collapses into a single underscore.
///
/// # Examples
/// ```
/// use mcp_builder::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
/// assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
/// assert_eq!(to_snake_case("GET /users/{id}"), "get_users_id");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_is_lowercase = false;

    for ch in s.chars() {
        if ch.is_ascii_uppercase() {
            // Word boundary inside camelCase
            if prev_is_lowercase {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_ascii_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_is_lowercase = false;
        }
    }

    result.trim_matches('_').to_string()
}

/// Converts a string to capitalized words separated by spaces.
///
/// # Examples
/// ```
/// use mcp_builder::utils::to_title_case;
///
/// assert_eq!(to_title_case("example_docs"), "Example Docs");
/// assert_eq!(to_title_case("stripe"), "Stripe");
/// ```
pub fn to_title_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|s| !s.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Converts a string to a snake_case identifier that is safe to emit as a
/// Python name: never empty, never starting with a digit, never a keyword.
pub fn to_identifier(s: &str) -> String {
    let snake = to_snake_case(s);
    if snake.is_empty() {
        return "value".to_string();
    }
    if snake.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("n_{snake}");
    }
    if RESERVED_IDENTIFIERS.contains(&snake.as_str()) {
        return format!("{snake}_");
    }
    snake
}
