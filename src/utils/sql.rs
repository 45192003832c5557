/// Table names cannot be bound as parameters, so only plain identifiers
/// (optionally schema-qualified) are let through.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_table_names() {
        assert!(is_valid_table_name("users"));
        assert!(is_valid_table_name("emerald.users"));
        assert!(is_valid_table_name("app_users_2"));
    }

    #[test]
    fn test_invalid_table_names() {
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("users; DROP TABLE x"));
        assert!(!is_valid_table_name("`users`"));
        assert!(!is_valid_table_name(".users"));
        assert!(!is_valid_table_name("a..b"));
    }
}
