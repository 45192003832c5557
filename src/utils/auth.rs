/// Verify API key using constant-time comparison to prevent timing attacks
pub fn verify_api_key(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .as_bytes()
            .iter()
            .zip(expected.as_bytes().iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Admin access requires a configured, non-empty key that matches.
pub fn verify_admin_key(provided: &str, configured: Option<&str>) -> bool {
    match configured {
        Some(expected) if !expected.is_empty() => verify_api_key(provided, expected),
        _ => false,
    }
}
