//! Location extraction result handling

/// Normalize extractor output; absent or all-whitespace becomes empty.
pub fn normalize_location(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location(Some(" Austin, TX, USA ")), "Austin, TX, USA");
        assert_eq!(normalize_location(Some("   \n")), "");
        assert_eq!(normalize_location(None), "");
    }
}
