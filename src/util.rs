use std::io::Write;
use std::path::Path;

/// Generate a fresh entity id (uuid v4, string form).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current moment as an RFC 3339 UTC timestamp string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Validate a required string field: trimmed, non-empty, length within bounds.
///
/// Returns the trimmed value on success so callers store the normalized form.
pub fn validate_bounded_string(
    value: &str,
    field: &str,
    min: usize,
    max: usize,
) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.len() < min {
        return Err(format!("{} must not be empty", field));
    }
    if trimmed.len() > max {
        return Err(format!("{} must be at most {} characters", field, max));
    }
    Ok(trimmed.to_string())
}

/// Validate a `YYYY-MM-DD` date string.
pub fn validate_yyyy_mm_dd(value: &str, field: &str) -> Result<(), String> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("{} must be a valid YYYY-MM-DD date", field))
}

/// Write a string to `path` atomically: temp file in the same directory,
/// flush, then rename over the target. Readers never observe a half-written
/// file.
pub fn atomic_write_str(path: &Path, content: &str) -> Result<(), String> {
    let dir = path
        .parent()
        .ok_or_else(|| format!("No parent directory for {}", path.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| format!("Failed to create temp file in {}: {}", dir.display(), e))?;

    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("Failed to write temp file: {}", e))?;
    tmp.flush()
        .map_err(|e| format!("Failed to flush temp file: {}", e))?;

    tmp.persist(path)
        .map_err(|e| format!("Failed to replace {}: {}", path.display(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_now_rfc3339_parses() {
        let ts = now_rfc3339();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_validate_bounded_string_trims() {
        assert_eq!(
            validate_bounded_string("  Ship it  ", "title", 1, 280).unwrap(),
            "Ship it"
        );
    }

    #[test]
    fn test_validate_bounded_string_empty() {
        let err = validate_bounded_string("   ", "title", 1, 280).unwrap_err();
        assert!(err.contains("title"));
    }

    #[test]
    fn test_validate_bounded_string_too_long() {
        let long = "x".repeat(300);
        assert!(validate_bounded_string(&long, "title", 1, 280).is_err());
    }

    #[test]
    fn test_validate_yyyy_mm_dd() {
        assert!(validate_yyyy_mm_dd("2025-03-14", "dueDate").is_ok());
        assert!(validate_yyyy_mm_dd("2025-02-30", "dueDate").is_err());
        assert!(validate_yyyy_mm_dd("14/03/2025", "dueDate").is_err());
        assert!(validate_yyyy_mm_dd("", "dueDate").is_err());
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");

        atomic_write_str(&path, "first").unwrap();
        atomic_write_str(&path, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
