//! Final file name validation for completed uploads.
//!
//! A final name is joined directly under a video directory, so it must be a single
//! path component that cannot escape that directory.

pub const MAX_FILENAME_LENGTH: usize = 255;

/// Validate a caller-supplied final file name and return it trimmed.
///
/// Rejects empty names, path separators, `.`/`..`, names made only of dots,
/// control characters and names longer than [`MAX_FILENAME_LENGTH`] bytes.
pub fn validate_final_filename(raw: Option<&str>) -> Result<&str, String> {
    let name = raw.map(str::trim).unwrap_or_default();

    if name.is_empty() {
        return Err("File name is missing".to_string());
    }

    if name.len() > MAX_FILENAME_LENGTH {
        return Err(format!(
            "File name exceeds {} bytes",
            MAX_FILENAME_LENGTH
        ));
    }

    if name.chars().all(|c| c == '.') {
        return Err(format!("Invalid file name: {}", name));
    }

    if name.contains('/') || name.contains('\\') {
        return Err("File name must not contain path separators".to_string());
    }

    if name.chars().any(char::is_control) {
        return Err("File name must not contain control characters".to_string());
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        assert_eq!(validate_final_filename(Some("f.bin")), Ok("f.bin"));
        assert_eq!(validate_final_filename(Some(" video.mp4 ")), Ok("video.mp4"));
        assert_eq!(validate_final_filename(Some(".hidden")), Ok(".hidden"));
    }

    #[test]
    fn test_rejects_missing_or_empty() {
        assert!(validate_final_filename(None).is_err());
        assert!(validate_final_filename(Some("")).is_err());
        assert!(validate_final_filename(Some("   ")).is_err());
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(validate_final_filename(Some("..")).is_err());
        assert!(validate_final_filename(Some(".")).is_err());
        assert!(validate_final_filename(Some("../etc/passwd")).is_err());
        assert!(validate_final_filename(Some("a\\b")).is_err());
    }

    #[test]
    fn test_rejects_control_characters_and_long_names() {
        assert!(validate_final_filename(Some("a\u{0}b")).is_err());
        assert!(validate_final_filename(Some("line\nbreak")).is_err());
        let long = "a".repeat(MAX_FILENAME_LENGTH + 1);
        assert!(validate_final_filename(Some(&long)).is_err());
    }
}
