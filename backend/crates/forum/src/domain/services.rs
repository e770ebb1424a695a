//! Domain Services
//!
//! Pure rules shared by the use cases: ownership and input validation.

use kernel::id::UserId;

use crate::domain::value_objects::BoundedText;
use crate::error::{ForumError, ForumResult};

/// Fail with `Forbidden` unless `actor` owns the resource
///
/// Must run before any write of the guarded operation.
pub fn require_owner(owner: &UserId, actor: &UserId, action: &str) -> ForumResult<()> {
    if owner == actor {
        Ok(())
    } else {
        tracing::warn!(owner = %owner, actor = %actor, action, "Ownership check failed");
        Err(ForumError::forbidden(format!(
            "Only the problem owner can {}",
            action
        )))
    }
}

/// Trim and bound-check image URLs
pub fn validate_images(
    images: Vec<String>,
    max_count: usize,
    max_url_len: usize,
) -> ForumResult<Vec<String>> {
    if images.len() > max_count {
        return Err(ForumError::validation(format!(
            "At most {} images are allowed",
            max_count
        )));
    }

    images
        .iter()
        .map(|url| BoundedText::new(url, "Image URL", max_url_len).map(BoundedText::into_inner))
        .collect()
}

/// Normalize a free-text search: trimmed, `None` when blank
pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_owner() {
        let owner = UserId::new();
        assert!(require_owner(&owner, &owner, "accept a solution").is_ok());

        let err = require_owner(&owner, &UserId::new(), "accept a solution").unwrap_err();
        assert!(matches!(err, ForumError::Forbidden(_)));
        assert_eq!(err.to_string(), "Only the problem owner can accept a solution");
    }

    #[test]
    fn test_validate_images() {
        let images = validate_images(vec![" https://img/1.png ".to_string()], 10, 2048).unwrap();
        assert_eq!(images, vec!["https://img/1.png".to_string()]);

        let too_many = vec!["https://img".to_string(); 11];
        assert!(validate_images(too_many, 10, 2048).is_err());
        assert!(validate_images(vec!["  ".to_string()], 10, 2048).is_err());
    }

    #[test]
    fn test_normalize_search() {
        assert_eq!(normalize_search(Some("  pump ")), Some("pump".to_string()));
        assert_eq!(normalize_search(Some("   ")), None);
        assert_eq!(normalize_search(None), None);
    }
}
