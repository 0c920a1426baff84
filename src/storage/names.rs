//! Object-name rules for clients that map names onto a real directory tree.

use crate::error::IndexSetError;

/// Directory under the root where writes are staged. Never a valid table name.
pub(crate) const STAGING_DIR: &str = ".indexset-staging";

/// Validate a file name inside a table or tenant directory:
/// - segments separated by '/'
/// - NUL not allowed
/// - no leading or trailing '/', no empty segments
/// - no '.' or '..' segments
pub(crate) fn validate_object_name(name: &str) -> Result<(), IndexSetError> {
    if name.is_empty() {
        return Err(IndexSetError::invalid_name(name, "name cannot be empty"));
    }
    if name.contains('\u{0000}') {
        return Err(IndexSetError::invalid_name(name, "NUL characters are not allowed"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(IndexSetError::invalid_name(name, "leading or trailing '/' is not allowed"));
    }
    for seg in name.split('/') {
        if seg.is_empty() {
            return Err(IndexSetError::invalid_name(name, "empty segments ('//') are not allowed"));
        }
        if seg == "." || seg == ".." {
            return Err(IndexSetError::invalid_name(name, "'.' and '..' segments are not allowed"));
        }
    }
    Ok(())
}

/// Table names and tenant ids map to exactly one directory level.
pub(crate) fn validate_segment(name: &str) -> Result<(), IndexSetError> {
    validate_object_name(name)?;
    if name.contains('/') {
        return Err(IndexSetError::invalid_name(name, "'/' is not allowed here"));
    }
    if name == STAGING_DIR {
        return Err(IndexSetError::invalid_name(name, "name is reserved for staged writes"));
    }
    Ok(())
}
