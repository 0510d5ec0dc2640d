use thiserror::Error;

/// Errors that can occur when building or resizing a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
  /// The cache was configured with a capacity of zero. Every cache holds at
  /// least one entry.
  #[error("cache capacity must be at least 1, got {0}")]
  InvalidCapacity(usize),
}

/// Validates a requested capacity, returning it unchanged when usable.
#[inline]
pub(crate) fn check_capacity(capacity: usize) -> Result<usize, CacheError> {
  if capacity == 0 {
    return Err(CacheError::InvalidCapacity(capacity));
  }
  Ok(capacity)
}

/// Signed difference `new - old` between two capacities, saturating at the
/// bounds of `isize`.
#[inline]
pub(crate) fn capacity_delta(old: usize, new: usize) -> isize {
  if new >= old {
    isize::try_from(new - old).unwrap_or(isize::MAX)
  } else {
    isize::try_from(old - new).map_or(isize::MIN, |d| -d)
  }
}
