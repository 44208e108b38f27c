//! Upload protocol constants and the per-account size limit policy.

/// Fixed size of every part except possibly the last (512 KiB).
pub const PART_SIZE: u64 = 512 * 1024;

/// Files strictly larger than this are uploaded as big files (10 MiB).
pub const BIG_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Worker count for big-file uploads.
pub const BIG_FILE_WORKERS: usize = 4;

/// Worker count for small-file uploads and single-part resends.
pub const SMALL_FILE_WORKERS: usize = 1;

/// Maximum file size for a standard account (2000 MiB).
pub const STANDARD_SIZE_LIMIT: u64 = 2_000 * 1024 * 1024;

/// Maximum file size for a privileged account (4000 MiB).
pub const PRIVILEGED_SIZE_LIMIT: u64 = 4_000 * 1024 * 1024;

/// Supplies the maximum file size the current account may upload.
pub trait SizeLimitPolicy: Send + Sync {
    fn max_file_size(&self) -> u64;
}

/// Account tier as reported by the account lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountTier {
    #[default]
    Standard,
    Privileged,
}

impl AccountTier {
    /// Tier for an optional "privileged" flag; unknown accounts are standard.
    pub fn from_flag(privileged: Option<bool>) -> Self {
        match privileged {
            Some(true) => AccountTier::Privileged,
            _ => AccountTier::Standard,
        }
    }
}

impl SizeLimitPolicy for AccountTier {
    fn max_file_size(&self) -> u64 {
        match self {
            AccountTier::Standard => STANDARD_SIZE_LIMIT,
            AccountTier::Privileged => PRIVILEGED_SIZE_LIMIT,
        }
    }
}

/// Fixed limit in bytes, for callers that already know it.
impl SizeLimitPolicy for u64 {
    fn max_file_size(&self) -> u64 {
        *self
    }
}

/// Maximum allowed file size for an optional "privileged account" flag.
pub fn size_limit_for(privileged: Option<bool>) -> u64 {
    AccountTier::from_flag(privileged).max_file_size()
}

/// Number of parts needed for `file_size` bytes: ceil(file_size / PART_SIZE).
pub fn total_parts(file_size: u64) -> u32 {
    file_size.div_ceil(PART_SIZE) as u32
}

/// Whether a file of `file_size` bytes takes the big-file path.
pub fn is_big_file(file_size: u64) -> bool {
    file_size > BIG_FILE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_limits_match_protocol_values() {
        assert_eq!(STANDARD_SIZE_LIMIT, 2_097_152_000);
        assert_eq!(PRIVILEGED_SIZE_LIMIT, 4_194_304_000);
        assert_eq!(size_limit_for(None), STANDARD_SIZE_LIMIT);
        assert_eq!(size_limit_for(Some(false)), STANDARD_SIZE_LIMIT);
        assert_eq!(size_limit_for(Some(true)), PRIVILEGED_SIZE_LIMIT);
    }

    #[test]
    fn total_parts_rounds_up() {
        assert_eq!(total_parts(1), 1);
        assert_eq!(total_parts(PART_SIZE), 1);
        assert_eq!(total_parts(PART_SIZE + 1), 2);
        assert_eq!(total_parts(1024 * 1024), 2);
        assert_eq!(total_parts(15 * 1024 * 1024), 30);
        assert_eq!(total_parts(15 * 1024 * 1024 - 1), 30);
    }

    #[test]
    fn big_file_threshold_is_exclusive() {
        assert!(!is_big_file(BIG_FILE_THRESHOLD));
        assert!(is_big_file(BIG_FILE_THRESHOLD + 1));
        assert!(!is_big_file(1));
    }
}
