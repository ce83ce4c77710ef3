//! Seek origin handling for blob reads.

/// Origin of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whence {
    /// Relative to the start of the blob.
    Start,
    /// Relative to the current offset.
    Current,
    /// Backwards from the end of the blob: the target is `size - offset`.
    End,
}

impl Whence {
    /// Map the conventional `0`/`1`/`2` whence codes.
    ///
    /// # Examples
    ///
    /// ```
    /// use blobfs_core::Whence;
    ///
    /// assert_eq!(Whence::from_raw(2), Some(Whence::End));
    /// assert_eq!(Whence::from_raw(7), None);
    /// ```
    #[must_use]
    pub fn from_raw(whence: i32) -> Option<Self> {
        match whence {
            0 => Some(Self::Start),
            1 => Some(Self::Current),
            2 => Some(Self::End),
            _ => None,
        }
    }
}

/// Absolute target of a seek, clamped to `[0, size]`.
pub(crate) fn target_offset(whence: Whence, offset: i64, current: u64, size: u64) -> u64 {
    let offset = i128::from(offset);
    let target = match whence {
        Whence::Start => offset,
        Whence::Current => i128::from(current) + offset,
        Whence::End => i128::from(size) - offset,
    };
    let clamped = target.clamp(0, i128::from(size));
    u64::try_from(clamped).unwrap_or(size)
}
