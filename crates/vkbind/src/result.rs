use std::fmt;

use crate::vk;

/// `Ok` carries a success code, `Err` an error code.
pub type VkResult<T> = Result<T, vk::Result>;

impl vk::Result {
    /// Non-negative codes are successes, including partial ones such as
    /// `INCOMPLETE` and `SUBOPTIMAL_KHR`.
    #[inline]
    pub const fn is_success(self) -> bool {
        self.as_raw() >= 0
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.as_raw() < 0
    }

    /// `Ok(self)` for success codes, `Err(self)` for error codes.
    #[inline]
    pub fn into_result(self) -> VkResult<Self> {
        if self.is_success() { Ok(self) } else { Err(self) }
    }

    /// Like [`into_result`](Self::into_result), discarding which success code
    /// it was.
    #[inline]
    pub fn result(self) -> VkResult<()> {
        self.into_result().map(|_| ())
    }
}

impl fmt::Display for vk::Result {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?} ({})", self.as_raw())
    }
}

impl std::error::Error for vk::Result {}
