//! Busy flags that survive cancellation.
//!
//! A screen marks itself busy while a boundary call is outstanding. The
//! flag is owned by a [`BusyFlag`] for the duration of the call and cleared
//! when it is dropped, including when the caller drops the future mid-await.

/// Holds a `bool` at `true` until dropped.
pub(crate) struct BusyFlag<'a> {
    flag: &'a mut bool,
}

impl<'a> BusyFlag<'a> {
    pub(crate) fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}
