//! The two leaf routines the supervisor calls: integer doubling and in-place
//! buffer reversal.
//!
//! Both are plain functions with no state. They trust their callers: there
//! is no range check on [`mul2`] and no capacity check on
//! [`reverse_string`] beyond what slice indexing already guarantees.

#![cfg_attr(not(test), no_std)]

pub mod abi;

/// Returns `value * 2`.
///
/// Overflow wraps in two's complement: `mul2(i32::MAX) == -2`. Callers that
/// need `2 * value` to be exact must keep `value` within
/// `i32::MIN / 2..=i32::MAX / 2`.
#[inline]
pub fn mul2(value: i32) -> i32 {
    value.wrapping_mul(2)
}

/// Reverses `buffer[..declared_size]` in place.
///
/// Bytes at `declared_size..` are left untouched and the buffer is never
/// scanned for a terminator. Sizes 0 and 1 are no-ops.
///
/// # Panics
///
/// If `declared_size > buffer.len()`. Passing a size larger than the
/// buffer is a caller bug.
pub fn reverse_string(buffer: &mut [u8], declared_size: usize) {
    let word = &mut buffer[..declared_size];

    let mut lo = 0;
    let mut hi = declared_size;
    // Swap (i, N-1-i) while i < N-1-i; the middle byte of an odd word stays put.
    while lo + 1 < hi {
        hi -= 1;
        word.swap(lo, hi);
        lo += 1;
    }
}
