//! C calling-convention entry points.
//!
//! The symbols are only left unmangled with the `c-abi` feature so that a
//! Rust-only build never collides with a C object that defines the same
//! names.

#![allow(non_snake_case)]

use core::ffi::{c_char, c_int};

/// `int Mul2(int num);`
#[cfg_attr(feature = "c-abi", no_mangle)]
pub extern "C" fn Mul2(num: c_int) -> c_int {
    crate::mul2(num)
}

/// `void ReverseString(char word[], int size);`
///
/// A non-positive `size` does nothing and `word` is not read.
///
/// # Safety
///
/// For `size > 0`, `word` must be non-null and valid for reads and writes of
/// `size` bytes, with no other live reference to that memory for the
/// duration of the call.
#[cfg_attr(feature = "c-abi", no_mangle)]
pub unsafe extern "C" fn ReverseString(word: *mut c_char, size: c_int) {
    if size <= 0 {
        return;
    }
    let len = size as usize;
    let buffer = core::slice::from_raw_parts_mut(word.cast::<u8>(), len);
    crate::reverse_string(buffer, len);
}
