// SPDX-License-Identifier: GPL-2.0 OR MIT

//! Fletcher checksum library.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

/// Checksum calculation.
pub mod checksum;

/// Userspace file access.
#[cfg(feature = "userspace")]
pub mod userspace;
