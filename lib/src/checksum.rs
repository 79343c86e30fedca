// SPDX-License-Identifier: GPL-2.0 OR MIT

pub(crate) mod common;
pub use common::{Checksum, Checksum128, Checksum64, ChecksumError};

pub(crate) mod fletcher64;
pub use fletcher64::{fletcher64, Fletcher64, Fletcher64Implementation};

pub(crate) mod fletcher128;
pub use fletcher128::{fletcher128, Fletcher128, Fletcher128Implementation};

pub(crate) mod striped;
pub use striped::{fletcher128_striped, StripeConfig, StripeSet};

#[cfg(test)]
mod proptests;
