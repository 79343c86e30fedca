// SPDX-License-Identifier: GPL-2.0 OR MIT

pub(crate) mod block_reader;
pub use block_reader::{BlockReader, BlockReaderOpenError, BlockReaderReadError};

pub(crate) mod mapped_file;
pub use mapped_file::{MappedFile, MappedFileOpenError};
