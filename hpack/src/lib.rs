// Copyright (C) 2024, Cloudflare, Inc.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//
//     * Redistributions in binary form must reproduce the above copyright
//       notice, this list of conditions and the following disclaimer in the
//       documentation and/or other materials provided with the distribution.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS
// IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO,
// THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! HTTP/2 header compression (HPACK, RFC 7541).
//!
//! Each direction of an HTTP/2 connection owns one [`Codec`], which holds
//! that direction's encoder-side and decoder-side dynamic tables. Header
//! field names must be lowercase ASCII before they reach the codec, per
//! RFC 7540 §8.1.2.
//!
//! ## Encoding
//!
//! [`Codec::encode()`] compresses a single header field into the provided
//! output buffer and returns the number of bytes written:
//!
//! ```
//! let mut codec = hpack::Codec::new();
//! let mut out = [0; 64];
//!
//! let len = codec.encode(
//!     &(&b":method"[..], &b"GET"[..]),
//!     hpack::EncodeOptions::default(),
//!     &mut out,
//! )?;
//!
//! assert_eq!(&out[..len], [0x82]);
//! # Ok::<(), hpack::Error>(())
//! ```
//!
//! [`EncodeOptions`] selects the indexing policy and whether name and value
//! literals are Huffman coded. Fields marked [`IndexPolicy::NeverIndex`]
//! are always sent as literals, so sensitive values are never stored in any
//! dynamic table along the path.
//!
//! ## Decoding
//!
//! [`Codec::decode()`] consumes one header field representation from the
//! front of a buffer. Truncated input is reported as
//! [`Error::BufferTooShort`]; the caller retries with more bytes once the
//! framing layer delivers them, and must not advance its buffer in the
//! meantime. Any other error means the field block is malformed and the
//! connection should be torn down.
//!
//! ```
//! let mut codec = hpack::Codec::new();
//!
//! let (hdr, consumed) = codec.decode(&[0x82])?;
//!
//! assert_eq!(consumed, 1);
//! assert_eq!(hdr, hpack::Header::new(b":method", b"GET"));
//! # Ok::<(), hpack::Error>(())
//! ```
//!
//! Dynamic table size updates (RFC 7541 §6.3) are not supported: they are
//! rejected as malformed input and never emitted.

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

use std::fmt;
use std::fmt::Write as _;

/// The first-byte opcode bits of each header field representation.
const INDEXED: u8 = 0b1000_0000;
const LITERAL_WITH_INDEXING: u8 = 0b0100_0000;
const LITERAL_NEVER_INDEXED: u8 = 0b0001_0000;
const LITERAL_WITHOUT_INDEXING: u8 = 0b0000_0000;

/// A specialized [`Result`] type for HPACK operations.
///
/// [`Result`]: https://doc.rust-lang.org/std/result/enum.Result.html
pub type Result<T> = std::result::Result<T, Error>;

/// An HPACK error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The provided buffer is too short. On decode this means the input is
    /// truncated, not malformed: retry once more bytes are available.
    BufferTooShort,

    /// A prefix integer exceeded the sanity bound.
    IntegerOverflow,

    /// A Huffman-coded string literal is invalid.
    InvalidHuffmanEncoding,

    /// An indexed reference doesn't resolve to a table entry.
    InvalidIndex,

    /// The field block contains a dynamic table size update, which this
    /// codec doesn't support.
    UnsupportedTableSizeUpdate,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::convert::From<octets::BufferTooShortError> for Error {
    fn from(_err: octets::BufferTooShortError) -> Self {
        Error::BufferTooShort
    }
}

/// A trait for types with associated string name and value.
pub trait NameValue {
    /// Returns the object's name.
    fn name(&self) -> &[u8];

    /// Returns the object's value.
    fn value(&self) -> &[u8];
}

impl NameValue for (&[u8], &[u8]) {
    fn name(&self) -> &[u8] {
        self.0
    }

    fn value(&self) -> &[u8] {
        self.1
    }
}

/// An owned name-value pair representing a raw HTTP header.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct Header(Vec<u8>, Vec<u8>);

fn try_print_as_readable(hdr: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    match std::str::from_utf8(hdr) {
        Ok(s) => f.write_str(&s.escape_default().to_string()),
        Err(_) => write!(f, "{hdr:?}"),
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        try_print_as_readable(&self.0, f)?;
        f.write_str(": ")?;
        try_print_as_readable(&self.1, f)?;
        f.write_char('"')
    }
}

impl Header {
    /// Creates a new header.
    ///
    /// Both `name` and `value` will be cloned.
    pub fn new(name: &[u8], value: &[u8]) -> Self {
        Self(name.to_vec(), value.to_vec())
    }
}

impl NameValue for Header {
    fn name(&self) -> &[u8] {
        &self.0
    }

    fn value(&self) -> &[u8] {
        &self.1
    }
}

/// A non-owned name-value pair representing a raw HTTP header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderRef<'a>(&'a [u8], &'a [u8]);

impl<'a> HeaderRef<'a> {
    /// Creates a new header.
    pub const fn new(name: &'a [u8], value: &'a [u8]) -> Self {
        Self(name, value)
    }
}

impl<'a> NameValue for HeaderRef<'a> {
    fn name(&self) -> &[u8] {
        self.0
    }

    fn value(&self) -> &[u8] {
        self.1
    }
}

/// How an encoded header field may interact with the dynamic tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexPolicy {
    /// Literal with incremental indexing (RFC 7541 §6.2.1): the field is
    /// added to the dynamic table on both sides.
    #[default]
    Index,

    /// Literal without indexing (§6.2.2): the field doesn't modify the
    /// dynamic tables, but an already-indexed match may still be referenced.
    NoIndex,

    /// Never indexed (§6.2.3): the field always travels as a literal, and
    /// intermediaries that re-encode it must not index it either. Use for
    /// sensitive values.
    NeverIndex,
}

/// Per-field encoding options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub index_policy: IndexPolicy,

    /// Huffman-code the name literal, when one is emitted.
    pub huffman_name: bool,

    /// Huffman-code the value literal.
    pub huffman_value: bool,
}

pub use codec::Codec;

mod codec;
mod huffman;
mod prefix_int;
mod static_table;
mod string;
mod table;
