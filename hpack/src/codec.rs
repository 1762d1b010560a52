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

use crate::prefix_int;
use crate::string;

use crate::table::IndexTable;
use crate::table::STATIC_INDEX;

use crate::EncodeOptions;
use crate::Error;
use crate::Header;
use crate::IndexPolicy;
use crate::NameValue;
use crate::Result;

use super::INDEXED;
use super::LITERAL_NEVER_INDEXED;
use super::LITERAL_WITHOUT_INDEXING;
use super::LITERAL_WITH_INDEXING;

/// An HPACK codec for one direction of an HTTP/2 connection.
///
/// The codec owns the direction's two dynamic tables: the encoder-side one
/// is mutated only by [`encode()`], the decoder-side one only by
/// [`decode()`]. Both start empty and share the `max_table_size` octet
/// budget given at construction.
///
/// [`encode()`]: Codec::encode
/// [`decode()`]: Codec::decode
pub struct Codec {
    encode_table: IndexTable,
    decode_table: IndexTable,
}

impl Default for Codec {
    fn default() -> Codec {
        Codec::new()
    }
}

impl Codec {
    /// The initial value of SETTINGS_HEADER_TABLE_SIZE (RFC 7540 §6.5.2).
    pub const DEFAULT_HEADER_TABLE_SIZE: usize = 4096;

    /// Creates a codec with the default dynamic table budget.
    pub fn new() -> Codec {
        Codec::with_max_table_size(Self::DEFAULT_HEADER_TABLE_SIZE)
    }

    /// Creates a codec whose dynamic tables are bounded to `max_table_size`
    /// octets each.
    pub fn with_max_table_size(max_table_size: usize) -> Codec {
        let start_index = STATIC_INDEX.end_index();

        Codec {
            encode_table: IndexTable::with_capacity(
                max_table_size,
                start_index,
                true,
            ),
            decode_table: IndexTable::with_capacity(
                max_table_size,
                start_index,
                false,
            ),
        }
    }

    fn find_header(&self, h: &Header) -> u64 {
        let index = STATIC_INDEX.index_of_header(h);

        if index > 0 {
            return index;
        }

        self.encode_table.index_of_header(h)
    }

    fn find_name(&self, name: &[u8]) -> u64 {
        let index = STATIC_INDEX.index_of_name(name);

        if index > 0 {
            return index;
        }

        self.encode_table.index_of_name(name)
    }

    /// Compresses a single header field into `out` and returns the number
    /// of bytes written.
    ///
    /// The name must be lowercase ASCII and non-empty. If `out` is too
    /// short, [`Error::BufferTooShort`] is returned and no state is
    /// modified.
    pub fn encode<T: NameValue>(
        &mut self, header: &T, options: EncodeOptions, out: &mut [u8],
    ) -> Result<usize> {
        let mut b = octets::OctetsMut::with_slice(out);

        let h = Header::new(header.name(), header.value());

        if options.index_policy != IndexPolicy::NeverIndex {
            let index = self.find_header(&h);

            if index > 0 {
                // Already indexed: the indexed form is both smaller and
                // side-effect free, so it wins under any policy but
                // NeverIndex.
                prefix_int::encode_int(index, INDEXED, 7, &mut b)?;

                return Ok(b.off());
            }
        }

        let name_index = self.find_name(h.name());

        match options.index_policy {
            IndexPolicy::Index =>
                prefix_int::encode_int(name_index, LITERAL_WITH_INDEXING, 6, &mut b)?,

            IndexPolicy::NoIndex =>
                prefix_int::encode_int(name_index, LITERAL_WITHOUT_INDEXING, 4, &mut b)?,

            IndexPolicy::NeverIndex =>
                prefix_int::encode_int(name_index, LITERAL_NEVER_INDEXED, 4, &mut b)?,
        }

        if name_index == 0 {
            string::encode_str(h.name(), options.huffman_name, &mut b)?;
        }

        string::encode_str(h.value(), options.huffman_value, &mut b)?;

        // The peer's decoder will insert the field when it sees the
        // incremental-indexing opcode, so mirror that here. The lookups
        // above already ran, which keeps the emitted indexes consistent.
        if options.index_policy == IndexPolicy::Index {
            self.encode_table.add_header(h);
        }

        Ok(b.off())
    }

    /// Decodes at most one header field from the front of `buf`, returning
    /// it together with the number of bytes consumed.
    ///
    /// [`Error::BufferTooShort`] means the input is truncated: no state was
    /// modified, retry with more bytes once the framing layer delivers
    /// them. Any other error means the field block is malformed and the
    /// decoder's dynamic table is no longer usable; the caller should
    /// terminate the connection.
    pub fn decode(&mut self, buf: &[u8]) -> Result<(Header, usize)> {
        let mut b = octets::Octets::with_slice(buf);

        let first = b.peek_u8()?;

        match first >> 4 {
            // Indexed Header Field (RFC 7541 §6.1).
            0b1000..=0b1111 => {
                let index = prefix_int::decode_int(&mut b, 7)?;

                trace!("Indexed index={index}");

                let header = match self.header_at(index) {
                    Some(h) => h.clone(),

                    None => {
                        trace!("no header at index {index}");
                        return Err(Error::InvalidIndex);
                    },
                };

                Ok((header, b.off()))
            },

            // Literal Header Field with Incremental Indexing (§6.2.1).
            0b0100..=0b0111 => {
                let header = self.decode_literal(&mut b, 6)?;

                trace!("Literal With Indexing header={header:?}");

                self.decode_table.add_header(header.clone());

                trace!(
                    "dynamic table size={}/{}",
                    self.decode_table.size(),
                    self.decode_table.max_size()
                );

                Ok((header, b.off()))
            },

            // Dynamic Table Size Update (§6.3).
            0b0010 | 0b0011 => {
                trace!("dynamic table size update is not supported");

                Err(Error::UnsupportedTableSizeUpdate)
            },

            // Literal Header Field Never Indexed (§6.2.3). The
            // never-indexed attribute isn't propagated to the caller.
            0b0001 => {
                let header = self.decode_literal(&mut b, 4)?;

                trace!("Literal Never Indexed header={header:?}");

                Ok((header, b.off()))
            },

            // Literal Header Field without Indexing (§6.2.2).
            _ => {
                let header = self.decode_literal(&mut b, 4)?;

                trace!("Literal Without Indexing header={header:?}");

                Ok((header, b.off()))
            },
        }
    }

    /// Like [`decode()`], but takes an owning buffer and pops the consumed
    /// prefix on success.
    ///
    /// [`decode()`]: Codec::decode
    pub fn decode_from(&mut self, buf: &mut Vec<u8>) -> Result<Header> {
        let (header, consumed) = self.decode(buf)?;

        buf.drain(..consumed);

        Ok(header)
    }

    /// Decodes a literal representation whose opcode has already been
    /// classified, with `prefix` bits of name index in the first byte. The
    /// name reference is resolved before the caller mutates the dynamic
    /// table, so it can't observe the eviction the new entry causes.
    fn decode_literal(
        &self, b: &mut octets::Octets, prefix: usize,
    ) -> Result<Header> {
        let name_index = prefix_int::decode_int(b, prefix)?;

        let name = if name_index > 0 {
            match self.header_at(name_index) {
                Some(h) => h.name().to_vec(),

                None => {
                    trace!("no header at name index {name_index}");
                    return Err(Error::InvalidIndex);
                },
            }
        } else {
            string::decode_str(b)?
        };

        let value = string::decode_str(b)?;

        Ok(Header(name, value))
    }

    fn header_at(&self, index: u64) -> Option<&Header> {
        if index >= self.decode_table.start_index() {
            return self.decode_table.header_at(index);
        }

        STATIC_INDEX.header_at(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_one(
        codec: &mut Codec, name: &[u8], value: &[u8], options: EncodeOptions,
    ) -> Vec<u8> {
        let mut out = [0u8; 256];

        let len = codec.encode(&(name, value), options, &mut out).unwrap();

        out[..len].to_vec()
    }

    fn encode_block(
        codec: &mut Codec, headers: &[(&[u8], &[u8])], options: EncodeOptions,
    ) -> Vec<u8> {
        let mut block = Vec::new();

        for &(name, value) in headers {
            block.extend(encode_one(codec, name, value, options));
        }

        block
    }

    fn decode_block(codec: &mut Codec, block: &[u8]) -> Vec<Header> {
        let mut buf = block.to_vec();
        let mut headers = Vec::new();

        while !buf.is_empty() {
            headers.push(codec.decode_from(&mut buf).unwrap());
        }

        headers
    }

    fn dynamic_entries(codec: &Codec) -> Vec<(Vec<u8>, Vec<u8>)> {
        let table = &codec.decode_table;

        (table.start_index()..table.end_index())
            .map(|i| {
                let h = table.header_at(i).unwrap();
                (h.name().to_vec(), h.value().to_vec())
            })
            .collect()
    }

    // RFC 7541 C.2.1.
    #[test]
    fn literal_with_incremental_indexing() {
        let mut enc = Codec::new();
        let mut dec = Codec::new();

        let encoded = encode_one(
            &mut enc,
            b"custom-key",
            b"custom-header",
            EncodeOptions::default(),
        );

        let expected = [
            0x40, 0x0a, 0x63, 0x75, 0x73, 0x74, 0x6f, 0x6d, 0x2d, 0x6b,
            0x65, 0x79, 0x0d, 0x63, 0x75, 0x73, 0x74, 0x6f, 0x6d, 0x2d,
            0x68, 0x65, 0x61, 0x64, 0x65, 0x72,
        ];

        assert_eq!(encoded, expected);

        let (hdr, consumed) = dec.decode(&encoded).unwrap();

        assert_eq!(consumed, encoded.len());
        assert_eq!(hdr, Header::new(b"custom-key", b"custom-header"));

        assert_eq!(dec.decode_table.size(), 55);
        assert_eq!(
            dec.decode_table.header_at(62),
            Some(&Header::new(b"custom-key", b"custom-header"))
        );
    }

    // RFC 7541 C.2.2.
    #[test]
    fn literal_without_indexing() {
        let mut enc = Codec::new();
        let mut dec = Codec::new();

        let options = EncodeOptions {
            index_policy: IndexPolicy::NoIndex,
            ..Default::default()
        };

        let encoded =
            encode_one(&mut enc, b":path", b"/sample/path", options);

        let expected = [
            0x04, 0x0c, 0x2f, 0x73, 0x61, 0x6d, 0x70, 0x6c, 0x65, 0x2f,
            0x70, 0x61, 0x74, 0x68,
        ];

        assert_eq!(encoded, expected);

        let (hdr, _) = dec.decode(&encoded).unwrap();

        assert_eq!(hdr, Header::new(b":path", b"/sample/path"));
        assert!(dec.decode_table.is_empty());
        assert!(enc.encode_table.is_empty());
    }

    // RFC 7541 C.2.3.
    #[test]
    fn literal_never_indexed() {
        let mut enc = Codec::new();
        let mut dec = Codec::new();

        let options = EncodeOptions {
            index_policy: IndexPolicy::NeverIndex,
            ..Default::default()
        };

        let encoded = encode_one(&mut enc, b"password", b"secret", options);

        let expected = [
            0x10, 0x08, 0x70, 0x61, 0x73, 0x73, 0x77, 0x6f, 0x72, 0x64,
            0x06, 0x73, 0x65, 0x63, 0x72, 0x65, 0x74,
        ];

        assert_eq!(encoded, expected);

        let (hdr, _) = dec.decode(&encoded).unwrap();

        assert_eq!(hdr, Header::new(b"password", b"secret"));
        assert!(dec.decode_table.is_empty());
        assert!(enc.encode_table.is_empty());
    }

    // RFC 7541 C.2.4.
    #[test]
    fn indexed_header_field() {
        let mut enc = Codec::new();
        let mut dec = Codec::new();

        let encoded = encode_one(
            &mut enc,
            b":method",
            b"GET",
            EncodeOptions::default(),
        );

        assert_eq!(encoded, [0x82]);

        let (hdr, consumed) = dec.decode(&encoded).unwrap();

        assert_eq!(consumed, 1);
        assert_eq!(hdr, Header::new(b":method", b"GET"));
        assert!(dec.decode_table.is_empty());
    }

    // RFC 7541 C.3: three successive requests on the same connection.
    #[test]
    fn request_sequence() {
        let mut enc = Codec::new();
        let mut dec = Codec::new();

        let request1: &[(&[u8], &[u8])] = &[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
        ];

        let block1 =
            encode_block(&mut enc, request1, EncodeOptions::default());

        assert_eq!(block1, [
            0x82, 0x86, 0x84, 0x41, 0x0f, 0x77, 0x77, 0x77, 0x2e, 0x65,
            0x78, 0x61, 0x6d, 0x70, 0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d,
        ]);

        decode_block(&mut dec, &block1);

        assert_eq!(dynamic_entries(&dec), [(
            b":authority".to_vec(),
            b"www.example.com".to_vec()
        )]);
        assert_eq!(dec.decode_table.size(), 57);

        let request2: &[(&[u8], &[u8])] = &[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
            (b"cache-control", b"no-cache"),
        ];

        let block2 =
            encode_block(&mut enc, request2, EncodeOptions::default());

        assert_eq!(block2, [
            0x82, 0x86, 0x84, 0xbe, 0x58, 0x08, 0x6e, 0x6f, 0x2d, 0x63,
            0x61, 0x63, 0x68, 0x65,
        ]);

        decode_block(&mut dec, &block2);

        assert_eq!(dec.decode_table.size(), 110);

        let request3: &[(&[u8], &[u8])] = &[
            (b":method", b"GET"),
            (b":scheme", b"https"),
            (b":path", b"/index.html"),
            (b":authority", b"www.example.com"),
            (b"custom-key", b"custom-value"),
        ];

        let block3 =
            encode_block(&mut enc, request3, EncodeOptions::default());

        assert_eq!(block3, [
            0x82, 0x87, 0x85, 0xbf, 0x40, 0x0a, 0x63, 0x75, 0x73, 0x74,
            0x6f, 0x6d, 0x2d, 0x6b, 0x65, 0x79, 0x0c, 0x63, 0x75, 0x73,
            0x74, 0x6f, 0x6d, 0x2d, 0x76, 0x61, 0x6c, 0x75, 0x65,
        ]);

        let headers3 = decode_block(&mut dec, &block3);

        assert_eq!(headers3, [
            Header::new(b":method", b"GET"),
            Header::new(b":scheme", b"https"),
            Header::new(b":path", b"/index.html"),
            Header::new(b":authority", b"www.example.com"),
            Header::new(b"custom-key", b"custom-value"),
        ]);

        assert_eq!(dynamic_entries(&dec), [
            (b"custom-key".to_vec(), b"custom-value".to_vec()),
            (b"cache-control".to_vec(), b"no-cache".to_vec()),
            (b":authority".to_vec(), b"www.example.com".to_vec()),
        ]);
        assert_eq!(dec.decode_table.size(), 164);
    }

    // RFC 7541 C.4: the same requests with Huffman-coded literals.
    #[test]
    fn request_sequence_huffman() {
        let mut enc = Codec::new();
        let mut dec = Codec::new();

        let options = EncodeOptions {
            huffman_name: true,
            huffman_value: true,
            ..Default::default()
        };

        let request1: &[(&[u8], &[u8])] = &[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
        ];

        let block1 = encode_block(&mut enc, request1, options);

        assert_eq!(block1, [
            0x82, 0x86, 0x84, 0x41, 0x8c, 0xf1, 0xe3, 0xc2, 0xe5, 0xf2,
            0x3a, 0x6b, 0xa0, 0xab, 0x90, 0xf4, 0xff,
        ]);

        decode_block(&mut dec, &block1);

        let request2: &[(&[u8], &[u8])] = &[
            (b":method", b"GET"),
            (b":scheme", b"http"),
            (b":path", b"/"),
            (b":authority", b"www.example.com"),
            (b"cache-control", b"no-cache"),
        ];

        let block2 = encode_block(&mut enc, request2, options);

        assert_eq!(block2, [
            0x82, 0x86, 0x84, 0xbe, 0x58, 0x86, 0xa8, 0xeb, 0x10, 0x64,
            0x9c, 0xbf,
        ]);

        decode_block(&mut dec, &block2);

        let request3: &[(&[u8], &[u8])] = &[
            (b":method", b"GET"),
            (b":scheme", b"https"),
            (b":path", b"/index.html"),
            (b":authority", b"www.example.com"),
            (b"custom-key", b"custom-value"),
        ];

        let block3 = encode_block(&mut enc, request3, options);

        assert_eq!(block3, [
            0x82, 0x87, 0x85, 0xbf, 0x40, 0x88, 0x25, 0xa8, 0x49, 0xe9,
            0x5b, 0xa9, 0x7d, 0x7f, 0x89, 0x25, 0xa8, 0x49, 0xe9, 0x5b,
            0xb8, 0xe8, 0xb4, 0xbf,
        ]);

        let headers3 = decode_block(&mut dec, &block3);

        assert_eq!(
            headers3.last(),
            Some(&Header::new(b"custom-key", b"custom-value"))
        );

        assert_eq!(dec.decode_table.size(), 164);
    }

    // RFC 7541 C.5: three responses against a 256-octet table, forcing
    // evictions.
    #[test]
    fn response_sequence_with_eviction() {
        let mut enc = Codec::with_max_table_size(256);
        let mut dec = Codec::with_max_table_size(256);

        let response1: &[(&[u8], &[u8])] = &[
            (b":status", b"302"),
            (b"cache-control", b"private"),
            (b"date", b"Mon, 21 Oct 2013 20:13:21 GMT"),
            (b"location", b"https://www.example.com"),
        ];

        let block1 =
            encode_block(&mut enc, response1, EncodeOptions::default());

        assert_eq!(block1, [
            0x48, 0x03, 0x33, 0x30, 0x32, 0x58, 0x07, 0x70, 0x72, 0x69,
            0x76, 0x61, 0x74, 0x65, 0x61, 0x1d, 0x4d, 0x6f, 0x6e, 0x2c,
            0x20, 0x32, 0x31, 0x20, 0x4f, 0x63, 0x74, 0x20, 0x32, 0x30,
            0x31, 0x33, 0x20, 0x32, 0x30, 0x3a, 0x31, 0x33, 0x3a, 0x32,
            0x31, 0x20, 0x47, 0x4d, 0x54, 0x6e, 0x17, 0x68, 0x74, 0x74,
            0x70, 0x73, 0x3a, 0x2f, 0x2f, 0x77, 0x77, 0x77, 0x2e, 0x65,
            0x78, 0x61, 0x6d, 0x70, 0x6c, 0x65, 0x2e, 0x63, 0x6f, 0x6d,
        ]);

        decode_block(&mut dec, &block1);

        assert_eq!(dec.decode_table.size(), 222);

        let response2: &[(&[u8], &[u8])] = &[
            (b":status", b"307"),
            (b"cache-control", b"private"),
            (b"date", b"Mon, 21 Oct 2013 20:13:21 GMT"),
            (b"location", b"https://www.example.com"),
        ];

        let block2 =
            encode_block(&mut enc, response2, EncodeOptions::default());

        // Adding ":status: 307" evicts ":status: 302"; the rest are full
        // matches in the dynamic table.
        assert_eq!(block2, [
            0x48, 0x03, 0x33, 0x30, 0x37, 0xc1, 0xc0, 0xbf,
        ]);

        decode_block(&mut dec, &block2);

        assert_eq!(dec.decode_table.size(), 222);

        let response3: &[(&[u8], &[u8])] = &[
            (b":status", b"200"),
            (b"cache-control", b"private"),
            (b"date", b"Mon, 21 Oct 2013 20:13:22 GMT"),
            (b"location", b"https://www.example.com"),
            (b"content-encoding", b"gzip"),
            (
                b"set-cookie",
                b"foo=ASDJKHQKBZXOQWEOPIUAXQWEOIU; max-age=3600; version=1",
            ),
        ];

        let block3 =
            encode_block(&mut enc, response3, EncodeOptions::default());

        assert_eq!(block3, [
            0x88, 0xc1, 0x61, 0x1d, 0x4d, 0x6f, 0x6e, 0x2c, 0x20, 0x32,
            0x31, 0x20, 0x4f, 0x63, 0x74, 0x20, 0x32, 0x30, 0x31, 0x33,
            0x20, 0x32, 0x30, 0x3a, 0x31, 0x33, 0x3a, 0x32, 0x32, 0x20,
            0x47, 0x4d, 0x54, 0xc0, 0x5a, 0x04, 0x67, 0x7a, 0x69, 0x70,
            0x77, 0x38, 0x66, 0x6f, 0x6f, 0x3d, 0x41, 0x53, 0x44, 0x4a,
            0x4b, 0x48, 0x51, 0x4b, 0x42, 0x5a, 0x58, 0x4f, 0x51, 0x57,
            0x45, 0x4f, 0x50, 0x49, 0x55, 0x41, 0x58, 0x51, 0x57, 0x45,
            0x4f, 0x49, 0x55, 0x3b, 0x20, 0x6d, 0x61, 0x78, 0x2d, 0x61,
            0x67, 0x65, 0x3d, 0x33, 0x36, 0x30, 0x30, 0x3b, 0x20, 0x76,
            0x65, 0x72, 0x73, 0x69, 0x6f, 0x6e, 0x3d, 0x31,
        ]);

        let headers3 = decode_block(&mut dec, &block3);

        assert_eq!(headers3.len(), 6);

        assert_eq!(dynamic_entries(&dec), [
            (
                b"set-cookie".to_vec(),
                b"foo=ASDJKHQKBZXOQWEOPIUAXQWEOIU; max-age=3600; version=1"
                    .to_vec()
            ),
            (b"content-encoding".to_vec(), b"gzip".to_vec()),
            (b"date".to_vec(), b"Mon, 21 Oct 2013 20:13:22 GMT".to_vec()),
        ]);
        assert_eq!(dec.decode_table.size(), 215);
    }

    // RFC 7541 C.6: the same responses with Huffman-coded literals.
    #[test]
    fn response_sequence_huffman() {
        let mut enc = Codec::with_max_table_size(256);
        let mut dec = Codec::with_max_table_size(256);

        let options = EncodeOptions {
            huffman_name: true,
            huffman_value: true,
            ..Default::default()
        };

        let response1: &[(&[u8], &[u8])] = &[
            (b":status", b"302"),
            (b"cache-control", b"private"),
            (b"date", b"Mon, 21 Oct 2013 20:13:21 GMT"),
            (b"location", b"https://www.example.com"),
        ];

        let block1 = encode_block(&mut enc, response1, options);

        assert_eq!(block1, [
            0x48, 0x82, 0x64, 0x02, 0x58, 0x85, 0xae, 0xc3, 0x77, 0x1a,
            0x4b, 0x61, 0x96, 0xd0, 0x7a, 0xbe, 0x94, 0x10, 0x54, 0xd4,
            0x44, 0xa8, 0x20, 0x05, 0x95, 0x04, 0x0b, 0x81, 0x66, 0xe0,
            0x82, 0xa6, 0x2d, 0x1b, 0xff, 0x6e, 0x91, 0x9d, 0x29, 0xad,
            0x17, 0x18, 0x63, 0xc7, 0x8f, 0x0b, 0x97, 0xc8, 0xe9, 0xae,
            0x82, 0xae, 0x43, 0xd3,
        ]);

        decode_block(&mut dec, &block1);

        assert_eq!(dec.decode_table.size(), 222);

        let response2: &[(&[u8], &[u8])] = &[
            (b":status", b"307"),
            (b"cache-control", b"private"),
            (b"date", b"Mon, 21 Oct 2013 20:13:21 GMT"),
            (b"location", b"https://www.example.com"),
        ];

        let block2 = encode_block(&mut enc, response2, options);

        assert_eq!(block2, [
            0x48, 0x83, 0x64, 0x0e, 0xff, 0xc1, 0xc0, 0xbf,
        ]);

        decode_block(&mut dec, &block2);

        let response3: &[(&[u8], &[u8])] = &[
            (b":status", b"200"),
            (b"cache-control", b"private"),
            (b"date", b"Mon, 21 Oct 2013 20:13:22 GMT"),
            (b"location", b"https://www.example.com"),
            (b"content-encoding", b"gzip"),
            (
                b"set-cookie",
                b"foo=ASDJKHQKBZXOQWEOPIUAXQWEOIU; max-age=3600; version=1",
            ),
        ];

        let block3 = encode_block(&mut enc, response3, options);

        assert_eq!(block3, [
            0x88, 0xc1, 0x61, 0x96, 0xd0, 0x7a, 0xbe, 0x94, 0x10, 0x54,
            0xd4, 0x44, 0xa8, 0x20, 0x05, 0x95, 0x04, 0x0b, 0x81, 0x66,
            0xe0, 0x84, 0xa6, 0x2d, 0x1b, 0xff, 0xc0, 0x5a, 0x83, 0x9b,
            0xd9, 0xab, 0x77, 0xad, 0x94, 0xe7, 0x82, 0x1d, 0xd7, 0xf2,
            0xe6, 0xc7, 0xb3, 0x35, 0xdf, 0xdf, 0xcd, 0x5b, 0x39, 0x60,
            0xd5, 0xaf, 0x27, 0x08, 0x7f, 0x36, 0x72, 0xc1, 0xab, 0x27,
            0x0f, 0xb5, 0x29, 0x1f, 0x95, 0x87, 0x31, 0x60, 0x65, 0xc0,
            0x03, 0xed, 0x4e, 0xe5, 0xb1, 0x06, 0x3d, 0x50, 0x07,
        ]);

        decode_block(&mut dec, &block3);

        assert_eq!(dynamic_entries(&dec), [
            (
                b"set-cookie".to_vec(),
                b"foo=ASDJKHQKBZXOQWEOPIUAXQWEOIU; max-age=3600; version=1"
                    .to_vec()
            ),
            (b"content-encoding".to_vec(), b"gzip".to_vec()),
            (b"date".to_vec(), b"Mon, 21 Oct 2013 20:13:22 GMT".to_vec()),
        ]);
        assert_eq!(dec.decode_table.size(), 215);
    }

    #[test]
    fn never_index_skips_the_indexed_form() {
        let mut enc = Codec::new();

        let options = EncodeOptions {
            index_policy: IndexPolicy::NeverIndex,
            ..Default::default()
        };

        // A full static match exists, but NeverIndex must still produce a
        // literal, identically every time.
        let first = encode_one(&mut enc, b":method", b"GET", options);
        let second = encode_one(&mut enc, b":method", b"GET", options);

        assert_eq!(first[0], 0x12);
        assert_eq!(first, second);
        assert!(enc.encode_table.is_empty());
    }

    #[test]
    fn no_index_still_uses_full_matches() {
        let mut enc = Codec::new();

        let options = EncodeOptions {
            index_policy: IndexPolicy::NoIndex,
            ..Default::default()
        };

        assert_eq!(encode_one(&mut enc, b":method", b"GET", options), [0x82]);
    }

    #[test]
    fn decode_empty_is_incomplete() {
        let mut dec = Codec::new();

        assert_eq!(dec.decode(&[]), Err(Error::BufferTooShort));
    }

    #[test]
    fn decode_truncated_literal_is_incomplete() {
        let mut enc = Codec::new();
        let mut dec = Codec::new();

        let encoded = encode_one(
            &mut enc,
            b"custom-key",
            b"custom-header",
            EncodeOptions::default(),
        );

        for len in 0..encoded.len() {
            assert_eq!(
                dec.decode(&encoded[..len]),
                Err(Error::BufferTooShort),
                "prefix of {len} bytes"
            );

            // Nothing may be committed until the field arrives in full.
            assert!(dec.decode_table.is_empty());
        }

        assert!(dec.decode(&encoded).is_ok());
        assert_eq!(dec.decode_table.size(), 55);
    }

    #[test]
    fn decode_table_size_update_is_malformed() {
        let mut dec = Codec::new();

        assert_eq!(dec.decode(&[0x20]), Err(Error::UnsupportedTableSizeUpdate));
        assert_eq!(dec.decode(&[0x3f]), Err(Error::UnsupportedTableSizeUpdate));
    }

    #[test]
    fn decode_index_zero_is_malformed() {
        let mut dec = Codec::new();

        assert_eq!(dec.decode(&[0x80]), Err(Error::InvalidIndex));
    }

    #[test]
    fn decode_out_of_range_index_is_malformed() {
        let mut dec = Codec::new();

        // 62 is the first dynamic index and the table is empty.
        assert_eq!(dec.decode(&[0xbe]), Err(Error::InvalidIndex));

        // A literal with an out-of-range name index.
        assert_eq!(
            dec.decode(&[0x7f, 0x0a, 0x00]),
            Err(Error::InvalidIndex)
        );
    }

    #[test]
    fn decode_from_pops_consumed_bytes() {
        let mut enc = Codec::new();
        let mut dec = Codec::new();

        let mut buf = encode_one(
            &mut enc,
            b":status",
            b"404",
            EncodeOptions::default(),
        );
        buf.extend_from_slice(&[0x82]);

        assert_eq!(
            dec.decode_from(&mut buf).unwrap(),
            Header::new(b":status", b"404")
        );
        assert_eq!(buf, [0x82]);

        assert_eq!(
            dec.decode_from(&mut buf).unwrap(),
            Header::new(b":method", b"GET")
        );
        assert!(buf.is_empty());
    }
}
