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

//! String literals (RFC 7541 §5.2): a 7-bit-prefix length with a Huffman
//! flag in the top bit, followed by the octets.

use crate::huffman;
use crate::prefix_int;
use crate::Result;

const HUFFMAN: u8 = 0b1000_0000;

pub fn encode_str(
    s: &[u8], huffman: bool, b: &mut octets::OctetsMut,
) -> Result<()> {
    if !huffman {
        prefix_int::encode_int(s.len() as u64, 0, 7, b)?;
        b.put_bytes(s)?;

        return Ok(());
    }

    let len = huffman::encode_output_length(s);

    prefix_int::encode_int(len as u64, HUFFMAN, 7, b)?;
    huffman::encode(s, b)?;

    Ok(())
}

pub fn decode_str(b: &mut octets::Octets) -> Result<Vec<u8>> {
    let first = b.peek_u8()?;

    let huffman = first & HUFFMAN == HUFFMAN;

    let len = prefix_int::decode_int(b, 7)? as usize;

    // A length past the remaining bytes means the field block is truncated,
    // which the framing layer resolves by feeding more input.
    let mut bytes = b.get_bytes(len)?;

    if !huffman {
        return Ok(bytes.to_vec());
    }

    huffman::decode(&mut bytes)
}
