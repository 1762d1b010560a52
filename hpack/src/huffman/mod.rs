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

//! Huffman coding for string literals (RFC 7541 §5.2 and Appendix B).

use crate::Error;
use crate::Result;

use self::table::CODES;

/// The reserved end-of-string symbol. It never appears decoded; its
/// most-significant bits are the only permitted trailing padding.
const EOS: u16 = 256;

const NULL_NODE: u16 = 0;
const ROOT_NODE: u16 = 1;

/// Sentinel for internal tree nodes, which carry no symbol.
const INVALID_VALUE: u16 = u16::MAX;

struct Node {
    left: u16,
    right: u16,
    value: u16,
}

/// Prefix tree over the Appendix B code, used by the decoder. Nodes live in
/// an arena and are addressed by id, with id 0 meaning "no child" and the
/// root at id 1.
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new() -> Tree {
        Tree {
            nodes: vec![Node {
                left: NULL_NODE,
                right: NULL_NODE,
                value: INVALID_VALUE,
            }],
        }
    }

    fn node(&self, id: u16) -> Option<&Node> {
        if id == NULL_NODE {
            return None;
        }

        self.nodes.get(id as usize - 1)
    }

    fn alloc(&mut self) -> u16 {
        self.nodes.push(Node {
            left: NULL_NODE,
            right: NULL_NODE,
            value: INVALID_VALUE,
        });

        self.nodes.len() as u16
    }

    /// Inserts `value` at the position described by its code, walking the
    /// bits MSB first and allocating children on demand. Only fresh nodes
    /// may become leaves, which enforces the prefix property of the code.
    fn add_leaf(&mut self, value: u16, bit_len: u8, code: u32) {
        let mut cur = ROOT_NODE;

        for i in (0..bit_len).rev() {
            debug_assert_eq!(self.nodes[cur as usize - 1].value, INVALID_VALUE);

            let right = code >> i & 1 == 1;

            let child = if right {
                self.nodes[cur as usize - 1].right
            } else {
                self.nodes[cur as usize - 1].left
            };

            cur = if child == NULL_NODE {
                let id = self.alloc();

                if right {
                    self.nodes[cur as usize - 1].right = id;
                } else {
                    self.nodes[cur as usize - 1].left = id;
                }

                id
            } else {
                child
            };
        }

        let leaf = &mut self.nodes[cur as usize - 1];

        debug_assert_eq!(leaf.value, INVALID_VALUE);
        debug_assert_eq!(leaf.left, NULL_NODE);
        debug_assert_eq!(leaf.right, NULL_NODE);

        leaf.value = value;
    }
}

lazy_static! {
    static ref TREE: Tree = {
        let mut tree = Tree::new();

        for (sym, &(bit_len, code)) in CODES.iter().enumerate() {
            tree.add_leaf(sym as u16, bit_len, code);
        }

        tree
    };
}

/// Returns the exact byte length of `src` once Huffman encoded, including
/// the final partial-byte padding.
pub fn encode_output_length(src: &[u8]) -> usize {
    let bits: usize = src.iter().map(|&b| CODES[b as usize].0 as usize).sum();

    let mut len = bits / 8;

    if bits & 7 != 0 {
        len += 1;
    }

    len
}

/// Huffman encodes `src`, padding the trailing bits of the last byte with
/// 1s (the EOS prefix) as required by RFC 7541 §5.2.
pub fn encode(src: &[u8], b: &mut octets::OctetsMut) -> Result<()> {
    let mut partial: u8 = 0;
    let mut remain: u8 = 8;

    for &byte in src {
        let (bit_len, code) = CODES[byte as usize];

        let mut left = bit_len;

        while left > 0 {
            let take = std::cmp::min(remain, left);

            // Clear the leading bits, then align the chunk to the LSB.
            let chunk = ((code & ((1 << left) - 1)) >> (left - take)) as u8;

            partial |= chunk << (remain - take);
            remain -= take;
            left -= take;

            if remain == 0 {
                b.put_u8(partial)?;

                partial = 0;
                remain = 8;
            }
        }
    }

    if remain < 8 {
        partial |= (1 << remain) - 1;
        b.put_u8(partial)?;
    }

    Ok(())
}

/// Decodes all remaining bytes of `b` as a Huffman-coded string.
pub fn decode(b: &mut octets::Octets) -> Result<Vec<u8>> {
    // The shortest code is 5 bits, so the output can't grow past 8/5.
    let mut out = Vec::with_capacity(b.cap() * 8 / 5 + 1);

    let mut decoder = Decoder::new(&TREE);

    while b.cap() > 0 {
        decoder.decode_byte(b.get_u8()?, &mut out)?;
    }

    decoder.finish()?;

    Ok(out)
}

/// Walks the prefix tree bit by bit, tracking how deep the current partial
/// path is and whether it is still all ones (i.e. a candidate EOS-prefix
/// padding).
struct Decoder<'a> {
    tree: &'a Tree,
    cur: u16,
    depth: u8,
    padding: bool,
}

impl<'a> Decoder<'a> {
    fn new(tree: &'a Tree) -> Decoder<'a> {
        Decoder {
            tree,
            cur: ROOT_NODE,
            depth: 0,
            padding: true,
        }
    }

    fn decode_byte(&mut self, byte: u8, out: &mut Vec<u8>) -> Result<()> {
        for i in (0..8).rev() {
            let right = byte >> i & 1 == 1;

            let next = match self.tree.node(self.cur) {
                Some(n) if right => n.right,
                Some(n) => n.left,
                None => NULL_NODE,
            };

            let node = match self.tree.node(next) {
                Some(n) => n,

                None => {
                    trace!("huffman stream walked off the code tree");
                    return Err(Error::InvalidHuffmanEncoding);
                },
            };

            if node.value != INVALID_VALUE {
                if node.value == EOS {
                    trace!("huffman stream contains EOS");
                    return Err(Error::InvalidHuffmanEncoding);
                }

                out.push(node.value as u8);

                self.cur = ROOT_NODE;
                self.depth = 0;
                self.padding = true;

                continue;
            }

            self.cur = next;
            self.depth += 1;

            if !right {
                self.padding = false;
            }
        }

        Ok(())
    }

    fn finish(&self) -> Result<()> {
        if self.depth == 0 {
            return Ok(());
        }

        // Up to 7 dangling bits are allowed, and only if all of them are
        // ones (a strict prefix of EOS).
        if self.depth <= 7 && self.padding {
            return Ok(());
        }

        Err(Error::InvalidHuffmanEncoding)
    }
}


mod table;
