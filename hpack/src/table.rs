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

//! Header index tables (RFC 7541 §2.3 and §4).

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::static_table::STATIC_TABLE;
use crate::Header;
use crate::NameValue;

/// One byte of name and one of value, plus the RFC 7541 §4.1 per-entry
/// overhead. Bounds how many entries a table of a given size can ever hold.
const MIN_ENTRY_SIZE: usize = 32 + 2;

/// An ordered sequence of header entries with octet-size accounting, plus
/// optional reverse-lookup maps for the encoder side.
///
/// Entries are addressed by an absolute index: the newest entry has the
/// smallest one. The reverse maps record only the most recent insertion per
/// key, so duplicate entries are shadowed but stay addressable by index.
pub struct IndexTable {
    start_index: u64,
    need_indexes: bool,

    /// Grows by one per insertion, including insertions whose entry has
    /// since been evicted. The current position of insertion id `k` is
    /// `start_index + (add_times - k) - 1`.
    add_times: u64,

    size: usize,
    max_size: usize,

    /// Newest entry at the front, oldest at the back.
    entries: VecDeque<Header>,

    header_index: HashMap<Header, u64>,
    name_index: HashMap<Vec<u8>, u64>,
}

impl IndexTable {
    /// Creates an empty table bounded to `max_size` octets, with storage
    /// pre-sized for the worst case of minimum-size entries.
    pub fn with_capacity(
        max_size: usize, start_index: u64, need_indexes: bool,
    ) -> IndexTable {
        let num_headers = max_size / MIN_ENTRY_SIZE;

        let index_capacity = if need_indexes { num_headers * 2 } else { 0 };

        IndexTable {
            start_index,
            need_indexes,
            add_times: 0,
            size: 0,
            max_size,
            entries: VecDeque::with_capacity(num_headers),
            header_index: HashMap::with_capacity(index_capacity),
            name_index: HashMap::with_capacity(index_capacity),
        }
    }

    /// Creates the process-wide static table: unbounded, indexed, with
    /// absolute indexes starting at 1.
    fn with_static_list(list: &[(&[u8], &[u8])]) -> IndexTable {
        let mut table = IndexTable {
            start_index: 1,
            need_indexes: true,
            add_times: 0,
            size: 0,
            max_size: usize::MAX,
            entries: VecDeque::with_capacity(list.len()),
            header_index: HashMap::with_capacity(list.len() * 2),
            name_index: HashMap::with_capacity(list.len() * 2),
        };

        // Insert in reverse so the first list position ends up newest, which
        // makes absolute indexes follow list order.
        for &(name, value) in list.iter().rev() {
            table.add_header(Header::new(name, value));
        }

        table
    }

    /// RFC 7541 §4.1 entry size.
    pub fn header_size<T: NameValue>(h: &T) -> usize {
        h.name().len() + h.value().len() + 32
    }

    pub fn header_at(&self, index: u64) -> Option<&Header> {
        if index < self.start_index {
            return None;
        }

        self.entries.get((index - self.start_index) as usize)
    }

    /// Returns the current absolute index of the newest entry matching both
    /// name and value, or 0 if there is none.
    pub fn index_of_header(&self, h: &Header) -> u64 {
        debug_assert!(self.need_indexes);

        match self.header_index.get(h) {
            Some(&id) => self.current_index(id),

            None => 0,
        }
    }

    /// Returns the current absolute index of the newest entry matching the
    /// name, or 0 if there is none.
    pub fn index_of_name(&self, name: &[u8]) -> u64 {
        debug_assert!(self.need_indexes);

        match self.name_index.get(name) {
            Some(&id) => self.current_index(id),

            None => 0,
        }
    }

    fn current_index(&self, id: u64) -> u64 {
        debug_assert!(self.add_times - id <= self.entries.len() as u64);

        // The latest added entry has the smallest index.
        self.start_index + (self.add_times - id) - 1
    }

    /// Pushes `h` as the newest entry, evicting from the oldest end until
    /// it fits. An entry larger than the whole table empties it and is not
    /// stored (RFC 7541 §4.1).
    pub fn add_header(&mut self, h: Header) {
        debug_assert!(!h.name().is_empty());

        let entry_size = Self::header_size(&h);

        while !self.is_empty() && self.size + entry_size > self.max_size {
            self.pop_header();
        }

        if entry_size > self.max_size {
            debug_assert!(self.is_empty());
            return;
        }

        self.size += entry_size;

        let id = self.add_times;
        self.add_times += 1;

        if self.need_indexes {
            // Overwrite any older binding; the shadowed entry stays in the
            // queue but will no longer be found by the reverse lookups.
            if !h.value().is_empty() {
                self.header_index.insert(h.clone(), id);
            }

            self.name_index.insert(h.name().to_vec(), id);
        }

        self.entries.push_front(h);
    }

    fn pop_header(&mut self) {
        let id = self.add_times - self.entries.len() as u64;

        let Some(h) = self.entries.pop_back() else {
            return;
        };

        self.size -= Self::header_size(&h);

        if !self.need_indexes {
            return;
        }

        // Only drop a reverse binding that still points at the evicted
        // entry; a newer duplicate keeps its own binding.
        if self.header_index.get(&h) == Some(&id) {
            self.header_index.remove(&h);
        }

        if self.name_index.get(h.name()) == Some(&id) {
            self.name_index.remove(h.name());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn start_index(&self) -> u64 {
        self.start_index
    }

    pub fn end_index(&self) -> u64 {
        self.start_index + self.entries.len() as u64
    }
}

lazy_static! {
    /// The RFC 7541 Appendix A entries at absolute indexes 1..=61, built
    /// once per process and shared read-only by every codec instance.
    pub static ref STATIC_INDEX: IndexTable =
        IndexTable::with_static_list(&STATIC_TABLE);
}
