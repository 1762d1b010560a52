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

/// The Huffman code from RFC 7541 Appendix B, one `(bit length,
/// right-aligned code)` pair per symbol. Symbols 0..=255 are the octet
/// values; symbol 256 is the reserved EOS marker whose most-significant bits
/// double as the only valid trailing padding.
pub const CODES: [(u8, u32); 257] = [
    (13, 0x1ff8), // 0
    (23, 0x7fffd8), // 1
    (28, 0xfffffe2), // 2
    (28, 0xfffffe3), // 3
    (28, 0xfffffe4), // 4
    (28, 0xfffffe5), // 5
    (28, 0xfffffe6), // 6
    (28, 0xfffffe7), // 7
    (28, 0xfffffe8), // 8
    (24, 0xffffea), // 9
    (30, 0x3ffffffc), // 10
    (28, 0xfffffe9), // 11
    (28, 0xfffffea), // 12
    (30, 0x3ffffffd), // 13
    (28, 0xfffffeb), // 14
    (28, 0xfffffec), // 15
    (28, 0xfffffed), // 16
    (28, 0xfffffee), // 17
    (28, 0xfffffef), // 18
    (28, 0xffffff0), // 19
    (28, 0xffffff1), // 20
    (28, 0xffffff2), // 21
    (30, 0x3ffffffe), // 22
    (28, 0xffffff3), // 23
    (28, 0xffffff4), // 24
    (28, 0xffffff5), // 25
    (28, 0xffffff6), // 26
    (28, 0xffffff7), // 27
    (28, 0xffffff8), // 28
    (28, 0xffffff9), // 29
    (28, 0xffffffa), // 30
    (28, 0xffffffb), // 31
    (6, 0x14), // ' '
    (10, 0x3f8), // '!'
    (10, 0x3f9), // '"'
    (12, 0xffa), // '#'
    (13, 0x1ff9), // '$'
    (6, 0x15), // '%'
    (8, 0xf8), // '&'
    (11, 0x7fa), // '\''
    (10, 0x3fa), // '('
    (10, 0x3fb), // ')'
    (8, 0xf9), // '*'
    (11, 0x7fb), // '+'
    (8, 0xfa), // ','
    (6, 0x16), // '-'
    (6, 0x17), // '.'
    (6, 0x18), // '/'
    (5, 0x0), // '0'
    (5, 0x1), // '1'
    (5, 0x2), // '2'
    (6, 0x19), // '3'
    (6, 0x1a), // '4'
    (6, 0x1b), // '5'
    (6, 0x1c), // '6'
    (6, 0x1d), // '7'
    (6, 0x1e), // '8'
    (6, 0x1f), // '9'
    (7, 0x5c), // ':'
    (8, 0xfb), // ';'
    (15, 0x7ffc), // '<'
    (6, 0x20), // '='
    (12, 0xffb), // '>'
    (10, 0x3fc), // '?'
    (13, 0x1ffa), // '@'
    (6, 0x21), // 'A'
    (7, 0x5d), // 'B'
    (7, 0x5e), // 'C'
    (7, 0x5f), // 'D'
    (7, 0x60), // 'E'
    (7, 0x61), // 'F'
    (7, 0x62), // 'G'
    (7, 0x63), // 'H'
    (7, 0x64), // 'I'
    (7, 0x65), // 'J'
    (7, 0x66), // 'K'
    (7, 0x67), // 'L'
    (7, 0x68), // 'M'
    (7, 0x69), // 'N'
    (7, 0x6a), // 'O'
    (7, 0x6b), // 'P'
    (7, 0x6c), // 'Q'
    (7, 0x6d), // 'R'
    (7, 0x6e), // 'S'
    (7, 0x6f), // 'T'
    (7, 0x70), // 'U'
    (7, 0x71), // 'V'
    (7, 0x72), // 'W'
    (8, 0xfc), // 'X'
    (7, 0x73), // 'Y'
    (8, 0xfd), // 'Z'
    (13, 0x1ffb), // '['
    (19, 0x7fff0), // '\\'
    (13, 0x1ffc), // ']'
    (14, 0x3ffc), // '^'
    (6, 0x22), // '_'
    (15, 0x7ffd), // '`'
    (5, 0x3), // 'a'
    (6, 0x23), // 'b'
    (5, 0x4), // 'c'
    (6, 0x24), // 'd'
    (5, 0x5), // 'e'
    (6, 0x25), // 'f'
    (6, 0x26), // 'g'
    (6, 0x27), // 'h'
    (5, 0x6), // 'i'
    (7, 0x74), // 'j'
    (7, 0x75), // 'k'
    (6, 0x28), // 'l'
    (6, 0x29), // 'm'
    (6, 0x2a), // 'n'
    (5, 0x7), // 'o'
    (6, 0x2b), // 'p'
    (7, 0x76), // 'q'
    (6, 0x2c), // 'r'
    (5, 0x8), // 's'
    (5, 0x9), // 't'
    (6, 0x2d), // 'u'
    (7, 0x77), // 'v'
    (7, 0x78), // 'w'
    (7, 0x79), // 'x'
    (7, 0x7a), // 'y'
    (7, 0x7b), // 'z'
    (15, 0x7ffe), // '{'
    (11, 0x7fc), // '|'
    (14, 0x3ffd), // '}'
    (13, 0x1ffd), // '~'
    (28, 0xffffffc), // 127
    (20, 0xfffe6), // 128
    (22, 0x3fffd2), // 129
    (20, 0xfffe7), // 130
    (20, 0xfffe8), // 131
    (22, 0x3fffd3), // 132
    (22, 0x3fffd4), // 133
    (22, 0x3fffd5), // 134
    (23, 0x7fffd9), // 135
    (22, 0x3fffd6), // 136
    (23, 0x7fffda), // 137
    (23, 0x7fffdb), // 138
    (23, 0x7fffdc), // 139
    (23, 0x7fffdd), // 140
    (23, 0x7fffde), // 141
    (24, 0xffffeb), // 142
    (23, 0x7fffdf), // 143
    (24, 0xffffec), // 144
    (24, 0xffffed), // 145
    (22, 0x3fffd7), // 146
    (23, 0x7fffe0), // 147
    (24, 0xffffee), // 148
    (23, 0x7fffe1), // 149
    (23, 0x7fffe2), // 150
    (23, 0x7fffe3), // 151
    (23, 0x7fffe4), // 152
    (21, 0x1fffdc), // 153
    (22, 0x3fffd8), // 154
    (23, 0x7fffe5), // 155
    (22, 0x3fffd9), // 156
    (23, 0x7fffe6), // 157
    (23, 0x7fffe7), // 158
    (24, 0xffffef), // 159
    (22, 0x3fffda), // 160
    (21, 0x1fffdd), // 161
    (20, 0xfffe9), // 162
    (22, 0x3fffdb), // 163
    (22, 0x3fffdc), // 164
    (23, 0x7fffe8), // 165
    (23, 0x7fffe9), // 166
    (21, 0x1fffde), // 167
    (23, 0x7fffea), // 168
    (22, 0x3fffdd), // 169
    (22, 0x3fffde), // 170
    (24, 0xfffff0), // 171
    (21, 0x1fffdf), // 172
    (22, 0x3fffdf), // 173
    (23, 0x7fffeb), // 174
    (23, 0x7fffec), // 175
    (21, 0x1fffe0), // 176
    (21, 0x1fffe1), // 177
    (22, 0x3fffe0), // 178
    (21, 0x1fffe2), // 179
    (23, 0x7fffed), // 180
    (22, 0x3fffe1), // 181
    (23, 0x7fffee), // 182
    (23, 0x7fffef), // 183
    (20, 0xfffea), // 184
    (22, 0x3fffe2), // 185
    (22, 0x3fffe3), // 186
    (22, 0x3fffe4), // 187
    (23, 0x7ffff0), // 188
    (22, 0x3fffe5), // 189
    (22, 0x3fffe6), // 190
    (23, 0x7ffff1), // 191
    (26, 0x3ffffe0), // 192
    (26, 0x3ffffe1), // 193
    (20, 0xfffeb), // 194
    (19, 0x7fff1), // 195
    (22, 0x3fffe7), // 196
    (23, 0x7ffff2), // 197
    (22, 0x3fffe8), // 198
    (25, 0x1ffffec), // 199
    (26, 0x3ffffe2), // 200
    (26, 0x3ffffe3), // 201
    (26, 0x3ffffe4), // 202
    (27, 0x7ffffde), // 203
    (27, 0x7ffffdf), // 204
    (26, 0x3ffffe5), // 205
    (24, 0xfffff1), // 206
    (25, 0x1ffffed), // 207
    (19, 0x7fff2), // 208
    (21, 0x1fffe3), // 209
    (26, 0x3ffffe6), // 210
    (27, 0x7ffffe0), // 211
    (27, 0x7ffffe1), // 212
    (26, 0x3ffffe7), // 213
    (27, 0x7ffffe2), // 214
    (24, 0xfffff2), // 215
    (21, 0x1fffe4), // 216
    (21, 0x1fffe5), // 217
    (26, 0x3ffffe8), // 218
    (26, 0x3ffffe9), // 219
    (28, 0xffffffd), // 220
    (27, 0x7ffffe3), // 221
    (27, 0x7ffffe4), // 222
    (27, 0x7ffffe5), // 223
    (20, 0xfffec), // 224
    (24, 0xfffff3), // 225
    (20, 0xfffed), // 226
    (21, 0x1fffe6), // 227
    (22, 0x3fffe9), // 228
    (21, 0x1fffe7), // 229
    (21, 0x1fffe8), // 230
    (23, 0x7ffff3), // 231
    (22, 0x3fffea), // 232
    (22, 0x3fffeb), // 233
    (25, 0x1ffffee), // 234
    (25, 0x1ffffef), // 235
    (24, 0xfffff4), // 236
    (24, 0xfffff5), // 237
    (26, 0x3ffffea), // 238
    (23, 0x7ffff4), // 239
    (26, 0x3ffffeb), // 240
    (27, 0x7ffffe6), // 241
    (26, 0x3ffffec), // 242
    (26, 0x3ffffed), // 243
    (27, 0x7ffffe7), // 244
    (27, 0x7ffffe8), // 245
    (27, 0x7ffffe9), // 246
    (27, 0x7ffffea), // 247
    (27, 0x7ffffeb), // 248
    (28, 0xffffffe), // 249
    (27, 0x7ffffec), // 250
    (27, 0x7ffffed), // 251
    (27, 0x7ffffee), // 252
    (27, 0x7ffffef), // 253
    (27, 0x7fffff0), // 254
    (26, 0x3ffffee), // 255
    (30, 0x3fffffff), // EOS
];
