// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bit-level view of framed data.
//!
//! Bytes expand most-significant bit first: `0xA0` becomes
//! `1 0 1 0 0 0 0 0`. One bit maps to one modulated symbol.

/// Ordered sequence of bits, MSB first within each source byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitStream {
    bits: Vec<bool>,
}

impl BitStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits),
        }
    }

    /// Expand bytes into bits, MSB first.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut stream = Self::with_capacity(bytes.len() * 8);
        stream.extend_bytes(bytes);
        stream
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn push_byte(&mut self, byte: u8) {
        for bit_pos in (0..8).rev() {
            self.bits.push((byte >> bit_pos) & 1 == 1);
        }
    }

    pub fn extend_bytes(&mut self, bytes: &[u8]) {
        self.bits.reserve(bytes.len() * 8);
        for &byte in bytes {
            self.push_byte(byte);
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<bool> {
        self.bits.get(idx).copied()
    }

    /// Invert one bit. Out-of-range indices are ignored.
    pub fn flip(&mut self, idx: usize) {
        if let Some(bit) = self.bits.get_mut(idx) {
            *bit = !*bit;
        }
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Pack back into bytes. `None` unless the length is a whole number of bytes.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        pack_bits(&self.bits)
    }

    /// Position of the first occurrence of `pattern` at or after `from`.
    pub fn find(&self, pattern: &[bool], from: usize) -> Option<usize> {
        find_pattern(&self.bits, pattern, from)
    }

    /// Split on every occurrence of `pattern`, scanning left to right and
    /// never letting two matches overlap. Empty segments are dropped.
    pub fn split<'a>(&'a self, pattern: &[bool]) -> Vec<&'a [bool]> {
        let mut segments = Vec::new();
        if pattern.is_empty() {
            if !self.bits.is_empty() {
                segments.push(self.bits.as_slice());
            }
            return segments;
        }

        let mut start = 0;
        let mut cursor = 0;
        while let Some(pos) = find_pattern(&self.bits, pattern, cursor) {
            if pos > start {
                segments.push(&self.bits[start..pos]);
            }
            start = pos + pattern.len();
            cursor = start;
        }
        if start < self.bits.len() {
            segments.push(&self.bits[start..]);
        }
        segments
    }
}

impl FromIterator<bool> for BitStream {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl Extend<bool> for BitStream {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        self.bits.extend(iter);
    }
}

impl From<Vec<bool>> for BitStream {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

/// Pack MSB-first bits into bytes; `None` for a partial trailing byte.
pub fn pack_bits(bits: &[bool]) -> Option<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return None;
    }
    let bytes = bits
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8))
        .collect();
    Some(bytes)
}

fn find_pattern(haystack: &[bool], pattern: &[bool], from: usize) -> Option<usize> {
    if pattern.is_empty() || from >= haystack.len() || haystack.len() - from < pattern.len() {
        return None;
    }
    haystack[from..]
        .windows(pattern.len())
        .position(|w| w == pattern)
        .map(|p| p + from)
}
