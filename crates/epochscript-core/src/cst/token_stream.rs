//! Token storage shared between tree versions
//!
//! A [`TokenStream`] is a list of chunks. Each chunk is a window into an
//! `Arc`-shared token array together with the byte shift to apply to the
//! tokens it covers. Reparsing after an edit copies chunks, not tokens: the
//! unchanged prefix and suffix keep pointing at the previous tree's arrays and
//! only the relexed tokens are allocated anew.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use super::{CstToken, EpochSyntaxKind};

/// A stream holding more chunks than this, plus one per `COMPACT_STRIDE`
/// tokens, is flattened into a single chunk
const MAX_EXTRA_CHUNKS: usize = 32;
const COMPACT_STRIDE: usize = 1024;

/// Tokens of one lexing pass, in the coordinates they were lexed in
#[derive(Debug)]
struct TokenArray {
    tokens: Box<[CstToken]>,
    /// Running maximum of `lookahead` over `tokens[..=i]`
    reach: Box<[usize]>,
}

impl TokenArray {
    fn new(tokens: Vec<CstToken>) -> Self {
        let reach = tokens
            .iter()
            .scan(0, |max, token| {
                *max = token.lookahead.max(*max);
                Some(*max)
            })
            .collect();
        Self {
            tokens: tokens.into_boxed_slice(),
            reach,
        }
    }
}

#[derive(Debug, Clone)]
struct Chunk {
    array: Arc<TokenArray>,
    /// Window into `array.tokens`; never empty
    range: Range<usize>,
    /// Stream index of the window's first token
    first: usize,
    /// Shift from array offsets to stream offsets
    delta: isize,
}

impl Chunk {
    fn whole(tokens: Vec<CstToken>, first: usize) -> Self {
        let range = 0..tokens.len();
        Self {
            array: Arc::new(TokenArray::new(tokens)),
            range,
            first,
            delta: 0,
        }
    }

    /// Stream index one past the window
    fn end(&self) -> usize {
        self.first + self.range.len()
    }

    fn raw(&self, index: usize) -> &CstToken {
        &self.array.tokens[self.range.start + (index - self.first)]
    }

    fn token(&self, index: usize) -> CstToken {
        self.raw(index).shifted(self.delta)
    }

    /// Byte offset where the window's last token ends
    fn end_offset(&self) -> usize {
        shift(self.array.tokens[self.range.end - 1].span.end, self.delta)
    }
}

fn shift(offset: usize, delta: isize) -> usize {
    offset.wrapping_add_signed(delta)
}

/// Flat token stream of a tree, trivia included
///
/// Indexing and iteration yield tokens with spans in the coordinates of the
/// tree's text. Equality compares the tokens, not how they are stored.
#[derive(Clone, Default)]
pub struct TokenStream {
    chunks: Vec<Chunk>,
    len: usize,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index into `chunks` of the chunk holding stream index `index`
    fn chunk_index(&self, index: usize) -> usize {
        self.chunks.partition_point(|chunk| chunk.end() <= index)
    }

    pub fn get(&self, index: usize) -> Option<CstToken> {
        self.chunks
            .get(self.chunk_index(index))
            .map(|chunk| chunk.token(index))
    }

    /// Kind of the token at `index`, without materialising its span
    pub fn kind(&self, index: usize) -> Option<EpochSyntaxKind> {
        self.chunks
            .get(self.chunk_index(index))
            .map(|chunk| chunk.raw(index).kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = CstToken> + '_ {
        self.iter_from(0)
    }

    /// Tokens from index `start` to the end
    pub fn iter_from(&self, start: usize) -> impl Iterator<Item = CstToken> + '_ {
        self.chunks[self.chunk_index(start)..]
            .iter()
            .flat_map(move |chunk| {
                (start.max(chunk.first)..chunk.end()).map(move |index| chunk.token(index))
            })
    }

    pub fn to_vec(&self) -> Vec<CstToken> {
        self.iter().collect()
    }

    /// Index of the token that starts exactly at byte `offset`
    pub(crate) fn index_starting_at(&self, offset: usize) -> Option<usize> {
        let chunk = self
            .chunks
            .get(self.chunks.partition_point(|chunk| chunk.end_offset() <= offset))?;
        let raw = offset.checked_add_signed(-chunk.delta)?;
        chunk.array.tokens[chunk.range.clone()]
            .binary_search_by_key(&raw, |token| token.span.start)
            .ok()
            .map(|index| chunk.first + index)
    }

    /// Copy tokens from index `from` onwards into `out`, moved by `delta`
    /// bytes, stopping early at a token that may have looked past `bound`
    ///
    /// Returns the index of the first token not copied. The stop never lies
    /// after the first token whose lookahead exceeds `bound`; it may lie
    /// slightly before it.
    pub(crate) fn copy_into(
        &self,
        from: usize,
        bound: Option<usize>,
        delta: isize,
        out: &mut TokenStreamBuilder,
    ) -> usize {
        let mut index = from;
        for chunk in &self.chunks[self.chunk_index(from)..] {
            let start = chunk.range.start + (index - chunk.first);
            let end = match bound {
                None => chunk.range.end,
                Some(bound) => {
                    let reach = &chunk.array.reach[start..chunk.range.end];
                    start + reach.partition_point(|&reach| shift(reach, chunk.delta) <= bound)
                }
            };
            if end > start {
                out.push_window(chunk, start..end, delta);
                index += end - start;
            }
            if end < chunk.range.end {
                break;
            }
        }
        index
    }

    #[cfg(test)]
    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether both streams read tokens from at least one common array
    #[cfg(test)]
    pub(crate) fn shares_storage_with(&self, other: &TokenStream) -> bool {
        self.chunks.iter().any(|chunk| {
            other
                .chunks
                .iter()
                .any(|theirs| Arc::ptr_eq(&chunk.array, &theirs.array))
        })
    }
}

impl From<Vec<CstToken>> for TokenStream {
    fn from(tokens: Vec<CstToken>) -> Self {
        let len = tokens.len();
        let chunks = if tokens.is_empty() {
            Vec::new()
        } else {
            vec![Chunk::whole(tokens, 0)]
        };
        Self { chunks, len }
    }
}

impl PartialEq for TokenStream {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for TokenStream {}

impl fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Assembles a [`TokenStream`] from freshly lexed tokens and windows of an
/// older stream
#[derive(Debug, Default)]
pub(crate) struct TokenStreamBuilder {
    chunks: Vec<Chunk>,
    fresh: Vec<CstToken>,
    len: usize,
    end_offset: usize,
}

impl TokenStreamBuilder {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Byte offset where the last token ends, 0 when empty
    pub(crate) fn end_offset(&self) -> usize {
        self.end_offset
    }

    pub(crate) fn push(&mut self, token: CstToken) {
        self.end_offset = token.span.end;
        self.fresh.push(token);
        self.len += 1;
    }

    fn push_window(&mut self, chunk: &Chunk, range: Range<usize>, delta: isize) {
        self.flush_fresh();
        let window = Chunk {
            array: Arc::clone(&chunk.array),
            range,
            first: self.len,
            delta: chunk.delta + delta,
        };
        self.len = window.end();
        self.end_offset = window.end_offset();
        self.chunks.push(window);
    }

    fn flush_fresh(&mut self) {
        if self.fresh.is_empty() {
            return;
        }
        let tokens = std::mem::take(&mut self.fresh);
        let first = self.len - tokens.len();
        self.chunks.push(Chunk::whole(tokens, first));
    }

    pub(crate) fn finish(mut self) -> TokenStream {
        self.flush_fresh();
        let stream = TokenStream {
            chunks: self.chunks,
            len: self.len,
        };
        if stream.chunks.len() > MAX_EXTRA_CHUNKS + stream.len / COMPACT_STRIDE {
            tracing::trace!(chunks = stream.chunks.len(), "flattening token stream");
            TokenStream::from(stream.to_vec())
        } else {
            stream
        }
    }
}
