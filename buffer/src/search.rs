//! SearchEngine: literal and regex search over the piecewise
//! document, returning absolute offsets.
//!
//! Literal search is a Boyer-Moore-Horspool searcher (`LiteralForward`/
//! `LiteralBackward`) built against this crate's `Bytes` cursor. Regex
//! search runs on `regex-cursor`: a forward `regex_cursor::engines::
//! meta::Regex` for `find_next`/`find_all`, and a pair of hybrid DFAs
//! (forward + reverse) for `find_previous`, since a reverse scan needs to
//! find the match's start before it can bound the forward scan that finds
//! its end.

use std::cmp::max;

use regex_cursor::engines::meta::Regex as MetaRegex;
use regex_cursor::regex_automata::hybrid::dfa::{Cache, DFA};
use regex_cursor::regex_automata::nfa::thompson;
use regex_cursor::Input;

use crate::error::{Error, Result};
use crate::piece_tree::PieceTree;

/// Search configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub whole_word: bool,
    /// Characters that count as word boundaries for `whole_word`. `None`
    /// falls back to "whitespace or punctuation".
    pub word_separators: Option<String>,
    /// Populate [`SearchMatch::groups`] with capture group spans.
    /// Ignored when `use_regex` is false (a literal query has no groups).
    pub capture_groups: bool,
}

/// One match: an absolute half-open offset range, plus capture group
/// spans when `SearchOptions::capture_groups` was set. `groups[0]` is
/// always the whole match when present; `groups[i]` is `None` for a
/// group that didn't participate in the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: u64,
    pub end: u64,
    pub groups: Vec<Option<(u64, u64)>>,
}

impl SearchMatch {
    #[inline]
    fn plain(start: u64, end: u64) -> SearchMatch {
        SearchMatch {
            start,
            end,
            groups: Vec::new(),
        }
    }
}

/// Internal cap on `find_all`, independent of the caller's `max_matches`
///.
pub(crate) const FIND_MATCHES_CAP: usize = 1_000;

pub(crate) fn find_all(
    pt: &PieceTree,
    query: &str,
    start_offset: u64,
    options: &SearchOptions,
    max_matches: usize,
) -> Result<Vec<SearchMatch>> {
    let cap = max_matches.min(FIND_MATCHES_CAP);
    let start_offset = start_offset.min(pt.len());
    let mut out = Vec::new();

    if options.use_regex {
        let regex = compile_regex(query, options.case_sensitive)?;
        let range = start_offset..pt.len();
        let cursor = crate::cursor::TreeCursor::new(pt, range);
        let input = Input::new(cursor);

        if options.capture_groups {
            for caps in regex.captures_iter(input) {
                if out.len() >= cap {
                    break;
                }
                let Some(m) = caps.get_match() else {
                    continue;
                };
                let abs_start = start_offset + m.start() as u64;
                let abs_end = start_offset + m.end() as u64;
                if passes_whole_word(pt, abs_start, abs_end, options)? {
                    let groups = caps
                        .iter()
                        .map(|span| {
                            span.map(|s| (start_offset + s.start as u64, start_offset + s.end as u64))
                        })
                        .collect();
                    out.push(SearchMatch {
                        start: abs_start,
                        end: abs_end,
                        groups,
                    });
                }
            }
        } else {
            for m in regex.find_iter(input) {
                if out.len() >= cap {
                    break;
                }
                let abs_start = start_offset + m.start() as u64;
                let abs_end = start_offset + m.end() as u64;
                if passes_whole_word(pt, abs_start, abs_end, options)? {
                    out.push(SearchMatch::plain(abs_start, abs_end));
                }
            }
        }
    } else {
        let mut searcher = LiteralForward::new(pt, query.as_bytes(), options.case_sensitive)?;
        let mut next = searcher.next_from(start_offset);
        while let Some((start, end)) = next {
            if passes_whole_word(pt, start, end, options)? {
                out.push(SearchMatch::plain(start, end));
                if out.len() >= cap {
                    break;
                }
            }
            next = searcher.next_from(end);
        }
    }

    Ok(out)
}

pub(crate) fn find_next(
    pt: &PieceTree,
    query: &str,
    start_offset: u64,
    options: &SearchOptions,
) -> Result<Option<SearchMatch>> {
    Ok(find_all(pt, query, start_offset, options, 1)?.into_iter().next())
}

pub(crate) fn find_previous(
    pt: &PieceTree,
    query: &str,
    end_offset: u64,
    options: &SearchOptions,
) -> Result<Option<SearchMatch>> {
    let end_offset = end_offset.min(pt.len());

    if options.use_regex {
        find_previous_regex(pt, query, end_offset, options)
    } else {
        let mut searcher = LiteralBackward::new(pt, query.as_bytes(), options.case_sensitive)?;
        let mut candidate = searcher.prev_from(end_offset);
        while let Some((start, end)) = candidate {
            if passes_whole_word(pt, start, end, options)? {
                return Ok(Some(SearchMatch::plain(start, end)));
            }
            candidate = searcher.prev_from(start);
        }
        Ok(None)
    }
}

fn find_previous_regex(
    pt: &PieceTree,
    query: &str,
    end_offset: u64,
    options: &SearchOptions,
) -> Result<Option<SearchMatch>> {
    let pattern = regex_pattern(query, options.case_sensitive);
    let fwd = DFA::builder()
        .thompson(thompson::Config::new())
        .build(&pattern)
        .map_err(hybrid_build_error)?;
    let bwd = DFA::builder()
        .thompson(thompson::Config::new().reverse(true))
        .build(&pattern)
        .map_err(hybrid_build_error)?;

    let mut search_end = end_offset;
    loop {
        let bwd_cursor = crate::cursor::TreeCursor::new(pt, 0..search_end);
        let mut bwd_input = Input::new(bwd_cursor);
        let mut bwd_cache = bwd.create_cache();
        let Some(half) =
            regex_cursor::engines::hybrid::try_search_rev(&bwd, &mut bwd_cache, &mut bwd_input)
                .ok()
                .flatten()
        else {
            return Ok(None);
        };
        let abs_start = half.offset() as u64;

        let fwd_cursor = crate::cursor::TreeCursor::new(pt, abs_start..pt.len());
        let mut fwd_input = Input::new(fwd_cursor);
        let mut fwd_cache = fwd.create_cache();
        let Some(end_half) =
            regex_cursor::engines::hybrid::try_search_fwd(&fwd, &mut fwd_cache, &mut fwd_input)
                .ok()
                .flatten()
        else {
            // Shouldn't happen: a reverse match always has a forward closure.
            return Ok(None);
        };
        let abs_end = abs_start + end_half.offset() as u64;

        if abs_end <= end_offset && passes_whole_word(pt, abs_start, abs_end, options)? {
            // The reverse DFA search has no capture-group support (hybrid
            // DFAs only track overall match spans), so `find_previous`
            // never populates `SearchMatch::groups` even when
            // `capture_groups` is set — documented in DESIGN.md.
            return Ok(Some(SearchMatch::plain(abs_start, abs_end)));
        }

        if abs_start == 0 {
            return Ok(None);
        }
        search_end = abs_start;
    }
}

fn regex_pattern(query: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        query.to_string()
    } else {
        format!("(?i){query}")
    }
}

fn compile_regex(query: &str, case_sensitive: bool) -> Result<MetaRegex> {
    MetaRegex::new(&regex_pattern(query, case_sensitive)).map_err(meta_build_error)
}

/// Pull the byte offset a regex failed to compile at out of its syntax
/// error, when the engine surfaced one; falls back to 0 for build failures
/// that aren't a syntax error (e.g. a size-limit rejection).
fn meta_build_error(e: regex_cursor::regex_automata::meta::BuildError) -> Error {
    let offset = e
        .syntax_error()
        .map(|se| se.span().start.offset)
        .unwrap_or(0);
    Error::InvalidQuery {
        message: e.to_string(),
        offset,
    }
}

fn hybrid_build_error(e: regex_cursor::regex_automata::hybrid::BuildError) -> Error {
    let offset = e
        .syntax_error()
        .map(|se| se.span().start.offset)
        .unwrap_or(0);
    Error::InvalidQuery {
        message: e.to_string(),
        offset,
    }
}

fn default_separator(b: u8) -> bool {
    b.is_ascii_whitespace() || b.is_ascii_punctuation()
}

fn is_separator(b: Option<u8>, seps: Option<&str>) -> bool {
    match b {
        None => true,
        Some(b) => match seps {
            Some(s) => s.as_bytes().contains(&b),
            None => default_separator(b),
        },
    }
}

/// Post-filter implementing `whole_word` by inspecting the bytes just
/// outside the match, rather than embedding a lookaround assertion in the
/// pattern — `regex-automata`'s engines don't support arbitrary lookbehind,
/// so both the literal and regex paths share this check (documented as an
/// Open-Question resolution in DESIGN.md).
fn passes_whole_word(pt: &PieceTree, start: u64, end: u64, options: &SearchOptions) -> Result<bool> {
    if !options.whole_word {
        return Ok(true);
    }
    let seps = options.word_separators.as_deref();

    let before = if start == 0 {
        None
    } else {
        pt.text_range(start - 1, start)?.first().copied()
    };
    let after = if end >= pt.len() {
        None
    } else {
        pt.text_range(end, end + 1)?.first().copied()
    };

    Ok(is_separator(before, seps) && is_separator(after, seps))
}

fn build_bad_char_table_fwd(pattern: &[u8]) -> [usize; 256] {
    let mut table = [pattern.len(); 256];
    let last = pattern.len() - 1;
    for (i, &b) in pattern.iter().enumerate().take(last) {
        table[b as usize] = last - i;
    }
    table
}

fn build_bad_char_table_bwd(pattern: &[u8]) -> [usize; 256] {
    let mut table = [pattern.len(); 256];
    for (i, &b) in pattern.iter().enumerate().rev() {
        table[b as usize] = i;
    }
    table
}

struct LiteralForward<'a> {
    pt: &'a PieceTree,
    pattern: Vec<u8>,
    bad_char: [usize; 256],
    case_sensitive: bool,
}

impl<'a> LiteralForward<'a> {
    fn new(pt: &'a PieceTree, pattern: &[u8], case_sensitive: bool) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidArgument("search pattern must not be empty".into()));
        }
        let pattern = if case_sensitive {
            pattern.to_vec()
        } else {
            pattern.to_ascii_lowercase()
        };
        let bad_char = build_bad_char_table_fwd(&pattern);
        Ok(LiteralForward {
            pt,
            pattern,
            bad_char,
            case_sensitive,
        })
    }

    #[inline]
    fn byte(&self, bytes: &mut crate::bytes::Bytes, pos: u64) -> u8 {
        let b = bytes.byte_at(pos);
        if self.case_sensitive {
            b
        } else {
            b.to_ascii_lowercase()
        }
    }

    /// First match at or after `from`.
    fn next_from(&mut self, from: u64) -> Option<(u64, u64)> {
        let m = self.pattern.len() as u64;
        let len = self.pt.len();
        if from + m > len {
            return None;
        }

        let mut bytes = self.pt.bytes_at(0);
        let mut i = from + m - 1;

        while i < len {
            let mut j = (m - 1) as i64;
            loop {
                let b = self.byte(&mut bytes, i);
                if b != self.pattern[j as usize] {
                    break;
                }
                if j == 0 {
                    i += 1;
                    return Some((i - m, i));
                }
                j -= 1;
                i -= 1;
            }
            let b = self.byte(&mut bytes, i);
            let shift = max(m as usize - j as usize, self.bad_char[b as usize]) as u64;
            i += shift;
        }
        None
    }
}

struct LiteralBackward<'a> {
    pt: &'a PieceTree,
    pattern: Vec<u8>,
    bad_char: [usize; 256],
    case_sensitive: bool,
}

impl<'a> LiteralBackward<'a> {
    fn new(pt: &'a PieceTree, pattern: &[u8], case_sensitive: bool) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidArgument("search pattern must not be empty".into()));
        }
        let pattern = if case_sensitive {
            pattern.to_vec()
        } else {
            pattern.to_ascii_lowercase()
        };
        let bad_char = build_bad_char_table_bwd(&pattern);
        Ok(LiteralBackward {
            pt,
            pattern,
            bad_char,
            case_sensitive,
        })
    }

    #[inline]
    fn byte(&self, bytes: &mut crate::bytes::Bytes, pos: u64) -> u8 {
        let b = bytes.byte_at(pos);
        if self.case_sensitive {
            b
        } else {
            b.to_ascii_lowercase()
        }
    }

    /// Last match whose end is at or before `before` (i.e. strictly before
    /// `before + 1`), scanning right-to-left.
    fn prev_from(&mut self, before: u64) -> Option<(u64, u64)> {
        let m = self.pattern.len() as u64;
        if before < m {
            return None;
        }

        let mut bytes = self.pt.bytes_at(0);
        let mut i = before - m;

        loop {
            let mut j = 0usize;
            loop {
                let b = self.byte(&mut bytes, i);
                if b != self.pattern[j] {
                    break;
                }
                if j == m as usize - 1 {
                    let end = i + 1;
                    let start = end - m;
                    return Some((start, end));
                }
                j += 1;
                i += 1;
            }
            let b = self.byte(&mut bytes, i);
            let shift = max(j as u64 + 1, self.bad_char[b as usize] as u64);
            if i < shift {
                return None;
            }
            i -= shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece_tree::PieceTree;

    fn opts() -> SearchOptions {
        SearchOptions {
            case_sensitive: true,
            ..Default::default()
        }
    }

    #[test]
    fn literal_forward_finds_all_occurrences() {
        let pt = PieceTree::from_bytes(b"[dependencies][dev-dependencies]");
        let matches = find_all(&pt, "dependencies", 0, &opts(), 100).unwrap();
        assert_eq!(
            matches,
            vec![
                SearchMatch::plain(1, 13),
                SearchMatch::plain(19, 31),
            ]
        );
    }

    #[test]
    fn literal_backward_finds_last_match_before_end() {
        let pt = PieceTree::from_bytes(b"[dependencies][dev-dependencies]");
        let m = find_previous(&pt, "dependencies", pt.len(), &opts())
            .unwrap()
            .unwrap();
        assert_eq!(m, SearchMatch::plain(19, 31));

        let m2 = find_previous(&pt, "dependencies", m.start, &opts())
            .unwrap()
            .unwrap();
        assert_eq!(m2, SearchMatch::plain(1, 13));
    }

    #[test]
    fn case_insensitive_literal_matches() {
        let pt = PieceTree::from_bytes(b"Hello HELLO hello");
        let o = SearchOptions {
            case_sensitive: false,
            ..Default::default()
        };
        let matches = find_all(&pt, "hello", 0, &o, 100).unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn whole_word_excludes_substring_matches() {
        let pt = PieceTree::from_bytes(b"cat category cat");
        let o = SearchOptions {
            case_sensitive: true,
            whole_word: true,
            ..Default::default()
        };
        let matches = find_all(&pt, "cat", 0, &o, 100).unwrap();
        assert_eq!(matches, vec![
            SearchMatch::plain(0, 3),
            SearchMatch::plain(13, 16),
        ]);
    }

    #[test]
    fn find_all_cap_is_1000() {
        let text = "x".repeat(2_000);
        let pt = PieceTree::from_bytes(text.as_bytes());
        let matches = find_all(&pt, "x", 0, &opts(), 5_000).unwrap();
        assert_eq!(matches.len(), FIND_MATCHES_CAP);

        let next = find_next(&pt, "x", matches[999].end, &opts()).unwrap().unwrap();
        assert_eq!(next.start, 1000);
    }

    #[test]
    fn regex_search_basic() {
        let pt = PieceTree::from_bytes(b"foo123 bar456");
        let o = SearchOptions {
            use_regex: true,
            case_sensitive: true,
            ..Default::default()
        };
        let matches = find_all(&pt, r"[a-z]+\d+", 0, &o, 10).unwrap();
        assert_eq!(
            matches,
            vec![
                SearchMatch::plain(0, 6),
                SearchMatch::plain(7, 13),
            ]
        );
    }

    #[test]
    fn invalid_regex_errors() {
        let pt = PieceTree::from_bytes(b"abc");
        let o = SearchOptions {
            use_regex: true,
            case_sensitive: true,
            ..Default::default()
        };
        let err = find_all(&pt, "(unterminated", 0, &o, 10);
        assert!(err.is_err());
    }

    #[test]
    fn capture_groups_are_populated_on_request() {
        let pt = PieceTree::from_bytes(b"key=value");
        let o = SearchOptions {
            use_regex: true,
            case_sensitive: true,
            capture_groups: true,
            ..Default::default()
        };
        let matches = find_all(&pt, r"(\w+)=(\w+)", 0, &o, 10).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.groups[0], Some((0, 9)));
        assert_eq!(m.groups[1], Some((0, 3)));
        assert_eq!(m.groups[2], Some((4, 9)));
    }
}
