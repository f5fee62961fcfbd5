//! End-of-line policy: normalization on ingress and the canonical
//! line-break scan shared by every piece constructed in the buffer.

/// Which terminator the document is canonicalized to store and/or
/// render with. `None` means "leave content as written"; the buffer then
/// detects a nominal policy from existing content (CRLF, else LF, else
/// CR, defaulting to LF) purely for `text_with_eol` bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EolPolicy {
    Lf,
    Crlf,
    Cr,
    None,
}

impl EolPolicy {
    #[inline]
    pub(crate) fn terminator(self) -> &'static [u8] {
        match self {
            EolPolicy::Lf => b"\n",
            EolPolicy::Crlf => b"\r\n",
            EolPolicy::Cr => b"\r",
            EolPolicy::None => b"\n",
        }
    }
}

/// Detect a nominal EOL policy from content: first terminator encountered
/// wins, CRLF checked before LF since LF alone would otherwise also match
/// the CRLF pair's second byte. Defaults to LF on content with no
/// terminators at all.
pub(crate) fn detect(bytes: &[u8]) -> EolPolicy {
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                return if bytes.get(i + 1) == Some(&b'\n') {
                    EolPolicy::Crlf
                } else {
                    EolPolicy::Cr
                };
            }
            b'\n' => return EolPolicy::Lf,
            _ => i += 1,
        }
    }
    EolPolicy::Lf
}

/// Rewrite every CRLF, LF, or standalone CR in `bytes` to `policy`'s
/// terminator, in one pass. No-op for `EolPolicy::None`.
pub(crate) fn normalize(bytes: &[u8], policy: EolPolicy) -> Vec<u8> {
    if policy == EolPolicy::None {
        return bytes.to_vec();
    }

    let term = policy.terminator();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                out.extend_from_slice(term);
                i += 2;
            }
            b'\r' => {
                out.extend_from_slice(term);
                i += 1;
            }
            b'\n' => {
                out.extend_from_slice(term);
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

/// One break at each LF, each standalone CR (not followed by LF), and
/// each CRLF pair (counted once, not twice). Returns offsets one past
/// each terminator, ascending, relative to the start of `bytes`.
pub(crate) fn compute_line_starts(bytes: &[u8]) -> Vec<u64> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 2;
                } else {
                    i += 1;
                }
                starts.push(i as u64);
            }
            b'\n' => {
                i += 1;
                starts.push(i as u64);
            }
            _ => i += 1,
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_first_terminator_kind() {
        assert_eq!(detect(b"a\r\nb"), EolPolicy::Crlf);
        assert_eq!(detect(b"a\nb"), EolPolicy::Lf);
        assert_eq!(detect(b"a\rb"), EolPolicy::Cr);
        assert_eq!(detect(b"abc"), EolPolicy::Lf);
    }

    #[test]
    fn normalize_collapses_mixed_terminators() {
        let out = normalize(b"a\r\nb\rc\nd", EolPolicy::Lf);
        assert_eq!(out, b"a\nb\nc\nd");
    }

    #[test]
    fn line_starts_counts_crlf_once() {
        // "ab\ncd\r\nef\rgh" -> breaks after 'ab\n' (3), after 'cd\r\n' (7),
        // after 'ef\r' (10)
        let starts = compute_line_starts(b"ab\ncd\r\nef\rgh");
        assert_eq!(starts, vec![3, 7, 10]);
    }
}
