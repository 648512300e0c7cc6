//! Run-length fallback encoding
//!
//! Two variants share one escape format. The text variant counts runs of
//! identical characters and the escaped unit is one UTF-8 character; the byte
//! variant counts runs of identical bytes for arbitrary file data.
//! ```text
//! literal unit           any character (or byte) other than '~', verbatim
//! '~' <digits> ':' <u>   <digits> decimal copies of unit <u>
//! ```
//!
//! A run is escaped when it is longer than 3 units, or when the unit is a
//! newline, a space, or '~' itself (whatever the run length). Because a
//! literal '~' never appears unescaped and the count always ends at ':', the
//! decoder never has to guess where the digits stop, even when <u> is a digit.

use fg_core::{ForgeguardError, ForgeguardResult};

const ESCAPE: u8 = b'~';
const TERMINATOR: u8 = b':';

/// Runs longer than this are always escaped.
const MAX_LITERAL_RUN: usize = 3;

fn always_escaped(b: u8) -> bool {
    matches!(b, b'\n' | b' ' | ESCAPE)
}

fn always_escaped_char(c: char) -> bool {
    c.is_ascii() && always_escaped(c as u8)
}

/// Encode text, counting runs of identical characters.
pub fn encode_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.next_if_eq(&c).is_some() {
            run += 1;
        }

        if run > MAX_LITERAL_RUN || always_escaped_char(c) {
            out.push(ESCAPE as char);
            out.push_str(&run.to_string());
            out.push(TERMINATOR as char);
            out.push(c);
        } else {
            out.extend(std::iter::repeat(c).take(run));
        }
    }
    out
}

/// Decode the output of [`encode_text`].
///
/// `max_len` bounds the decoded size in bytes. The run unit after ':' is one
/// whole character, so multi-byte runs expand correctly.
pub fn decode_text(input: &str, max_len: usize) -> ForgeguardResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        let offset = input.len() - rest.len();
        if c != ESCAPE as char {
            out.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let after_escape = &rest[1..];
        let digits_len = after_escape
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let (digits, tail) = after_escape.split_at(digits_len);
        let Some(tail) = tail.strip_prefix(TERMINATOR as char) else {
            return Err(malformed(offset, "escape without count terminator"));
        };
        let value = tail
            .chars()
            .next()
            .ok_or_else(|| malformed(offset, "escape missing run character"))?;

        let run: usize = digits
            .parse()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| malformed(offset, "invalid run length"))?;

        let run_bytes = run.saturating_mul(value.len_utf8());
        if out.len().saturating_add(run_bytes) > max_len {
            return Err(malformed(offset, "run exceeds size limit"));
        }
        out.extend(std::iter::repeat(value).take(run));
        rest = &tail[value.len_utf8()..];
    }
    Ok(out)
}

/// Encode arbitrary bytes, counting runs of identical bytes.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        let run = input[i..].iter().take_while(|&&b| b == byte).count();

        if run > MAX_LITERAL_RUN || always_escaped(byte) {
            out.push(ESCAPE);
            out.extend_from_slice(run.to_string().as_bytes());
            out.push(TERMINATOR);
            out.push(byte);
        } else {
            out.extend(std::iter::repeat(byte).take(run));
        }
        i += run;
    }
    out
}

/// Decode the output of [`encode`].
///
/// `max_len` bounds the decoded size so a corrupted count cannot allocate
/// without limit. Truncated or malformed escapes are errors, never partial
/// output.
pub fn decode(input: &[u8], max_len: usize) -> ForgeguardResult<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte != ESCAPE {
            out.push(byte);
            i += 1;
            continue;
        }

        let digits_start = i + 1;
        let digits_len = input[digits_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        let terminator_at = digits_start + digits_len;

        if digits_len == 0 || input.get(terminator_at) != Some(&TERMINATOR) {
            return Err(malformed(i, "escape without count terminator"));
        }
        let value = *input
            .get(terminator_at + 1)
            .ok_or_else(|| malformed(i, "escape missing run byte"))?;

        let run: usize = std::str::from_utf8(&input[digits_start..terminator_at])
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .ok_or_else(|| malformed(i, "invalid run length"))?;

        if out.len().saturating_add(run) > max_len {
            return Err(malformed(i, "run exceeds size limit"));
        }
        out.extend(std::iter::repeat(value).take(run));
        i = terminator_at + 2;
    }
    Ok(out)
}

fn malformed(offset: usize, reason: &str) -> ForgeguardError {
    ForgeguardError::MalformedCompressed(format!("run-length stream at byte {offset}: {reason}"))
}
