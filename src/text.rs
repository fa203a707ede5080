//! CJK-aware string helpers shared by the classifiers.

use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use phf::phf_map;

/// CJK numerals accepted by the hint phrases.
static CJK_DIGITS: phf::Map<char, i64> = phf_map! {
    '零' => 0,
    '一' => 1,
    '二' => 2,
    '三' => 3,
    '四' => 4,
    '五' => 5,
    '六' => 6,
    '七' => 7,
    '八' => 8,
    '九' => 9,
};

static ROMAN_RE: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(r"^(?=[MDCLXVI])M*(C[MD]|D?C{0,3})(X[CL]|L?X{0,3})(I[XV]|V?I{0,3})$").unwrap()
});

/// True if the string contains at least one CJK ideograph.
pub(crate) fn is_chinese(s: &str) -> bool {
    s.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// True if every non-space character is a CJK ideograph.
pub(crate) fn is_all_chinese(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .filter(|c| *c != ' ')
            .all(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// True if the token is a well-formed roman numeral (I, II, XIV, ...).
pub(crate) fn is_roman_numeral(s: &str) -> bool {
    ROMAN_RE.is_match(s).unwrap_or(false)
}

pub(crate) fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Title-case a Latin name: the first letter of every alphabetic run is
/// uppercased, the rest lowercased. Digits and punctuation break runs.
pub(crate) fn str_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Convert a numeral string to an integer, accepting both Arabic digits and
/// CJK numerals (一, 十二, 二十三, ...). Returns `None` for anything the
/// table cannot express; callers treat that as "field stays unset".
pub(crate) fn numeral_to_int(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if is_digits(s) {
        return s.parse().ok();
    }
    let chars: Vec<char> = s.chars().collect();
    if let Some(pos) = chars.iter().position(|c| *c == '十') {
        let tens = if pos == 0 {
            1
        } else {
            cjk_run_value(&chars[..pos])?
        };
        let units = if pos + 1 == chars.len() {
            0
        } else {
            cjk_run_value(&chars[pos + 1..])?
        };
        return Some(tens * 10 + units);
    }
    cjk_run_value(&chars)
}

/// Digit-by-digit value of a CJK numeral run ("二三" -> 23).
fn cjk_run_value(chars: &[char]) -> Option<i64> {
    let mut value = 0i64;
    for c in chars {
        if let Some(d) = CJK_DIGITS.get(c) {
            value = value.checked_mul(10)?.checked_add(*d)?;
        } else if c.is_ascii_digit() {
            value = value.checked_mul(10)?.checked_add((*c as i64) - ('0' as i64))?;
        } else {
            return None;
        }
    }
    Some(value)
}
