// NVMe qualified name syntax checks for the --subsystem argument
//
//   nqn.2016-06.io.spdk:cnode1
//   nqn.2014-08.org.nvmexpress:uuid:ee889718-8c69-40d3-8e78-5be049f966a6

use std::ops::RangeInclusive;

pub const LENGTH: RangeInclusive<usize> = 12..=223;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NqnError {
    #[error("nqn length is invalid, must be between 12-223 characters")]
    Length,
    #[error("nqn must begin with 'nqn.'")]
    Prefix,
    #[error("nqn must consist of 3 '.' separated qualifiers")]
    Qualifiers,
    #[error("the 2nd qualifier of an nqn must start with a YYYY-MM date")]
    Date,
    #[error("a valid nqn has either 1 or 2 ':' symbols")]
    Colons,
    #[error("nqn contains an invalid uuid suffix")]
    Uuid,
}

pub fn validate_nqn(nqn: &str) -> Result<(), NqnError> {
    if !LENGTH.contains(&nqn.len()) {
        return Err(NqnError::Length);
    }
    if !nqn.starts_with("nqn.") {
        return Err(NqnError::Prefix);
    }
    if nqn.matches('.').count() != 3 {
        return Err(NqnError::Qualifiers);
    }
    let date = nqn.split('.').nth(1).unwrap_or_default();
    if !is_year_month(date) {
        return Err(NqnError::Date);
    }
    let fields: Vec<&str> = nqn.split(':').collect();
    match fields.as_slice() {
        [_, _] => Ok(()),
        [_, "uuid", suffix] if is_uuid(suffix) => Ok(()),
        [_, _, _] => Err(NqnError::Uuid),
        _ => Err(NqnError::Colons),
    }
}

/// For clap's `value_parser`.
pub fn parse_nqn(s: &str) -> Result<String, String> {
    validate_nqn(s).map(|()| s.to_string()).map_err(|e| e.to_string())
}

fn is_year_month(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
}

/// Hyphenated, simple (32 hex digits) and braced forms.
fn is_uuid(s: &str) -> bool {
    uuid::Uuid::parse_str(s).is_ok()
}
