//! Hand-written format predicates (no regex).

pub fn is_email(s: &str) -> bool {
    // local@domain, basic RFC-like check
    let at = match s.rfind('@') {
        Some(pos) if pos > 0 => pos,
        _ => return false,
    };
    let local = &s[..at];
    let domain = &s[at + 1..];

    if local.is_empty() || local.len() > 64 || domain.is_empty() {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    // Local part: printable ASCII except some specials, no spaces
    for ch in local.chars() {
        if ch.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(ch) {
            continue;
        }
        return false;
    }

    domain.contains('.') && is_hostname(domain)
}

pub fn is_uuid(s: &str) -> bool {
    // 8-4-4-4-12 hex with dashes: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
    if s.len() != 36 {
        return false;
    }
    let bytes = s.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match i {
            8 | 13 | 18 | 23 => {
                if b != b'-' {
                    return false;
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return false;
                }
            }
        }
    }
    true
}

/// UUID of a specific version (1-8). The version nibble is the first digit
/// of the third group.
pub fn is_uuid_version(s: &str, version: u32) -> bool {
    is_uuid(s) && s[14..15].chars().next().and_then(|c| c.to_digit(16)) == Some(version)
}

pub fn is_url(s: &str) -> bool {
    let rest = ["https://", "http://", "ftp://"]
        .iter()
        .find_map(|scheme| s.strip_prefix(scheme))
        .unwrap_or(s);
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return false;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    // Drop userinfo and port.
    let host_port = authority.rsplit('@').next().unwrap_or("");
    let host = match host_port.rsplit_once(':') {
        Some((h, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => h,
        _ => host_port,
    };
    if host == "localhost" || is_ipv4(host) {
        return true;
    }
    host.contains('.') && is_hostname(host)
}

pub fn is_ipv4(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    for part in parts {
        if part.is_empty() || part.len() > 3 {
            return false;
        }
        // No leading zeros (except "0" itself)
        if part.len() > 1 && part.starts_with('0') {
            return false;
        }
        match part.parse::<u16>() {
            Ok(n) if n <= 255 => {}
            _ => return false,
        }
    }
    true
}

pub fn is_ipv6(s: &str) -> bool {
    if s == "::" {
        return true;
    }

    let (left, right) = match s.find("::") {
        Some(pos) => (&s[..pos], &s[pos + 2..]),
        None => (s, ""),
    };
    let has_double_colon = s.contains("::");
    if has_double_colon && right.contains("::") {
        return false;
    }

    let groups = |part: &str| -> Vec<String> {
        if part.is_empty() {
            vec![]
        } else {
            part.split(':').map(str::to_string).collect()
        }
    };
    let left_groups = groups(left);
    let right_groups = groups(right);
    let total = left_groups.len() + right_groups.len();

    if has_double_colon {
        if total > 7 {
            return false;
        }
    } else if total != 8 {
        return false;
    }

    left_groups.iter().chain(right_groups.iter()).all(|group| {
        !group.is_empty() && group.len() <= 4 && group.chars().all(|c| c.is_ascii_hexdigit())
    })
}

pub fn is_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }
    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }
    true
}

pub fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn is_alphanumeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Optional sign followed by digits only.
pub fn is_numeric(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_int(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    // No leading zeros.
    digits == "0" || !digits.starts_with('0')
}

pub fn is_float(s: &str) -> bool {
    let t = s.trim();
    !t.is_empty()
        && t != "."
        && !t.eq_ignore_ascii_case("nan")
        && !t.to_ascii_lowercase().contains("inf")
        && t.parse::<f64>().is_ok()
}

/// Digits with an optional single decimal point.
pub fn is_decimal(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    match frac_part {
        Some(f) => !f.is_empty() && all_digits(f) && all_digits(int_part),
        None => !int_part.is_empty() && all_digits(int_part),
    }
}

pub fn is_hexadecimal(s: &str) -> bool {
    let body = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    !body.is_empty() && body.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Luhn checksum over 12-19 digits; spaces and dashes are ignored.
pub fn is_credit_card(s: &str) -> bool {
    let digits: Vec<u32> = s
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    if !(12..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
