//! Exchange-native ticker to vendor ticker mapping.

/// Normalize an exchange-native ticker to the quote vendor's form.
///
/// Rules, applied in order to the uppercased trimmed input:
/// 1. Strip any trailing `.XXXX` marker (perpetual/spot suffixes).
/// 2. `…USDT` / `…BUSD` become `…/USD`.
/// 3. `…USD` with a 2-5 character A-Z prefix gets a `/` inserted
///    before `USD` (e.g. `XAUUSD` -> `XAU/USD`).
/// 4. Anything else is returned uppercased, unchanged.
///
/// Deterministic and total; never performs I/O.
pub fn normalize_symbol(raw: &str) -> String {
    let mut s = raw.trim().to_ascii_uppercase();

    if let Some(idx) = s.find('.') {
        s.truncate(idx);
    }

    if s.ends_with("USDT") || s.ends_with("BUSD") {
        let base = &s[..s.len() - 4];
        return format!("{base}/USD");
    }

    if s.ends_with("USD") && s.len() >= 6 {
        let base = &s[..s.len() - 3];
        if base.len() <= 5 && base.chars().all(|c| c.is_ascii_uppercase()) {
            return format!("{base}/USD");
        }
    }

    s
}

/// Base symbol of a canonical ticker: the prefix before any `/`.
pub fn base_symbol(canonical: &str) -> &str {
    canonical.split('/').next().unwrap_or(canonical)
}
