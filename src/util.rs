// Text and number helpers used when turning warehouse values into Spanish
// presentation strings.
//
// Numbers in the documents follow the Colombian convention: "." groups
// thousands and "," separates decimals (e.g. `1.234.567,8`).
use num_format::{Locale, ToFormattedString};

/// Parse a warehouse or parameter value into `f64`.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    s.parse::<f64>().ok()
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Month parameters sometimes arrive as "3.0" from numeric columns.
    s.parse::<i32>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|v| v as i32))
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - Spanish separators (e.g., `1.234.567,89`).
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    // `num-format` groups with commas; swap them for dots.
    let mut res = int_val.to_formatted_string(&Locale::en).replace(',', ".");
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push(',');
            res.push_str(frac);
        }
    }
    // Negatives that round to zero keep their sign ("-0,0").
    if n.is_sign_negative() {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_no_decimal(n: f64) -> String {
    format_number(n, 0)
}

/// Percentages are shown with one decimal and a comma: `12,3%`.
pub fn format_percent(n: f64) -> String {
    format!("{:.1}%", n).replace('.', ",")
}

/// Capitalize every whitespace-separated word: first letter upper, rest lower.
pub fn capitalize_words(s: &str) -> String {
    s.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `"Año corrido (2024)"` becomes `"2024 Año corrido"`; names without a
/// parenthesised period are returned unchanged.
pub fn transform_year_column_name(name: &str) -> String {
    match (name.find('('), name.find(')')) {
        (Some(open), Some(_)) => {
            let year = name[..open].trim();
            let period = name[open + 1..].replace(')', "");
            format!("{} {}", period.trim(), year)
        }
        _ => name.to_string(),
    }
}

/// Text before the first `(`, trimmed. `"2024 (enero-marzo)"` gives `"2024"`.
pub fn year_prefix(s: &str) -> String {
    s.split('(').next().unwrap_or(s).trim().to_string()
}

/// "positivos" for inflows above zero, "negativos" otherwise.
pub fn inversion_palabra(value: f64) -> &'static str {
    if value > 0.0 {
        "positivos"
    } else {
        "negativos"
    }
}

pub fn variacion_palabra(value: f64) -> &'static str {
    if value > 0.0 {
        "más"
    } else {
        "menos"
    }
}

/// Round half away from zero to two decimals, as written into workbooks.
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}
