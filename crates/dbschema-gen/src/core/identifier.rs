//! Identifier normalization for generated schema names.
//!
//! Database identifiers are frequently illegal or non-idiomatic as schema
//! names (`user-accounts`, `2fa_codes`, `Order Items`). The functions here map
//! them to IDL-legal names:
//!
//! - [`to_type_name`]: PascalCase, singularized (`user_accounts` → `UserAccount`)
//! - [`to_field_name`]: camelCase (`created-at` → `createdAt`)
//!
//! Both are total: every input, including empty strings and pure punctuation,
//! produces a valid name. The mapping must stay stable between runs because a
//! previously generated document is matched against fresh output by name.

/// Suffix rewrites applied to the concatenated type name, longest first.
///
/// An entry whose replacement equals its suffix protects words that already
/// end in `s` (`Address`, `Status`, `Analysis`) from the trailing `s` rule.
const SINGULAR_SUFFIXES: &[(&str, &str)] = &[
    ("ouses", "ouse"),
    ("aches", "ache"),
    ("sses", "ss"),
    ("uses", "us"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("ies", "y"),
    ("xes", "x"),
    ("ss", "ss"),
    ("us", "us"),
    ("is", "is"),
    ("s", ""),
];

/// Check whether a name is a legal IDL identifier: `[_A-Za-z][_0-9A-Za-z]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Convert a raw table (or enum) name to a PascalCase, singular type name.
///
/// Falls back to `Model<digits>` when nothing usable remains, using any
/// numerals found in the input.
///
/// # Examples
///
/// ```
/// use dbschema_gen::core::identifier::to_type_name;
///
/// assert_eq!(to_type_name("blog_posts"), "BlogPost");
/// assert_eq!(to_type_name("salaries"), "Salary");
/// assert_eq!(to_type_name("2024"), "Model2024");
/// ```
pub fn to_type_name(raw: &str) -> String {
    let segments = segments(raw);
    if segments.is_empty() {
        return fallback("Model", raw);
    }

    let joined: String = segments.iter().map(|s| capitalize(s)).collect();
    singularize(&joined)
}

/// Convert a raw column name to a camelCase field name.
///
/// Only the first character of the leading segment is lower-cased, so a
/// leading acronym keeps the rest of its case (`ID` → `iD`). Falls back to
/// `field<digits>` when nothing usable remains.
pub fn to_field_name(raw: &str) -> String {
    let segments = segments(raw);
    if segments.is_empty() {
        return fallback("field", raw);
    }

    let mut name = String::with_capacity(raw.len());
    for (idx, segment) in segments.iter().enumerate() {
        if idx == 0 {
            name.push_str(&decapitalize(segment));
        } else {
            name.push_str(&capitalize(segment));
        }
    }
    name
}

/// Apply the suffix table to a concatenated PascalCase name.
pub fn singularize(name: &str) -> String {
    for (suffix, replacement) in SINGULAR_SUFFIXES {
        if name.len() > suffix.len() && name.ends_with(suffix) {
            let stem = &name[..name.len() - suffix.len()];
            return format!("{}{}", stem, replacement);
        }
    }
    name.to_string()
}

/// Split on non-alphanumeric runs, dropping leading segments that can't
/// start an identifier.
fn segments(raw: &str) -> Vec<String> {
    let mut parts: Vec<&str> = raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect();

    while let Some(first) = parts.first() {
        if first.chars().all(|c| c.is_ascii_digit()) {
            parts.remove(0);
        } else {
            break;
        }
    }

    let mut owned: Vec<String> = parts.into_iter().map(str::to_string).collect();
    // "3d_models" -> "d", "models": an identifier can't start with a digit
    if let Some(first) = owned.first_mut() {
        *first = first.trim_start_matches(|c: char| c.is_ascii_digit()).to_string();
    }
    owned
}

fn fallback(prefix: &str, raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{}{}", prefix, digits)
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn decapitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
