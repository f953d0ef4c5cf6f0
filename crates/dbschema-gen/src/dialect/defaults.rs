//! Column default classification.
//!
//! A catalog default is either a literal the schema can carry as a static
//! default, or an expression the engine evaluates at write time. Computed
//! defaults never become static defaults, and the field is made optional so
//! clients may omit it.
//!
//! Detection is a best-effort heuristic, not a SQL parser. An expression is
//! recognized by its `IDENT(...)` shape, possibly wrapped in parentheses.
//! A quoted literal is recognized by its leading quote, so `'f(x)'` stays a
//! literal.

use crate::core::schema::{DefaultValue, Engine};

/// Bare keywords MySQL reports for temporal expression defaults.
const MYSQL_TEMPORAL_KEYWORDS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NOW",
    "UTC_TIMESTAMP",
];

/// Classify a raw catalog default for the given engine.
///
/// Never fails: anything that is not recognizably a literal is treated as
/// computed.
pub fn classify_default(engine: Engine, raw: Option<&str>) -> Option<DefaultValue> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() && engine == Engine::Postgres {
        return None;
    }

    if is_computed_expression(trimmed) {
        return Some(DefaultValue::Computed(trimmed.to_string()));
    }

    match engine {
        Engine::MySql => {
            if is_mysql_temporal_keyword(trimmed) {
                Some(DefaultValue::Computed(trimmed.to_string()))
            } else {
                // MySQL reports literal defaults unquoted
                Some(DefaultValue::Literal(raw.to_string()))
            }
        }
        Engine::Postgres => {
            let unwrapped = strip_outer_parens(trimmed);
            if is_null_literal(unwrapped) {
                None
            } else if let Some(text) = postgres_quoted_literal(unwrapped) {
                Some(DefaultValue::Literal(text))
            } else if is_numeric_literal(unwrapped) || is_boolean_literal(unwrapped) {
                Some(DefaultValue::Literal(unwrapped.to_string()))
            } else {
                Some(DefaultValue::Computed(trimmed.to_string()))
            }
        }
    }
}

/// Whether a default looks like an engine-computed expression.
///
/// Matches `IDENT(...)` with balanced parentheses, optionally wrapped in any
/// number of outer parentheses, and bare parenthesized non-literal
/// expressions such as `(uuid())`.
pub fn is_computed_expression(text: &str) -> bool {
    let text = text.trim();
    let unwrapped = strip_outer_parens(text);

    if is_function_call(unwrapped) {
        return true;
    }

    // "(a + b)" is an expression, "(-1)" and "('x')" are still literals
    unwrapped.len() != text.len()
        && !is_numeric_literal(unwrapped)
        && !is_boolean_literal(unwrapped)
        && !unwrapped.starts_with('\'')
        && !unwrapped.starts_with('"')
}

/// `IDENT(...)` where the parenthesis opened after the identifier closes at
/// the very end of the text.
fn is_function_call(text: &str) -> bool {
    let ident_len = text
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    if ident_len == 0 || text[..ident_len].starts_with(|c: char| c.is_ascii_digit()) {
        return false;
    }
    let rest = &text[ident_len..];
    rest.starts_with('(') && closing_paren(rest) == Some(rest.len() - 1)
}

/// Index of the parenthesis closing the one at position 0, skipping quoted
/// sections.
fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (idx, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

/// Remove parentheses that wrap the whole text.
fn strip_outer_parens(mut text: &str) -> &str {
    while text.starts_with('(') && closing_paren(text) == Some(text.len() - 1) {
        text = text[1..text.len() - 1].trim();
    }
    text
}

fn is_mysql_temporal_keyword(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    let keyword = upper.split('(').next().unwrap_or_default().trim();
    MYSQL_TEMPORAL_KEYWORDS.contains(&keyword)
}

fn is_null_literal(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    upper == "NULL" || upper.starts_with("NULL::")
}

fn is_boolean_literal(text: &str) -> bool {
    text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false")
}

fn is_numeric_literal(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
}

/// `'text'` or `'text'::type`, with `''` escapes. Returns the unescaped text.
fn postgres_quoted_literal(text: &str) -> Option<String> {
    let body = text.strip_prefix('\'')?;
    let mut value = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                value.push('\'');
                continue;
            }
            let rest = &body[idx + 1..];
            return (rest.is_empty() || rest.starts_with("::")).then_some(value);
        }
        value.push(c);
    }
    None
}
