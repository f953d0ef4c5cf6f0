//! Reader for previously generated (and possibly hand-edited) IDL documents.
//!
//! Only the structure regeneration needs is modelled: definitions, their
//! directives and fields, and directive arguments. Every definition, field
//! and directive also keeps its verbatim source text so user additions can
//! be copied forward byte for byte.

use crate::error::{GenError, Result};

/// Keywords that start a top-level definition.
const DEFINITION_KEYWORDS: &[&str] = &[
    "type",
    "interface",
    "input",
    "enum",
    "scalar",
    "union",
    "directive",
    "extend",
    "schema",
];

/// Directives that declare relationships between models.
pub const RELATIONSHIP_DIRECTIVES: &[&str] = &["hasMany", "hasOne", "belongsTo", "manyToMany"];

/// A literal argument or default value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a list of strings, if it is exactly that.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Value::List(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<(String, Value)>,
    /// Verbatim source, from `@` to the closing parenthesis.
    pub text: String,
}

impl Directive {
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    /// Type syntax as written (`[Int!]!`).
    pub type_text: String,
    /// Default value of an input field.
    pub default: Option<Value>,
    /// Verbatim source of the default value.
    pub default_text: Option<String>,
    pub directives: Vec<Directive>,
    /// Verbatim source, including any description.
    pub text: String,
}

impl FieldDef {
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }

    /// Source column named by `@refersTo`.
    pub fn refers_to(&self) -> Option<&str> {
        refers_to(&self.directives)
    }

    pub fn is_relationship(&self) -> bool {
        self.directives
            .iter()
            .any(|d| RELATIONSHIP_DIRECTIVES.contains(&d.name.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// `type`, `input`, `enum`, `scalar`, ...
    pub keyword: String,
    pub name: String,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDef>,
    /// Enum values.
    pub values: Vec<String>,
    /// Verbatim source, including any description.
    pub text: String,
}

impl Definition {
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_model(&self) -> bool {
        self.keyword == "type" && self.directive("model").is_some()
    }

    /// Source table named by `@refersTo`.
    pub fn refers_to(&self) -> Option<&str> {
        refers_to(&self.directives)
    }
}

fn refers_to(directives: &[Directive]) -> Option<&str> {
    directives
        .iter()
        .find(|d| d.name == "refersTo")
        .and_then(|d| d.argument("name"))
        .and_then(Value::as_str)
}

/// A parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

impl Document {
    /// Parse document text.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };
        let mut definitions = Vec::new();
        while !parser.at_end() {
            definitions.push(parser.definition()?);
        }
        Ok(Self { definitions })
    }

    /// First definition with a given keyword and name.
    pub fn find(&self, keyword: &str, name: &str) -> Option<&Definition> {
        self.definitions
            .iter()
            .find(|d| d.keyword == keyword && d.name == name)
    }

    /// Definitions carrying `@model`.
    pub fn models(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter().filter(|d| d.is_model())
    }
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Name(String),
    Str(String),
    Number(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    start: usize,
    end: usize,
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())].matches('\n').count() + 1
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> GenError {
        GenError::idl(line_of(self.src, offset), message)
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                // Commas are insignificant
                c if c.is_whitespace() || c == ',' || c == '\u{feff}' => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '"' => {
                    let value = if self.src[self.pos..].starts_with("\"\"\"") {
                        self.block_string()?
                    } else {
                        self.string()?
                    };
                    tokens.push(Token {
                        tok: Tok::Str(value),
                        start,
                        end: self.pos,
                    });
                }
                c if c == '_' || c.is_ascii_alphabetic() => {
                    while matches!(self.peek(), Some(c) if c == '_' || c.is_ascii_alphanumeric()) {
                        self.bump();
                    }
                    tokens.push(Token {
                        tok: Tok::Name(self.src[start..self.pos].to_string()),
                        start,
                        end: self.pos,
                    });
                }
                c if c == '-' || c.is_ascii_digit() => {
                    self.bump();
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
                    {
                        self.bump();
                    }
                    tokens.push(Token {
                        tok: Tok::Number(self.src[start..self.pos].to_string()),
                        start,
                        end: self.pos,
                    });
                }
                '!' | '$' | '&' | '(' | ')' | ':' | '=' | '@' | '[' | ']' | '{' | '}' | '|' => {
                    self.bump();
                    tokens.push(Token {
                        tok: Tok::Punct(c),
                        start,
                        end: self.pos,
                    });
                }
                '.' if self.src[self.pos..].starts_with("...") => {
                    self.pos += 3;
                    tokens.push(Token {
                        tok: Tok::Punct('.'),
                        start,
                        end: self.pos,
                    });
                }
                other => return Err(self.error(start, format!("unexpected character '{}'", other))),
            }
        }
        Ok(tokens)
    }

    fn string(&mut self) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error(start, "unterminated string")),
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('b') => value.push('\u{8}'),
                    Some('f') => value.push('\u{c}'),
                    Some('u') => {
                        let hex: String = (0..4).filter_map(|_| self.bump()).collect();
                        let ch = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| self.error(start, format!("invalid escape \\u{}", hex)))?;
                        value.push(ch);
                    }
                    Some(c @ ('"' | '\\' | '/')) => value.push(c),
                    Some(c) => return Err(self.error(start, format!("invalid escape \\{}", c))),
                    None => return Err(self.error(start, "unterminated string")),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn block_string(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 3;
        let mut value = String::new();
        loop {
            let rest = &self.src[self.pos..];
            if rest.starts_with("\\\"\"\"") {
                value.push_str("\"\"\"");
                self.pos += 4;
            } else if rest.starts_with("\"\"\"") {
                self.pos += 3;
                return Ok(value);
            } else {
                match self.bump() {
                    Some(c) => value.push(c),
                    None => return Err(self.error(start, "unterminated block string")),
                }
            }
        }
    }
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Tok::Punct(c))
    }

    fn start_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.start)
            .unwrap_or(self.source.len())
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.end)
            .unwrap_or(0)
    }

    fn error(&self, message: impl Into<String>) -> GenError {
        GenError::idl(line_of(self.source, self.start_offset()), message)
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|t| t.tok.clone());
        self.pos += 1;
        tok
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        if self.is_punct(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn expect_name(&mut self) -> Result<String> {
        match self.peek() {
            Some(Tok::Name(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("expected a name")),
        }
    }

    fn skip_description(&mut self) {
        if matches!(self.peek(), Some(Tok::Str(_))) {
            self.pos += 1;
        }
    }

    fn text(&self, start: usize) -> String {
        self.source[start..self.prev_end().max(start)].to_string()
    }

    fn at_definition_start(&self) -> bool {
        match self.peek() {
            Some(Tok::Str(_)) => true,
            Some(Tok::Name(name)) => DEFINITION_KEYWORDS.contains(&name.as_str()),
            _ => false,
        }
    }

    fn definition(&mut self) -> Result<Definition> {
        let start = self.start_offset();
        self.skip_description();
        let keyword = self.expect_name()?;
        match keyword.as_str() {
            "type" | "interface" | "input" => self.object(keyword, start),
            "enum" => self.enumeration(start),
            "scalar" | "union" | "directive" | "extend" | "schema" => self.other(keyword, start),
            other => Err(self.error(format!("unexpected '{}' at top level", other))),
        }
    }

    fn object(&mut self, keyword: String, start: usize) -> Result<Definition> {
        let name = self.expect_name()?;

        if self.peek() == Some(&Tok::Name("implements".to_string())) {
            self.pos += 1;
            while self.is_punct('&')
                || (matches!(self.peek(), Some(Tok::Name(_))) && !self.at_definition_start())
            {
                self.pos += 1;
            }
        }

        let directives = self.directives()?;
        let mut fields = Vec::new();
        if self.is_punct('{') {
            self.pos += 1;
            while !self.is_punct('}') {
                if self.at_end() {
                    return Err(self.error(format!("unterminated body of {}", name)));
                }
                let field = self.field()?;
                if fields.iter().any(|f: &FieldDef| f.name == field.name) {
                    return Err(self.error(format!("duplicate field {}.{}", name, field.name)));
                }
                fields.push(field);
            }
            self.pos += 1;
        }

        Ok(Definition {
            keyword,
            name,
            directives,
            fields,
            values: Vec::new(),
            text: self.text(start),
        })
    }

    fn enumeration(&mut self, start: usize) -> Result<Definition> {
        let name = self.expect_name()?;
        let directives = self.directives()?;
        let mut values = Vec::new();
        if self.is_punct('{') {
            self.pos += 1;
            while !self.is_punct('}') {
                if self.at_end() {
                    return Err(self.error(format!("unterminated body of {}", name)));
                }
                self.skip_description();
                values.push(self.expect_name()?);
                self.directives()?;
            }
            self.pos += 1;
        }

        Ok(Definition {
            keyword: "enum".to_string(),
            name,
            directives,
            fields: Vec::new(),
            values,
            text: self.text(start),
        })
    }

    /// Definitions regeneration never looks inside: consumed up to the next
    /// top-level definition.
    fn other(&mut self, keyword: String, start: usize) -> Result<Definition> {
        if keyword == "extend" {
            // the extended kind is itself a keyword
            self.expect_name()?;
        }
        if self.is_punct('@') {
            self.pos += 1;
        }
        let name = match self.peek() {
            Some(Tok::Name(name)) if !DEFINITION_KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.pos += 1;
                name
            }
            _ => keyword.clone(),
        };

        let mut depth = 0usize;
        while !self.at_end() {
            if depth == 0 && self.at_definition_start() {
                break;
            }
            match self.advance() {
                Some(Tok::Punct('(' | '[' | '{')) => depth += 1,
                Some(Tok::Punct(')' | ']' | '}')) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.error("unbalanced closing bracket"))?;
                }
                _ => {}
            }
        }
        if depth > 0 {
            return Err(self.error(format!("unterminated definition {}", name)));
        }

        Ok(Definition {
            keyword,
            name,
            directives: Vec::new(),
            fields: Vec::new(),
            values: Vec::new(),
            text: self.text(start),
        })
    }

    fn field(&mut self) -> Result<FieldDef> {
        let start = self.start_offset();
        self.skip_description();
        let name = self.expect_name()?;

        if self.is_punct('(') {
            self.skip_balanced('(', ')')?;
        }
        self.expect_punct(':')?;

        let type_start = self.start_offset();
        self.type_ref()?;
        let type_text = self.source[type_start..self.prev_end()].to_string();

        let (default, default_text) = if self.is_punct('=') {
            self.pos += 1;
            let value_start = self.start_offset();
            let value = self.value()?;
            (Some(value), Some(self.text(value_start)))
        } else {
            (None, None)
        };

        let directives = self.directives()?;
        Ok(FieldDef {
            name,
            type_text,
            default,
            default_text,
            directives,
            text: self.text(start),
        })
    }

    fn type_ref(&mut self) -> Result<()> {
        if self.is_punct('[') {
            self.pos += 1;
            self.type_ref()?;
            self.expect_punct(']')?;
        } else {
            self.expect_name()?;
        }
        if self.is_punct('!') {
            self.pos += 1;
        }
        Ok(())
    }

    fn skip_balanced(&mut self, open: char, close: char) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Some(Tok::Punct(c)) if c == open => depth += 1,
                Some(Tok::Punct(c)) if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
                None => return Err(self.error(format!("expected '{}'", close))),
            }
        }
    }

    fn directives(&mut self) -> Result<Vec<Directive>> {
        let mut directives = Vec::new();
        while self.is_punct('@') {
            let start = self.start_offset();
            self.pos += 1;
            let name = self.expect_name()?;
            let mut arguments = Vec::new();
            if self.is_punct('(') {
                self.pos += 1;
                while !self.is_punct(')') {
                    let arg = self.expect_name()?;
                    self.expect_punct(':')?;
                    arguments.push((arg, self.value()?));
                }
                self.pos += 1;
            }
            directives.push(Directive {
                name,
                arguments,
                text: self.text(start),
            });
        }
        Ok(directives)
    }

    fn value(&mut self) -> Result<Value> {
        match self.advance() {
            Some(Tok::Str(s)) => Ok(Value::String(s)),
            Some(Tok::Number(n)) => Ok(Value::Number(n)),
            Some(Tok::Name(name)) => Ok(match name.as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                "null" => Value::Null,
                _ => Value::Enum(name),
            }),
            Some(Tok::Punct('[')) => {
                let mut items = Vec::new();
                while !self.is_punct(']') {
                    if self.at_end() {
                        return Err(self.error("unterminated list"));
                    }
                    items.push(self.value()?);
                }
                self.pos += 1;
                Ok(Value::List(items))
            }
            Some(Tok::Punct('{')) => {
                let mut entries = Vec::new();
                while !self.is_punct('}') {
                    let key = self.expect_name()?;
                    self.expect_punct(':')?;
                    entries.push((key, self.value()?));
                }
                self.pos += 1;
                Ok(Value::Object(entries))
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error("expected a value"))
            }
        }
    }
}
