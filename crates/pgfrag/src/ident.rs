//! Identifier references.
//!
//! Clause keys such as `"users"`, `"users.id"` or `"users.id uid"` are parsed
//! against a fixed grammar and rendered as quoted identifiers
//! (`"users"."id" AS "uid"`). Each name segment must match
//! `[A-Za-z_][A-Za-z0-9_]*` and be at most [`MAX_IDENT_LEN`] bytes long.
//!
//! Anything that does not match is **not** an error: it resolves to
//! [`Reference::Raw`] and is emitted verbatim. This is how callers drop in
//! expressions such as `count(*)` or `"fieldA" = {#}` as keys. Keys are
//! therefore either safe identifiers or trusted SQL supplied by the
//! application; values never take this path and are always bound as
//! parameters.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum identifier length accepted by Postgres (`NAMEDATALEN - 1`).
pub const MAX_IDENT_LEN: usize = 63;

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*([A-Za-z_][A-Za-z0-9_]{0,62})(?:\.([A-Za-z_][A-Za-z0-9_]{0,62}))?(?:\s+(?:(?i:AS)\s+)?([A-Za-z_][A-Za-z0-9_]{0,62}))?\s*$",
        )
        .expect("invalid built-in identifier regex")
    })
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]{0,62})\s*$").expect("invalid built-in name regex")
    })
}

/// Quote a single identifier segment, doubling embedded `"`.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// A parsed `qualifier.name alias` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// Table (for columns) or schema (for tables).
    pub qualifier: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl Identifier {
    /// Render as quoted SQL, e.g. `"users"."id" AS "uid"`.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        if let Some(qualifier) = &self.qualifier {
            out.push_str(&quote_ident(qualifier));
            out.push('.');
        }
        out.push_str(&quote_ident(&self.name));
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            out.push_str(&quote_ident(alias));
        }
        out
    }

    /// Same identifier without its alias.
    pub fn without_alias(&self) -> Self {
        Self {
            alias: None,
            ..self.clone()
        }
    }
}

/// Parse `name`, `qualifier.name`, `name alias`, `qualifier.name alias` or
/// `qualifier.name AS alias`, ignoring surrounding whitespace.
///
/// Returns `None` when `text` is not identifier-shaped.
pub fn parse_identifier(text: &str) -> Option<Identifier> {
    let caps = identifier_re().captures(text)?;
    let first = caps.get(1)?.as_str().to_string();
    let second = caps.get(2).map(|m| m.as_str().to_string());
    let alias = caps.get(3).map(|m| m.as_str().to_string());
    let (qualifier, name) = match second {
        Some(name) => (Some(first), name),
        None => (None, first),
    };
    Some(Identifier {
        qualifier,
        name,
        alias,
    })
}

/// Parse a bare name (no qualifier, no alias).
pub fn parse_name(text: &str) -> Option<&str> {
    name_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A resolved clause key: a safe quoted identifier, or text to use verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Matched the identifier grammar; renders quoted.
    Identifier(Identifier),
    /// Did not match; trusted SQL emitted as given.
    Raw(String),
}

impl Reference {
    /// `column`, `table.column` (no alias).
    pub fn column(text: &str) -> Self {
        Self::qualified(text)
    }

    /// `name` or `qualifier.name` without an alias.
    pub fn qualified(text: &str) -> Self {
        match parse_identifier(text) {
            Some(ident) if ident.alias.is_none() => Reference::Identifier(ident),
            _ => Reference::Raw(text.to_string()),
        }
    }

    /// `column`, `table.column`, optionally followed by an alias.
    pub fn aliased_column(text: &str) -> Self {
        Self::resolve(text)
    }

    /// `table`, `schema.table`, optionally followed by an alias.
    pub fn table(text: &str) -> Self {
        Self::resolve(text)
    }

    /// A bare name, as used for aliases and CTE names.
    pub fn name(text: &str) -> Self {
        match parse_name(text) {
            Some(name) => Reference::Identifier(Identifier {
                qualifier: None,
                name: name.to_string(),
                alias: None,
            }),
            None => Reference::Raw(text.to_string()),
        }
    }

    fn resolve(text: &str) -> Self {
        match parse_identifier(text) {
            Some(ident) => Reference::Identifier(ident),
            None => Reference::Raw(text.to_string()),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Reference::Raw(_))
    }

    pub fn to_sql(&self) -> String {
        match self {
            Reference::Identifier(ident) => ident.to_sql(),
            Reference::Raw(text) => text.clone(),
        }
    }
}
