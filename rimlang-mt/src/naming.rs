//! Naming-pattern analysis for identifier-like strings
//!
//! Some translatable values are really identifiers (`fire_damage`,
//! `fireDamage`). Knowing how the source was put together lets the
//! alternatives generator offer a translation in the same shape.

use std::fmt;

/// How a string joins its words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingStyle {
    /// `fire_damage`
    SnakeCase,
    /// `fireDamage`, `FireDamage`
    CamelCase,
    /// `Fire Damage`
    Spaced,
    /// A single word
    Atomic,
}

impl NamingStyle {
    pub fn separator(&self) -> &'static str {
        match self {
            NamingStyle::SnakeCase => "_",
            NamingStyle::Spaced => " ",
            NamingStyle::CamelCase | NamingStyle::Atomic => "",
        }
    }
}

impl fmt::Display for NamingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NamingStyle::SnakeCase => "snake_case",
            NamingStyle::CamelCase => "CamelCase",
            NamingStyle::Spaced => "spaced",
            NamingStyle::Atomic => "atomic",
        })
    }
}

/// Shape of a source string, computed by [`analyze`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPattern {
    pub has_underscore: bool,
    /// An uppercase character somewhere after the first
    pub has_internal_uppercase: bool,
    pub has_space: bool,
    pub style: NamingStyle,
    /// Words in source order; snake_case keeps empty parts from `a__b`
    pub parts: Vec<String>,
}

impl NamingPattern {
    pub fn separator(&self) -> &'static str {
        self.style.separator()
    }

    pub fn is_snake_case(&self) -> bool {
        self.style == NamingStyle::SnakeCase
    }

    pub fn is_camel_case(&self) -> bool {
        self.style == NamingStyle::CamelCase
    }
}

fn has_internal_uppercase(text: &str) -> bool {
    text.chars().skip(1).any(char::is_uppercase)
}

fn is_camel_case(text: &str) -> bool {
    text.chars().count() >= 2 && has_internal_uppercase(text) && !text.contains(' ')
}

/// Split before every uppercase character after the first
fn split_camel_case(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for (index, c) in text.chars().enumerate() {
        if index > 0 && c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Classify `text` and split it into words
///
/// The first matching rule wins: an underscore means snake_case, then an
/// interior uppercase letter without spaces means CamelCase, then a space
/// means space separated; anything else is one atomic word. `fire_Damage`
/// is therefore snake_case.
pub fn analyze(text: &str) -> NamingPattern {
    let has_underscore = text.contains('_');
    let has_space = text.contains(' ');

    let (style, parts) = if has_underscore {
        (
            NamingStyle::SnakeCase,
            text.split('_').map(str::to_string).collect(),
        )
    } else if is_camel_case(text) {
        (NamingStyle::CamelCase, split_camel_case(text))
    } else if has_space {
        (
            NamingStyle::Spaced,
            text.split(' ').map(str::to_string).collect(),
        )
    } else {
        (NamingStyle::Atomic, vec![text.to_string()])
    };

    NamingPattern {
        has_underscore,
        has_internal_uppercase: has_internal_uppercase(text),
        has_space,
        style,
        parts,
    }
}

/// Short description of a string's format, for display next to candidates
pub fn describe_format(text: &str) -> &'static str {
    let first_upper = text.chars().next().map(char::is_uppercase);
    if text.contains('_') {
        "with underscores"
    } else if text.contains(' ') {
        "with spaces"
    } else if first_upper == Some(true) && has_internal_uppercase(text) {
        "PascalCase"
    } else if text.chars().next().is_some_and(char::is_lowercase) && has_internal_uppercase(text)
    {
        "camelCase"
    } else {
        "simple"
    }
}
