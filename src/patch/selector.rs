//! Selector paths addressing into YAML mappings and sequences
//!
//! ```text
//! /indicators/0/promql            plain keys and numeric indexes
//! /indicators/name=latency        first sequence element whose `name` is `latency`
//! /indicators/0/thresholds?/-     `?` creates a missing container, `-` appends
//! ```

use std::fmt;
use std::str::FromStr;

/// One step of a selector path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Key { name: String, optional: bool },
    Index(usize),
    Append,
    Match {
        key: String,
        value: String,
        optional: bool,
    },
}

impl Token {
    /// Whether a container created in front of this token should be a
    /// sequence
    pub fn wants_sequence(&self) -> bool {
        matches!(self, Token::Index(_) | Token::Append | Token::Match { .. })
    }

    fn parse(segment: &str) -> Result<Self, String> {
        let (body, optional) = match segment.strip_suffix('?') {
            Some(body) => (body, true),
            None => (segment, false),
        };

        if body.is_empty() {
            return Err("empty path segment".to_string());
        }

        if body == "-" {
            return Ok(Token::Append);
        }

        if let Some((key, value)) = body.split_once('=') {
            if key.is_empty() {
                return Err(format!("segment {segment:?} has no key before '='"));
            }
            return Ok(Token::Match {
                key: unescape(key),
                value: unescape(value),
                optional,
            });
        }

        if !optional && body.bytes().all(|b| b.is_ascii_digit()) {
            return body
                .parse()
                .map(Token::Index)
                .map_err(|e| format!("segment {segment:?} is not a valid index: {e}"));
        }

        Ok(Token::Key {
            name: unescape(body),
            optional,
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Key { name, optional } => {
                write!(f, "{}{}", escape(name), if *optional { "?" } else { "" })
            }
            Token::Index(idx) => write!(f, "{idx}"),
            Token::Append => f.write_str("-"),
            Token::Match {
                key,
                value,
                optional,
            } => write!(
                f,
                "{}={}{}",
                escape(key),
                escape(value),
                if *optional { "?" } else { "" }
            ),
        }
    }
}

/// A parsed selector path. The empty token list addresses the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tokens: Vec<Token>,
}

impl Selector {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromStr for Selector {
    type Err = String;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let Some(rest) = path.strip_prefix('/') else {
            return Err(format!("path {path:?} must start with '/'"));
        };

        if rest.is_empty() {
            return Ok(Selector { tokens: Vec::new() });
        }

        let tokens = rest
            .split('/')
            .map(Token::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("path {path:?}: {e}"))?;

        Ok(Selector { tokens })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tokens.is_empty() {
            return f.write_str("/");
        }
        for token in &self.tokens {
            write!(f, "/{token}")?;
        }
        Ok(())
    }
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
