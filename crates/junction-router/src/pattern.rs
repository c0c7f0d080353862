//! Path template compilation.
//!
//! A template is literal text interleaved with symbol tokens. The compiler
//! turns it into an anchored regular expression with one named group per
//! symbol, matched against normalized paths (no leading or trailing slash,
//! query stripped, percent-decoded).
//!
//! # Syntax
//!
//! | Token        | Meaning                                              |
//! |--------------|------------------------------------------------------|
//! | `:name`      | one or more non-slash characters, captured as `name` |
//! | `:name@expr` | `expr` captured as `name`; `expr` runs to the next `/`, `(` or `)` |
//! | `( ... )`    | optional section                                     |
//! | `*`          | any run of characters, slashes included (lazy)       |
//!
//! Every other character is matched literally.

use std::collections::HashSet;
use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::{RouteError, RouteResult};
use crate::params::Params;

/// Default expression for a symbol without an explicit class.
const SEGMENT: &str = "[^/]+";

/// Compiles path templates into anchored matchers.
///
/// # Example
///
/// ```rust
/// use junction_router::PatternCompiler;
///
/// let pattern = PatternCompiler::new().compile("/users/:id@\\d+").unwrap();
///
/// assert_eq!(pattern.symbols(), ["id"]);
/// assert!(pattern.is_match("users/42"));
/// assert!(!pattern.is_match("users/ada"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternCompiler {
    case_sensitive: bool,
}

impl PatternCompiler {
    /// Creates a case-insensitive compiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether compiled matchers distinguish letter case.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Returns true if this compiler produces case-sensitive matchers.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Compiles a route template.
    pub fn compile(&self, template: &str) -> RouteResult<CompiledPattern> {
        let trimmed = template.trim_matches('/');
        let (source, symbols) = translate(trimmed)?;

        let matcher = RegexBuilder::new(&format!("^{source}$"))
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| RouteError::invalid_pattern(template, e.to_string()))?;

        Ok(CompiledPattern {
            template: trimmed.to_string(),
            matcher,
            symbols,
        })
    }

    /// Compiles a free-form hook expression.
    ///
    /// Expressions are plain regular expressions and are not anchored, so
    /// `^admin` scopes a hook to every path under `admin`.
    pub fn compile_expression(&self, expression: &str) -> RouteResult<Regex> {
        RegexBuilder::new(expression)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| RouteError::invalid_expression(expression, e.to_string()))
    }
}

/// A compiled route template.
#[derive(Clone)]
pub struct CompiledPattern {
    template: String,
    matcher: Regex,
    symbols: Vec<String>,
}

impl CompiledPattern {
    /// Returns the template with surrounding slashes removed.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the symbol names in the order they appear in the template.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Returns the anchored regular expression source.
    pub fn as_str(&self) -> &str {
        self.matcher.as_str()
    }

    /// Returns true if the normalized path matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Matches the normalized path and returns the captured symbols.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.matcher.captures(path)?;
        let mut params = Params::new();
        for name in &self.symbols {
            if let Some(value) = caps.name(name) {
                params.push(name.as_str(), value.as_str());
            }
        }
        Some(params)
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("template", &self.template)
            .field("matcher", &self.matcher.as_str())
            .field("symbols", &self.symbols)
            .finish()
    }
}

const fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrites a trimmed template into regex source plus its symbol list.
fn translate(template: &str) -> RouteResult<(String, Vec<String>)> {
    let mut source = String::with_capacity(template.len() * 2);
    let mut symbols: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    let mut literal = String::new();
    let mut depth = 0usize;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek().copied().is_some_and(is_symbol_start) => {
                flush_literal(&mut source, &mut literal);

                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if !is_symbol_char(n) {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }

                let class = if chars.peek() == Some(&'@') {
                    chars.next();
                    let mut class = String::new();
                    while let Some(&n) = chars.peek() {
                        if matches!(n, '/' | '(' | ')') {
                            break;
                        }
                        class.push(n);
                        chars.next();
                    }
                    if class.is_empty() {
                        return Err(RouteError::invalid_pattern(
                            template,
                            format!("symbol ':{name}' has an empty class"),
                        ));
                    }
                    class
                } else {
                    SEGMENT.to_string()
                };

                if !seen.insert(name.clone()) {
                    return Err(RouteError::DuplicateSymbol {
                        symbol: name,
                        template: template.to_string(),
                    });
                }

                source.push_str(&format!("(?P<{name}>{class})"));
                symbols.push(name);
            }
            '(' => {
                flush_literal(&mut source, &mut literal);
                depth += 1;
                source.push_str("(?:");
            }
            ')' => {
                flush_literal(&mut source, &mut literal);
                if depth == 0 {
                    return Err(RouteError::invalid_pattern(template, "unbalanced ')'"));
                }
                depth -= 1;
                source.push_str(")?");
            }
            '*' => {
                flush_literal(&mut source, &mut literal);
                source.push_str(".*?");
            }
            other => literal.push(other),
        }
    }

    if depth != 0 {
        return Err(RouteError::invalid_pattern(template, "unbalanced '('"));
    }
    flush_literal(&mut source, &mut literal);

    Ok((source, symbols))
}

fn flush_literal(source: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        source.push_str(&regex::escape(literal));
        literal.clear();
    }
}
