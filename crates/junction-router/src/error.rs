//! Routing error types.

use thiserror::Error;

/// Result type alias using [`RouteError`].
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors raised while registering routes or resolving request verbs.
///
/// Every variant except [`RouteError::UnsupportedMethod`] is a setup-time
/// error: it is returned from a registration call and never produced while
/// a request is being dispatched. `UnsupportedMethod` is raised both when
/// a route is registered for such a verb and when a request arrives with
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A path template could not be compiled.
    #[error("invalid path template '{template}': {reason}")]
    InvalidPattern {
        /// The offending template.
        template: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A symbol appears more than once in the same template.
    #[error("symbol ':{symbol}' appears more than once in '{template}'")]
    DuplicateSymbol {
        /// The repeated symbol name.
        symbol: String,
        /// The offending template.
        template: String,
    },

    /// A hook or scope expression is not a valid regular expression.
    #[error("invalid path expression '{expression}': {reason}")]
    InvalidExpression {
        /// The offending expression.
        expression: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A verb selector names a method outside the supported set.
    #[error("unsupported method: {method}")]
    UnsupportedMethod {
        /// The rejected method, upper-cased.
        method: String,
    },

    /// A verb selector string could not be parsed.
    #[error("invalid route selector '{selector}': {reason}")]
    InvalidSelector {
        /// The offending selector.
        selector: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A handler chain was registered without any links.
    #[error("handler chain for '{template}' is empty")]
    EmptyChain {
        /// The template the chain was registered for.
        template: String,
    },

    /// A handler chain does not end with a terminal handler, or has a
    /// terminal handler before its last position.
    #[error("handler chain for '{template}' is malformed: {reason}")]
    MalformedChain {
        /// The template the chain was registered for.
        template: String,
        /// What is wrong with the chain.
        reason: String,
    },

    /// A base URL could not be reduced to a path prefix.
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected base URL.
        url: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The configured method override header is not a valid header name.
    #[error("invalid method override header '{header}'")]
    InvalidOverrideHeader {
        /// The rejected header name.
        header: String,
    },
}

impl RouteError {
    /// Creates an invalid pattern error.
    pub fn invalid_pattern(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid expression error.
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported method error.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Creates an invalid selector error.
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed chain error.
    pub fn malformed_chain(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedChain {
            template: template.into(),
            reason: reason.into(),
        }
    }
}
