use std::fmt;

use rulekit_source_file::{Spanned, TextSpan};

/// The name of a static-analysis rule, e.g. `unused-binding`.
///
/// Rule names are static metadata of the rule under test, so this is a thin
/// wrapper around a `&'static str` that can be compared against the plain
/// identifier strings test authors write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleName(&'static str);

impl RuleName {
    pub const fn of(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl PartialEq<str> for RuleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identifies the kind of a diagnostic.
///
/// The two front-end conditions get their own variants so that callers can
/// never confuse them with a rule finding by filtering on identifier
/// strings: a crashed rule is a [`DiagnosticId::Panic`], not a finding named
/// "panic".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticId {
    /// The front end caught an unhandled fault inside a rule. This is the
    /// well-known crash sentinel; the runner strips it out of the ordinary
    /// diagnostic list.
    Panic,

    /// The input snippet itself failed to parse or compile.
    InvalidSyntax,

    /// A finding reported by the rule under test.
    Rule(RuleName),
}

impl DiagnosticId {
    /// Creates an id for a rule finding with the given name.
    pub const fn rule(name: &'static str) -> Self {
        Self::Rule(RuleName::of(name))
    }

    pub const fn is_rule(self) -> bool {
        matches!(self, DiagnosticId::Rule(_))
    }

    /// Returns `true` if this id is a rule finding named `name`.
    pub fn is_rule_named(self, name: &str) -> bool {
        matches!(self, DiagnosticId::Rule(rule) if rule.as_str() == name)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DiagnosticId::Panic => "panic",
            DiagnosticId::InvalidSyntax => "invalid-syntax",
            DiagnosticId::Rule(rule) => rule.as_str(),
        }
    }
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How important a diagnostic is to an end user.
///
/// Ordered so that severities can be compared: `Info < Warning < Error`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(text)
    }
}

/// A single finding produced by the analysis front end or by a rule.
///
/// Diagnostics are immutable values owned by the run that produced them;
/// consumers only read them through the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    id: DiagnosticId,
    severity: Severity,
    message: String,
    span: TextSpan,
}

impl Diagnostic {
    pub fn new(
        id: DiagnosticId,
        severity: Severity,
        message: impl Into<String>,
        span: TextSpan,
    ) -> Self {
        Self {
            id,
            severity,
            message: message.into(),
            span,
        }
    }

    /// A rule finding with the given rule name.
    pub fn rule(
        name: &'static str,
        severity: Severity,
        message: impl Into<String>,
        span: TextSpan,
    ) -> Self {
        Self::new(DiagnosticId::rule(name), severity, message, span)
    }

    /// A compile-time error in the input snippet itself.
    pub fn invalid_syntax(message: impl Into<String>, span: TextSpan) -> Self {
        Self::new(DiagnosticId::InvalidSyntax, Severity::Error, message, span)
    }

    /// The crash sentinel a front end reports when a rule faults.
    ///
    /// Carries no meaningful span; the fault is not anchored in the snippet.
    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(
            DiagnosticId::Panic,
            Severity::Error,
            message,
            TextSpan::empty(0),
        )
    }

    pub fn id(&self) -> DiagnosticId {
        self.id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Spanned for Diagnostic {
    fn span(&self) -> TextSpan {
        self.span
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{severity}[{id}] at {span}: {message}",
            severity = self.severity,
            id = self.id,
            span = self.span,
            message = self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use rulekit_source_file::{Spanned, TextSpan};

    use crate::{Diagnostic, DiagnosticId, Severity};

    #[test]
    fn id_filtering_never_matches_front_end_conditions() {
        assert!(DiagnosticId::rule("panic").is_rule_named("panic"));
        assert!(!DiagnosticId::Panic.is_rule_named("panic"));
        assert!(!DiagnosticId::InvalidSyntax.is_rule_named("invalid-syntax"));
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
    }

    #[test]
    fn display() {
        let diagnostic = Diagnostic::rule(
            "unused-binding",
            Severity::Warning,
            "`x` is never used",
            TextSpan::new(4, 5),
        );
        assert_eq!(
            diagnostic.to_string(),
            "warning[unused-binding] at 4..5: `x` is never used"
        );
        assert_eq!(diagnostic.span(), TextSpan::new(4, 5));
    }
}
