//! Tokens: the named, valued units every lexing layer produces.

/// Conventional name of the terminal token.
pub const EOF: &str = "EOF";
/// Name of the token that opens a span for the combiner.
pub const START: &str = "START";
/// Name of the token that closes a span; its value names the span's group.
pub const END: &str = "END";

/// A lexical token.
///
/// A token with no name is ignorable (whitespace, comments):
/// producers drop it and keep pulling, so it never reaches a consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<V> {
    pub name: Option<String>,
    pub value: V,
}

impl<V> Token<V> {
    pub fn new(name: impl Into<String>, value: V) -> Self {
        Token {
            name: Some(name.into()),
            value,
        }
    }

    /// A token that will be discarded by whichever layer sees it first.
    pub fn ignored(value: V) -> Self {
        Token { name: None, value }
    }

    pub fn eof(value: V) -> Self {
        Token::new(EOF, value)
    }

    pub fn start(value: V) -> Self {
        Token::new(START, value)
    }

    /// Close the current span; `group` selects the reduction rule.
    pub fn end(group: V) -> Self {
        Token::new(END, group)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name() == Some(name)
    }

    pub fn is_ignorable(&self) -> bool {
        self.name.is_none()
    }

    pub fn is_eof(&self) -> bool {
        self.is(EOF)
    }

    /// Replace the value, keeping the name.
    pub fn map<W>(self, f: impl FnOnce(V) -> W) -> Token<W> {
        Token {
            name: self.name,
            value: f(self.value),
        }
    }
}

impl<V: std::fmt::Display> std::fmt::Display for Token<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}:{}", self.value),
            None => write!(f, "_:{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_compared_not_types() {
        let eof = Token::eof(());
        assert!(eof.is_eof());
        assert!(Token::new("EOF", ()).is_eof());
        assert!(!Token::new("eof", ()).is_eof());
        assert!(Token::ignored(()).is_ignorable());
        assert!(!Token::ignored(()).is_eof());
    }

    #[test]
    fn display() {
        assert_eq!(Token::new("WORD", "hi").to_string(), "WORD:hi");
        assert_eq!(Token::ignored(" ").to_string(), "_: ");
    }
}
