use crate::core::{CtlError, Result};

/// A parsed dotted ctl path: an ordered, non-empty token sequence.
///
/// `"prefault.at_open"` parses to `["prefault", "at_open"]`. Empty
/// tokens are rejected, so `".x"`, `"x."`, `"a..b"` and `""` are all
/// malformed. Tokens are matched case-sensitively against node names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtlPath {
    raw: String,
    tokens: Vec<String>,
}

impl CtlPath {
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(CtlError::MalformedPath(input.to_string()));
        }

        let mut tokens = Vec::new();
        for token in input.split('.') {
            if token.is_empty() {
                return Err(CtlError::MalformedPath(input.to_string()));
            }
            tokens.push(token.to_string());
        }

        Ok(Self {
            raw: input.to_string(),
            tokens,
        })
    }

    /// Original dotted string, used verbatim in error messages.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}
