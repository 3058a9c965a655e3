use thiserror::Error;

pub type ResolveResult<T> = std::result::Result<T, ResolutionErrors>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("{location}: unresolved token reference `{reference}`: {reason}")]
    UnresolvedTokenReference {
        location: String,
        reference: String,
        reason: String,
    },
    #[error("{location}: unknown breakpoint `{name}`")]
    UnknownBreakpoint { location: String, name: String },
}

impl ResolutionError {
    pub fn location(&self) -> &str {
        match self {
            ResolutionError::UnresolvedTokenReference { location, .. }
            | ResolutionError::UnknownBreakpoint { location, .. } => location,
        }
    }
}

/// Every failed reference of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ResolutionErrors(Vec<ResolutionError>);

impl ResolutionErrors {
    pub fn new(errors: Vec<ResolutionError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ResolutionError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: ResolutionErrors) {
        self.0.extend(other.0);
    }

    pub fn into_inner(self) -> Vec<ResolutionError> {
        self.0
    }
}

impl std::fmt::Display for ResolutionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token resolution failed with {} error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}
