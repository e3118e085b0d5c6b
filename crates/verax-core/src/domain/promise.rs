//! Source-anchored promises (expectations) extracted from application code.

use serde::{Deserialize, Serialize};

/// What kind of user-visible effect a promise implies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PromiseKind {
    Navigation,
    Network,
    State,
    UiFeedback,
}

/// How strongly the extractor anchored the promise in source.
///
/// `ProvenExpectation` means the target is a literal or AST-anchored value.
/// Everything else is weaker; the core never re-derives this classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProofStrength {
    ProvenExpectation,
    WeakExpectation,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ProofStrength {
    pub fn is_proven(self) -> bool {
        matches!(self, Self::ProvenExpectation)
    }
}

/// Location of the code that produced a promise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub file: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(col) => write!(f, "{}:{}:{}", self.file, self.line, col),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// An extracted claim about expected runtime behavior. Immutable once extracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Promise {
    pub id: String,
    pub kind: PromiseKind,
    pub target: String,
    pub proof: ProofStrength,
    #[serde(default)]
    pub source_ref: Option<SourceRef>,
}

impl Promise {
    pub fn new(id: impl Into<String>, kind: PromiseKind, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            target: target.into(),
            proof: ProofStrength::Unknown,
            source_ref: None,
        }
    }

    pub fn proven(mut self) -> Self {
        self.proof = ProofStrength::ProvenExpectation;
        self
    }

    pub fn with_proof(mut self, proof: ProofStrength) -> Self {
        self.proof = proof;
        self
    }

    pub fn with_source(mut self, file: impl Into<String>, line: u32) -> Self {
        self.source_ref = Some(SourceRef {
            file: file.into(),
            line,
            column: None,
        });
        self
    }
}
