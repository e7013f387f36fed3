//! Candidate statement validation.
//!
//! Parses model-generated SQL and checks it against the schema descriptor
//! before anything reaches the database: single statement only, known
//! table/columns only, placeholders matching the supplied parameters, and no
//! DDL or other side-band constructs.

mod parser;

pub use parser::StatementValidator;

use std::fmt;

/// How a statement touches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    /// Plain queries (SELECT, including CTEs and set operations).
    ReadOnly,
    /// Data modification (INSERT, UPDATE, DELETE); needs the write opt-in.
    Write,
    /// Never executed (DDL, PRAGMA, ATTACH, transaction control, unknown).
    Forbidden,
}

impl AccessLevel {
    /// Returns true if statements at this level may execute under the given
    /// write policy.
    pub fn is_allowed(&self, allow_writes: bool) -> bool {
        match self {
            Self::ReadOnly => true,
            Self::Write => allow_writes,
            Self::Forbidden => false,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::Write => write!(f, "write"),
            Self::Forbidden => write!(f, "forbidden"),
        }
    }
}

/// The kind of SQL statement detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Truncate,
    Pragma,
    Attach,
    Transaction,
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Create => write!(f, "CREATE"),
            Self::Drop => write!(f, "DROP"),
            Self::Alter => write!(f, "ALTER"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::Pragma => write!(f, "PRAGMA"),
            Self::Attach => write!(f, "ATTACH"),
            Self::Transaction => write!(f, "transaction control"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A statement that passed validation and may be bound and executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStatement {
    /// The statement kind.
    pub kind: StatementKind,
    /// How the statement touches the database.
    pub access: AccessLevel,
    /// Number of `?` placeholders found (equals the parameter count).
    pub placeholders: usize,
}
