//! Shared domain enums

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BookStatus
// ---------------------------------------------------------------------------

/// Physical/catalog status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    #[default]
    Active,
    Inactive,
    Lost,
    Damaged,
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookStatus::Active => "Active",
            BookStatus::Inactive => "Inactive",
            BookStatus::Lost => "Lost",
            BookStatus::Damaged => "Damaged",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a loan on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    #[default]
    Pending,
    Approved,
    Borrowed,
    Returned,
    Overdue,
    Rejected,
}

impl LoanStatus {
    /// Loans that still hold copies
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            LoanStatus::Pending | LoanStatus::Approved | LoanStatus::Borrowed | LoanStatus::Overdue
        )
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Pending => "Pending",
            LoanStatus::Approved => "Approved",
            LoanStatus::Borrowed => "Borrowed",
            LoanStatus::Returned => "Returned",
            LoanStatus::Overdue => "Overdue",
            LoanStatus::Rejected => "Rejected",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Staff,
    Librarian,
    Admin,
}

impl Role {
    pub fn can_administer(&self) -> bool {
        matches!(self, Role::Librarian | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Librarian => "librarian",
            Role::Admin => "admin",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&BookStatus::Damaged).unwrap(), "\"DAMAGED\"");
        let status: LoanStatus = serde_json::from_str("\"OVERDUE\"").unwrap();
        assert!(status.is_open());
        assert!(!LoanStatus::Returned.is_open());
    }
}
