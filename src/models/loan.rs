//! Loan (borrow) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::book::EntityRef;
use super::enums::LoanStatus;

/// One line of a loan request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoanItemRequest {
    #[validate(length(min = 1, message = "Book id is required"))]
    pub book_id: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub qty: u32,
}

/// Create loan request, built from the cart at checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoan {
    #[validate(custom(function = "validate_due_date"))]
    pub due_date: NaiveDate,
    #[validate(length(min = 1, message = "A loan needs at least one book"), nested)]
    pub items: Vec<LoanItemRequest>,
}

fn validate_due_date(due_date: &NaiveDate) -> Result<(), ValidationError> {
    if *due_date <= Utc::now().date_naive() {
        let mut err = ValidationError::new("due_date_in_past");
        err.message = Some("Due date must be in the future".into());
        return Err(err);
    }
    Ok(())
}

/// Book line of a loan as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanItem {
    pub book: EntityRef,
    #[serde(default = "one")]
    pub qty: u32,
}

fn one() -> u32 {
    1
}

/// Loan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<LoanItem>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
    /// Fine computed by the server, in the library's currency
    #[serde(default)]
    pub fine_amount: Option<f64>,
}

impl Loan {
    pub fn total_copies(&self) -> u32 {
        self.items.iter().map(|i| i.qty).sum()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Overdue || (self.status.is_open() && self.due_date < now)
    }
}

/// Loan creation responses are sometimes wrapped in `{loan: ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LoanResponse {
    Wrapped { loan: Loan },
    Bare(Loan),
}

impl From<LoanResponse> for Loan {
    fn from(r: LoanResponse) -> Self {
        match r {
            LoanResponse::Wrapped { loan } => loan,
            LoanResponse::Bare(loan) => loan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(days: i64, items: Vec<LoanItemRequest>) -> CreateLoan {
        CreateLoan {
            due_date: Utc::now().date_naive() + Duration::days(days),
            items,
        }
    }

    #[test]
    fn test_create_loan_validation() {
        let ok = request(
            14,
            vec![LoanItemRequest {
                book_id: "b1".to_string(),
                qty: 2,
            }],
        );
        assert!(ok.validate().is_ok());

        assert!(request(14, vec![]).validate().is_err());
        assert!(request(0, vec![LoanItemRequest { book_id: "b1".into(), qty: 1 }])
            .validate()
            .is_err());
        assert!(request(3, vec![LoanItemRequest { book_id: "b1".into(), qty: 0 }])
            .validate()
            .is_err());
    }

    #[test]
    fn test_wire_format() {
        let req = request(1, vec![LoanItemRequest { book_id: "b1".into(), qty: 1 }]);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("dueDate").is_some());
        assert_eq!(json["items"][0]["bookId"], "b1");
        assert_eq!(json["items"][0]["qty"], 1);
    }
}
