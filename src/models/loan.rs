//! Loan (borrow) model and related types

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Days between a loan and its expected return
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Expected return date for a loan started on `loan_date`
pub fn expected_return_date(loan_date: NaiveDate) -> NaiveDate {
    loan_date + Duration::days(LOAN_PERIOD_DAYS)
}

/// Loan status. `Returned` is terminal.
///
/// Serialized upper case; read through [`FromStr`](std::str::FromStr) in
/// any case, legacy labels included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum LoanStatus {
    Active,
    Returned,
}

/// Effect of moving a loan from one status to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanTransition {
    Unchanged,
    Return,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Returned => "RETURNED",
        }
    }

    /// Validate a status change requested by a caller
    pub fn transition_to(self, next: LoanStatus) -> AppResult<LoanTransition> {
        match (self, next) {
            (LoanStatus::Active, LoanStatus::Active) => Ok(LoanTransition::Unchanged),
            (LoanStatus::Active, LoanStatus::Returned) => Ok(LoanTransition::Return),
            (LoanStatus::Returned, LoanStatus::Returned) => {
                Err(AppError::Validation("Loan already returned".to_string()))
            }
            (LoanStatus::Returned, LoanStatus::Active) => Err(AppError::Validation(
                "A returned loan cannot be reactivated".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" | "ATIVO" => Ok(LoanStatus::Active),
            "RETURNED" | "DEVOLVIDO" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

impl TryFrom<String> for LoanStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub loan_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    #[validate(range(min = 1, message = "user_id must be a valid id"))]
    pub user_id: i64,
    #[validate(range(min = 1, message = "book_id must be a valid id"))]
    pub book_id: i64,
}

/// Update loan request. User and book are immutable.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLoan {
    pub expected_return_date: Option<NaiveDate>,
    pub status: Option<LoanStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_is_two_weeks_out() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
        assert_eq!(
            expected_return_date(start),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn active_loans_may_be_returned() {
        assert_eq!(
            LoanStatus::Active.transition_to(LoanStatus::Returned).unwrap(),
            LoanTransition::Return
        );
        assert_eq!(
            LoanStatus::Active.transition_to(LoanStatus::Active).unwrap(),
            LoanTransition::Unchanged
        );
    }

    #[test]
    fn returned_is_terminal() {
        assert!(matches!(
            LoanStatus::Returned.transition_to(LoanStatus::Returned),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            LoanStatus::Returned.transition_to(LoanStatus::Active),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn status_parses_current_and_legacy_labels() {
        assert_eq!("active".parse::<LoanStatus>(), Ok(LoanStatus::Active));
        assert_eq!("ATIVO".parse::<LoanStatus>(), Ok(LoanStatus::Active));
        assert_eq!("Returned".parse::<LoanStatus>(), Ok(LoanStatus::Returned));
        assert_eq!("devolvido".parse::<LoanStatus>(), Ok(LoanStatus::Returned));
        assert!("OVERDUE".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn update_accepts_legacy_status_in_json() {
        let update: UpdateLoan =
            serde_json::from_str(r#"{"status":"DEVOLVIDO","expected_return_date":"2024-05-01"}"#)
                .unwrap();
        assert_eq!(update.status, Some(LoanStatus::Returned));
        assert_eq!(
            update.expected_return_date,
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }

    #[test]
    fn json_status_matches_path_filter_case_rules() {
        for (raw, expected) in [
            ("returned", LoanStatus::Returned),
            (" Active ", LoanStatus::Active),
            ("ativo", LoanStatus::Active),
        ] {
            let update: UpdateLoan =
                serde_json::from_value(serde_json::json!({ "status": raw })).unwrap();
            assert_eq!(update.status, Some(expected), "{raw}");
        }

        let err = serde_json::from_str::<UpdateLoan>(r#"{"status":"OVERDUE"}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid loan status"));
        assert_eq!(
            serde_json::to_value(LoanStatus::Returned).unwrap(),
            "RETURNED"
        );
    }
}
