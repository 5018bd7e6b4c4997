//! Typed access to task element values
//!
//! A field the engine asks for is a field the workflow definition promises;
//! absence or a kind mismatch means the workflow is mis-configured upstream
//! and the handling pass must stop.

use crate::error::{WorkerError, WorkerResult};
use crate::workflow::types::{ElementValue, Task};
use rust_decimal::Decimal;

/// Get a scalar field value by code
pub fn get_field<'a>(task: &'a Task, code: &str) -> WorkerResult<&'a str> {
    match task.element_values.get(code) {
        Some(ElementValue::Scalar { value }) => Ok(value),
        _ => Err(WorkerError::missing_required_field(code)),
    }
}

/// Get a decision code by field code
pub fn get_decision<'a>(task: &'a Task, code: &str) -> WorkerResult<&'a str> {
    match task.element_values.get(code) {
        Some(ElementValue::Decision { code: decision }) => Ok(decision),
        _ => Err(WorkerError::missing_required_field(code)),
    }
}

/// Get a monetary amount field by code.
///
/// Non-numeric or negative amounts fail loudly instead of degrading to zero;
/// a loan application without a usable amount is upstream data corruption.
pub fn get_amount(task: &Task, code: &str) -> WorkerResult<Decimal> {
    let raw = get_field(task, code)?;

    let amount: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| WorkerError::missing_required_field(code))?;

    if amount.is_sign_negative() {
        return Err(WorkerError::missing_required_field(code));
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{TaskDefinition, TaskDefinitionCode};
    use uuid::Uuid;

    fn task_with(values: Vec<(&str, ElementValue)>) -> Task {
        Task {
            id: Uuid::new_v4(),
            process_id: Uuid::new_v4(),
            task_definition: TaskDefinition {
                code: TaskDefinitionCode::LoanApplication.as_str().to_string(),
            },
            element_values: values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_get_field_returns_scalar() {
        let task = task_with(vec![("currency", ElementValue::scalar("EUR"))]);
        assert_eq!(get_field(&task, "currency").unwrap(), "EUR");
    }

    #[test]
    fn test_get_field_fails_when_absent() {
        let task = task_with(vec![]);
        let result = get_field(&task, "currency");
        assert!(matches!(
            result,
            Err(WorkerError::MissingRequiredField { code }) if code == "currency"
        ));
    }

    #[test]
    fn test_get_field_fails_on_decision_value() {
        let task = task_with(vec![("currency", ElementValue::decision("EUR"))]);
        assert!(get_field(&task, "currency").is_err());
    }

    #[test]
    fn test_get_decision_returns_code() {
        let task = task_with(vec![("authorized", ElementValue::decision("OK"))]);
        assert_eq!(get_decision(&task, "authorized").unwrap(), "OK");
    }

    #[test]
    fn test_get_decision_fails_on_scalar_value() {
        let task = task_with(vec![("authorized", ElementValue::scalar("OK"))]);
        assert!(matches!(
            get_decision(&task, "authorized"),
            Err(WorkerError::MissingRequiredField { code }) if code == "authorized"
        ));
    }

    #[test]
    fn test_get_amount_parses_plain_decimal() {
        let task = task_with(vec![("amount", ElementValue::scalar("3000.50"))]);
        assert_eq!(
            get_amount(&task, "amount").unwrap(),
            "3000.50".parse::<Decimal>().unwrap()
        );
    }

    #[test]
    fn test_get_amount_trims_whitespace() {
        let task = task_with(vec![("amount", ElementValue::scalar(" 6000 "))]);
        assert_eq!(get_amount(&task, "amount").unwrap(), Decimal::from(6000));
    }

    #[test]
    fn test_get_amount_fails_on_non_numeric() {
        let task = task_with(vec![("amount", ElementValue::scalar("lots"))]);
        assert!(matches!(
            get_amount(&task, "amount"),
            Err(WorkerError::MissingRequiredField { code }) if code == "amount"
        ));
    }

    #[test]
    fn test_get_amount_fails_on_negative() {
        let task = task_with(vec![("amount", ElementValue::scalar("-100"))]);
        assert!(get_amount(&task, "amount").is_err());
    }

    #[test]
    fn test_get_amount_fails_on_empty_string() {
        let task = task_with(vec![("amount", ElementValue::scalar(""))]);
        assert!(get_amount(&task, "amount").is_err());
    }
}
