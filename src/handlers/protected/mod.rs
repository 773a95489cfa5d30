pub mod appointments;
pub mod customers;
pub mod invoices;
pub mod materials;
pub mod profile;
pub mod quotes;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::database::stores::CustomerStore;
use crate::error::ApiError;

/// Reject references to customers that do not belong to the caller.
///
/// Every handler that accepts a customer id in its body runs it through
/// this check; an other-tenant customer is indistinguishable from an
/// absent one.
pub(crate) async fn ensure_customer_owned(
    store: &dyn CustomerStore,
    craftsman_id: Uuid,
    customer_id: Uuid,
) -> Result<(), ApiError> {
    if store
        .exists(craftsman_id, customer_id)
        .await
        .map_err(ApiError::from)?
    {
        Ok(())
    } else {
        Err(ApiError::not_found("Customer not found"))
    }
}

/// Parse an ISO-8601 date ("2026-09-01") from a request field.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{}: expected ISO date (YYYY-MM-DD)", field)))
}

/// Parse an ISO-8601 local timestamp ("2026-09-01T10:00:00") from a request field.
pub(crate) fn parse_datetime(field: &str, value: &str) -> Result<NaiveDateTime, ApiError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| {
            ApiError::bad_request(format!(
                "{}: expected ISO timestamp (YYYY-MM-DDTHH:MM:SS)",
                field
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::stores::StoreError;
    use async_trait::async_trait;

    /// In-memory customer table keyed by (craftsman, customer).
    struct MemoryCustomers {
        rows: Vec<(Uuid, Uuid)>,
    }

    #[async_trait]
    impl CustomerStore for MemoryCustomers {
        async fn exists(
            &self,
            craftsman_id: Uuid,
            customer_id: Uuid,
        ) -> Result<bool, StoreError> {
            Ok(self.rows.contains(&(craftsman_id, customer_id)))
        }
    }

    #[tokio::test]
    async fn own_customer_reference_is_accepted() {
        let craftsman = Uuid::new_v4();
        let customer = Uuid::new_v4();
        let store = MemoryCustomers {
            rows: vec![(craftsman, customer)],
        };

        assert!(ensure_customer_owned(&store, craftsman, customer)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn another_tenants_customer_reference_is_not_found() {
        let craftsman_a = Uuid::new_v4();
        let craftsman_b = Uuid::new_v4();
        let customer_of_a = Uuid::new_v4();
        let store = MemoryCustomers {
            rows: vec![(craftsman_a, customer_of_a)],
        };

        let err = ensure_customer_owned(&store, craftsman_b, customer_of_a)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn unknown_customer_reference_is_not_found() {
        let store = MemoryCustomers { rows: vec![] };

        let err = ensure_customer_owned(&store, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn parses_iso_date() {
        assert!(parse_date("date", "2026-09-01").is_ok());
        assert!(parse_date("date", "09/01/2026").is_err());
        assert!(parse_date("date", "").is_err());
    }

    #[test]
    fn parses_iso_datetime_with_and_without_seconds() {
        assert!(parse_datetime("startsAt", "2026-09-01T10:00:00").is_ok());
        assert!(parse_datetime("startsAt", "2026-09-01T10:00").is_ok());
        assert!(parse_datetime("startsAt", "2026-09-01 10:00").is_err());
    }

    #[test]
    fn error_message_names_the_field() {
        let err = parse_date("date", "bogus").unwrap_err();
        assert!(err.message().starts_with("date:"));
    }
}
