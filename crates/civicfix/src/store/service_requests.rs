use async_trait::async_trait;
use chrono::Utc;

use super::{RepositoryError, SqliteStore};
use crate::contractors::BusinessNumber;
use crate::service_requests::{LinkOutcome, ReportId, ServiceRequestRepository};

#[async_trait]
impl ServiceRequestRepository for SqliteStore {
    async fn link_if_verified(
        &self,
        business_number: &BusinessNumber,
        report_id: &ReportId,
    ) -> Result<LinkOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // The insert selects from the verified contractor row, so the check and
        // the write are a single statement under the transaction's write lock.
        let inserted = sqlx::query(
            r#"
            INSERT INTO service_requests (company_bn, report_id, linked_at)
            SELECT company_bn, ?, ?
            FROM contractors
            WHERE company_bn = ? AND verified = TRUE
            "#,
        )
        .bind(report_id.as_str())
        .bind(Utc::now())
        .bind(business_number.as_str())
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() > 0 {
            tx.commit().await?;
            return Ok(LinkOutcome::Created);
        }

        let verified: Option<bool> =
            sqlx::query_scalar("SELECT verified FROM contractors WHERE company_bn = ?")
                .bind(business_number.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        tx.rollback().await?;

        Ok(match verified {
            None => LinkOutcome::BusinessNotFound,
            Some(_) => LinkOutcome::Unverified,
        })
    }

    async fn report_ids(
        &self,
        business_number: &BusinessNumber,
    ) -> Result<Vec<ReportId>, RepositoryError> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT report_id FROM service_requests WHERE company_bn = ? ORDER BY id",
        )
        .bind(business_number.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReportId).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::contractors::{ContractorRepository, NewContractor};
    use crate::store::testing::memory_store;

    async fn seed(store: &SqliteStore, verified: bool) -> BusinessNumber {
        let business_number = BusinessNumber("BN001".to_string());
        store
            .insert(NewContractor {
                business_number: business_number.clone(),
                name: "Northside Lighting".to_string(),
                email: "crew@northside.example".to_string(),
                password_hash: "pbkdf2-sha256$1000$c2FsdA$aGFzaA".to_string(),
                phone_number: None,
                company_website: None,
                description: None,
                registered_at: Utc::now(),
            })
            .await
            .expect("contractor inserted");
        if verified {
            store
                .set_verified(&business_number, true)
                .await
                .expect("contractor verified");
        }
        business_number
    }

    async fn seeded_store(verified: bool) -> (SqliteStore, BusinessNumber) {
        let store = memory_store().await;
        let business_number = seed(&store, verified).await;
        (store, business_number)
    }

    async fn link_count(store: &SqliteStore) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM service_requests")
            .fetch_one(store.pool())
            .await
            .expect("count query")
    }

    #[tokio::test]
    async fn unverified_contractor_is_rejected_without_writing() {
        let (store, business_number) = seeded_store(false).await;
        let outcome = store
            .link_if_verified(&business_number, &ReportId("R1".to_string()))
            .await
            .expect("link attempt completes");

        assert_eq!(outcome, LinkOutcome::Unverified);
        assert_eq!(link_count(&store).await, 0);
    }

    #[tokio::test]
    async fn unknown_contractor_is_not_found() {
        let (store, _) = seeded_store(true).await;
        let outcome = store
            .link_if_verified(
                &BusinessNumber("UNKNOWN".to_string()),
                &ReportId("R2".to_string()),
            )
            .await
            .expect("link attempt completes");

        assert_eq!(outcome, LinkOutcome::BusinessNotFound);
        assert_eq!(link_count(&store).await, 0);
    }

    #[tokio::test]
    async fn verified_links_are_listed_in_link_order_with_duplicates() {
        let (store, business_number) = seeded_store(true).await;
        for report in ["R9", "R1", "R9"] {
            let outcome = store
                .link_if_verified(&business_number, &ReportId(report.to_string()))
                .await
                .expect("link attempt completes");
            assert_eq!(outcome, LinkOutcome::Created);
        }

        let ids = store
            .report_ids(&business_number)
            .await
            .expect("report ids load");
        let ids: Vec<_> = ids.iter().map(ReportId::as_str).collect();
        assert_eq!(ids, vec!["R9", "R1", "R9"]);
    }

    #[tokio::test]
    async fn revoked_verification_blocks_new_links() {
        let (store, business_number) = seeded_store(true).await;
        store
            .link_if_verified(&business_number, &ReportId("R1".to_string()))
            .await
            .expect("first link");
        store
            .set_verified(&business_number, false)
            .await
            .expect("revoke");

        let outcome = store
            .link_if_verified(&business_number, &ReportId("R2".to_string()))
            .await
            .expect("link attempt completes");
        assert_eq!(outcome, LinkOutcome::Unverified);
        assert_eq!(link_count(&store).await, 1);
    }

    #[tokio::test]
    async fn trigger_rejects_direct_inserts_for_unverified_contractors() {
        let (store, _) = seeded_store(false).await;
        let result = sqlx::query(
            "INSERT INTO service_requests (company_bn, report_id, linked_at) VALUES (?, ?, ?)",
        )
        .bind("BN001")
        .bind("R1")
        .bind(Utc::now())
        .execute(store.pool())
        .await;

        let err = result.expect_err("trigger aborts the insert");
        assert!(err.to_string().contains("contractor is not verified"));
        assert_eq!(link_count(&store).await, 0);
    }

    #[tokio::test]
    async fn unknown_business_has_no_report_ids() {
        let (store, _) = seeded_store(true).await;
        let ids = store
            .report_ids(&BusinessNumber("NOBODY".to_string()))
            .await
            .expect("query succeeds");
        assert!(ids.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_links_racing_a_revoke_leave_no_unverified_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("ledger.db").display()),
            max_connections: 8,
        };
        let store = SqliteStore::open(&config).await.expect("file store opens");
        let business_number = seed(&store, true).await;

        let mut attempts = Vec::new();
        for index in 0..48 {
            let task_store = store.clone();
            let task_business_number = business_number.clone();
            attempts.push(tokio::spawn(async move {
                task_store
                    .link_if_verified(&task_business_number, &ReportId(format!("R{index}")))
                    .await
            }));
            if index == 24 {
                store
                    .set_verified(&business_number, false)
                    .await
                    .expect("revoke");
            }
        }

        let mut created = 0_i64;
        for attempt in attempts {
            match attempt
                .await
                .expect("task joins")
                .expect("link attempt completes")
            {
                LinkOutcome::Created => created += 1,
                LinkOutcome::Unverified => {}
                LinkOutcome::BusinessNotFound => panic!("contractor was registered"),
            }
        }
        assert_eq!(link_count(&store).await, created);

        let outcome = store
            .link_if_verified(&business_number, &ReportId("R-late".to_string()))
            .await
            .expect("link attempt completes");
        assert_eq!(outcome, LinkOutcome::Unverified);
        assert_eq!(link_count(&store).await, created);
    }
}
