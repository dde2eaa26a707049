use async_trait::async_trait;

use super::{RepositoryError, SqliteStore};
use crate::contractors::{
    BusinessNumber, ContractorRepository, ContractorSummary, NewContractor, VerificationFilter,
};

const SUMMARY_COLUMNS: &str = "company_bn, company_name, email, phone_number, \
                               company_website, description, verified, registered_at";

#[async_trait]
impl ContractorRepository for SqliteStore {
    async fn insert(&self, contractor: NewContractor) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO contractors (
                company_bn, company_name, email, company_password,
                phone_number, company_website, description, verified, registered_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(contractor.business_number.as_str())
        .bind(&contractor.name)
        .bind(&contractor.email)
        .bind(&contractor.password_hash)
        .bind(&contractor.phone_number)
        .bind(&contractor.company_website)
        .bind(&contractor.description)
        .bind(contractor.registered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(
        &self,
        filter: VerificationFilter,
    ) -> Result<Vec<ContractorSummary>, RepositoryError> {
        let sql = match filter {
            VerificationFilter::All => {
                format!("SELECT {SUMMARY_COLUMNS} FROM contractors ORDER BY rowid")
            }
            VerificationFilter::VerifiedOnly => format!(
                "SELECT {SUMMARY_COLUMNS} FROM contractors WHERE verified = TRUE ORDER BY rowid"
            ),
        };

        let rows = sqlx::query_as::<_, ContractorSummary>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn set_verified(
        &self,
        business_number: &BusinessNumber,
        verified: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE contractors SET verified = ? WHERE company_bn = ?")
            .bind(verified)
            .bind(business_number.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
