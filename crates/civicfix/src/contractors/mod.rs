//! Contractor registration records and their verification flag.

pub mod credentials;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use credentials::{CredentialError, PasswordHasher};
pub use domain::{
    BusinessNumber, ContractorRegistration, ContractorSummary, NewContractor, RegistrationInvalid,
    VerificationFilter,
};
pub use repository::ContractorRepository;
pub use router::contractor_router;
pub use service::{ContractorDirectory, DirectoryError};
