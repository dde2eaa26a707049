use crate::infra::{build_scanner, open_store};
use civicfix::config::AppConfig;
use civicfix::contractors::{BusinessNumber, ContractorDirectory, VerificationFilter};
use civicfix::error::AppError;
use civicfix::scan::{ImageClassifier, ImageScanner, ImageUpload};
use clap::Args;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    /// Only show contractors that have been verified
    #[arg(long)]
    pub(crate) verified: bool,
}

#[derive(Args, Debug)]
pub(crate) struct VerifyArgs {
    /// Business number of the contractor to update
    pub(crate) business_number: String,
    /// Clear the verified flag instead of setting it
    #[arg(long)]
    pub(crate) revoke: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScanArgs {
    /// Image files, or directories containing jpg/jpeg/png/webp images
    #[arg(required = true)]
    pub(crate) paths: Vec<PathBuf>,
}

pub(crate) async fn list_contractors(args: ListArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let directory = ContractorDirectory::new(open_store(&config).await?);

    let filter = if args.verified {
        VerificationFilter::VerifiedOnly
    } else {
        VerificationFilter::All
    };
    let contractors = directory.list(filter).await?;

    if contractors.is_empty() {
        println!("No contractors registered.");
        return Ok(());
    }

    println!("Contractors ({}):", contractors.len());
    for contractor in contractors {
        let status = if contractor.verified {
            "verified"
        } else {
            "pending"
        };
        println!(
            "- {} | {} | {} | {} | registered {}",
            contractor.company_bn,
            contractor.company_name,
            contractor.email,
            status,
            contractor.registered_at.format("%Y-%m-%d %H:%M UTC")
        );
    }
    Ok(())
}

pub(crate) async fn verify_contractor(args: VerifyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let directory = ContractorDirectory::new(open_store(&config).await?);

    let business_number = BusinessNumber(args.business_number.trim().to_string());
    let verified = !args.revoke;
    directory.set_verified(&business_number, verified).await?;

    if verified {
        println!("Contractor {business_number} is now verified.");
    } else {
        println!("Verification revoked for contractor {business_number}.");
    }
    Ok(())
}

pub(crate) async fn run_scan(args: ScanArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let scanner = build_scanner(&config)?;
    let images = collect_images(&args.paths)?;

    if images.is_empty() {
        eprintln!("No images found.");
        return Ok(());
    }

    for path in images {
        println!("{}", scan_file(&*scanner, &path).await);
    }
    Ok(())
}

/// Classify one file into a result line, or a `{filename, error}` line when
/// the file cannot be read or classified.
pub(crate) async fn scan_file<C>(scanner: &ImageScanner<C>, path: &Path) -> Value
where
    C: ImageClassifier + 'static,
{
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            let error = format!("unable to read {}: {err}", path.display());
            return json!({ "filename": filename, "error": error });
        }
    };
    let upload = ImageUpload {
        bytes,
        filename: filename.clone(),
        content_type: None,
    };

    match scanner.scan(upload).await {
        Ok(result) => json!(result),
        Err(err) => json!({ "filename": filename, "error": err.to_string() }),
    }
}

/// Expands directories into their image files, sorted by path. Explicit file
/// arguments are kept regardless of extension.
pub(crate) fn collect_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let candidate = entry?.path();
                if candidate.is_file() && has_image_extension(&candidate) {
                    found.push(candidate);
                }
            }
            found.sort();
            images.extend(found);
        } else {
            images.push(path.clone());
        }
    }
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
