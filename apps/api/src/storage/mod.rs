//! Object storage for uploaded and compiled resumes.

use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
/// Lifetime of download links handed to clients.
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Key for a candidate's uploaded resume.
pub fn uploaded_resume_key(user_id: Uuid, upload_id: Uuid) -> String {
    format!("resumes/{user_id}/{upload_id}.pdf")
}

/// Key for a PDF compiled from a generated resume.
pub fn compiled_resume_key(user_id: Uuid, resume_id: Uuid) -> String {
    format!("generated/{user_id}/{resume_id}.pdf")
}

pub async fn put_pdf(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: Bytes,
) -> Result<(), AppError> {
    let size = body.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type(PDF_CONTENT_TYPE)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

    info!("Uploaded {size} bytes to s3://{bucket}/{key}");
    Ok(())
}

/// Returns a time-limited GET URL for `key`.
pub async fn presigned_download_url(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<String, AppError> {
    let presigning = PresigningConfig::expires_in(DOWNLOAD_URL_TTL)
        .map_err(|e| AppError::S3(format!("invalid presigning config: {e}")))?;
    let request = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .presigned(presigning)
        .await
        .map_err(|e| AppError::S3(format!("presigning {key} failed: {e}")))?;
    Ok(request.uri().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_scoped_by_user() {
        let user = Uuid::new_v4();
        let id = Uuid::new_v4();
        assert_eq!(
            uploaded_resume_key(user, id),
            format!("resumes/{user}/{id}.pdf")
        );
        assert!(compiled_resume_key(user, id).starts_with(&format!("generated/{user}/")));
    }
}
