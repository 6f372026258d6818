// Uploaded resumes live in S3 with extracted text on the profile row;
// generated resumes are LaTeX rows compiled to PDF on demand.

pub mod generated;
pub mod upload;
