// crates/snare-evidence/src/lib.rs
// ============================================================================
// Module: Snare Evidence Library
// Description: Evidence package assembly, upload, and retrieval.
// Purpose: Expose the HAR model, evidence builder, and evidence retriever.
// Dependencies: snare-core, tempfile, md-5
// ============================================================================

//! ## Overview
//! Evidence packages bundle a captured decoy session: a HAR v1.2 log,
//! package metadata, an optional behavior profile, and payload artifacts as
//! first-class files. The builder assembles and uploads a package and then
//! publishes an [`snare_core::EvidencePointer`]; the retriever downloads a
//! package, revalidates its checksum, and parses its contents.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod builder;
pub mod har;
pub mod package;
pub mod retriever;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use builder::EvidenceBuilder;
pub use builder::EvidenceBuilderError;
pub use builder::HarExchange;
pub use builder::capture_fingerprint;
pub use har::HarContent;
pub use har::HarEntry;
pub use har::HarHeader;
pub use har::HarLog;
pub use har::HarRequest;
pub use har::HarResponse;
pub use har::HarTimings;
pub use package::EvidenceMetadata;
pub use package::SessionMetadata;
pub use package::UploadedFileRecord;
pub use retriever::EvidenceRetriever;
pub use retriever::RetrievedEvidence;
pub use retriever::RetrieverError;
