pub mod enrichment;
pub mod pacer;
pub mod top_k;

pub use enrichment::{Diagnostic, DiagnosticKind, EnrichmentPipeline, EnrichmentReport, LookupOutcome};
pub use pacer::Pacer;
pub use top_k::select_top_k;
