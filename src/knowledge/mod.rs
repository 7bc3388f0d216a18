//! Knowledge sampling for generation prompts.
//!
//! Two deliberately different parsing policies live here. Sampling
//! ([`build`]) is lenient: a bad source, line, or fetch is skipped and
//! logged, never fatal. Upload validation ([`validate_jsonl`]) is strict: a
//! file with malformed or mis-shaped lines is rejected outright before it
//! can enter the corpus.

mod preamble;
mod sampler;
mod validate;

pub use preamble::render_preamble;
pub use sampler::{
    SampleBuild, SamplerConfig, SourceLineError, SourceSample, build, extract_keywords,
    sample_source,
};
pub use validate::{JsonlRejection, MAX_VALIDATED_LINES, MAX_VALIDATION_ERRORS, validate_jsonl};

const SNIPPET_MAX_CHARS: usize = 50;

/// Truncated preview of a source line, for error reporting.
pub(crate) fn snippet(line: &str) -> String {
    line.chars().take(SNIPPET_MAX_CHARS).collect()
}

/// Strips a leading UTF-8 byte-order mark.
pub(crate) fn strip_bom(raw: &[u8]) -> &[u8] {
    raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw)
}
