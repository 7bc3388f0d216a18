use crate::storage::KnowledgeStorage;
use crate::types::{KnowledgeExample, KnowledgeSource, Provenance};

/// Raw text budget per source, regardless of file size.
pub const MAX_BYTES_PER_SOURCE: usize = 64 * 1024;
/// Parsed line budget per source.
pub const MAX_LINES_PER_SOURCE: usize = 20;

// Filler words that carry no signal for relevance matching. Tokens of one
// or two characters are already dropped by the length threshold.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "have", "are", "was", "you", "your",
    "can", "will", "what", "how", "make", "made", "create", "need", "want", "would", "like",
    "please", "using", "use", "should", "could", "some", "all", "one", "two", "not", "but",
];

/// Sampling thresholds. These are tuning knobs, not business rules; the
/// defaults match what the curated corpus was built against.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub max_bytes_per_source: usize,
    pub max_lines_per_source: usize,
    pub max_examples_per_source: usize,
    pub max_keywords: usize,
    /// Minimum keyword length in characters.
    pub min_keyword_len: usize,
    /// Example code longer than this is truncated with an ellipsis to bound
    /// prompt size.
    pub max_code_chars: usize,
    /// How many recently-tagged assets join the global curated source.
    pub max_asset_sources: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_bytes_per_source: MAX_BYTES_PER_SOURCE,
            max_lines_per_source: MAX_LINES_PER_SOURCE,
            max_examples_per_source: 4,
            max_keywords: 10,
            min_keyword_len: 3,
            max_code_chars: 800,
            max_asset_sources: 5,
        }
    }
}

/// A line that failed the lenient per-line parse. Recorded and skipped,
/// never fatal to the rest of the source.
#[derive(Debug, Clone)]
pub struct SourceLineError {
    pub line_number: usize,
    pub snippet: String,
    pub error: String,
}

/// Outcome of sampling a single source's raw bytes.
#[derive(Debug)]
pub struct SourceSample {
    pub examples: Vec<KnowledgeExample>,
    pub bytes_used: usize,
    pub lines_parsed: usize,
    pub errors: Vec<SourceLineError>,
}

/// Outcome of sampling all sources for one generation request.
#[derive(Debug)]
pub struct SampleBuild {
    pub examples: Vec<KnowledgeExample>,
    pub provenance: Vec<Provenance>,
}

/// Lowercased prompt keywords used for relevance filtering: tokens longer
/// than two characters, stop-words removed, deduplicated, capped.
#[must_use]
pub fn extract_keywords(prompt: &str, cfg: &SamplerConfig) -> Vec<String> {
    let lowered = prompt.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();

    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.chars().count() < cfg.min_keyword_len {
            continue;
        }
        if STOP_WORDS.contains(&token) {
            continue;
        }
        if keywords.iter().any(|k| k == token) {
            continue;
        }
        keywords.push(token.to_string());
        if keywords.len() == cfg.max_keywords {
            break;
        }
    }

    keywords
}

fn is_relevant(example: &KnowledgeExample, keywords: &[String]) -> bool {
    let mut haystack = example.prompt.to_lowercase();
    for field in [&example.description, &example.template] {
        if let Some(value) = field {
            haystack.push(' ');
            haystack.push_str(&value.to_lowercase());
        }
    }
    for tag in &example.tags {
        haystack.push(' ');
        haystack.push_str(&tag.to_lowercase());
    }

    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

fn truncate_code(example: &mut KnowledgeExample, max_chars: usize) {
    if example.code.chars().count() > max_chars {
        let mut truncated: String = example.code.chars().take(max_chars).collect();
        truncated.push_str("...");
        example.code = truncated;
    }
}

/// Samples one source's raw bytes. Pure: same bytes + same keywords always
/// produce the same result.
#[must_use]
pub fn sample_source(raw: &[u8], keywords: &[String], cfg: &SamplerConfig) -> SourceSample {
    let truncated = &raw[..raw.len().min(cfg.max_bytes_per_source)];
    let bytes_used = truncated.len();
    let text = String::from_utf8_lossy(super::strip_bom(truncated));

    let mut examples = Vec::new();
    let mut errors = Vec::new();
    let mut lines_parsed = 0;

    for (idx, line) in text.lines().enumerate() {
        let line_number = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if lines_parsed == cfg.max_lines_per_source
            || examples.len() == cfg.max_examples_per_source
        {
            break;
        }
        lines_parsed += 1;

        match serde_json::from_str::<KnowledgeExample>(trimmed) {
            Ok(mut example) => {
                if !is_relevant(&example, keywords) {
                    continue;
                }
                truncate_code(&mut example, cfg.max_code_chars);
                examples.push(example);
            }
            Err(e) => errors.push(SourceLineError {
                line_number,
                snippet: super::snippet(trimmed),
                error: e.to_string(),
            }),
        }
    }

    SourceSample {
        examples,
        bytes_used,
        lines_parsed,
        errors,
    }
}

/// Samples every source in order, keeping the ordering of `sources` in both
/// the examples and the provenance log. A source that cannot be fetched is
/// skipped with a warning; nothing here aborts the build.
pub async fn build(
    storage: &KnowledgeStorage,
    prompt: &str,
    sources: &[KnowledgeSource],
    cfg: &SamplerConfig,
) -> SampleBuild {
    let keywords = extract_keywords(prompt, cfg);

    let mut examples = Vec::new();
    let mut provenance = Vec::new();

    for source in sources {
        let raw = match storage
            .read_capped(&source.path, cfg.max_bytes_per_source)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("skipping knowledge source {}: {e}", source.path);
                continue;
            }
        };

        let sample = sample_source(&raw, &keywords, cfg);
        for err in &sample.errors {
            tracing::warn!(
                "skipped line {} of {} ({:?}): {}",
                err.line_number,
                source.path,
                err.snippet,
                err.error
            );
        }

        provenance.push(Provenance {
            path: source.path.clone(),
            bytes_used: sample.bytes_used,
            source_tag: source.tag,
        });
        examples.extend(sample.examples);
    }

    SampleBuild {
        examples,
        provenance,
    }
}
