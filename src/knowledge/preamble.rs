use crate::types::KnowledgeExample;

/// Renders sampled examples into the fixed-structure preamble prepended to
/// the user's message. Pure templating; the only branching is omitting
/// fields (and the whole section) when there is nothing to show.
#[must_use]
pub fn render_preamble(examples: &[KnowledgeExample]) -> String {
    if examples.is_empty() {
        return String::new();
    }

    let mut out = String::from(
        "You are an expert OpenSCAD engineer. Use the reference examples below \
         as guidance for style and structure, then write complete parametric \
         OpenSCAD code for the user's request.\n\nReference examples:\n",
    );

    for (i, example) in examples.iter().enumerate() {
        out.push_str(&format!("\nExample {}:\n", i + 1));
        out.push_str(&format!("Prompt: {}\n", example.prompt));
        if let Some(template) = &example.template {
            out.push_str(&format!("Template: {template}\n"));
        }
        if !example.tags.is_empty() {
            out.push_str(&format!("Tags: {}\n", example.tags.join(", ")));
        }
        if let Some(score) = example.quality_score {
            out.push_str(&format!("Quality score: {score}\n"));
        }
        out.push_str(&format!("Code:\n{}\n", example.code));
    }

    out
}
