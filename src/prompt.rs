//! Prompt text. Pure functions, no state.

use llm::Style;

/// Ask for all four rewrites as one strict JSON object.
pub fn build_rephrase_prompt(text: &str) -> String {
    let styles: String = Style::ALL
        .iter()
        .map(|style| format!("- {style}\n"))
        .collect();
    let keys = Style::ALL.map(Style::as_str).join(", ");

    format!(
        "You are a writing assistant.\n\
         \n\
         Rephrase the input text into exactly four styles:\n\
         {styles}\
         \n\
         Return ONLY valid JSON with exactly these keys:\n\
         {keys}\n\
         \n\
         No markdown. No code fences. No extra keys. No explanations.\n\
         \n\
         Input text:\n\
         {text}\n"
    )
}

/// Ask for one rewrite as bare text.
///
/// The reply is forwarded to clients fragment by fragment and becomes the
/// final text for `style` without any parsing, so the prompt rules out
/// quoting, fences, JSON and commentary.
pub fn build_single_style_prompt(text: &str, style: Style) -> String {
    let label = style.label();
    format!(
        "You are a writing assistant.\n\
         \n\
         Rephrase the input text in a {label} style.\n\
         \n\
         Return ONLY the rewritten text.\n\
         No quotes. No markdown. No code fences. No JSON. No explanations.\n\
         \n\
         Input text:\n\
         {text}\n"
    )
}
