//! Code-mode response normalization.

const FENCE: &str = "```";

/// Strip a surrounding markdown code fence, and the info line after the
/// opening fence if there is one.
///
/// Text that is not fenced is only trimmed. Nested fences are peeled until
/// none remain, so `normalize_code(normalize_code(x)) == normalize_code(x)`.
pub fn normalize_code(text: &str) -> String {
    let mut code = text.trim();
    while is_fenced(code) {
        code = strip_fence(code);
    }
    code.to_string()
}

fn is_fenced(text: &str) -> bool {
    text.len() >= 2 * FENCE.len() && text.starts_with(FENCE) && text.ends_with(FENCE)
}

fn strip_fence(text: &str) -> &str {
    let inner = &text[FENCE.len()..text.len() - FENCE.len()];
    // Anything on the opening line is an info string (```python, ```{r}).
    let body = match inner.split_once('\n') {
        Some((first, rest)) if !first.trim().is_empty() => rest,
        _ => inner,
    };
    body.trim()
}
