//! Line-oriented diagnostic printing: `[file:line:col] error: <message>`
//! (spec.md §6), colorized via `saying::say!` the way the teacher's
//! `compiler_frontend/compiler_messages/display_messages.rs` colorizes its
//! own error banners.

use crate::diagnostics::errors::{CompilerError, CompilerMessages};
use crate::diagnostics::warnings::CompilerWarning;
use saying::say;

pub fn print_compiler_messages(messages: &CompilerMessages) {
    for error in &messages.errors {
        print_error(error);
    }
    for warning in &messages.warnings {
        print_warning(warning);
    }

    say!(
        Bright {messages.errors.len()}, " errors, ",
        Bright {messages.warnings.len()}, " warnings"
    );
}

pub fn print_error(e: &CompilerError) {
    say!(
        "[", e.location.file.display(), ":", {e.location.start.line}, ":", {e.location.start.column}, "] ",
        Red "error", ": ", e.msg.as_str()
    );
}

pub fn print_warning(w: &CompilerWarning) {
    say!(
        "[", w.location.file.display(), ":", {w.location.start.line}, ":", {w.location.start.column}, "] ",
        Yellow "warning", ": ", w.msg.as_str()
    );
}

/// `--json-errors`: serialize diagnostics for LSP/IDE consumption. This is
/// the implemented version of the sketch left commented out in the
/// teacher's `compiler/compiler_errors.rs` (`to_llm_friendly_json`).
pub fn messages_to_json(messages: &CompilerMessages) -> serde_json::Value {
    serde_json::json!({
        "errors": messages.errors.iter().map(error_to_json).collect::<Vec<_>>(),
        "warnings": messages.warnings.iter().map(|w| serde_json::json!({
            "kind": format!("{:?}", w.kind),
            "message": w.msg,
            "file": w.location.file.to_string_lossy(),
            "line": w.location.start.line,
            "column": w.location.start.column,
        })).collect::<Vec<_>>(),
    })
}

fn error_to_json(e: &CompilerError) -> serde_json::Value {
    serde_json::json!({
        "type": format!("{:?}", e.error_type),
        "message": e.msg,
        "file": e.location.file.to_string_lossy(),
        "line": e.location.start.line,
        "column": e.location.start.column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::errors::{ErrorLocation, ErrorType};

    #[test]
    fn json_summary_carries_error_count() {
        let mut messages = CompilerMessages::new();
        messages
            .errors
            .push(CompilerError::new("bad token", ErrorLocation::unknown(), ErrorType::Lexical));

        let json = messages_to_json(&messages);
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    }
}
