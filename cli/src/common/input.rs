//! File input utilities.

use std::io::Read;

use pika::Error;
use pika::tree::Program;

/// Read input from a file path or stdin if path is "-".
///
/// Returns the content and a display name for error messages.
pub fn read_input(path: &str) -> Result<(String, String), String> {
    if is_stdin(path) {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| format!("<stdin>: {}", e))?;
        Ok((content, "<stdin>".to_string()))
    } else {
        let content = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
        Ok((content, path.to_string()))
    }
}

/// Check if the path represents stdin.
pub fn is_stdin(path: &str) -> bool {
    path == "-"
}

/// Whether `path` names a typed program tree rather than assembly text.
///
/// Stdin has no extension, so `run -` reads assembly unless `--tree` is given.
pub fn is_program_tree(path: &str) -> bool {
    path.ends_with(".json")
}

/// Decode a typed program tree from its JSON form.
pub fn read_program(content: &str, display_name: &str) -> Result<Program, Error> {
    serde_json::from_str(content).map_err(|e| Error::Input(format!("{}: {}", display_name, e)))
}
