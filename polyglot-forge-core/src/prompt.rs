//! Prompt rendering for one file.

use crate::contract::{InputFile, LATEST_VERSION};

/// Render the conversion instruction for `file`.
///
/// Pure and deterministic. The version clause is dropped entirely when `target_version` is
/// the `"latest"` sentinel. File content is embedded verbatim inside a fenced block.
pub fn build_prompt(file: &InputFile, target_language: &str, target_version: &str) -> String {
    let target = if target_version == LATEST_VERSION {
        target_language.to_owned()
    } else {
        format!("{target_language} ({target_version})")
    };

    format!(
        r#"You are an expert code converter.

Convert the following file to {target}.
Preserve logic, comments, and structure.

Output ONLY valid JSON matching this schema:
{{
  "path": "<string - file path or name>",
  "content": "<string - converted file contents>"
}}

Do not include markdown fences, explanations, or any text outside JSON.

File Path: {path}
Filename: {name}
Code:
```
{content}
```
"#,
        path = file.path,
        name = file.name,
        content = file.content,
    )
}
