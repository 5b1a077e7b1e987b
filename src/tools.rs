//! The two mutation tools advertised to the model and their typed decoding.

use std::path::Path;

use chat_provider::ToolDefinition;
use serde::Deserialize;
use serde_json::json;

pub const EDIT_FILE_TOOL: &str = "edit_file";
pub const DELETE_FILE_TOOL: &str = "delete_file";

/// Tool schemas sent with every request.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: EDIT_FILE_TOOL.to_string(),
            description: Some("Use this function to edit/create the contents of files.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file you want to edit."
                    },
                    "file_content": {
                        "type": "string",
                        "description": "The new content of the file."
                    },
                    "commit_message": {
                        "type": "string",
                        "description": "The message for the commit."
                    }
                },
                "required": ["file_path", "file_content", "commit_message"]
            }),
        },
        ToolDefinition {
            name: DELETE_FILE_TOOL.to_string(),
            description: Some("Use this function to delete files.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file you want to delete."
                    },
                    "commit_message": {
                        "type": "string",
                        "description": "The message for the commit."
                    }
                },
                "required": ["file_path", "commit_message"]
            }),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditFileArgs {
    pub file_path: String,
    pub file_content: String,
    pub commit_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteFileArgs {
    pub file_path: String,
    pub commit_message: String,
}

/// A completed tool call decoded into one of the supported mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    WriteFile(EditFileArgs),
    DeleteFile(DeleteFileArgs),
}

impl ToolInvocation {
    /// Decodes the accumulated name and argument text of one call.
    pub fn parse(name: Option<&str>, arguments: &str) -> Result<Self, ToolParseError> {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ToolParseError::MissingName)?;

        match name {
            EDIT_FILE_TOOL => serde_json::from_str(arguments)
                .map(Self::WriteFile)
                .map_err(|source| ToolParseError::InvalidArguments {
                    tool: EDIT_FILE_TOOL,
                    source,
                }),
            DELETE_FILE_TOOL => serde_json::from_str(arguments)
                .map(Self::DeleteFile)
                .map_err(|source| ToolParseError::InvalidArguments {
                    tool: DELETE_FILE_TOOL,
                    source,
                }),
            unknown => Err(ToolParseError::UnknownTool {
                name: unknown.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn file_path(&self) -> &str {
        match self {
            Self::WriteFile(args) => &args.file_path,
            Self::DeleteFile(args) => &args.file_path,
        }
    }

    /// Output line reported after the mutation is committed.
    #[must_use]
    pub fn confirmation(&self) -> String {
        let name = basename(self.file_path());
        match self {
            Self::WriteFile(_) => format!("\nModified file: {name}"),
            Self::DeleteFile(_) => format!("\nRemoved file: {name}"),
        }
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ToolParseError {
    #[error("tool call has no name")]
    MissingName,
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },
    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn definitions_declare_required_fields() {
        let definitions = tool_definitions();
        let required: Vec<(&str, &serde_json::Value)> = definitions
            .iter()
            .map(|tool| (tool.name.as_str(), &tool.input_schema["required"]))
            .collect();

        assert_eq!(
            required,
            vec![
                (
                    EDIT_FILE_TOOL,
                    &json!(["file_path", "file_content", "commit_message"])
                ),
                (DELETE_FILE_TOOL, &json!(["file_path", "commit_message"])),
            ]
        );
    }

    #[test]
    fn edit_file_parses_into_write_invocation() {
        let invocation = ToolInvocation::parse(
            Some("edit_file"),
            r##"{"file_path":"docs/a.md","file_content":"# A\n","commit_message":"Add A"}"##,
        )
        .expect("valid call");

        assert_eq!(
            invocation,
            ToolInvocation::WriteFile(EditFileArgs {
                file_path: "docs/a.md".to_string(),
                file_content: "# A\n".to_string(),
                commit_message: "Add A".to_string(),
            })
        );
        assert_eq!(invocation.confirmation(), "\nModified file: a.md");
    }

    #[test]
    fn delete_file_parses_into_delete_invocation() {
        let invocation = ToolInvocation::parse(
            Some("delete_file"),
            r#"{"file_path":"old.txt","commit_message":"Drop old"}"#,
        )
        .expect("valid call");

        assert_eq!(invocation.file_path(), "old.txt");
        assert_eq!(invocation.confirmation(), "\nRemoved file: old.txt");
    }

    #[test]
    fn missing_and_unknown_names_are_typed_errors() {
        assert!(matches!(
            ToolInvocation::parse(None, "{}"),
            Err(ToolParseError::MissingName)
        ));
        assert!(matches!(
            ToolInvocation::parse(Some("  "), "{}"),
            Err(ToolParseError::MissingName)
        ));
        assert!(matches!(
            ToolInvocation::parse(Some("rename_file"), "{}"),
            Err(ToolParseError::UnknownTool { name }) if name == "rename_file"
        ));
    }

    #[test]
    fn malformed_or_incomplete_arguments_are_rejected() {
        for arguments in [
            "",
            r#"{"file_path":"a.txt""#,
            r#"{"file_path":"a.txt","commit_message":"m"}"#,
            r#"{"file_path":"a.txt","file_content":"x","commit_message":"m","mode":"755"}"#,
        ] {
            assert!(
                matches!(
                    ToolInvocation::parse(Some("edit_file"), arguments),
                    Err(ToolParseError::InvalidArguments { tool: "edit_file", .. })
                ),
                "expected {arguments:?} to be rejected"
            );
        }
    }

    #[test]
    fn invalid_arguments_keep_the_json_error_as_source() {
        let error = ToolInvocation::parse(Some("delete_file"), "{\"file_path\":")
            .expect_err("truncated arguments");

        assert!(error.to_string().starts_with("invalid arguments for delete_file: "));
        assert!(std::error::Error::source(&error).is_some());
        assert!(std::error::Error::source(&ToolParseError::MissingName).is_none());
    }
}
