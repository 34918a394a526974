use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KarozuError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Edit,
    Append,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Edit => "edit",
            OperationKind::Append => "append",
            OperationKind::Delete => "delete",
        }
    }

    /// The payload fields this operation requires.
    pub fn required_fields(self) -> Vec<&'static str> {
        match self {
            OperationKind::Create => vec!["template"],
            OperationKind::Edit => vec!["replacements"],
            OperationKind::Append => vec!["content"],
            OperationKind::Delete => vec![],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    pub old_string: String,
    pub new_string: String,
}

impl Replacement {
    pub fn new(old_string: impl Into<String>, new_string: impl Into<String>) -> Self {
        Self {
            old_string: old_string.into(),
            new_string: new_string.into(),
        }
    }
}

/// What a render function returns, before the operation is checked.
///
/// Mirrors the loose record template authors write: the operation may be
/// omitted, and any combination of payload fields may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSpec {
    pub title: String,
    pub description: String,
    /// Path of the target file, relative to the project root.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacements: Option<Vec<Replacement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileSpec {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn operation(mut self, operation: OperationKind) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn replacements(mut self, replacements: Vec<Replacement>) -> Self {
        self.replacements = Some(replacements);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Payload fields that are set. An empty replacement list counts as unset.
    fn present_fields(&self) -> Vec<&'static str> {
        let mut found = Vec::new();
        if self.template.is_some() {
            found.push("template");
        }
        if self.replacements.as_ref().is_some_and(|r| !r.is_empty()) {
            found.push("replacements");
        }
        if self.content.is_some() {
            found.push("content");
        }
        found
    }

    /// Infer the operation if omitted and check the payload matches it.
    ///
    /// A `FileSpec` with a `template` and no `operation` is a `create`. Any other
    /// omission, a missing payload, or a payload belonging to another
    /// operation is a [`KarozuError::TemplateShape`].
    pub fn normalize(self) -> Result<FileDescriptor> {
        let found = self.present_fields();

        let Some(kind) = self
            .operation
            .or_else(|| self.template.is_some().then_some(OperationKind::Create))
        else {
            return Err(KarozuError::TemplateShape {
                title: self.title,
                operation: "<none>".to_string(),
                expected: vec!["operation", "template"],
                found,
            });
        };

        let expected = kind.required_fields();
        if found != expected {
            return Err(KarozuError::TemplateShape {
                title: self.title,
                operation: kind.to_string(),
                expected,
                found,
            });
        }

        let operation = match (kind, self.template, self.replacements, self.content) {
            (OperationKind::Create, Some(template), _, _) => FileOperation::Create { template },
            (OperationKind::Edit, _, Some(replacements), _) => FileOperation::Edit { replacements },
            (OperationKind::Append, _, _, Some(content)) => FileOperation::Append { content },
            (OperationKind::Delete, ..) => FileOperation::Delete,
            _ => unreachable!("field set checked against required fields"),
        };

        Ok(FileDescriptor {
            title: self.title,
            description: self.description,
            path: self.path,
            operation,
        })
    }
}

/// The operation-specific part of a compiled file description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum FileOperation {
    Create { template: String },
    Edit { replacements: Vec<Replacement> },
    Append { content: String },
    Delete,
}

impl FileOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            FileOperation::Create { .. } => OperationKind::Create,
            FileOperation::Edit { .. } => OperationKind::Edit,
            FileOperation::Append { .. } => OperationKind::Append,
            FileOperation::Delete => OperationKind::Delete,
        }
    }
}

/// A compiled, operation-tagged file description ready for an installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub title: String,
    pub description: String,
    pub path: String,
    #[serde(flatten)]
    pub operation: FileOperation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn spec() -> FileSpec {
        FileSpec::new("Config", "Drizzle config", "drizzle.config.ts")
    }

    #[test]
    fn test_template_without_operation_infers_create() {
        let descriptor = spec().template("export default {}").normalize().unwrap();
        assert_eq!(
            descriptor.operation,
            FileOperation::Create {
                template: "export default {}".into()
            }
        );
    }

    #[rstest]
    #[case::edit_without_replacements(spec().operation(OperationKind::Edit))]
    #[case::edit_with_empty_replacements(spec().operation(OperationKind::Edit).replacements(vec![]))]
    #[case::create_without_template(spec().operation(OperationKind::Create))]
    #[case::append_without_content(spec().operation(OperationKind::Append))]
    #[case::delete_with_content(spec().operation(OperationKind::Delete).content("x"))]
    #[case::create_with_extra_content(spec().template("a").content("b"))]
    #[case::nothing_at_all(spec())]
    fn test_shape_mismatch_is_rejected(#[case] spec: FileSpec) {
        let err = spec.normalize().unwrap_err();
        assert!(matches!(err, KarozuError::TemplateShape { ref title, .. } if title == "Config"));
    }

    #[test]
    fn test_edit_keeps_replacement_order() {
        let descriptor = spec()
            .operation(OperationKind::Edit)
            .replacements(vec![
                Replacement::new("A=", "A=1"),
                Replacement::new("B=", "B=2"),
            ])
            .normalize()
            .unwrap();
        let FileOperation::Edit { replacements } = descriptor.operation else {
            panic!("expected edit");
        };
        assert_eq!(replacements[0].old_string, "A=");
        assert_eq!(replacements[1].old_string, "B=");
    }

    #[test]
    fn test_delete_has_no_payload() {
        let descriptor = spec().operation(OperationKind::Delete).normalize().unwrap();
        assert_eq!(descriptor.operation.kind(), OperationKind::Delete);
    }

    #[test]
    fn test_descriptor_serializes_with_operation_tag() {
        let descriptor = spec()
            .operation(OperationKind::Edit)
            .replacements(vec![Replacement::new("DATABASE_URL=", "DATABASE_URL=mysql://")])
            .normalize()
            .unwrap();
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["operation"], "edit");
        assert_eq!(json["path"], "drizzle.config.ts");
        assert_eq!(json["replacements"][0]["oldString"], "DATABASE_URL=");
        assert_eq!(json["replacements"][0]["newString"], "DATABASE_URL=mysql://");
    }
}
