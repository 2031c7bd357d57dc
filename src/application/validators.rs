use crate::application::commands::{
    CreateSchemeCommand, EditRolePermissionsCommand, PatchSchemeCommand,
    TogglePermissionGroupCommand,
};

const MAX_DISPLAY_NAME_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 1024;

/// Validation error types
#[derive(Debug)]
pub enum ValidationError {
    FieldValidation { field: String, message: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::FieldValidation { field, message } => {
                write!(f, "Field validation failed: {field} - {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::FieldValidation {
            field: field.to_string(),
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(())
}

fn require_max_len(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.len() > max {
        return Err(ValidationError::FieldValidation {
            field: field.to_string(),
            message: format!("{field} cannot exceed {max} characters"),
        });
    }
    Ok(())
}

/// Scheme command validation rules. Permission codes are never validated
/// here: unknown codes are excluded downstream, not rejected.
pub struct SchemeCommandValidator;

impl SchemeCommandValidator {
    pub fn validate_create(command: &CreateSchemeCommand) -> Result<(), ValidationError> {
        require_non_empty("display_name", &command.display_name)?;
        require_max_len("display_name", &command.display_name, MAX_DISPLAY_NAME_LEN)?;
        if let Some(description) = &command.description {
            require_max_len("description", description, MAX_DESCRIPTION_LEN)?;
        }
        Ok(())
    }

    pub fn validate_patch(command: &PatchSchemeCommand) -> Result<(), ValidationError> {
        require_non_empty("scheme_id", &command.scheme_id)?;
        if let Some(display_name) = &command.display_name {
            require_non_empty("display_name", display_name)?;
            require_max_len("display_name", display_name, MAX_DISPLAY_NAME_LEN)?;
        }
        if let Some(description) = &command.description {
            require_max_len("description", description, MAX_DESCRIPTION_LEN)?;
        }
        Ok(())
    }
}

/// Role command validation rules
pub struct RoleCommandValidator;

impl RoleCommandValidator {
    pub fn validate_edit(command: &EditRolePermissionsCommand) -> Result<(), ValidationError> {
        require_non_empty("role_id", &command.role_id)
    }

    pub fn validate_toggle(command: &TogglePermissionGroupCommand) -> Result<(), ValidationError> {
        require_non_empty("role_id", &command.role_id)?;
        require_non_empty("group_id", &command.group_id)
    }
}
