use std::collections::BTreeMap;

use super::types::ApiSpec;
use crate::error::{GenError, Result};
use crate::naming::handler_method_name;

fn invalid(message: impl Into<String>) -> GenError {
    GenError::SpecValidation(message.into())
}

/// Reject two operations of one category that derive the same handler method.
fn check_unique<'a>(
    section: &str,
    names: impl Iterator<Item = (usize, &'a str)>,
) -> Result<()> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for (i, name) in names {
        let method = handler_method_name(name);
        if let Some(previous) = seen.insert(method.clone(), name) {
            return Err(invalid(format!(
                "{section}[{i}] {name:?} and {previous:?} both map to handler `{method}`"
            )));
        }
    }
    Ok(())
}

impl ApiSpec {
    /// Check required fields and handler identifier uniqueness.
    ///
    /// # Errors
    ///
    /// `SpecValidation` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.info.title.trim().is_empty() {
            return Err(invalid("info.title is required"));
        }
        if self.info.version.trim().is_empty() {
            return Err(invalid("info.version is required"));
        }

        for (i, tool) in self.tools.iter().enumerate() {
            if tool.name.trim().is_empty() {
                return Err(invalid(format!("tools[{i}].name is required")));
            }
            if tool.input_schema.is_none() {
                return Err(invalid(format!(
                    "tools[{i}].inputSchema is required (tool {:?})",
                    tool.name
                )));
            }
        }

        for (i, resource) in self.resources.iter().enumerate() {
            if resource.name.trim().is_empty() {
                return Err(invalid(format!("resources[{i}].name is required")));
            }
            let has_uri = resource.uri.as_deref().is_some_and(|u| !u.is_empty());
            match (has_uri, resource.is_template()) {
                (false, false) => {
                    return Err(invalid(format!(
                        "resources[{i}] must have either uri or uriTemplate"
                    )))
                }
                (true, true) => {
                    return Err(invalid(format!(
                        "resources[{i}] cannot have both uri and uriTemplate"
                    )))
                }
                _ => {}
            }
        }

        for (i, prompt) in self.prompts.iter().enumerate() {
            if prompt.name.trim().is_empty() {
                return Err(invalid(format!("prompts[{i}].name is required")));
            }
            for (j, arg) in prompt.arguments.iter().enumerate() {
                if arg.name.trim().is_empty() {
                    return Err(invalid(format!(
                        "prompts[{i}].arguments[{j}].name is required"
                    )));
                }
            }
        }

        check_unique(
            "tools",
            self.tools.iter().enumerate().map(|(i, t)| (i, t.name.as_str())),
        )?;
        check_unique(
            "resources",
            self.resources
                .iter()
                .enumerate()
                .filter(|(_, r)| !r.is_template())
                .map(|(i, r)| (i, r.name.as_str())),
        )?;
        check_unique(
            "resources",
            self.resources
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_template())
                .map(|(i, r)| (i, r.name.as_str())),
        )?;
        check_unique(
            "prompts",
            self.prompts.iter().enumerate().map(|(i, p)| (i, p.name.as_str())),
        )?;
        Ok(())
    }
}
