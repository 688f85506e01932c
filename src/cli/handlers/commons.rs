// src/cli/handlers/commons.rs

use crate::{
    core::{arg_parser::GlobalOptions, color, config_loader::ConfigSnapshot},
    models::VariableTable,
    system::executor::OutputOptions,
};

/// Loads the `vars` section. A malformed section is reported and substitution is
/// skipped for this run instead of aborting it.
pub fn load_variables(snapshot: &ConfigSnapshot) -> Option<VariableTable> {
    match snapshot.variables() {
        Ok(table) => {
            log::debug!("Loaded {} variable(s).", table.len());
            Some(table)
        }
        Err(e) => {
            log::warn!("failed to get vars: {}", e);
            println!("failed to get vars. skip");
            None
        }
    }
}

/// How parallel output is shown for these options.
pub fn output_options(options: &GlobalOptions) -> OutputOptions {
    OutputOptions {
        suppress: options.without_output,
        line_color: options
            .output_color
            .as_deref()
            .map(color::parse_color_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colored::Color;
    use serde_json::json;

    #[test]
    fn test_malformed_vars_are_skipped() {
        let snapshot = ConfigSnapshot::from_value(json!({ "vars": { "nested": { "a": 1 } } }));
        assert!(load_variables(&snapshot).is_none());

        let snapshot = ConfigSnapshot::from_value(json!({ "vars": { "name": "world" } }));
        let table = load_variables(&snapshot).unwrap();
        assert_eq!(table.get("NAME"), Some("world"));
    }

    #[test]
    fn test_output_options_follow_flags() {
        let options = GlobalOptions {
            without_output: true,
            output_color: Some("cyan".to_string()),
            ..Default::default()
        };
        let output = output_options(&options);
        assert!(output.suppress);
        assert_eq!(output.line_color, Some(Color::Cyan));
    }
}
