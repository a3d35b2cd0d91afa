//! # Operation Registry
//!
//! The routing table mapping `(op, action)` tags to external invocations.
//! This table is the worker's only extension point: adding an operation means
//! adding a row (one configuration entry), nothing else changes.

use std::collections::HashMap;

use crate::config::OperationRow;

use super::command::Command;

/// Routing key: operation tag plus optional action tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub op: String,
    pub action: Option<String>,
}

/// External invocation for one routing row: program, fixed leading
/// arguments, and (implicitly) the serialized payload appended last.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationSpec {
    pub program: String,
    pub args: Vec<String>,
}

/// Static table of registered operations.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    handlers: HashMap<OperationKey, InvocationSpec>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration rows. Later rows with the same
    /// key replace earlier ones.
    pub fn from_rows(rows: &[OperationRow]) -> Self {
        let mut registry = Self::new();
        for row in rows {
            registry.register(
                OperationKey {
                    op: row.op.clone(),
                    action: row.action.clone(),
                },
                InvocationSpec {
                    program: row.program.clone(),
                    args: row.args.clone(),
                },
            );
        }
        registry
    }

    pub fn register(&mut self, key: OperationKey, spec: InvocationSpec) {
        self.handlers.insert(key, spec);
    }

    /// Look up the invocation for a command; `None` means the command is
    /// dropped.
    pub fn resolve(&self, command: &Command) -> Option<&InvocationSpec> {
        self.handlers.get(&command.operation_key())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::command::Command;
    use proptest::prelude::*;
    use serde_json::Map;

    fn site_table() -> OperationRegistry {
        let mut registry = OperationRegistry::new();
        registry.register(
            OperationKey {
                op: "InvokeAction".to_string(),
                action: Some("runSite".to_string()),
            },
            InvocationSpec {
                program: "step-simulation".to_string(),
                args: vec![],
            },
        );
        registry.register(
            OperationKey {
                op: "InvokeAction".to_string(),
                action: Some("addSite".to_string()),
            },
            InvocationSpec {
                program: "add-site".to_string(),
                args: vec![],
            },
        );
        registry
    }

    fn command(op: &str, action: Option<&str>) -> Command {
        Command {
            op: op.to_string(),
            action: action.map(str::to_string),
            fields: Map::new(),
        }
    }

    #[test]
    fn resolves_registered_actions() {
        let registry = site_table();

        let run_site = command("InvokeAction", Some("runSite"));
        assert_eq!(
            registry.resolve(&run_site).unwrap().program,
            "step-simulation"
        );

        let add_site = command("InvokeAction", Some("addSite"));
        assert_eq!(registry.resolve(&add_site).unwrap().program, "add-site");
    }

    #[test]
    fn unknown_action_and_missing_action_do_not_resolve() {
        let registry = site_table();
        assert!(registry
            .resolve(&command("InvokeAction", Some("removeSite")))
            .is_none());
        assert!(registry.resolve(&command("InvokeAction", None)).is_none());
    }

    #[test]
    fn from_rows_builds_the_configured_table() {
        let rows = vec![crate::config::OperationRow {
            op: "InvokeAction".to_string(),
            action: Some("runSite".to_string()),
            program: "python3".to_string(),
            args: vec!["runners/step_simulation.py".to_string()],
        }];

        let registry = OperationRegistry::from_rows(&rows);
        assert_eq!(registry.len(), 1);

        let spec = registry
            .resolve(&command("InvokeAction", Some("runSite")))
            .unwrap();
        assert_eq!(spec.program, "python3");
        assert_eq!(spec.args, vec!["runners/step_simulation.py".to_string()]);
    }

    proptest! {
        #[test]
        fn unregistered_ops_never_resolve(op in "[A-Za-z]{1,16}") {
            prop_assume!(op != "InvokeAction");
            let registry = site_table();
            let command = command(&op, Some("runSite"));
            prop_assert!(registry.resolve(&command).is_none());
        }
    }
}
