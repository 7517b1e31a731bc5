use serde_json::{json, Map, Value};

use crate::core::Command;

use super::CommandError;

pub(crate) struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
}

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "add",
        usage: "add <name> <amount> [frequency] [payer]",
        summary: "Add a recurring expense",
    },
    CommandSpec {
        name: "update",
        usage: "update <id> [name=..] [amount=..] [frequency=..] [payer=..]",
        summary: "Change fields of one expense",
    },
    CommandSpec {
        name: "update-by-name",
        usage: "update-by-name <name> [name=..] [amount=..] [frequency=..] [payer=..]",
        summary: "Change every expense with the given name",
    },
    CommandSpec {
        name: "remove",
        usage: "remove <id>",
        summary: "Delete one expense",
    },
    CommandSpec {
        name: "remove-by-name",
        usage: "remove-by-name <name>",
        summary: "Delete every expense with the given name",
    },
    CommandSpec {
        name: "clear",
        usage: "clear",
        summary: "Delete all expenses",
    },
    CommandSpec {
        name: "rebuild",
        usage: "rebuild",
        summary: "Re-sync published objects with the stored expenses",
    },
    CommandSpec {
        name: "participants",
        usage: "participants [name...]",
        summary: "Show or replace the participants",
    },
    CommandSpec {
        name: "overview",
        usage: "overview",
        summary: "Show the monthly total and what each participant pays",
    },
    CommandSpec {
        name: "items",
        usage: "items",
        summary: "List expenses with their monthly share",
    },
    CommandSpec {
        name: "call",
        usage: "call <json>",
        summary: "Run a raw service call, e.g. {\"service\": \"clear\"}",
    },
    CommandSpec {
        name: "help",
        usage: "help [command]",
        summary: "Show available commands",
    },
    CommandSpec {
        name: "exit",
        usage: "exit",
        summary: "Leave the shell",
    },
];

pub(crate) fn command_names() -> Vec<&'static str> {
    COMMANDS.iter().map(|spec| spec.name).collect()
}

pub(crate) fn find_spec(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

fn usage_error(name: &str) -> CommandError {
    let usage = find_spec(name).map(|spec| spec.usage).unwrap_or(name);
    CommandError::InvalidArguments(format!("Usage: {}", usage))
}

fn service(service: &str, data: Value) -> Result<Command, CommandError> {
    Ok(Command::from_value(json!({ "service": service, "data": data }))?)
}

pub(crate) fn add(args: &[&str]) -> Result<Command, CommandError> {
    let [name, amount, rest @ ..] = args else {
        return Err(usage_error("add"));
    };
    if rest.len() > 2 {
        return Err(usage_error("add"));
    }
    let mut data = json!({ "name": name, "amount": amount });
    if let Some(frequency) = rest.first() {
        data["frequency"] = json!(frequency);
    }
    if let Some(payer) = rest.get(1) {
        data["payer"] = json!(payer);
    }
    service("add_item", data)
}

/// Parses `field=value` pairs. `rename_key` is the payload key a `name=` pair maps to.
fn fields(
    command: &str,
    pairs: &[&str],
    rename_key: &str,
) -> Result<Map<String, Value>, CommandError> {
    let mut data = Map::new();
    for pair in pairs {
        let Some((field, value)) = pair.split_once('=') else {
            return Err(usage_error(command));
        };
        let key = match field.trim().to_ascii_lowercase().as_str() {
            "name" => rename_key.to_string(),
            other @ ("amount" | "frequency" | "payer") => other.to_string(),
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "Unknown field `{}`. Use name, amount, frequency or payer.",
                    other
                )))
            }
        };
        data.insert(key, json!(value));
    }
    Ok(data)
}

pub(crate) fn update(args: &[&str]) -> Result<Command, CommandError> {
    let [id, pairs @ ..] = args else {
        return Err(usage_error("update"));
    };
    let mut data = fields("update", pairs, "name")?;
    data.insert("id".into(), json!(id));
    service("update_item", Value::Object(data))
}

pub(crate) fn update_by_name(args: &[&str]) -> Result<Command, CommandError> {
    let [name, pairs @ ..] = args else {
        return Err(usage_error("update-by-name"));
    };
    let mut data = fields("update-by-name", pairs, "new_name")?;
    data.insert("name".into(), json!(name));
    service("update_item_by_name", Value::Object(data))
}

pub(crate) fn remove(args: &[&str]) -> Result<Command, CommandError> {
    match args {
        [id] => service("remove_item", json!({ "id": id })),
        _ => Err(usage_error("remove")),
    }
}

pub(crate) fn remove_by_name(args: &[&str]) -> Result<Command, CommandError> {
    match args {
        [name] => service("remove_item_by_name", json!({ "name": name })),
        _ => Err(usage_error("remove-by-name")),
    }
}

pub(crate) fn set_participants(args: &[&str]) -> Result<Command, CommandError> {
    service("set_participants", json!({ "names": args }))
}

pub(crate) fn raw_call(args: &[&str]) -> Result<Command, CommandError> {
    if args.is_empty() {
        return Err(usage_error("call"));
    }
    Ok(Command::from_json(&args.join(" "))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Frequency;

    #[test]
    fn add_builds_item_with_optional_fields() {
        let Command::AddItem(add) = add(&["Netflix", "129", "monthly", "Christian"]).unwrap()
        else {
            panic!("expected add_item");
        };
        assert_eq!(add.amount, 129.0);
        assert_eq!(add.frequency.as_deref(), Some("monthly"));
        assert_eq!(add.payer.as_deref(), Some("Christian"));
    }

    #[test]
    fn add_without_amount_is_a_usage_error() {
        assert!(matches!(
            add(&["Rent"]),
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[test]
    fn update_by_name_maps_name_field_to_new_name() {
        let command = update_by_name(&["Rent", "name=Housing", "amount=9500"]).unwrap();
        let Command::UpdateItemByName(update) = command else {
            panic!("expected update_item_by_name");
        };
        assert_eq!(update.name, "Rent");
        let patch = update.patch();
        assert_eq!(patch.name.as_deref(), Some("Housing"));
        assert_eq!(patch.amount, Some(9500.0));
    }

    #[test]
    fn update_parses_frequency() {
        let Command::UpdateItem(update) = update(&["abc", "frequency=Yearly"]).unwrap() else {
            panic!("expected update_item");
        };
        assert_eq!(update.patch().frequency, Some(Frequency::Yearly));
    }

    #[test]
    fn unknown_update_field_is_rejected() {
        assert!(matches!(
            update(&["abc", "colour=red"]),
            Err(CommandError::InvalidArguments(_))
        ));
    }

    #[test]
    fn raw_call_joins_arguments() {
        let command = raw_call(&["{\"service\":", "\"clear\"}"]).unwrap();
        assert_eq!(command, Command::Clear);
    }

    #[test]
    fn every_spec_has_unique_name() {
        let mut names = command_names();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }
}
