//! Ansible INI rendering of an inventory's host and group tree.

use crate::models::{parse_variables, Group, Host};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Write;

/// Render hosts and groups as an INI inventory.
///
/// Ungrouped hosts come first, then one `[group]` section per group in name
/// order, followed by `[group:children]` and `[group:vars]` sections where
/// they have content. Disabled hosts are left out. Malformed variable blobs
/// contribute no variables.
pub fn render(groups: &[Group], hosts: &[Host]) -> String {
    let mut groups: Vec<&Group> = groups.iter().collect();
    groups.sort_by(|a, b| a.name.cmp(&b.name));

    let names: HashMap<&str, &str> = groups
        .iter()
        .map(|g| (g.id.as_str(), g.name.as_str()))
        .collect();

    let mut out = String::new();

    for host in hosts.iter().filter(|h| h.enabled) {
        let grouped = host
            .group_id
            .as_deref()
            .is_some_and(|id| names.contains_key(id));
        if !grouped {
            push_host_line(&mut out, host);
        }
    }

    for group in &groups {
        let members: Vec<&Host> = hosts
            .iter()
            .filter(|h| h.enabled && h.group_id.as_deref() == Some(group.id.as_str()))
            .collect();
        ensure_blank_line(&mut out);
        let _ = writeln!(out, "[{}]", group.name);
        for host in members {
            push_host_line(&mut out, host);
        }
    }

    for group in &groups {
        let mut children: Vec<&str> = groups
            .iter()
            .filter(|g| g.parent_group_id.as_deref() == Some(group.id.as_str()))
            .map(|g| g.name.as_str())
            .collect();
        if children.is_empty() {
            continue;
        }
        children.sort_unstable();
        ensure_blank_line(&mut out);
        let _ = writeln!(out, "[{}:children]", group.name);
        for child in children {
            let _ = writeln!(out, "{}", child);
        }
    }

    for group in &groups {
        let vars = variables_of(&group.variables);
        if vars.is_empty() {
            continue;
        }
        ensure_blank_line(&mut out);
        let _ = writeln!(out, "[{}:vars]", group.name);
        for (key, value) in &vars {
            let _ = writeln!(out, "{}={}", key, render_value(value));
        }
    }

    out
}

fn push_host_line(out: &mut String, host: &Host) {
    out.push_str(&host.name);
    for (key, value) in &variables_of(&host.variables) {
        let _ = write!(out, " {}={}", key, quote_inline(&render_value(value)));
    }
    out.push('\n');
}

fn variables_of(raw: &str) -> Map<String, Value> {
    parse_variables(raw).unwrap_or_default()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn quote_inline(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

fn ensure_blank_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
}
