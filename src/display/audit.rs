//! Audit trail display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::{format_value, ActionOption, ActivityItem, AuditView, FieldMap, Page};

#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Actor")]
    actor: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "IP")]
    address: String,
}

impl From<&AuditView> for AuditRow {
    fn from(view: &AuditView) -> Self {
        Self {
            id: view.id.as_uuid().to_string(),
            when: view.created_at_display.clone(),
            actor: view.actor_name().to_string(),
            action: view.action_label.clone(),
            subject: subject_label(view),
            address: view.network_address.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

fn subject_label(view: &AuditView) -> String {
    match view.subject_id.as_deref() {
        Some(id) => format!("{} {}", view.subject_type_label, short(id)),
        None => view.subject_type_label.clone(),
    }
}

/// First segment of a uuid-like identifier
fn short(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

/// Format one page of the trail as a table with a page footer
pub fn format_audit_page(page: &Page<AuditView>) -> String {
    if page.items.is_empty() {
        return "No audit records found.".to_string();
    }

    let rows: Vec<AuditRow> = page.items.iter().map(AuditRow::from).collect();
    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push_str(&format!(
        "\n\nPage {} of {} ({} records)",
        page.page,
        page.last_page(),
        page.total
    ));
    output
}

/// Format the full detail of a single record
pub fn format_audit_details(view: &AuditView) -> String {
    let mut output = String::new();

    output.push_str(&format!("Record:     {}\n", view.id.as_uuid()));
    output.push_str(&format!(
        "When:       {} ({})\n",
        view.created_at_display, view.created_at_relative
    ));
    match &view.actor {
        Some(actor) => output.push_str(&format!("Actor:      {} <{}>\n", actor.name, actor.contact)),
        None => output.push_str("Actor:      System\n"),
    }
    output.push_str(&format!("Action:     {} ({})\n", view.action_label, view.action));
    output.push_str(&format!("Subject:    {}\n", view.subject_type_label));
    if let Some(id) = &view.subject_id {
        output.push_str(&format!("Subject ID: {}\n", id));
    }

    if let Some(address) = &view.network_address {
        output.push_str(&format!("IP:         {}\n", address));
    }
    if let Some(agent) = &view.user_agent {
        output.push_str(&format!("User agent: {}\n", agent));
    }
    if let (Some(verb), Some(path)) = (&view.http_verb, &view.request_path) {
        output.push_str(&format!("Request:    {} {}\n", verb, path));
    }

    if !view.computed_diff.is_empty() {
        output.push_str("\nChanges:\n");
        for (field, change) in view.computed_diff.iter() {
            let line = match (view.before_state.is_some(), view.after_state.is_some()) {
                (true, true) => format!(
                    "  {}: {} -> {}",
                    field,
                    format_value(&change.old),
                    format_value(&change.new)
                ),
                (false, true) => format!("  {}: {}", field, format_value(&change.new)),
                _ => format!("  {}: {}", field, format_value(&change.old)),
            };
            output.push_str(&line);
            output.push('\n');
        }
    }

    if let Some(metadata) = &view.metadata {
        output.push_str("\nMetadata:\n");
        output.push_str(&format_fields(metadata));
    }

    output
}

fn format_fields(fields: &FieldMap) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("  {}: {}\n", key, format_value(value)))
        .collect()
}

#[derive(Tabled)]
struct ActionRow<'a> {
    #[tabled(rename = "Code")]
    code: &'a str,
    #[tabled(rename = "Label")]
    label: &'a str,
}

/// Format the action catalogue
pub fn format_action_list(actions: &[ActionOption]) -> String {
    let rows = actions.iter().map(|a| ActionRow {
        code: &a.code,
        label: &a.label,
    });
    Table::new(rows).with(Style::psql()).to_string()
}

/// Format the recent-activity feed, one line per record
pub fn format_activity_feed(items: &[ActivityItem]) -> String {
    if items.is_empty() {
        return "No recent activity.".to_string();
    }

    items
        .iter()
        .map(|item| {
            let subject = match &item.subject_id {
                Some(id) => format!("{} {}", item.subject_label, short(id)),
                None => item.subject_label.clone(),
            };
            format!(
                "{:<16} {} {} ({})",
                item.actor_name, item.action_label, subject, item.created_at_relative
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
