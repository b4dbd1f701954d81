use super::{item_lines, pick, text, CONVERSATION_ID_PATTERN};
use crate::form::{FieldDef, FieldError};
use crate::lifecycle::CallSpec;
use crate::services::ConversationFilter;
use serde_json::{json, Value};

pub(super) fn specs() -> Vec<CallSpec> {
    vec![
        CallSpec::new("MessageService", "sendMessage")
            .summary("Send a text message to a conversation")
            .field(conversation_field())
            .field(FieldDef::text("text", "Text").required())
            .defaults(json!({ "conversationId": "alice|p2p|bob", "text": "hello from the console" }))
            .build(|values| Ok(pick(values, &["conversationId", "text"])))
            .view(|output| vec![message_line(&output["message"])]),
        CallSpec::new("MessageService", "revokeMessage")
            .summary("Revoke one of your own messages")
            .field(
                FieldDef::text("messageClientId", "Message client id")
                    .required()
                    .help("Copy it from a sendMessage or getMessageList result"),
            )
            .field(FieldDef::text("postscript", "Postscript"))
            .defaults(json!({ "messageClientId": "paste-a-message-client-id" }))
            .build(|values| Ok(pick(values, &["messageClientId", "postscript"]))),
        CallSpec::new("MessageService", "getMessageList")
            .summary("Page through the history of a conversation")
            .field(conversation_field())
            .field(FieldDef::integer("limit", "Limit").range(1, 100))
            .field(FieldDef::choice("direction", "Direction", &["older", "newer"]))
            .defaults(json!({ "conversationId": "alice|p2p|bob", "limit": 20, "direction": "older" }))
            .build(|values| Ok(pick(values, &["conversationId", "limit", "direction"])))
            .view(|output| item_lines(output, message_line)),
        CallSpec::new("ConversationService", "getConversationList")
            .summary("List conversations through a named filter")
            .field(FieldDef::integer("offset", "Offset").range(0, 10_000))
            .field(FieldDef::integer("limit", "Limit").range(1, 100))
            .field(
                FieldDef::choice("filter", "Filter", ConversationFilter::NAMES)
                    .help("all, unread only, one-to-one or team conversations"),
            )
            .defaults(json!({ "offset": 0, "limit": 50, "filter": "all" }))
            .build(build_conversation_query)
            .view(|output| item_lines(&output["conversationList"], conversation_line)),
        CallSpec::new("ConversationService", "deleteConversation")
            .summary("Delete a conversation, optionally with its messages")
            .field(conversation_field())
            .field(FieldDef::toggle("clearMessage", "Also clear messages"))
            .defaults(json!({ "conversationId": "alice|p2p|bob", "clearMessage": false }))
            .build(|values| Ok(pick(values, &["conversationId", "clearMessage"]))),
    ]
}

fn conversation_field() -> FieldDef {
    FieldDef::text("conversationId", "Conversation id")
        .required()
        .pattern(CONVERSATION_ID_PATTERN)
        .help("<self>|<p2p|team>|<target>")
}

fn build_conversation_query(values: &crate::form::FormValues) -> Result<Value, FieldError> {
    let mut query = pick(values, &["offset", "limit"]);
    let name = values.get("filter").and_then(Value::as_str).unwrap_or("all");
    let filter = ConversationFilter::from_name(name)
        .ok_or_else(|| FieldError::invalid("filter", format!("unknown filter {}", name)))?;
    if let (Some(filter), Value::Object(query)) = (filter.to_filter(), &mut query) {
        query.insert("filter".to_string(), filter);
    }
    Ok(query)
}

fn message_line(message: &Value) -> String {
    let revoked = if message["revoked"].as_bool().unwrap_or(false) {
        " (revoked)"
    } else {
        ""
    };
    format!(
        "{} <{}> {}{}",
        text(message, "messageClientId"),
        text(message, "senderId"),
        text(message, "text"),
        revoked
    )
}

fn conversation_line(conversation: &Value) -> String {
    format!(
        "{} unread={} last={}",
        text(conversation, "conversationId"),
        conversation["unreadCount"].as_u64().unwrap_or(0),
        text(&conversation["lastMessage"], "text")
    )
}
