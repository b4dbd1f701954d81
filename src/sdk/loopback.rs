//! In-process stand-in for the messaging SDK. It keeps just enough state to
//! answer the catalog's calls with realistic shapes and emit matching events;
//! nothing leaves the process.

use super::{ImClient, SdkError, SdkEvent};
use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const CODE_NOT_LOGGED_IN: u16 = 401;
const CODE_NOT_FOUND: u16 = 404;
const CODE_CONFLICT: u16 = 409;
const CODE_PARAMETER: u16 = 414;
const CODE_AUTH: u16 = 302;

#[derive(Debug, Clone)]
pub struct LoopbackOptions {
    pub app_key: String,
    pub latency: Duration,
}

impl Default for LoopbackOptions {
    fn default() -> Self {
        Self {
            app_key: "demo-app-key".to_string(),
            latency: Duration::from_millis(150),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    message_client_id: String,
    conversation_id: String,
    sender_id: String,
    text: String,
    created_at: i64,
    revoked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Conversation {
    conversation_id: String,
    conversation_type: String,
    target_id: String,
    unread_count: u64,
    last_message: Option<Message>,
    updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Team {
    team_id: String,
    name: String,
    team_type: String,
    intro: String,
    join_mode: String,
    owner_account_id: String,
    member_account_ids: Vec<String>,
    created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Friend {
    account_id: String,
    postscript: String,
    created_at: i64,
}

#[derive(Default)]
struct LoopbackState {
    account: Option<String>,
    messages: Vec<Message>,
    conversations: BTreeMap<String, Conversation>,
    teams: Vec<Team>,
    friends: BTreeMap<String, Friend>,
    profiles: BTreeMap<String, serde_json::Map<String, Value>>,
    status_subscriptions: BTreeSet<String>,
}

pub struct LoopbackClient {
    options: LoopbackOptions,
    events: broadcast::Sender<SdkEvent>,
    state: Mutex<LoopbackState>,
}

impl LoopbackClient {
    pub fn new(options: LoopbackOptions, events: broadcast::Sender<SdkEvent>) -> Self {
        debug!(app_key = %options.app_key, latency_ms = options.latency.as_millis() as u64, "loopback client ready");
        Self {
            options,
            events,
            state: Mutex::new(LoopbackState::default()),
        }
    }

    pub fn options(&self) -> &LoopbackOptions {
        &self.options
    }

    fn emit(&self, name: &str, payload: Value) {
        let _ = self.events.send(SdkEvent::new(name, payload));
    }

    fn handle(&self, method: &str, args: &Value) -> Result<Value, SdkError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match method {
            "LoginService.login" => self.login(&mut state, args),
            "LoginService.getLoginUser" => Ok(state.account.clone().map(Value::String).unwrap_or(Value::Null)),
            "LoginService.logout" => {
                let account = logged_in(&state)?.to_string();
                state.account = None;
                self.emit("onLoginStatus", json!({ "status": "LOGOUT", "accountId": account }));
                Ok(Value::Null)
            }
            "MessageService.sendMessage" => self.send_message(&mut state, args),
            "MessageService.revokeMessage" => self.revoke_message(&mut state, args),
            "MessageService.getMessageList" => get_message_list(&state, args),
            "ConversationService.getConversationList" => get_conversation_list(&state, args),
            "ConversationService.deleteConversation" => delete_conversation(&mut state, args),
            "TeamService.createTeam" => self.create_team(&mut state, args),
            "TeamService.getJoinedTeamList" => get_joined_teams(&state, args),
            "FriendService.addFriend" => self.add_friend(&mut state, args),
            "FriendService.getFriendList" => {
                logged_in(&state)?;
                Ok(to_json(state.friends.values().collect::<Vec<_>>()))
            }
            "UserService.updateSelfUserProfile" => self.update_profile(&mut state, args),
            "UserService.getUserList" => get_user_list(&state, args),
            "StorageService.uploadFile" => upload_file(&state, args),
            "SubscriptionService.subscribeUserStatus" => self.subscribe_status(&mut state, args),
            other => Err(SdkError::UnknownMethod(other.to_string())),
        }
    }

    fn login(&self, state: &mut LoopbackState, args: &Value) -> Result<Value, SdkError> {
        let account = str_arg(args, "accountId")?;
        let token = str_arg(args, "token")?;
        let force = args.get("forceMode").and_then(Value::as_bool).unwrap_or(false);
        if token.starts_with("invalid") {
            return Err(SdkError::rejected(CODE_AUTH, "account and token do not match"));
        }
        if let Some(current) = &state.account {
            if !force {
                return Err(SdkError::rejected(
                    CODE_CONFLICT,
                    format!("already logged in as {}", current),
                ));
            }
        }
        state.account = Some(account.to_string());
        self.emit("onLoginStatus", json!({ "status": "LOGINED", "accountId": account }));
        Ok(Value::Null)
    }

    fn send_message(&self, state: &mut LoopbackState, args: &Value) -> Result<Value, SdkError> {
        let sender = logged_in(state)?.to_string();
        let conversation_id = str_arg(args, "conversationId")?;
        let (kind, target) = parse_conversation_id(conversation_id)?;
        let text = str_arg(args, "text")?;
        let message = Message {
            message_client_id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender,
            text: text.to_string(),
            created_at: now_ms(),
            revoked: false,
        };
        state.messages.push(message.clone());
        let conversation = upsert_conversation(state, conversation_id, kind, target);
        conversation.last_message = Some(message.clone());
        conversation.updated_at = message.created_at;
        self.emit("onSendMessage", to_json(&message));

        if kind == "p2p" {
            let reply = Message {
                message_client_id: Uuid::new_v4().to_string(),
                conversation_id: conversation_id.to_string(),
                sender_id: target.to_string(),
                text: format!("echo: {}", text),
                created_at: now_ms(),
                revoked: false,
            };
            state.messages.push(reply.clone());
            let conversation = upsert_conversation(state, conversation_id, kind, target);
            conversation.unread_count += 1;
            conversation.updated_at = reply.created_at;
            conversation.last_message = Some(reply.clone());
            self.emit("onReceiveMessages", json!([reply]));
        }
        Ok(json!({ "message": message }))
    }

    fn revoke_message(&self, state: &mut LoopbackState, args: &Value) -> Result<Value, SdkError> {
        let account = logged_in(state)?.to_string();
        let id = str_arg(args, "messageClientId")?;
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.message_client_id == id)
            .ok_or_else(|| SdkError::rejected(CODE_NOT_FOUND, format!("message {} not found", id)))?;
        if message.sender_id != account {
            return Err(SdkError::rejected(CODE_PARAMETER, "only your own messages can be revoked"));
        }
        if message.revoked {
            return Err(SdkError::rejected(CODE_CONFLICT, "message already revoked"));
        }
        message.revoked = true;
        let notification = json!({
            "messageClientId": id,
            "conversationId": message.conversation_id,
            "postscript": args.get("postscript").cloned().unwrap_or(Value::Null),
        });
        self.emit("onMessageRevokeNotifications", json!([notification]));
        Ok(Value::Null)
    }

    fn create_team(&self, state: &mut LoopbackState, args: &Value) -> Result<Value, SdkError> {
        let owner = logged_in(state)?.to_string();
        let invitees = str_list_arg(args, "inviteeAccountIds");
        let mut members = vec![owner.clone()];
        members.extend(invitees.into_iter().filter(|id| *id != owner));
        let team = Team {
            team_id: format!("team-{}", state.teams.len() + 1),
            name: str_arg(args, "name")?.to_string(),
            team_type: opt_str_arg(args, "teamType").unwrap_or("normal").to_string(),
            intro: opt_str_arg(args, "intro").unwrap_or_default().to_string(),
            join_mode: opt_str_arg(args, "joinMode").unwrap_or("free").to_string(),
            owner_account_id: owner.clone(),
            member_account_ids: members,
            created_at: now_ms(),
        };
        state.teams.push(team.clone());
        let conversation_id = format!("{}|team|{}", owner, team.team_id);
        upsert_conversation(state, &conversation_id, "team", &team.team_id);
        self.emit("onTeamJoined", to_json(&team));
        Ok(json!({ "team": team, "failedList": [] }))
    }

    fn add_friend(&self, state: &mut LoopbackState, args: &Value) -> Result<Value, SdkError> {
        let account = logged_in(state)?.to_string();
        let friend_id = str_arg(args, "accountId")?;
        if friend_id == account {
            return Err(SdkError::rejected(CODE_PARAMETER, "cannot add yourself as a friend"));
        }
        if state.friends.contains_key(friend_id) {
            return Err(SdkError::rejected(CODE_CONFLICT, format!("{} is already a friend", friend_id)));
        }
        let postscript = opt_str_arg(args, "postscript").unwrap_or_default().to_string();
        match opt_str_arg(args, "addMode").unwrap_or("direct") {
            "apply" => {
                self.emit(
                    "onFriendAddApplication",
                    json!({ "applicantAccountId": account, "recipientAccountId": friend_id, "postscript": postscript }),
                );
            }
            _ => {
                let friend = Friend {
                    account_id: friend_id.to_string(),
                    postscript,
                    created_at: now_ms(),
                };
                self.emit("onFriendAdded", to_json(&friend));
                state.friends.insert(friend_id.to_string(), friend);
            }
        }
        Ok(Value::Null)
    }

    fn update_profile(&self, state: &mut LoopbackState, args: &Value) -> Result<Value, SdkError> {
        let account = logged_in(state)?.to_string();
        let updates = args
            .as_object()
            .ok_or_else(|| SdkError::rejected(CODE_PARAMETER, "profile update must be an object"))?;
        let profile = state.profiles.entry(account.clone()).or_insert_with(|| default_profile(&account));
        for (key, value) in updates {
            if !value.is_null() {
                profile.insert(key.clone(), value.clone());
            }
        }
        profile.insert("updatedAt".to_string(), json!(now_ms()));
        let snapshot = Value::Object(profile.clone());
        self.emit("onUserProfileChanged", json!([snapshot]));
        Ok(Value::Null)
    }

    fn subscribe_status(&self, state: &mut LoopbackState, args: &Value) -> Result<Value, SdkError> {
        logged_in(state)?;
        let ids = str_list_arg(args, "accountIds");
        if ids.is_empty() {
            return Err(SdkError::rejected(CODE_PARAMETER, "accountIds must not be empty"));
        }
        let immediate = args.get("immediateSync").and_then(Value::as_bool).unwrap_or(false);
        for id in &ids {
            state.status_subscriptions.insert(id.clone());
        }
        if immediate {
            let statuses: Vec<Value> = ids
                .iter()
                .map(|id| {
                    let online = state.friends.contains_key(id);
                    json!({ "accountId": id, "statusType": if online { "online" } else { "offline" } })
                })
                .collect();
            self.emit("onUserStatusChanged", Value::Array(statuses));
        }
        Ok(json!({ "failedList": [] }))
    }
}

#[async_trait]
impl ImClient for LoopbackClient {
    async fn invoke(&self, method: &str, args: Value) -> Result<Value, SdkError> {
        if !self.options.latency.is_zero() {
            tokio::time::sleep(self.options.latency).await;
        }
        self.handle(method, &args)
    }
}

fn get_message_list(state: &LoopbackState, args: &Value) -> Result<Value, SdkError> {
    logged_in(state)?;
    let conversation_id = str_arg(args, "conversationId")?;
    let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(50) as usize;
    let mut messages: Vec<&Message> = state
        .messages
        .iter()
        .filter(|m| m.conversation_id == conversation_id)
        .collect();
    if opt_str_arg(args, "direction").unwrap_or("older") == "older" {
        messages.reverse();
    }
    messages.truncate(limit);
    Ok(to_json(messages))
}

fn get_conversation_list(state: &LoopbackState, args: &Value) -> Result<Value, SdkError> {
    logged_in(state)?;
    let offset = args.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
    let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(100) as usize;
    let filter = args.get("filter").cloned().unwrap_or(Value::Null);
    let unread_only = filter.get("unreadOnly").and_then(Value::as_bool).unwrap_or(false);
    let kinds = str_list_arg(&filter, "conversationTypes");

    let mut matching: Vec<&Conversation> = state
        .conversations
        .values()
        .filter(|c| !unread_only || c.unread_count > 0)
        .filter(|c| kinds.is_empty() || kinds.contains(&c.conversation_type))
        .collect();
    matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let total = matching.len();
    let page: Vec<&Conversation> = matching.into_iter().skip(offset).take(limit).collect();
    let next = offset + page.len();
    Ok(json!({
        "offset": next,
        "finished": next >= total,
        "conversationList": page,
    }))
}

fn delete_conversation(state: &mut LoopbackState, args: &Value) -> Result<Value, SdkError> {
    logged_in(state)?;
    let conversation_id = str_arg(args, "conversationId")?;
    if state.conversations.remove(conversation_id).is_none() {
        return Err(SdkError::rejected(
            CODE_NOT_FOUND,
            format!("conversation {} not found", conversation_id),
        ));
    }
    if args.get("clearMessage").and_then(Value::as_bool).unwrap_or(false) {
        state.messages.retain(|m| m.conversation_id != conversation_id);
    }
    Ok(Value::Null)
}

fn get_joined_teams(state: &LoopbackState, args: &Value) -> Result<Value, SdkError> {
    let account = logged_in(state)?;
    let kinds = str_list_arg(args, "teamTypes");
    let teams: Vec<&Team> = state
        .teams
        .iter()
        .filter(|t| t.member_account_ids.iter().any(|m| m == account))
        .filter(|t| kinds.is_empty() || kinds.contains(&t.team_type))
        .collect();
    Ok(to_json(teams))
}

fn get_user_list(state: &LoopbackState, args: &Value) -> Result<Value, SdkError> {
    logged_in(state)?;
    let users: Vec<Value> = str_list_arg(args, "accountIds")
        .iter()
        .map(|id| {
            let profile = state.profiles.get(id).cloned().unwrap_or_else(|| default_profile(id));
            Value::Object(profile)
        })
        .collect();
    Ok(Value::Array(users))
}

fn upload_file(state: &LoopbackState, args: &Value) -> Result<Value, SdkError> {
    logged_in(state)?;
    let file_name = str_arg(args, "fileName")?;
    let data_url = str_arg(args, "dataUrl")?;
    let scene = opt_str_arg(args, "sceneName").unwrap_or("default");
    let encoded = data_url.split_once(',').map(|(_, data)| data).unwrap_or(data_url);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|err| SdkError::rejected(CODE_PARAMETER, format!("file data is not base64: {}", err)))?;
    Ok(json!({
        "url": format!("loopback://{}/{}/{}", scene, Uuid::new_v4(), file_name),
        "size": bytes.len(),
    }))
}

fn upsert_conversation<'a>(
    state: &'a mut LoopbackState,
    conversation_id: &str,
    kind: &str,
    target: &str,
) -> &'a mut Conversation {
    state
        .conversations
        .entry(conversation_id.to_string())
        .or_insert_with(|| Conversation {
            conversation_id: conversation_id.to_string(),
            conversation_type: kind.to_string(),
            target_id: target.to_string(),
            unread_count: 0,
            last_message: None,
            updated_at: now_ms(),
        })
}

fn default_profile(account: &str) -> serde_json::Map<String, Value> {
    let mut profile = serde_json::Map::new();
    profile.insert("accountId".to_string(), json!(account));
    profile.insert("name".to_string(), json!(account));
    profile
}

/// `"<self>|<p2p|team>|<target>"`
fn parse_conversation_id(id: &str) -> Result<(&str, &str), SdkError> {
    let mut parts = id.split('|');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(kind @ ("p2p" | "team")), Some(target), None) if !target.is_empty() => Ok((kind, target)),
        _ => Err(SdkError::rejected(
            CODE_PARAMETER,
            format!("malformed conversation id {}", id),
        )),
    }
}

fn logged_in(state: &LoopbackState) -> Result<&str, SdkError> {
    state
        .account
        .as_deref()
        .ok_or_else(|| SdkError::rejected(CODE_NOT_LOGGED_IN, "not logged in"))
}

fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, SdkError> {
    opt_str_arg(args, name)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SdkError::rejected(CODE_PARAMETER, format!("parameter error: {} is required", name)))
}

fn opt_str_arg<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

fn str_list_arg(args: &Value, name: &str) -> Vec<String> {
    args.get(name)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (LoopbackClient, broadcast::Receiver<SdkEvent>) {
        let (tx, rx) = broadcast::channel(32);
        let options = LoopbackOptions {
            latency: Duration::ZERO,
            ..LoopbackOptions::default()
        };
        (LoopbackClient::new(options, tx), rx)
    }

    #[tokio::test]
    async fn calls_before_login_are_rejected() {
        let (client, _) = client();
        let err = client
            .invoke("FriendService.getFriendList", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err, SdkError::rejected(CODE_NOT_LOGGED_IN, "not logged in"));
        assert_eq!(err.to_string(), "[401] not logged in");
    }

    #[tokio::test]
    async fn p2p_send_gets_an_echo_and_unread_count() {
        let (client, mut events) = client();
        client
            .invoke("LoginService.login", json!({"accountId": "alice", "token": "t"}))
            .await
            .unwrap();
        let sent = client
            .invoke(
                "MessageService.sendMessage",
                json!({"conversationId": "alice|p2p|bob", "text": "hi"}),
            )
            .await
            .unwrap();
        assert_eq!(sent["message"]["text"], "hi");

        let list = client
            .invoke("ConversationService.getConversationList", json!({"filter": {"unreadOnly": true}}))
            .await
            .unwrap();
        assert_eq!(list["conversationList"][0]["unreadCount"], 1);
        assert_eq!(list["conversationList"][0]["lastMessage"]["text"], "echo: hi");

        let names: Vec<String> = std::iter::from_fn(|| events.try_recv().ok()).map(|e| e.name).collect();
        assert_eq!(names, ["onLoginStatus", "onSendMessage", "onReceiveMessages"]);
    }

    #[tokio::test]
    async fn revoke_twice_conflicts() {
        let (client, _) = client();
        client
            .invoke("LoginService.login", json!({"accountId": "alice", "token": "t"}))
            .await
            .unwrap();
        let sent = client
            .invoke(
                "MessageService.sendMessage",
                json!({"conversationId": "alice|team|team-9", "text": "hey"}),
            )
            .await
            .unwrap();
        let id = sent["message"]["messageClientId"].clone();
        let args = json!({ "messageClientId": id });
        client.invoke("MessageService.revokeMessage", args.clone()).await.unwrap();
        let err = client.invoke("MessageService.revokeMessage", args).await.unwrap_err();
        assert!(matches!(err, SdkError::Rejected { code: CODE_CONFLICT, .. }));
    }

    #[test]
    fn conversation_ids_are_checked() {
        assert_eq!(parse_conversation_id("a|p2p|b").unwrap(), ("p2p", "b"));
        assert!(parse_conversation_id("a|group|b").is_err());
        assert!(parse_conversation_id("a|p2p|").is_err());
        assert!(parse_conversation_id("a|p2p|b|c").is_err());
    }

    #[tokio::test]
    async fn unknown_methods_are_reported() {
        let (client, _) = client();
        let err = client.invoke("Nope.nothing", Value::Null).await.unwrap_err();
        assert_eq!(err, SdkError::UnknownMethod("Nope.nothing".to_string()));
    }
}
