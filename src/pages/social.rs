use super::{item_lines, pick, text};
use crate::form::{FieldDef, FieldError, FormValues};
use crate::lifecycle::CallSpec;
use serde_json::{json, Value};

const TEAM_TYPES: &[&str] = &["normal", "advanced", "superTeam"];
const ACCOUNT_PATTERN: &str = r"^[A-Za-z0-9_.@-]+$";

pub(super) fn specs() -> Vec<CallSpec> {
    vec![
        CallSpec::new("TeamService", "createTeam")
            .summary("Create a team and invite members")
            .field(FieldDef::text("name", "Name").required())
            .field(FieldDef::choice("teamType", "Type", TEAM_TYPES))
            .field(FieldDef::text("intro", "Intro"))
            .field(FieldDef::list("inviteeAccountIds", "Invitees").pattern(ACCOUNT_PATTERN))
            .field(FieldDef::choice("joinMode", "Join mode", &["free", "apply", "invite"]))
            .defaults(json!({
                "name": "console team",
                "teamType": "advanced",
                "inviteeAccountIds": ["bob", "carol"],
                "joinMode": "free",
            }))
            .build(|values| {
                Ok(pick(
                    values,
                    &["name", "teamType", "intro", "inviteeAccountIds", "joinMode"],
                ))
            })
            .view(|output| vec![team_line(&output["team"])]),
        CallSpec::new("TeamService", "getJoinedTeamList")
            .summary("Teams the current account belongs to")
            .field(
                FieldDef::list("teamTypes", "Types")
                    .pattern(r"^(normal|advanced|superTeam)$")
                    .help("Leave empty for every type"),
            )
            .build(|values| Ok(pick(values, &["teamTypes"])))
            .view(|output| item_lines(output, team_line)),
        CallSpec::new("FriendService", "addFriend")
            .summary("Add a friend directly or send a friend request")
            .field(FieldDef::text("accountId", "Account").required().pattern(ACCOUNT_PATTERN))
            .field(FieldDef::choice("addMode", "Mode", &["direct", "apply"]))
            .field(FieldDef::text("postscript", "Postscript"))
            .defaults(json!({ "accountId": "bob", "addMode": "direct" }))
            .build(|values| Ok(pick(values, &["accountId", "addMode", "postscript"]))),
        CallSpec::new("FriendService", "getFriendList")
            .summary("Friends of the current account")
            .view(|output| item_lines(output, |f| text(f, "accountId").to_string())),
        CallSpec::new("UserService", "updateSelfUserProfile")
            .summary("Update your own profile; blank fields are left alone")
            .field(FieldDef::text("name", "Nickname"))
            .field(FieldDef::text("avatar", "Avatar URL").pattern(r"^(https?|loopback)://"))
            .field(FieldDef::text("sign", "Signature"))
            .field(FieldDef::choice("gender", "Gender", &["unknown", "male", "female"]))
            .field(FieldDef::text("email", "Email").pattern(r"^[^@\s]+@[^@\s]+$"))
            .field(FieldDef::text("mobile", "Mobile").pattern(r"^\+?[0-9]{5,15}$"))
            .defaults(json!({ "name": "Alice" }))
            .build(build_profile_update),
        CallSpec::new("UserService", "getUserList")
            .summary("Look up user profiles")
            .field(FieldDef::list("accountIds", "Accounts").required().pattern(ACCOUNT_PATTERN))
            .defaults(json!({ "accountIds": ["alice", "bob"] }))
            .build(|values| Ok(pick(values, &["accountIds"])))
            .view(|output| item_lines(output, |u| format!("{} ({})", text(u, "accountId"), text(u, "name")))),
        CallSpec::new("SubscriptionService", "subscribeUserStatus")
            .summary("Subscribe to online status changes")
            .field(FieldDef::list("accountIds", "Accounts").required().pattern(ACCOUNT_PATTERN))
            .field(FieldDef::integer("duration", "Duration (s)").range(60, 2_592_000))
            .field(FieldDef::toggle("immediateSync", "Sync immediately"))
            .defaults(json!({ "accountIds": ["bob"], "duration": 3600, "immediateSync": true }))
            .build(|values| Ok(pick(values, &["accountIds", "duration", "immediateSync"]))),
    ]
}

fn build_profile_update(values: &FormValues) -> Result<Value, FieldError> {
    let update = pick(values, &["name", "avatar", "sign", "gender", "email", "mobile"]);
    if update.as_object().is_some_and(|fields| fields.is_empty()) {
        return Err(FieldError::invalid("name", "fill in at least one profile field"));
    }
    Ok(update)
}

fn team_line(team: &Value) -> String {
    let members = team["memberAccountIds"].as_array().map(Vec::len).unwrap_or(0);
    format!(
        "{} {} [{}] members={}",
        text(team, "teamId"),
        text(team, "name"),
        text(team, "teamType"),
        members
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_update_is_a_field_error() {
        let err = build_profile_update(&FormValues::new()).unwrap_err();
        assert_eq!(err.to_string(), "name fill in at least one profile field");
    }
}
