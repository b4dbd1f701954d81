use crate::form::FieldDef;
use crate::lifecycle::CallSpec;
use serde_json::{json, Value};

pub(super) fn specs() -> Vec<CallSpec> {
    vec![
        CallSpec::new("LoginService", "login")
            .summary("Log in with an account and token")
            .field(
                FieldDef::text("accountId", "Account")
                    .required()
                    .pattern(r"^[A-Za-z0-9_.@-]+$"),
            )
            .field(FieldDef::secret("token", "Token").required())
            .field(FieldDef::toggle("forceMode", "Force login").help("Replace a session that is already logged in"))
            .defaults(json!({ "accountId": "alice", "token": "alice-token", "forceMode": false }))
            .build(|values| Ok(super::pick(values, &["accountId", "token", "forceMode"]))),
        CallSpec::new("LoginService", "logout").summary("Log the current account out"),
        CallSpec::new("LoginService", "getLoginUser")
            .summary("Account that is currently logged in")
            .view(|output| match output {
                Value::String(account) => vec![format!("logged in as {}", account)],
                _ => vec!["not logged in".to_string()],
            }),
    ]
}
