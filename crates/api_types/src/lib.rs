//! Request and response bodies of the HTTP API.
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Deserializer, Serialize};

pub mod expense {
    use super::*;
    use serde_json::Value;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UserIdRepr {
        Text(String),
        Number(i64),
    }

    /// Participant ids are strings, but clients may send plain numbers.
    fn user_id_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match UserIdRepr::deserialize(deserializer)? {
            UserIdRepr::Text(id) => id,
            UserIdRepr::Number(id) => id.to_string(),
        })
    }

    /// A participant as sent by the client. `share` is accepted but always
    /// recomputed by the server.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ShareNew {
        #[serde(deserialize_with = "user_id_as_text")]
        pub user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub share: Option<f64>,
    }

    /// Body of create and update.
    ///
    /// `id` and `userId` are tolerated in any shape so a client can send back
    /// a full expense, but neither is ever applied.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseNew {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<Value>,
        pub title: String,
        #[serde(default)]
        pub amount: f64,
        pub date: String,
        pub category: String,
        pub payment_method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub user_id: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub shared_with: Option<Vec<ShareNew>>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ShareView {
        pub user_id: String,
        pub share: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseView {
        pub id: String,
        pub title: String,
        pub amount: f64,
        pub date: String,
        pub category: String,
        pub payment_method: String,
        pub user_id: i32,
        /// The owner's implicit part, never stored.
        pub owner_share: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub shared_with: Option<Vec<ShareView>>,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Signup {
        pub email: String,
        pub password: String,
        pub name: String,
        /// Reference (URL) of an already uploaded picture.
        #[serde(default)]
        pub profile_pic: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub token: String,
    }

    /// Partial update: missing fields stay as they are.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProfileUpdate {
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub about: Option<String>,
        #[serde(default)]
        pub profile_pic: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserView {
        pub id: i32,
        pub name: String,
        pub email: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub profile_pic: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub about: Option<String>,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}
