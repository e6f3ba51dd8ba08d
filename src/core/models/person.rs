use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Person {
    pub id: String,
    pub name: String,
    /// Digits only. Doubles as login credential and PIX routing key.
    pub phone: String,
    pub is_admin: bool,
}

impl Person {
    /// Stand-in used when a joined row references a person that could not be loaded.
    pub fn placeholder(id: &str, name: &str) -> Self {
        Person {
            id: id.to_string(),
            name: name.to_string(),
            phone: String::new(),
            is_admin: false,
        }
    }

    pub fn role(&self) -> &'static str {
        if self.is_admin { "ADMIN" } else { "USER" }
    }
}
