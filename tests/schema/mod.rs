use fake::faker::name::en::Name;
use fake::Dummy;
use serde::{Deserialize, Serialize};

pub const TRANSACTION_SUBJECT_NAME: &str = "registry.test.Transaction";

pub fn transaction_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "record",
        "name": "Transaction",
        "namespace": "registry.test",
        "fields": [
          {
            "name": "id",
            "type": "string"
          },
          {
            "name": "name",
            "type": "string"
          },
          {
            "name": "production_year",
            "type": "int"
          }
        ]
    })
}

#[derive(Debug, Serialize, Deserialize, Dummy, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,

    #[dummy(faker = "Name()")]
    pub name: String,

    #[dummy(faker = "1990..2024")]
    pub production_year: i32,
}
