#![allow(dead_code)]

use clientpanel_core::{Clock, NewClient, PasswordHashError, PasswordHasher};
use std::cell::Cell;

/// Deterministic clock that only moves when told to.
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn at(epoch_ms: i64) -> Self {
        Self {
            now: Cell::new(epoch_ms),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get() + millis);
    }
}

impl Clock for ManualClock {
    fn now_epoch_ms(&self) -> i64 {
        self.now.get()
    }
}

/// Cheap reversible-looking hasher so tests do not pay argon2 cost.
pub struct TaggedHasher;

impl PasswordHasher for TaggedHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        Ok(format!("tagged${}", plaintext.chars().rev().collect::<String>()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordHashError> {
        Ok(self.hash(plaintext)? == hash)
    }
}

pub fn new_client(id: &str, email: &str, mobile: &str, phone_number_id: &str) -> NewClient {
    NewClient {
        client_id: id.to_string(),
        email: email.to_string(),
        name: format!("Client {id}"),
        mobile: mobile.to_string(),
        phone_number_id: phone_number_id.to_string(),
        password: "s3cret-pass".to_string(),
        chat_prefix: None,
    }
}

/// Record `A` from the reference scenario.
pub fn client_a() -> NewClient {
    new_client("c001", "a@x.com", "1111111111", "100000000000001")
}

pub fn client_b() -> NewClient {
    new_client("c002", "b@x.com", "2222222222", "100000000000002")
}
