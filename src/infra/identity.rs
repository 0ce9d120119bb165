//! Identity provider backed by the document store, issuing opaque bearer tokens.
//!
//! Accounts live in the `accounts` collection keyed by a digest of the
//! normalized email, so they travel with store snapshots. Issued tokens are
//! process-local and end with the process.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::identity::{AuthSession, IdentityError, IdentityProvider, Principal};
use crate::infra::store::{DocumentStore, Fields, StoreError};

const ACCOUNTS: &str = "accounts";

#[derive(Debug, Clone)]
struct Account {
    id: String,
    salt: String,
    password_hash: String,
}

impl Account {
    fn decode(fields: &Fields) -> Result<Self, IdentityError> {
        let field = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| IdentityError::Backend(format!("account is missing `{key}`")))
        };
        Ok(Self {
            id: field("uid")?,
            salt: field("salt")?,
            password_hash: field("passwordHash")?,
        })
    }

    fn encode(&self, email: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("email".into(), Value::String(email.to_string()));
        fields.insert("uid".into(), Value::String(self.id.clone()));
        fields.insert("salt".into(), Value::String(self.salt.clone()));
        fields.insert(
            "passwordHash".into(),
            Value::String(self.password_hash.clone()),
        );
        fields
    }
}

pub struct StoreIdentityProvider {
    store: Arc<dyn DocumentStore>,
    tokens: DashMap<String, Principal>,
    registration: Mutex<()>,
}

impl StoreIdentityProvider {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            tokens: DashMap::new(),
            registration: Mutex::new(()),
        }
    }

    fn account_key(email: &str) -> String {
        hex::encode(Sha256::digest(email.as_bytes()))
    }

    fn hash_password(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, IdentityError> {
        self.store
            .get(ACCOUNTS, &Self::account_key(email))
            .await
            .map_err(backend)?
            .map(|fields| Account::decode(&fields))
            .transpose()
    }

    fn issue(&self, principal: Principal) -> AuthSession {
        let token = format!("bb_{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.tokens.insert(token.clone(), principal.clone());
        AuthSession { principal, token }
    }
}

fn backend(err: StoreError) -> IdentityError {
    IdentityError::Backend(err.to_string())
}

#[async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn register(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let _guard = self.registration.lock().await;
        if self.find_account(email).await?.is_some() {
            return Err(IdentityError::EmailTaken);
        }

        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            id: Uuid::new_v4().simple().to_string(),
            password_hash: Self::hash_password(&salt, password),
            salt,
        };
        self.store
            .set(ACCOUNTS, &Self::account_key(email), account.encode(email))
            .await
            .map_err(backend)?;

        Ok(self.issue(Principal {
            id: account.id,
            email: email.to_string(),
        }))
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let account = self
            .find_account(email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let hashed_input = Self::hash_password(&account.salt, password);
        if account
            .password_hash
            .as_bytes()
            .ct_eq(hashed_input.as_bytes())
            .unwrap_u8()
            == 0
        {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(self.issue(Principal {
            id: account.id,
            email: email.to_string(),
        }))
    }

    async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
        self.tokens
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or(IdentityError::InvalidToken)
    }

    async fn revoke(&self, token: &str) -> Result<(), IdentityError> {
        self.tokens
            .remove(token)
            .map(|_| ())
            .ok_or(IdentityError::InvalidToken)
    }
}
