use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use postyt_core::{AccountCredential, AppError, PlatformId, TokenUpdate};
use postyt_db::{empty_linked_accounts, AccountStore, CredentialStore, LinkedAccounts};

type AccountKey = (String, PlatformId, String);

/// Account store backed by a map, with switchable lookup failures
#[derive(Clone, Default)]
pub struct InMemoryAccountStore {
    accounts: Arc<Mutex<Vec<(AccountKey, AccountCredential)>>>,
    failing_lookups: Arc<Mutex<HashMap<String, String>>>,
    updates: Arc<Mutex<Vec<(String, TokenUpdate)>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, user_id: &str, platform: PlatformId, credential: AccountCredential) -> Self {
        self.insert(user_id, platform, credential);
        self
    }

    /// Lookups of this account id fail with a store error
    pub fn failing_lookup_for(self, account_id: &str) -> Self {
        self.failing_lookups
            .lock()
            .unwrap()
            .insert(account_id.to_string(), "connection reset".to_string());
        self
    }

    pub fn insert(&self, user_id: &str, platform: PlatformId, credential: AccountCredential) {
        let key = (user_id.to_string(), platform, credential.account_id.clone());
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                let refresh_token = credential
                    .refresh_token
                    .clone()
                    .or_else(|| existing.refresh_token.clone());
                *existing = AccountCredential {
                    refresh_token,
                    ..credential
                };
            }
            None => accounts.push((key, credential)),
        }
    }

    pub fn get(&self, user_id: &str, platform: PlatformId, account_id: &str) -> Option<AccountCredential> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|((u, p, a), _)| u == user_id && *p == platform && a == account_id)
            .map(|(_, credential)| credential.clone())
    }

    /// Token updates applied so far, with the user they were applied for
    pub fn applied_updates(&self) -> Vec<(String, TokenUpdate)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for InMemoryAccountStore {
    async fn find_account(
        &self,
        user_id: &str,
        platform: PlatformId,
        account_id: &str,
    ) -> Result<Option<AccountCredential>, AppError> {
        if let Some(message) = self.failing_lookups.lock().unwrap().get(account_id) {
            return Err(AppError::Internal(message.clone()));
        }
        Ok(self.get(user_id, platform, account_id))
    }

    async fn apply_token_update(&self, user_id: &str, update: &TokenUpdate) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let (_, credential) = accounts
            .iter_mut()
            .find(|((u, p, a), _)| u == user_id && *p == update.platform && *a == update.account_id)
            .ok_or_else(|| AppError::NotFound(format!("{} account {}", update.platform, update.account_id)))?;

        credential.access_token = update.access_token.clone();
        credential.expiry_date = update.expiry_date;
        if let Some(ref refresh_token) = update.refresh_token {
            credential.refresh_token = Some(refresh_token.clone());
        }

        self.updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), update.clone()));
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn list_accounts(&self, user_id: &str) -> Result<LinkedAccounts, AppError> {
        let mut linked = empty_linked_accounts();
        for ((owner, platform, _), credential) in self.accounts.lock().unwrap().iter() {
            if owner == user_id {
                linked.entry(*platform).or_default().push(credential.summary());
            }
        }
        Ok(linked)
    }

    async fn upsert_account(
        &self,
        user_id: &str,
        platform: PlatformId,
        credential: &AccountCredential,
    ) -> Result<(), AppError> {
        self.insert(user_id, platform, credential.clone());
        Ok(())
    }
}
