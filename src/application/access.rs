use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{AccessKeysRepo, CreateAccessKeyParams, RepoError};
use crate::domain::access::{AccessKeyRecord, Capability, Role};

const TOKEN_PREFIX: &str = "nk";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AccessKeyError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("key name must not be empty")]
    InvalidName,
    #[error("key not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum AccessAuthError {
    #[error("missing access key")]
    Missing,
    #[error("invalid access key")]
    Invalid,
    #[error("revoked access key")]
    Revoked,
    #[error("access key lacks the required role")]
    Forbidden,
    #[error("access key lookup failed")]
    Unavailable(#[source] RepoError),
}

#[derive(Debug, Clone)]
pub struct AccessKeyIssued {
    pub record: AccessKeyRecord,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct Principal {
    pub key_id: Uuid,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn requires(&self, needed: Capability) -> Result<(), AccessAuthError> {
        if self.role.grants(needed) {
            Ok(())
        } else {
            Err(AccessAuthError::Forbidden)
        }
    }
}

#[derive(Clone)]
pub struct AccessKeyService {
    repo: Arc<dyn AccessKeysRepo>,
}

impl AccessKeyService {
    pub fn new(repo: Arc<dyn AccessKeysRepo>) -> Self {
        Self { repo }
    }

    pub async fn issue(&self, name: &str, role: Role) -> Result<AccessKeyIssued, AccessKeyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccessKeyError::InvalidName);
        }

        let prefix = generate_prefix();
        let secret = generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");

        let record = self
            .repo
            .create_key(CreateAccessKeyParams {
                name: name.to_string(),
                prefix,
                hashed_secret: hash_secret(&secret),
                role,
            })
            .await?;

        info!(
            target = "newsdesk::auth",
            key_prefix = %record.prefix,
            role = record.role.as_str(),
            "access key issued"
        );
        Ok(AccessKeyIssued { record, token })
    }

    pub async fn revoke(&self, prefix: &str) -> Result<(), AccessKeyError> {
        let now = OffsetDateTime::now_utc();
        if !self.repo.revoke_by_prefix(prefix, now).await? {
            return Err(AccessKeyError::NotFound);
        }
        info!(target = "newsdesk::auth", key_prefix = prefix, "access key revoked");
        Ok(())
    }

    pub async fn authenticate(&self, token: &str) -> Result<Principal, AccessAuthError> {
        let parsed = parse_token(token).ok_or(AccessAuthError::Invalid)?;
        let record = self
            .repo
            .find_by_prefix(parsed.prefix)
            .await
            .map_err(AccessAuthError::Unavailable)?
            .ok_or(AccessAuthError::Invalid)?;

        let hashed_input = hash_secret(parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AccessAuthError::Invalid);
        }

        let now = OffsetDateTime::now_utc();
        if record.is_revoked_at(now) {
            return Err(AccessAuthError::Revoked);
        }

        // best-effort; a failed bookkeeping write never blocks the request
        let repo = self.repo.clone();
        tokio::spawn(async move {
            let _ = repo.update_last_used(record.id, now).await;
        });

        Ok(Principal {
            key_id: record.id,
            name: record.name,
            role: record.role,
        })
    }
}

fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_prefix() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

struct ParsedToken<'a> {
    prefix: &'a str,
    secret: &'a str,
}

fn parse_token(token: &str) -> Option<ParsedToken<'_>> {
    let mut parts = token.trim().splitn(3, '_');
    if parts.next()? != TOKEN_PREFIX {
        return None;
    }
    let prefix = parts.next()?;
    let secret = parts.next()?;
    if prefix.is_empty() || secret.len() < MIN_SECRET_LEN {
        return None;
    }
    Some(ParsedToken { prefix, secret })
}
