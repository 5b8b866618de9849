//! [`TokenRegistry`]: the public registry operations.
//!
//! Block-list writes and deletes always span both environment partitions;
//! block-list reads are environment-scoped. Every operation runs in its own
//! `IMMEDIATE` transaction so guard checks and the writes they protect see a
//! consistent snapshot. Moves commit one environment partition at a time,
//! writing the destination before deleting the source.

use pushgate_core::errors::{require, require_hex};
use pushgate_core::text::token_prefix;
use pushgate_core::types::{MAX_IP_LEN, MAX_TOKEN_LEN};
use pushgate_core::{Environment, TokenEntry, TokenList};
use rusqlite::TransactionBehavior;
use tracing::{debug, info};

use crate::connection::ConnectionPool;
use crate::errors::{RegistryError, Result};
use crate::migrations::run_migrations;
use crate::repository::TokenRepo;

/// Result of [`TokenRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The token was written to the send list.
    Stored,
    /// The IP is on the block list for this environment.
    IgnoredBlocked,
    /// The send list already holds this exact token for the IP.
    IgnoredNoChange,
}

impl RegisterOutcome {
    /// Wire reason for ignored registrations.
    pub fn reason(self) -> Option<&'static str> {
        match self {
            Self::Stored => None,
            Self::IgnoredBlocked => Some("blocked"),
            Self::IgnoredNoChange => Some("no_change"),
        }
    }
}

/// Durable `(list, environment, ip) -> token` registry.
#[derive(Clone)]
pub struct TokenRegistry {
    pool: ConnectionPool,
}

impl TokenRegistry {
    /// Wrap a pool, applying pending migrations first.
    pub fn new(pool: ConnectionPool) -> Result<Self> {
        {
            let conn = pool.get()?;
            let _ = run_migrations(&conn)?;
        }
        Ok(Self { pool })
    }

    /// Register a device token for `(env, ip)` in the send list.
    ///
    /// Ignored when the IP is blocked in `env`, or when the send list already
    /// holds the identical token.
    pub fn register(&self, env: Environment, ip: &str, token: &str) -> Result<RegisterOutcome> {
        validate_ip(ip)?;
        validate_token(token)?;

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if TokenRepo::get(&tx, TokenList::Block, env, ip)?.is_some() {
            debug!(%env, ip, "registration ignored, ip is blocked");
            return Ok(RegisterOutcome::IgnoredBlocked);
        }
        if TokenRepo::get(&tx, TokenList::Send, env, ip)?.as_deref() == Some(token) {
            debug!(%env, ip, "registration ignored, token unchanged");
            return Ok(RegisterOutcome::IgnoredNoChange);
        }

        TokenRepo::upsert(&tx, TokenList::Send, env, ip, token)?;
        tx.commit()?;

        info!(%env, ip, token = %token_prefix(token), "device token registered");
        Ok(RegisterOutcome::Stored)
    }

    /// Send-list token for `(env, ip)`.
    pub fn get_send(&self, env: Environment, ip: &str) -> Result<Option<String>> {
        self.get(TokenList::Send, env, ip)
    }

    /// Block-list token for `(env, ip)`.
    pub fn get_block(&self, env: Environment, ip: &str) -> Result<Option<String>> {
        self.get(TokenList::Block, env, ip)
    }

    /// Remove `ip` from the send list in both environments.
    pub fn delete_send(&self, ip: &str) -> Result<Vec<Environment>> {
        self.delete(TokenList::Send, ip)
    }

    /// Remove `ip` from the block list in both environments.
    pub fn delete_block(&self, ip: &str) -> Result<Vec<Environment>> {
        self.delete(TokenList::Block, ip)
    }

    /// Send-list entries, optionally restricted to one environment.
    pub fn list_send(&self, env: Option<Environment>) -> Result<Vec<TokenEntry>> {
        self.list(TokenList::Send, env)
    }

    /// Block-list entries, optionally restricted to one environment.
    pub fn list_block(&self, env: Option<Environment>) -> Result<Vec<TokenEntry>> {
        self.list(TokenList::Block, env)
    }

    /// Put `ip` on the block list in both environments.
    ///
    /// Any send-list entry for the IP is removed in the same transaction, so the
    /// IP never sits on both lists.
    pub fn add_block(&self, ip: &str, token: &str) -> Result<()> {
        validate_ip(ip)?;
        validate_token(token)?;

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for env in Environment::ALL {
            TokenRepo::upsert(&tx, TokenList::Block, env, ip, token)?;
            let _ = TokenRepo::delete(&tx, TokenList::Send, env, ip)?;
        }
        tx.commit()?;

        info!(ip, token = %token_prefix(token), "ip added to block list");
        Ok(())
    }

    /// Move `ip` from the send list to the block list in every environment
    /// where it is present.
    pub fn move_to_block(&self, ip: &str) -> Result<Vec<Environment>> {
        self.move_entry(TokenList::Send, ip)
    }

    /// Move `ip` from the block list to the send list in every environment
    /// where it is present.
    pub fn move_to_send(&self, ip: &str) -> Result<Vec<Environment>> {
        self.move_entry(TokenList::Block, ip)
    }

    fn get(&self, list: TokenList, env: Environment, ip: &str) -> Result<Option<String>> {
        validate_ip(ip)?;
        let conn = self.pool.get()?;
        TokenRepo::get(&conn, list, env, ip)
    }

    fn delete(&self, list: TokenList, ip: &str) -> Result<Vec<Environment>> {
        validate_ip(ip)?;

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut removed = Vec::new();
        for env in Environment::ALL {
            if TokenRepo::delete(&tx, list, env, ip)? {
                removed.push(env);
            }
        }
        if removed.is_empty() {
            return Err(RegistryError::NotFound {
                list,
                ip: ip.to_string(),
            });
        }
        tx.commit()?;

        info!(%list, ip, environments = ?removed, "registry entry deleted");
        Ok(removed)
    }

    fn list(&self, list: TokenList, env: Option<Environment>) -> Result<Vec<TokenEntry>> {
        let conn = self.pool.get()?;
        let mut entries = Vec::new();
        for env in env.as_ref().map_or(&Environment::ALL[..], std::slice::from_ref) {
            entries.extend(TokenRepo::list(&conn, list, *env)?);
        }
        Ok(entries)
    }

    fn move_entry(&self, from: TokenList, ip: &str) -> Result<Vec<Environment>> {
        validate_ip(ip)?;
        let to = from.other();

        let mut conn = self.pool.get()?;
        let mut moved = Vec::new();
        for env in Environment::ALL {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(token) = TokenRepo::get(&tx, from, env, ip)? else {
                continue;
            };
            TokenRepo::upsert(&tx, to, env, ip, &token)?;
            let _ = TokenRepo::delete(&tx, from, env, ip)?;
            tx.commit()?;
            moved.push(env);
        }

        if moved.is_empty() {
            return Err(RegistryError::NotFound {
                list: from,
                ip: ip.to_string(),
            });
        }

        info!(%from, %to, ip, environments = ?moved, "registry entry moved");
        Ok(moved)
    }
}

fn validate_ip(ip: &str) -> Result<()> {
    Ok(require("ip", ip, MAX_IP_LEN)?)
}

fn validate_token(token: &str) -> Result<()> {
    Ok(require_hex("token", token, MAX_TOKEN_LEN)?)
}
