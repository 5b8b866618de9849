//! Token repository: per-partition SQL over the `push_tokens` table.
//!
//! Every method addresses exactly one `(list, environment)` partition. The
//! multi-partition semantics live in [`crate::registry`].

use pushgate_core::{Environment, TokenEntry, TokenList};
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;

/// Stateless repository, every method takes `&Connection`.
pub struct TokenRepo;

impl TokenRepo {
    /// Token stored for `ip` in one partition.
    pub fn get(
        conn: &Connection,
        list: TokenList,
        env: Environment,
        ip: &str,
    ) -> Result<Option<String>> {
        let token = conn
            .query_row(
                "SELECT token FROM push_tokens WHERE list = ?1 AND environment = ?2 AND ip = ?3",
                params![list.as_str(), env.as_str(), ip],
                |row| row.get(0),
            )
            .optional()?;
        Ok(token)
    }

    /// Insert or overwrite the token for `ip` in one partition.
    pub fn upsert(
        conn: &Connection,
        list: TokenList,
        env: Environment,
        ip: &str,
        token: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO push_tokens (list, environment, ip, token, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (list, environment, ip)
             DO UPDATE SET token = excluded.token, updated_at = excluded.updated_at",
            params![list.as_str(), env.as_str(), ip, token, now],
        )?;
        Ok(())
    }

    /// Remove `ip` from one partition. Returns whether a row was deleted.
    pub fn delete(conn: &Connection, list: TokenList, env: Environment, ip: &str) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM push_tokens WHERE list = ?1 AND environment = ?2 AND ip = ?3",
            params![list.as_str(), env.as_str(), ip],
        )?;
        Ok(changed > 0)
    }

    /// All entries of one partition, ordered by IP.
    pub fn list(conn: &Connection, list: TokenList, env: Environment) -> Result<Vec<TokenEntry>> {
        let mut stmt = conn.prepare(
            "SELECT ip, token FROM push_tokens
             WHERE list = ?1 AND environment = ?2
             ORDER BY ip",
        )?;
        let rows = stmt
            .query_map(params![list.as_str(), env.as_str()], |row| {
                Ok(TokenEntry {
                    environment: env,
                    ip: row.get(0)?,
                    token: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = setup();
        let token = TokenRepo::get(&conn, TokenList::Send, Environment::Sandbox, "10.0.0.1").unwrap();
        assert!(token.is_none());
    }

    #[test]
    fn upsert_then_get() {
        let conn = setup();
        TokenRepo::upsert(&conn, TokenList::Send, Environment::Sandbox, "10.0.0.1", "tok").unwrap();
        let token = TokenRepo::get(&conn, TokenList::Send, Environment::Sandbox, "10.0.0.1").unwrap();
        assert_eq!(token.as_deref(), Some("tok"));
    }

    #[test]
    fn upsert_overwrites() {
        let conn = setup();
        TokenRepo::upsert(&conn, TokenList::Send, Environment::Sandbox, "10.0.0.1", "old").unwrap();
        TokenRepo::upsert(&conn, TokenList::Send, Environment::Sandbox, "10.0.0.1", "new").unwrap();
        let entries = TokenRepo::list(&conn, TokenList::Send, Environment::Sandbox).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].token, "new");
    }

    #[test]
    fn partitions_are_independent() {
        let conn = setup();
        TokenRepo::upsert(&conn, TokenList::Send, Environment::Sandbox, "10.0.0.1", "s").unwrap();
        TokenRepo::upsert(&conn, TokenList::Send, Environment::Production, "10.0.0.1", "p").unwrap();
        TokenRepo::upsert(&conn, TokenList::Block, Environment::Sandbox, "10.0.0.1", "b").unwrap();

        assert_eq!(
            TokenRepo::get(&conn, TokenList::Send, Environment::Production, "10.0.0.1")
                .unwrap()
                .as_deref(),
            Some("p")
        );
        assert_eq!(
            TokenRepo::list(&conn, TokenList::Block, Environment::Production)
                .unwrap()
                .len(),
            0
        );
    }

    #[test]
    fn delete_reports_presence() {
        let conn = setup();
        TokenRepo::upsert(&conn, TokenList::Block, Environment::Sandbox, "10.0.0.1", "t").unwrap();
        assert!(TokenRepo::delete(&conn, TokenList::Block, Environment::Sandbox, "10.0.0.1").unwrap());
        assert!(!TokenRepo::delete(&conn, TokenList::Block, Environment::Sandbox, "10.0.0.1").unwrap());
    }

    #[test]
    fn list_tags_environment() {
        let conn = setup();
        TokenRepo::upsert(&conn, TokenList::Send, Environment::Production, "10.0.0.2", "b").unwrap();
        TokenRepo::upsert(&conn, TokenList::Send, Environment::Production, "10.0.0.1", "a").unwrap();
        let entries = TokenRepo::list(&conn, TokenList::Send, Environment::Production).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.environment == Environment::Production));
        assert_eq!(entries[0].ip, "10.0.0.1");
    }
}
