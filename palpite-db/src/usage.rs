use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::config::RateLimitConfig;

/// Résultat d'une demande de suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Quota {
    Unlimited,
    Allowed { remaining: u32 },
    Exhausted,
}

impl Quota {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Quota::Exhausted)
    }
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quota::Unlimited => write!(f, "illimité"),
            Quota::Allowed { remaining } => write!(f, "{} restante(s) aujourd'hui", remaining),
            Quota::Exhausted => write!(f, "quota du jour épuisé"),
        }
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn usage_today(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<u32> {
    usage_on(conn, user_id, now.date_naive())
}

/// Abonnement actif ; un abonnement expiré est rétrogradé au passage.
pub fn is_premium(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<bool> {
    let row: Option<(bool, Option<String>)> = conn
        .query_row(
            "SELECT is_premium, expires_at FROM subscriptions WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((true, expires_at)) = row else {
        return Ok(false);
    };

    if let Some(raw) = expires_at {
        let expires_at = DateTime::parse_from_rfc3339(&raw)
            .with_context(|| format!("Date d'expiration invalide : '{raw}'"))?
            .with_timezone(&Utc);
        if expires_at <= now {
            conn.execute(
                "UPDATE subscriptions SET is_premium = 0 WHERE user_id = ?1",
                [user_id],
            )?;
            log::info!("Abonnement expiré pour {user_id}");
            return Ok(false);
        }
    }
    Ok(true)
}

/// `expires_at = None` : abonnement sans échéance.
pub fn set_premium(conn: &Connection, user_id: &str, expires_at: Option<DateTime<Utc>>) -> Result<()> {
    conn.execute(
        "INSERT INTO subscriptions (user_id, is_premium, expires_at) VALUES (?1, 1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET is_premium = 1, expires_at = excluded.expires_at",
        rusqlite::params![user_id, expires_at.map(|d| d.to_rfc3339())],
    ).context("Échec de l'enregistrement de l'abonnement")?;
    Ok(())
}

/// Vérifie le quota puis consomme une unité si c'est permis.
pub fn check_and_increment(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
    config: &RateLimitConfig,
) -> Result<Quota> {
    if config.premium_unlimited && is_premium(conn, user_id, now)? {
        return Ok(Quota::Unlimited);
    }

    let used = usage_today(conn, user_id, now)?;
    if used >= config.suggestions_per_day {
        log::debug!("Quota épuisé pour {user_id} ({used}/{})", config.suggestions_per_day);
        return Ok(Quota::Exhausted);
    }

    conn.execute(
        "INSERT INTO suggestion_usage (user_id, day, count) VALUES (?1, ?2, 1)
         ON CONFLICT(user_id, day) DO UPDATE SET count = count + 1",
        rusqlite::params![user_id, day_key(now.date_naive())],
    ).context("Échec de la mise à jour du quota")?;

    Ok(Quota::Allowed {
        remaining: config.suggestions_per_day - used - 1,
    })
}

/// Lecture seule du quota restant.
pub fn remaining(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
    config: &RateLimitConfig,
) -> Result<Quota> {
    if config.premium_unlimited && is_premium(conn, user_id, now)? {
        return Ok(Quota::Unlimited);
    }
    let used = usage_today(conn, user_id, now)?;
    Ok(match config.suggestions_per_day.saturating_sub(used) {
        0 => Quota::Exhausted,
        remaining => Quota::Allowed { remaining },
    })
}

pub fn usage_on(conn: &Connection, user_id: &str, day: NaiveDate) -> Result<u32> {
    let count: Option<u32> = conn
        .query_row(
            "SELECT count FROM suggestion_usage WHERE user_id = ?1 AND day = ?2",
            rusqlite::params![user_id, day_key(day)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(count.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;
    use chrono::{Duration, TimeZone};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_free_user_quota() {
        let conn = memory_db();
        let config = RateLimitConfig::default();
        let now = noon(1);

        assert_eq!(remaining(&conn, "u1", now, &config).unwrap(), Quota::Allowed { remaining: 3 });
        assert_eq!(check_and_increment(&conn, "u1", now, &config).unwrap(), Quota::Allowed { remaining: 2 });
        assert_eq!(check_and_increment(&conn, "u1", now, &config).unwrap(), Quota::Allowed { remaining: 1 });
        assert_eq!(check_and_increment(&conn, "u1", now, &config).unwrap(), Quota::Allowed { remaining: 0 });
        assert_eq!(check_and_increment(&conn, "u1", now, &config).unwrap(), Quota::Exhausted);
        assert_eq!(remaining(&conn, "u1", now, &config).unwrap(), Quota::Exhausted);
        assert_eq!(usage_on(&conn, "u1", now.date_naive()).unwrap(), 3);
    }

    #[test]
    fn test_quota_resets_next_day() {
        let conn = memory_db();
        let config = RateLimitConfig {
            suggestions_per_day: 1,
            premium_unlimited: true,
        };

        assert!(check_and_increment(&conn, "u1", noon(1), &config).unwrap().is_allowed());
        assert!(!check_and_increment(&conn, "u1", noon(1), &config).unwrap().is_allowed());
        assert!(check_and_increment(&conn, "u1", noon(2), &config).unwrap().is_allowed());
    }

    #[test]
    fn test_users_are_independent() {
        let conn = memory_db();
        let config = RateLimitConfig {
            suggestions_per_day: 1,
            premium_unlimited: true,
        };
        check_and_increment(&conn, "u1", noon(1), &config).unwrap();
        assert_eq!(
            check_and_increment(&conn, "u2", noon(1), &config).unwrap(),
            Quota::Allowed { remaining: 0 }
        );
    }

    #[test]
    fn test_premium_unlimited() {
        let conn = memory_db();
        let config = RateLimitConfig::default();
        set_premium(&conn, "vip", None).unwrap();

        for _ in 0..10 {
            assert_eq!(check_and_increment(&conn, "vip", noon(1), &config).unwrap(), Quota::Unlimited);
        }
        assert_eq!(usage_on(&conn, "vip", noon(1).date_naive()).unwrap(), 0);
    }

    #[test]
    fn test_premium_ignored_when_disabled() {
        let conn = memory_db();
        let config = RateLimitConfig {
            suggestions_per_day: 2,
            premium_unlimited: false,
        };
        set_premium(&conn, "vip", None).unwrap();
        assert_eq!(
            check_and_increment(&conn, "vip", noon(1), &config).unwrap(),
            Quota::Allowed { remaining: 1 }
        );
    }

    #[test]
    fn test_expired_subscription_demoted() {
        let conn = memory_db();
        let now = noon(10);
        set_premium(&conn, "vip", Some(now - Duration::days(1))).unwrap();

        assert!(!is_premium(&conn, "vip", now).unwrap());
        let flag: bool = conn
            .query_row("SELECT is_premium FROM subscriptions WHERE user_id = 'vip'", [], |row| row.get(0))
            .unwrap();
        assert!(!flag);
    }

    #[test]
    fn test_active_subscription() {
        let conn = memory_db();
        let now = noon(10);
        set_premium(&conn, "vip", Some(now + Duration::days(30))).unwrap();
        assert!(is_premium(&conn, "vip", now).unwrap());
        assert!(!is_premium(&conn, "nobody", now).unwrap());
    }
}
