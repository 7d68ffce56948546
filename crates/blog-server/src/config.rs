use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub foreign_keys: bool,
    pub admin: Option<AdminSeed>,
}

/// Account created on startup when its login is not taken yet.
pub struct AdminSeed {
    pub login: String,
    pub password: String,
    pub name: String,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = var_or("BLOG_PORT", "3000")
            .parse()
            .context("BLOG_PORT must be a port number")?;
        let foreign_keys = var_or("BLOG_FOREIGN_KEYS", "true")
            .parse()
            .context("BLOG_FOREIGN_KEYS must be true or false")?;

        let admin = match (
            std::env::var("BLOG_ADMIN_LOGIN"),
            std::env::var("BLOG_ADMIN_PASSWORD"),
        ) {
            (Ok(login), Ok(password)) => Some(AdminSeed {
                name: var_or("BLOG_ADMIN_NAME", &login),
                login,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            db_path: PathBuf::from(var_or("BLOG_DB_PATH", "blog.db")),
            host: var_or("BLOG_HOST", "0.0.0.0"),
            port,
            jwt_secret: var_or("BLOG_JWT_SECRET", "dev-secret-change-me"),
            foreign_keys,
            admin,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
