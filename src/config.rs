use std::env;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let database = DatabaseConfig {
            host: require("DB_HOST")?,
            user: require("DB_USER")?,
            password: require("DB_PASSWORD")?,
            database: require("DB_NAME")?,
            port: port_or("DB_PORT", 3306)?,
        };

        let storage = StorageConfig {
            bucket: require("S3_BUCKET_NAME")?,
            region: env::var("AWS_REGION").unwrap_or_else(|_| "ap-southeast-1".to_string()),
        };

        Ok(Self {
            database,
            storage,
            port: port_or("PORT", 3000)?,
        })
    }
}

fn require(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::BadRequest(format!("{key} is not set")))
}

fn port_or(key: &str, default: u16) -> Result<u16, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("{key} is not a valid port"))),
        Err(_) => Ok(default),
    }
}
