use serde::Deserialize;

/// Accounts service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct AccountsConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port for the HTTP server. Env var: `ACCOUNTS_PORT`.
    #[serde(default = "default_accounts_port")]
    pub accounts_port: u16,
    /// TCP port for the gRPC server. Env var: `ACCOUNTS_GRPC_PORT`.
    #[serde(default = "default_accounts_grpc_port")]
    pub accounts_grpc_port: u16,
    /// Comma-separated `host:port` list. Env var: `KAFKA_BROKERS`.
    #[serde(default = "default_kafka_brokers")]
    pub kafka_brokers: Vec<String>,
    /// Consumer group for confirmation topics. Env var: `APP_NAME`.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Upper bound on a single HTTP or gRPC request. Env var: `REQUEST_TIMEOUT_SECS`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_accounts_port() -> u16 {
    3120
}

fn default_accounts_grpc_port() -> u16 {
    50061
}

fn default_kafka_brokers() -> Vec<String> {
    vec!["localhost:9092".to_owned()]
}

fn default_app_name() -> String {
    "accounts".to_owned()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl tessera_core::config::Config for AccountsConfig {}

impl AccountsConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
