use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Shared secret expected in the X-Admin-API-Key header. While unset,
    /// every admin request fails with a configuration error rather than a
    /// plain rejection, so operators can tell a deployment gap from an attack.
    pub admin_api_key: Option<String>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("confab.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8057,
            data_dir: PathBuf::from("./data"),
            admin_api_key: None,
        }
    }
}
