use dotenv::dotenv;
use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv().ok(); // Load .env file if present
        let port = match env::var("PORT") {
            Ok(value) => value.parse()?,
            Err(_) => 8080,
        };
        Ok(Self {
            port,
            jwt_secret: env::var("JWT_SECRET")?,
        })
    }
}
