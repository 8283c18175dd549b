// src/config.rs
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default = "default_admin_login")]
    pub admin_login: String,
    pub admin_password: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    // Номер для ручного перевода при покупке тарифа
    #[serde(default)]
    pub payment_phone: Option<String>,

    #[serde(default = "default_wiki_api_url")]
    pub wiki_api_url: String,
    #[serde(default = "default_wiki_timeout_secs")]
    pub wiki_timeout_secs: u64,

    #[serde(default = "default_llm_api_url")]
    pub llm_api_url: String,
    // Без ключа генеративный запасной вариант отключён
    #[serde(default, alias = "deepinfra_api_key")]
    pub llm_api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

fn default_database_url() -> String {
    "sqlite://neiro.db".to_string()
}

fn default_admin_login() -> String {
    "admin".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_session_ttl_hours() -> u64 {
    24
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_wiki_api_url() -> String {
    "https://ru.wikipedia.org/api/rest_v1/page/summary".to_string()
}

fn default_wiki_timeout_secs() -> u64 {
    2
}

fn default_llm_api_url() -> String {
    "https://api.deepinfra.com/v1/openai".to_string()
}

fn default_llm_model() -> String {
    "meta-llama/Meta-Llama-3-8B-Instruct".to_string()
}

fn default_llm_temperature() -> f32 {
    0.3
}

fn default_llm_timeout_secs() -> u64 {
    60
}
