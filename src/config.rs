use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub api_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DANCI_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let api_base_url = std::env::var("DANCI_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        Self {
            data_dir,
            api_base_url,
        }
    }

    /// 每个存储键一个独立的 blob 文件
    pub fn store_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("progress-{key}.json"))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("danci")
}
