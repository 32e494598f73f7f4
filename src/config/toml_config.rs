use crate::adapters::loader::DataFiles;
use crate::core::ConfigProvider;
use crate::domain::policy::{CanvasSettings, OverlapRule, TieBreak};
use crate::utils::error::{Result, SeatError};
use crate::utils::validation::{self, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub canvas: CanvasSettings,
    #[serde(default)]
    pub apportionment: ApportionmentConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub dir: String,
    #[serde(flatten)]
    pub files: DataFiles,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApportionmentConfig {
    #[serde(default)]
    pub tie_break: TieBreak,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default)]
    pub overlap_rule: OverlapRule,
    pub gestures: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub filename: Option<String>,
    /// "compact" 或 "json"
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SeatError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SeatError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SeatError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("data.dir", &self.data.dir)?;
        validation::validate_path("output.path", &self.output.path)?;

        let files = self.data.files.all();
        for file in files {
            validation::validate_non_empty_string("data", file)?;
        }
        validation::validate_file_extensions("data", &files[..2], &["csv"])?;
        validation::validate_file_extensions("data", &files[2..], &["json"])?;

        validation::validate_range("canvas.width", self.canvas.width, 1.0, 100_000.0)?;
        validation::validate_range("canvas.height", self.canvas.height, 1.0, 100_000.0)?;
        validation::validate_range("canvas.padding", self.canvas.padding, 0.0, 1_000.0)?;
        validation::validate_range("canvas.row_gap", self.canvas.row_gap, 0.0, 10_000.0)?;
        if let Some(columns) = self.canvas.columns {
            validation::validate_positive_number("canvas.columns", columns, 1)?;
        }

        if let Some(format) = &self.output.log_format {
            let valid_formats = ["compact", "json"];
            if !valid_formats.contains(&format.as_str()) {
                return Err(SeatError::InvalidConfigValueError {
                    field: "output.log_format".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        valid_formats.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn data_files(&self) -> &DataFiles {
        &self.data.files
    }

    pub fn output_filename(&self) -> &str {
        self.output.filename.as_deref().unwrap_or("session.json")
    }

    pub fn json_logs(&self) -> bool {
        self.output.log_format.as_deref() == Some("json")
    }
}

impl ConfigProvider for TomlConfig {
    fn data_dir(&self) -> &str {
        &self.data.dir
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn canvas(&self) -> CanvasSettings {
        self.canvas
    }

    fn tie_break(&self) -> TieBreak {
        self.apportionment.tie_break
    }

    fn overlap_rule(&self) -> OverlapRule {
        self.interaction.overlap_rule
    }

    fn gesture_script(&self) -> Option<&str> {
        self.interaction.gestures.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
