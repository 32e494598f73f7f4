pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::policy::{CanvasSettings, OverlapRule, TieBreak};
#[cfg(feature = "cli")]
use crate::utils::{
    error::Result,
    validation::{self, Validate},
};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "alliance-seats")]
#[command(about = "Simulate D'Hondt seat apportionment while regrouping party alliances")]
pub struct CliConfig {
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "1000")]
    pub width: f64,

    #[arg(long, default_value = "300")]
    pub height: f64,

    #[arg(long, help = "Lay alliances out on a grid with this many columns")]
    pub columns: Option<usize>,

    #[arg(long, value_enum, default_value_t = TieBreak::GenerationOrder)]
    pub tie_break: TieBreak,

    #[arg(long, value_enum, default_value_t = OverlapRule::LastWins)]
    pub overlap: OverlapRule,

    #[arg(long, help = "JSON file with a scripted sequence of pointer events")]
    pub gestures: Option<String>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn canvas(&self) -> CanvasSettings {
        CanvasSettings {
            width: self.width,
            height: self.height,
            columns: self.columns,
            ..CanvasSettings::default()
        }
    }

    fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    fn overlap_rule(&self) -> OverlapRule {
        self.overlap
    }

    fn gesture_script(&self) -> Option<&str> {
        self.gestures.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("data_dir", &self.data_dir)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_range("width", self.width, 1.0, 100_000.0)?;
        validation::validate_range("height", self.height, 1.0, 100_000.0)?;
        if let Some(columns) = self.columns {
            validation::validate_positive_number("columns", columns, 1)?;
        }
        if let Some(script) = &self.gestures {
            validation::validate_file_extensions("gestures", &[script.as_str()], &["json"])?;
        }
        Ok(())
    }
}
