//! Application configuration management.
//!
//! Sources are layered: `config/default`, `config/{RUN_MODE}`, then
//! environment variables prefixed with `SYGFP__` (e.g.
//! `SYGFP__DATABASE__URL`, `SYGFP__WORKFLOW__SEUIL_VALIDATION_DG`).

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Expenditure chain workflow configuration.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// One configured step of a role-gated circuit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepConfig {
    /// Position in the circuit, starting at 1.
    pub order: u8,
    /// Role code allowed to act on this step (e.g. `"DAAF"`).
    pub role: String,
    /// Human-readable label.
    pub label: String,
}

impl StepConfig {
    fn new(order: u8, role: &str, label: &str) -> Self {
        Self {
            order,
            role: role.to_string(),
            label: label.to_string(),
        }
    }
}

/// Expenditure chain workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowConfig {
    /// Amount (minor units) above which DG validation is mandatory.
    #[serde(default = "default_seuil_validation_dg")]
    pub seuil_validation_dg: i64,
    /// Ordered validation steps for an ordonnancement.
    #[serde(default = "default_ordonnancement_steps")]
    pub ordonnancement_steps: Vec<StepConfig>,
    /// Ordered signature steps for a validated ordonnancement.
    #[serde(default = "default_signature_steps")]
    pub signature_steps: Vec<StepConfig>,
}

fn default_seuil_validation_dg() -> i64 {
    50_000_000
}

fn default_ordonnancement_steps() -> Vec<StepConfig> {
    vec![
        StepConfig::new(1, "DAAF", "Directeur Administratif et Financier"),
        StepConfig::new(2, "DG", "Directeur Général"),
    ]
}

fn default_signature_steps() -> Vec<StepConfig> {
    vec![
        StepConfig::new(1, "DAAF", "Directeur Administratif et Financier"),
        StepConfig::new(2, "DG", "Directeur Général (Ordonnateur)"),
    ]
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            seuil_validation_dg: default_seuil_validation_dg(),
            ordonnancement_steps: default_ordonnancement_steps(),
            signature_steps: default_signature_steps(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("SYGFP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_defaults() {
        let workflow = WorkflowConfig::default();
        assert_eq!(workflow.seuil_validation_dg, 50_000_000);
        assert_eq!(workflow.ordonnancement_steps.len(), 2);
        assert_eq!(workflow.ordonnancement_steps[0].role, "DAAF");
        assert_eq!(workflow.ordonnancement_steps[1].role, "DG");
        assert_eq!(workflow.signature_steps[0].order, 1);
        assert_eq!(workflow.signature_steps[1].order, 2);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("SYGFP__DATABASE__URL", Some("postgres://localhost/sygfp_test")),
                ("SYGFP__WORKFLOW__SEUIL_VALIDATION_DG", Some("500000")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/sygfp_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.database.min_connections, 1);
                assert_eq!(config.workflow.seuil_validation_dg, 500_000);
                assert_eq!(config.workflow.ordonnancement_steps.len(), 2);
            },
        );
    }

    #[test]
    fn test_load_without_database_url_fails() {
        temp_env::with_vars_unset(["SYGFP__DATABASE__URL"], || {
            assert!(AppConfig::load().is_err());
        });
    }
}
