//! Status file for sharing engine state with external processes

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-cycle snapshot written as pretty JSON
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SystemStatus {
    pub running: bool,
    pub timestamp: i64,
    pub balance: f64,
    pub equity: f64,
    pub daily_pnl: f64,
    pub risk_status: String,
    pub trading: bool,
    pub last_signal: String,
}

impl SystemStatus {
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Self {
        if path.exists() {
            if let Ok(contents) = fs::read_to_string(path) {
                if let Ok(status) = serde_json::from_str(&contents) {
                    return status;
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join("bastion_status_test.json");

        let status = SystemStatus {
            running: true,
            timestamp: 1700000000,
            balance: 100000.0,
            equity: 99500.5,
            daily_pnl: -499.5,
            risk_status: "OK".to_string(),
            trading: true,
            last_signal: "BUY EURUSD".to_string(),
        };
        status.save(&path).unwrap();

        let loaded = SystemStatus::load(&path);
        assert_eq!(loaded.balance, 100000.0);
        assert_eq!(loaded.risk_status, "OK");
        assert!(loaded.trading);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let path = std::env::temp_dir().join("bastion_status_missing.json");
        let loaded = SystemStatus::load(&path);
        assert!(!loaded.running);
    }
}
