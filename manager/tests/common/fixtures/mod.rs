//! This module provides reusable test utilities:
//! - Scripted dump runners standing in for a Redis source
//! - Mock alert webhook
//! - Test configuration builder

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod dump_runners;
pub mod mock_webhook;
pub mod test_config;

pub use dump_runners::{DumpOutcome, FailingDumpRunner, ScriptedDumpRunner};
pub use mock_webhook::MockWebhookServer;
pub use test_config::{scheduler_config, TestConfigBuilder};
