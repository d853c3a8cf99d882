//! Fallback orchestrator.
//!
//! The [`Saver`] owns the host, the hidden elements its strategies share,
//! and the ordered strategy list. [`Saver::save_as`] normalizes its inputs,
//! tries each strategy in order until one reports success, and tells the
//! user through the host when every strategy has failed. Nothing is ever
//! raised to the caller.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_FAILURE_MESSAGE, FilenameConfig, SaverConfig};
use crate::error::SaveError;
use crate::host::{Host, SharedElements};
use crate::normalize::normalize_filename;
use crate::strategy::{SaveRequest, Strategy};

/// What a call to [`Saver::save_as`] ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A strategy dispatched the save.
    Saved {
        /// Name of the strategy that succeeded
        strategy: String,
    },
    /// Every strategy failed and the user was notified.
    Exhausted {
        /// Number of strategies attempted
        tried: usize,
    },
}

impl SaveOutcome {
    /// Returns true if a strategy dispatched the save.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// Builds the saver described by `config`.
///
/// Strategies are registered in `config.strategies` order and all share one
/// set of hidden elements.
///
/// # Errors
///
/// Returns `SaveError::InvalidConfig` if `config` fails
/// [`SaverConfig::validate`].
pub fn build_default_saver<H: Host>(
    host: H,
    config: &SaverConfig,
) -> Result<Saver<H>, SaveError> {
    let mut saver = Saver::with_config(host, config)?;
    let shared = saver.shared_elements();
    for kind in &config.strategies {
        saver.register(kind.build(&shared));
    }
    Ok(saver)
}

/// An ordered chain of save strategies over one host.
pub struct Saver<H: Host> {
    host: H,
    shared: Rc<SharedElements>,
    strategies: Vec<Box<dyn Strategy>>,
    failure_message: String,
    filename_config: FilenameConfig,
}

impl<H: Host> Saver<H> {
    /// Creates a saver with no strategies and default settings.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self {
            host,
            shared: Rc::new(SharedElements::new()),
            strategies: Vec::new(),
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            filename_config: FilenameConfig::default(),
        }
    }

    /// Creates a saver with no strategies, taking settings from `config`.
    ///
    /// `config` is validated in full, but `config.strategies` is not
    /// registered; see [`build_default_saver`].
    ///
    /// # Errors
    ///
    /// Returns `SaveError::InvalidConfig` if `config` fails
    /// [`SaverConfig::validate`].
    pub fn with_config(host: H, config: &SaverConfig) -> Result<Self, SaveError> {
        config.validate()?;
        Ok(Self {
            failure_message: config.failure_message.clone(),
            filename_config: config.filename.clone(),
            ..Self::new(host)
        })
    }

    /// Appends a strategy to the end of the chain.
    #[tracing::instrument(skip(self, strategy), fields(strategy_name))]
    pub fn register(&mut self, strategy: Box<dyn Strategy>) {
        tracing::Span::current().record("strategy_name", strategy.name());
        debug!(
            name = strategy.name(),
            position = self.strategies.len(),
            "Registering strategy"
        );
        self.strategies.push(strategy);
    }

    /// Returns the hidden elements shared by this saver's strategies.
    #[must_use]
    pub fn shared_elements(&self) -> Rc<SharedElements> {
        Rc::clone(&self.shared)
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the number of registered strategies.
    #[must_use]
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Returns strategy names in priority order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Returns the names of strategies whose support probe passes.
    #[must_use]
    pub fn supported_strategies(&self) -> Vec<&str> {
        self.strategies
            .iter()
            .filter(|s| s.is_supported(&self.host))
            .map(|s| s.name())
            .collect()
    }

    /// Saves `content` as a download named `filename`.
    ///
    /// Either input may be missing or of any JSON type; both are normalized
    /// first. Strategies are tried in order until one reports success. If
    /// none does, the user is alerted once through the host.
    #[tracing::instrument(skip_all)]
    pub fn save_as(&self, content: Option<&Value>, filename: Option<&Value>) -> SaveOutcome {
        let request = SaveRequest::normalize(content, filename, &self.filename_config);
        self.run(&request)
    }

    /// Saves text under a filename. Same behavior as [`Saver::save_as`].
    pub fn save_text(&self, content: &str, filename: &str) -> SaveOutcome {
        let filename = Value::String(filename.to_string());
        let request = SaveRequest {
            content: content.to_string(),
            filename: normalize_filename(Some(&filename), &self.filename_config),
        };
        self.run(&request)
    }

    fn run(&self, request: &SaveRequest) -> SaveOutcome {
        let mut tried: usize = 0;

        for strategy in &self.strategies {
            tried += 1;
            debug!(
                strategy = strategy.name(),
                filename = %request.filename,
                "Trying strategy"
            );

            match strategy.execute(&self.host, request) {
                Ok(true) => {
                    info!(
                        strategy = strategy.name(),
                        filename = %request.filename,
                        bytes = request.content.len(),
                        "Save dispatched"
                    );
                    return SaveOutcome::Saved {
                        strategy: strategy.name().to_string(),
                    };
                }
                Ok(false) => {
                    debug!(strategy = strategy.name(), "Strategy declined, trying next");
                }
                Err(err) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %err,
                        "Strategy returned error"
                    );
                }
            }
        }

        warn!(
            tried,
            filename = %request.filename,
            "All save strategies failed"
        );
        if let Err(err) = self.host.alert(&self.failure_message) {
            warn!(error = %err, "Failure notification could not be shown");
        }
        SaveOutcome::Exhausted { tried }
    }
}

impl<H: Host> fmt::Debug for Saver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Saver")
            .field("strategy_count", &self.strategies.len())
            .field("strategies", &self.strategy_names())
            .field("failure_message", &self.failure_message)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::error::HostError;
    use crate::host::{HostCall, HostCapabilities, RecordingHost};
    use crate::strategy::StrategyKind;

    // ==================== MockStrategy for Testing ====================

    struct MockStrategy {
        mock_name: &'static str,
        result: Option<bool>,
        calls: Rc<Cell<usize>>,
    }

    impl Strategy for MockStrategy {
        fn name(&self) -> &str {
            self.mock_name
        }

        fn is_supported(&self, _host: &dyn Host) -> bool {
            self.result == Some(true)
        }

        fn execute(&self, _host: &dyn Host, _request: &SaveRequest) -> Result<bool, SaveError> {
            self.calls.set(self.calls.get() + 1);
            self.result.ok_or_else(|| {
                SaveError::host("mock", HostError::operation_failed("mock", "broken"))
            })
        }
    }

    fn mock(name: &'static str, result: Option<bool>) -> (Box<dyn Strategy>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let strategy = MockStrategy {
            mock_name: name,
            result,
            calls: Rc::clone(&calls),
        };
        (Box::new(strategy), calls)
    }

    #[test]
    fn test_saver_new_is_empty() {
        let saver = Saver::new(RecordingHost::new(HostCapabilities::ALL));
        assert!(saver.is_empty());
        assert_eq!(saver.strategy_count(), 0);
    }

    #[test]
    fn test_saver_stops_at_first_success() {
        let mut saver = Saver::new(RecordingHost::new(HostCapabilities::NONE));
        let (first, first_calls) = mock("first", Some(false));
        let (second, second_calls) = mock("second", Some(true));
        let (third, third_calls) = mock("third", Some(true));
        saver.register(first);
        saver.register(second);
        saver.register(third);

        let outcome = saver.save_text("hello", "test.txt");

        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                strategy: "second".to_string()
            }
        );
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 1);
        assert_eq!(third_calls.get(), 0);
        assert!(saver.host().alerts().is_empty());
    }

    #[test]
    fn test_saver_error_advances_like_failure() {
        let mut saver = Saver::new(RecordingHost::new(HostCapabilities::NONE));
        let (broken, broken_calls) = mock("broken", None);
        let (working, working_calls) = mock("working", Some(true));
        saver.register(broken);
        saver.register(working);

        let outcome = saver.save_text("hello", "test.txt");

        assert!(outcome.is_saved());
        assert_eq!(broken_calls.get(), 1);
        assert_eq!(working_calls.get(), 1);
    }

    #[test]
    fn test_saver_exhausted_alerts_once() {
        let mut saver = Saver::new(RecordingHost::new(HostCapabilities::NONE));
        let (a, a_calls) = mock("a", Some(false));
        let (b, b_calls) = mock("b", None);
        saver.register(a);
        saver.register(b);

        let outcome = saver.save_text("hello", "test.txt");

        assert_eq!(outcome, SaveOutcome::Exhausted { tried: 2 });
        assert_eq!(a_calls.get(), 1);
        assert_eq!(b_calls.get(), 1);
        assert_eq!(saver.host().alerts(), vec!["Couldn't download".to_string()]);
    }

    #[test]
    fn test_saver_with_no_strategies_alerts() {
        let saver = Saver::new(RecordingHost::new(HostCapabilities::ALL));
        let outcome = saver.save_text("hello", "test.txt");
        assert_eq!(outcome, SaveOutcome::Exhausted { tried: 0 });
        assert_eq!(saver.host().alerts().len(), 1);
    }

    #[test]
    fn test_saver_swallows_alert_failure() {
        let saver = Saver::new(RecordingHost::new(HostCapabilities::NONE).failing_on("alert"));
        let outcome = saver.save_text("hello", "test.txt");
        assert!(!outcome.is_saved());
    }

    #[test]
    fn test_saver_uses_configured_failure_message() {
        let config = SaverConfig {
            failure_message: "Save failed".to_string(),
            ..SaverConfig::default()
        };
        let saver = build_default_saver(RecordingHost::new(HostCapabilities::NONE), &config)
            .unwrap();

        saver.save_text("x", "x.txt");

        assert_eq!(saver.host().alerts(), vec!["Save failed".to_string()]);
    }

    #[test]
    fn test_build_default_saver_follows_config_order() {
        let config = SaverConfig {
            strategies: vec![StrategyKind::ExecCommand, StrategyKind::AnchorDownload],
            ..SaverConfig::default()
        };
        let saver = build_default_saver(RecordingHost::new(HostCapabilities::ALL), &config)
            .unwrap();
        assert_eq!(saver.strategy_names(), vec!["exec_command", "anchor_download"]);

        let outcome = saver.save_text("x", "x.txt");
        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                strategy: "exec_command".to_string()
            }
        );
    }

    #[test]
    fn test_supported_strategies_reflect_host() {
        let host = RecordingHost::new(HostCapabilities {
            data_uri_navigation: true,
            exec_command: true,
            ..HostCapabilities::NONE
        });
        let saver = build_default_saver(host, &SaverConfig::default()).unwrap();
        assert_eq!(
            saver.supported_strategies(),
            vec!["frame_data_uri", "exec_command"]
        );
        assert!(saver.host().calls().is_empty(), "probes must not touch the host");
    }

    #[test]
    fn test_save_as_normalizes_inputs() {
        let saver = build_default_saver(
            RecordingHost::new(HostCapabilities::ALL),
            &SaverConfig::default(),
        )
        .unwrap();

        saver.save_as(Some(&json!({"a": 1})), Some(&json!("re|port.txt")));

        let anchor = saver.shared_elements().existing_anchor().unwrap();
        assert_eq!(
            saver.host().attribute(anchor, "href").as_deref(),
            Some("data:charset=utf-8,%5Bobject%20Object%5D")
        );
        assert_eq!(
            saver.host().attribute(anchor, "download").as_deref(),
            Some("report.txt")
        );
    }

    #[test]
    fn test_save_as_generates_filename_when_missing() {
        let saver = build_default_saver(
            RecordingHost::new(HostCapabilities::ALL),
            &SaverConfig::default(),
        )
        .unwrap();

        saver.save_as(Some(&json!("body")), None);

        let anchor = saver.shared_elements().existing_anchor().unwrap();
        let name = saver.host().attribute(anchor, "download").unwrap();
        assert!(name.starts_with("download_"), "got {name}");
    }

    #[test]
    fn test_build_default_saver_rejects_invalid_config() {
        let config = SaverConfig {
            filename: FilenameConfig {
                prefix: "../evil".to_string(),
                ..FilenameConfig::default()
            },
            ..SaverConfig::default()
        };
        let err = build_default_saver(RecordingHost::new(HostCapabilities::ALL), &config)
            .unwrap_err();
        assert!(err.to_string().contains("filename.prefix"), "got: {err}");

        let config = SaverConfig {
            strategies: Vec::new(),
            ..SaverConfig::default()
        };
        assert!(build_default_saver(RecordingHost::new(HostCapabilities::ALL), &config).is_err());
    }

    #[test]
    fn test_with_config_rejects_out_of_range_max_bytes() {
        let mut config = SaverConfig::default();
        config.filename.max_bytes = 0;
        let err = Saver::with_config(RecordingHost::new(HostCapabilities::ALL), &config)
            .unwrap_err();
        assert!(matches!(err, SaveError::InvalidConfig { .. }));
    }

    #[test]
    fn test_saver_debug_lists_strategies() {
        let saver = build_default_saver(
            RecordingHost::new(HostCapabilities::ALL),
            &SaverConfig::default(),
        )
        .unwrap();
        let debug = format!("{saver:?}");
        assert!(debug.contains("anchor_download"));
        assert!(debug.contains("exec_command"));
    }

    #[test]
    fn test_saver_exhausted_touches_all_real_strategies_in_order() {
        let host = RecordingHost::new(HostCapabilities {
            exec_command: true,
            ..HostCapabilities::NONE
        })
        .with_exec_command_result(false);
        let saver = build_default_saver(host, &SaverConfig::default()).unwrap();

        let outcome = saver.save_text("x", "x.txt");

        assert_eq!(outcome, SaveOutcome::Exhausted { tried: 3 });
        let calls = saver.host().calls();
        let exec_index = calls
            .iter()
            .position(|c| matches!(c, HostCall::ExecCommandSaveAs { .. }))
            .unwrap();
        let alert_index = calls
            .iter()
            .position(|c| matches!(c, HostCall::Alert(_)))
            .unwrap();
        assert!(exec_index < alert_index);
    }
}
