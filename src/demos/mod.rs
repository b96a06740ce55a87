//! Runnable pattern scenarios.
//!
//! Each demo returns the lines it produced so callers (the `pattern`
//! binary, tests) can print or inspect them. Demos are selected with a
//! `<type>:<pattern>[:<file>]` selector, e.g. `van:proxy:validation`.

pub mod conference;
pub mod invitations;
pub mod person;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::config::RelayConfig;
use crate::errors::{DispatchError, NotifyError};

/// Shared, append-only log of what a demo's participants did.
pub type Transcript = Rc<RefCell<Vec<String>>>;

/// A runnable demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// Conference coordinator (dispatch hub).
    Mediator,
    /// Conference invitations (notification bus).
    Observer,
    /// Derived person name (interception layer).
    Proxy,
    /// Age validation (interception layer).
    ProxyValidation,
}

/// Why a selector could not be resolved to a demo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("expected <type>:<pattern>[:<file>], got '{0}'")]
    Malformed(String),

    #[error("no demo at {type_name}/{pattern}/{file}")]
    NotFound {
        type_name: String,
        pattern: String,
        file: String,
        /// Files available for this pattern (empty if the pattern is unknown).
        available: Vec<&'static str>,
    },
}

/// Failure while running a demo.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// `(type, pattern, file, demo)` table.
const CATALOG: &[(&str, &str, &str, Demo)] = &[
    ("vanilla", "mediator", "index", Demo::Mediator),
    ("vanilla", "observer", "index", Demo::Observer),
    ("vanilla", "proxy", "index", Demo::Proxy),
    ("vanilla", "proxy", "validation", Demo::ProxyValidation),
];

/// Expand a type shorthand (`van` -> `vanilla`).
fn expand_type(type_name: &str) -> &str {
    match type_name {
        "van" => "vanilla",
        other => other,
    }
}

impl Demo {
    /// All demos, in catalog order.
    pub fn all() -> Vec<Demo> {
        CATALOG.iter().map(|(_, _, _, demo)| *demo).collect()
    }

    /// Resolve a `<type>:<pattern>[:<file>]` selector.
    ///
    /// `file` defaults to `index`; a trailing `.js` is ignored.
    pub fn from_selector(selector: &str) -> Result<Demo, SelectorError> {
        let parts: Vec<&str> = selector.split(':').collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(SelectorError::Malformed(selector.to_string()));
        }

        let type_name = expand_type(parts[0]);
        let pattern = parts[1];
        let file = parts
            .get(2)
            .copied()
            .map(|f| f.strip_suffix(".js").unwrap_or(f))
            .unwrap_or("index");

        CATALOG
            .iter()
            .find(|(t, p, f, _)| *t == type_name && *p == pattern && *f == file)
            .map(|(_, _, _, demo)| *demo)
            .ok_or_else(|| SelectorError::NotFound {
                type_name: type_name.to_string(),
                pattern: pattern.to_string(),
                file: file.to_string(),
                available: CATALOG
                    .iter()
                    .filter(|(t, p, _, _)| *t == type_name && *p == pattern)
                    .map(|(_, _, f, _)| *f)
                    .collect(),
            })
    }

    /// The canonical selector for this demo.
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Mediator => "van:mediator",
            Self::Observer => "van:observer",
            Self::Proxy => "van:proxy",
            Self::ProxyValidation => "van:proxy:validation",
        }
    }

    /// Run the demo with `config` and return its transcript.
    pub fn run(&self, config: &RelayConfig) -> Result<Vec<String>, DemoError> {
        log::debug!("Running demo {}", self);
        match self {
            Self::Mediator => Ok(conference::run(config)?),
            Self::Observer => Ok(invitations::run(config)?),
            Self::Proxy => Ok(person::run_proxy(config)),
            Self::ProxyValidation => Ok(person::run_validation(config)),
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_selector() {
        assert_eq!(Demo::from_selector("van:mediator"), Ok(Demo::Mediator));
        assert_eq!(Demo::from_selector("vanilla:observer"), Ok(Demo::Observer));
        assert_eq!(Demo::from_selector("van:proxy"), Ok(Demo::Proxy));
        assert_eq!(Demo::from_selector("van:proxy:index"), Ok(Demo::Proxy));
        assert_eq!(
            Demo::from_selector("van:proxy:validation.js"),
            Ok(Demo::ProxyValidation)
        );
    }

    #[test]
    fn test_malformed_selector() {
        assert!(matches!(
            Demo::from_selector("mediator"),
            Err(SelectorError::Malformed(_))
        ));
        assert!(matches!(
            Demo::from_selector("van:"),
            Err(SelectorError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_file_lists_available() {
        match Demo::from_selector("van:proxy:caching") {
            Err(SelectorError::NotFound { available, file, .. }) => {
                assert_eq!(file, "caching");
                assert_eq!(available, vec!["index", "validation"]);
            }
            other => panic!("unexpected: {other:?}"),
        }

        match Demo::from_selector("react:proxy") {
            Err(SelectorError::NotFound { available, .. }) => assert!(available.is_empty()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_selectors_round_trip() {
        for demo in Demo::all() {
            assert_eq!(Demo::from_selector(demo.selector()), Ok(demo));
        }
    }

    #[test]
    fn test_every_demo_runs() {
        for demo in Demo::all() {
            let lines = demo.run(&RelayConfig::default()).unwrap();
            assert!(!lines.is_empty(), "{demo} produced no output");
        }
    }

    #[test]
    fn test_demos_run_with_loaded_config() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "dispatch:\n  max_depth: 1\n  reject_cycles: true\ninterception:\n  log_rejections: false"
        )
        .unwrap();
        let config = RelayConfig::from_file(file.path()).unwrap();

        assert_eq!(
            Demo::Mediator.run(&config).unwrap(),
            Demo::Mediator.run(&RelayConfig::default()).unwrap()
        );
        assert_eq!(
            Demo::ProxyValidation.run(&config).unwrap(),
            vec![
                "write to 'age' rejected: 'age' cannot be below 0".to_string(),
                "30".to_string(),
            ]
        );
    }
}
