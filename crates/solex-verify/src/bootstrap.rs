//! One-time compile+deploy of the shared assertion library.
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

use solex_core::{CompiledArtifact, ContractCompiler, ExecutionBackend, VerifyError};

/// The assertion library source shipped with the verifier.
pub const ASSERT_SOURCE: &str = include_str!("../assets/Assert.sol");

/// Unit name the library compiles under; validation units import
/// `Assert.sol`, and link references resolve against that file.
pub const ASSERT_UNIT: &str = "Assert";
pub const ASSERT_LIBRARY: &str = "Assert";
pub const ASSERT_FILE: &str = "Assert.sol";

/// Process-wide handle to the deployed assertion library.
#[derive(Debug, Clone)]
pub struct AssertionLibrary {
    pub source: &'static str,
    /// Backend-assigned address every verification links against.
    pub address: String,
    pub artifact: CompiledArtifact,
}

type BootstrapResult = Result<Arc<AssertionLibrary>, VerifyError>;

/// Single-flight bootstrap guard.
///
/// The first `ensure` caller spawns one detached compile+deploy task; every
/// caller — including ones that arrive mid-flight or after an earlier waiter
/// was cancelled — observes that task's result. Success and failure are both
/// sticky: a failed bootstrap is fatal for every verification in the process
/// and is never re-run.
pub struct LibraryBootstrap {
    watcher: OnceCell<watch::Receiver<Option<BootstrapResult>>>,
}

impl LibraryBootstrap {
    pub fn new() -> Self {
        Self {
            watcher: OnceCell::new(),
        }
    }

    pub async fn ensure(
        &self,
        compiler: Arc<dyn ContractCompiler>,
        backend: Arc<dyn ExecutionBackend>,
    ) -> BootstrapResult {
        let mut receiver = self
            .watcher
            .get_or_init(|| {
                let (sender, receiver) = watch::channel(None);
                tokio::spawn(async move {
                    let result = bootstrap_once(compiler, backend).await;
                    if let Err(error) = &result {
                        tracing::error!(%error, "assertion library bootstrap failed");
                    }
                    let _ = sender.send(Some(result));
                });
                receiver
            })
            .clone();

        loop {
            if let Some(result) = receiver.borrow().clone() {
                return result;
            }
            if receiver.changed().await.is_err() {
                return Err(VerifyError::BootstrapError(
                    "bootstrap task terminated without a result".into(),
                ));
            }
        }
    }
}

impl Default for LibraryBootstrap {
    fn default() -> Self {
        Self::new()
    }
}

async fn bootstrap_once(
    compiler: Arc<dyn ContractCompiler>,
    backend: Arc<dyn ExecutionBackend>,
) -> BootstrapResult {
    tracing::info!("bootstrapping assertion library");

    let units: BTreeMap<String, String> =
        [(ASSERT_UNIT.to_string(), ASSERT_SOURCE.to_string())].into();
    let artifacts = compiler
        .compile(&units)
        .await
        .map_err(|error| VerifyError::BootstrapError(error.to_string()))?;
    let artifact = artifacts
        .get(ASSERT_UNIT)
        .and_then(|list| list.iter().find(|artifact| artifact.contract == ASSERT_LIBRARY))
        .cloned()
        .ok_or_else(|| {
            VerifyError::BootstrapError("compiler produced no Assert artifact".into())
        })?;

    let deployed = backend
        .deploy(&artifact, &[])
        .await
        .map_err(|error| VerifyError::BootstrapError(error.to_string()))?;

    tracing::info!(address = %deployed.address, "assertion library ready");
    Ok(Arc::new(AssertionLibrary {
        source: ASSERT_SOURCE,
        address: deployed.address,
        artifact,
    }))
}
