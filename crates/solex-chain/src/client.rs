//! JSON-RPC execution backend client.
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;

use solex_core::{
    AssertionEvent, CompiledArtifact, DeployedContract, ExecutionBackend, LinkedLibrary,
    VerifierConfig, VerifyError,
};

use crate::abi;
use crate::transport::{HttpTransport, RpcTransport};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Internal fault before per-operation classification.
#[derive(Debug)]
enum RpcFault {
    Transport(String),
    Timeout(String),
    /// The node itself rejected the request (rpc `error` object).
    Node(String),
}

impl RpcFault {
    fn into_deploy_error(self) -> VerifyError {
        match self {
            Self::Node(message) if is_revert(&message) => VerifyError::DeploymentReverted(message),
            other => other.into_infra_error(),
        }
    }

    fn into_call_error(self) -> VerifyError {
        match self {
            Self::Node(message) if is_revert(&message) => VerifyError::ExecutionReverted(message),
            other => other.into_infra_error(),
        }
    }

    fn into_infra_error(self) -> VerifyError {
        match self {
            Self::Transport(message) | Self::Node(message) => {
                VerifyError::BackendUnavailable(message)
            }
            Self::Timeout(message) => VerifyError::BackendTimeout(message),
        }
    }
}

fn is_revert(message: &str) -> bool {
    message.to_lowercase().contains("revert")
}

/// Execution backend speaking Ethereum JSON-RPC to a test chain.
///
/// Every operation is bounded by the configured call timeout and retried
/// once on transient faults; reverts are never retried.
pub struct JsonRpcBackend {
    transport: Arc<dyn RpcTransport>,
    rpc_url: String,
    call_timeout: Duration,
    gas_limit: u64,
    sender: OnceCell<String>,
}

impl JsonRpcBackend {
    pub fn new(config: &VerifierConfig) -> Self {
        Self::with_transport(Arc::new(HttpTransport), config)
    }

    pub fn with_transport(transport: Arc<dyn RpcTransport>, config: &VerifierConfig) -> Self {
        Self {
            transport,
            rpc_url: config.rpc_url.clone(),
            call_timeout: config.call_timeout,
            gas_limit: config.gas_limit,
            sender: OnceCell::new(),
        }
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, RpcFault> {
        let body = serde_json::to_vec(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .map_err(|error| RpcFault::Transport(format!("serialize {method}: {error}")))?;

        let transport = self.transport.clone();
        let url = self.rpc_url.clone();
        let request = tokio::task::spawn_blocking(move || transport.post(&url, &body));

        let raw = tokio::time::timeout(self.call_timeout, request)
            .await
            .map_err(|_| RpcFault::Timeout(method.to_string()))?
            .map_err(|join| RpcFault::Transport(format!("transport task failed: {join}")))?
            .map_err(|transport| RpcFault::Transport(format!("{method} failed: {transport}")))?;

        let response: Value = serde_json::from_slice(&raw)
            .map_err(|error| RpcFault::Transport(format!("unparsable {method} response: {error}")))?;
        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(RpcFault::Node(format!("{method}: {message}")));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    /// First unlocked account of the backend session, fetched once.
    async fn sender(&self) -> Result<String, RpcFault> {
        self.sender
            .get_or_try_init(|| async {
                let accounts = self.rpc_call("eth_accounts", json!([])).await?;
                accounts
                    .as_array()
                    .and_then(|list| list.first())
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| RpcFault::Node("backend exposes no accounts".into()))
            })
            .await
            .cloned()
    }

    async fn send_transaction(&self, tx: Value) -> Result<String, RpcFault> {
        let hash = self.rpc_call("eth_sendTransaction", json!([tx])).await?;
        hash.as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcFault::Node("eth_sendTransaction returned no hash".into()))
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<Value, RpcFault> {
        let deadline = Instant::now() + self.call_timeout;
        loop {
            let receipt = self
                .rpc_call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !receipt.is_null() {
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(RpcFault::Timeout(format!("receipt for {tx_hash}")));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    fn receipt_reverted(receipt: &Value) -> bool {
        receipt
            .get("status")
            .and_then(Value::as_str)
            .map(|status| status == "0x0" || status == "0x00")
            .unwrap_or(false)
    }

    async fn deploy_once(
        &self,
        artifact: &CompiledArtifact,
        bytecode: &str,
    ) -> Result<DeployedContract, VerifyError> {
        let sender = self.sender().await.map_err(RpcFault::into_infra_error)?;
        let tx = json!({
            "from": sender,
            "data": format!("0x{bytecode}"),
            "gas": format!("0x{:x}", self.gas_limit)
        });
        let tx_hash = self
            .send_transaction(tx)
            .await
            .map_err(RpcFault::into_deploy_error)?;
        let receipt = self
            .wait_for_receipt(&tx_hash)
            .await
            .map_err(RpcFault::into_infra_error)?;

        if Self::receipt_reverted(&receipt) {
            return Err(VerifyError::DeploymentReverted(format!(
                "constructor of {} reverted",
                artifact.qualified_name()
            )));
        }
        let address = receipt
            .get("contractAddress")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VerifyError::BackendUnavailable(format!(
                    "receipt for {} carries no contractAddress",
                    artifact.qualified_name()
                ))
            })?;

        Ok(DeployedContract {
            unit: artifact.unit.clone(),
            contract: artifact.contract.clone(),
            address: address.to_string(),
            artifact_hash: artifact.artifact_hash.clone(),
        })
    }

    async fn call_once(
        &self,
        contract: &DeployedContract,
        function: &str,
    ) -> Result<Vec<AssertionEvent>, VerifyError> {
        let sender = self.sender().await.map_err(RpcFault::into_infra_error)?;
        let selector = abi::selector_hex(&format!("{function}()"));
        let tx = json!({
            "from": sender,
            "to": contract.address,
            "data": format!("0x{selector}"),
            "gas": format!("0x{:x}", self.gas_limit)
        });
        let tx_hash = self
            .send_transaction(tx)
            .await
            .map_err(RpcFault::into_call_error)?;
        let receipt = self
            .wait_for_receipt(&tx_hash)
            .await
            .map_err(RpcFault::into_infra_error)?;

        if Self::receipt_reverted(&receipt) {
            return Err(VerifyError::ExecutionReverted(format!(
                "{}.{function} reverted",
                contract.contract
            )));
        }

        let events = receipt
            .get("logs")
            .and_then(Value::as_array)
            .map(|logs| logs.iter().filter_map(abi::decode_test_event).collect())
            .unwrap_or_default();
        Ok(events)
    }
}

#[async_trait]
impl ExecutionBackend for JsonRpcBackend {
    async fn deploy(
        &self,
        artifact: &CompiledArtifact,
        libraries: &[LinkedLibrary],
    ) -> Result<DeployedContract, VerifyError> {
        if artifact.bytecode.is_empty() {
            return Err(VerifyError::DeploymentReverted(format!(
                "{} has no creation bytecode",
                artifact.qualified_name()
            )));
        }

        let mut linked = artifact.clone();
        for library in libraries {
            linked.bytecode = linked.link(&library.file, &library.name, &library.address)?;
        }
        if !linked.bytecode.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(VerifyError::LinkError(format!(
                "{} still carries unresolved link placeholders",
                artifact.qualified_name()
            )));
        }

        let mut retried = false;
        loop {
            match self.deploy_once(artifact, &linked.bytecode).await {
                Err(error) if error.is_retryable() && !retried => {
                    tracing::warn!(%error, contract = %artifact.qualified_name(), "retrying deploy");
                    retried = true;
                }
                outcome => {
                    if let Ok(deployed) = &outcome {
                        tracing::debug!(
                            contract = %artifact.qualified_name(),
                            address = %deployed.address,
                            "deployed"
                        );
                    }
                    return outcome;
                }
            }
        }
    }

    async fn call(
        &self,
        contract: &DeployedContract,
        function: &str,
    ) -> Result<Vec<AssertionEvent>, VerifyError> {
        let mut retried = false;
        loop {
            match self.call_once(contract, function).await {
                Err(error) if error.is_retryable() && !retried => {
                    tracing::warn!(%error, function, "retrying call");
                    retried = true;
                }
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode_string_data;
    use crate::transport::TransportError;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted transport: pops one canned reply per request and records
    /// what was asked.
    struct MockTransport {
        replies: Mutex<VecDeque<Result<Value, TransportError>>>,
        requests: Mutex<Vec<Value>>,
        delay: Option<Duration>,
    }

    impl MockTransport {
        fn new(replies: Vec<Result<Value, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
                delay: None,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                delay: Some(delay),
            })
        }

        fn methods(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|req| req["method"].as_str().unwrap().to_string())
                .collect()
        }
    }

    impl RpcTransport for MockTransport {
        fn post(&self, _url: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
                return Err(TransportError::Transport("slept past deadline".into()));
            }
            let request: Value = serde_json::from_slice(body).unwrap();
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("mock transport ran out of replies");
            reply.map(|value| serde_json::to_vec(&json!({ "jsonrpc": "2.0", "id": 1, "result": value })).unwrap())
        }
    }

    fn transport_error(message: &str) -> Result<Value, TransportError> {
        Err(TransportError::Transport(message.to_string()))
    }

    fn config(timeout_ms: u64) -> VerifierConfig {
        VerifierConfig::from_lookup(|key| match key {
            "SOLEX_CALL_TIMEOUT_MS" => Some(timeout_ms.to_string()),
            _ => None,
        })
    }

    fn artifact(bytecode: &str) -> CompiledArtifact {
        CompiledArtifact::new("validation", "TestCoin", bytecode, json!([]), json!({}))
    }

    fn deployed() -> DeployedContract {
        DeployedContract {
            unit: "validation".into(),
            contract: "TestCoin".into(),
            address: "0x00000000000000000000000000000000000000aa".into(),
            artifact_hash: "blake3:test".into(),
        }
    }

    #[tokio::test]
    async fn test_deploy_happy_path() {
        let transport = MockTransport::new(vec![
            Ok(json!(["0x00000000000000000000000000000000000000f0"])),
            Ok(json!("0xtxhash")),
            Ok(json!({
                "status": "0x1",
                "contractAddress": "0x00000000000000000000000000000000000000aa"
            })),
        ]);
        let backend = JsonRpcBackend::with_transport(transport.clone(), &config(5_000));
        let contract = backend.deploy(&artifact("6060"), &[]).await.unwrap();

        assert_eq!(contract.address, "0x00000000000000000000000000000000000000aa");
        assert_eq!(contract.contract, "TestCoin");
        assert_eq!(
            transport.methods(),
            vec!["eth_accounts", "eth_sendTransaction", "eth_getTransactionReceipt"]
        );
    }

    #[tokio::test]
    async fn test_deploy_reverted_receipt_is_not_retried() {
        let transport = MockTransport::new(vec![
            Ok(json!(["0xf0"])),
            Ok(json!("0xtxhash")),
            Ok(json!({ "status": "0x0", "contractAddress": null })),
        ]);
        let backend = JsonRpcBackend::with_transport(transport.clone(), &config(5_000));
        let error = backend.deploy(&artifact("6060"), &[]).await.unwrap_err();
        assert!(matches!(error, VerifyError::DeploymentReverted(_)));
        // exactly one send, no second attempt
        assert_eq!(transport.methods().iter().filter(|m| *m == "eth_sendTransaction").count(), 1);
    }

    #[tokio::test]
    async fn test_deploy_retries_transport_fault_once() {
        let transport = MockTransport::new(vec![
            Ok(json!(["0xf0"])),
            transport_error("connection refused"),
            // second attempt succeeds
            Ok(json!("0xtxhash")),
            Ok(json!({
                "status": "0x1",
                "contractAddress": "0x00000000000000000000000000000000000000ab"
            })),
        ]);
        let backend = JsonRpcBackend::with_transport(transport.clone(), &config(5_000));
        let contract = backend.deploy(&artifact("6060"), &[]).await.unwrap();
        assert_eq!(contract.address, "0x00000000000000000000000000000000000000ab");
        assert_eq!(
            transport.methods().iter().filter(|m| *m == "eth_sendTransaction").count(),
            2
        );
    }

    #[tokio::test]
    async fn test_deploy_gives_up_after_second_transport_fault() {
        let transport = MockTransport::new(vec![
            Ok(json!(["0xf0"])),
            transport_error("connection refused"),
            transport_error("connection refused"),
        ]);
        let backend = JsonRpcBackend::with_transport(transport, &config(5_000));
        let error = backend.deploy(&artifact("6060"), &[]).await.unwrap_err();
        assert!(matches!(error, VerifyError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_deploy_rejects_empty_and_unlinked_bytecode() {
        let backend =
            JsonRpcBackend::with_transport(MockTransport::new(vec![]), &config(5_000));
        assert!(matches!(
            backend.deploy(&artifact(""), &[]).await.unwrap_err(),
            VerifyError::DeploymentReverted(_)
        ));
        assert!(matches!(
            backend
                .deploy(&artifact("6060__$placeholder$__6060"), &[])
                .await
                .unwrap_err(),
            VerifyError::LinkError(_)
        ));
    }

    #[tokio::test]
    async fn test_call_decodes_assertion_events_in_order() {
        let passed = format!("0x{:064x}", 1);
        let failed = format!("0x{:064x}", 0);
        let transport = MockTransport::new(vec![
            Ok(json!(["0xf0"])),
            Ok(json!("0xtxhash")),
            Ok(json!({
                "status": "0x1",
                "logs": [
                    { "topics": [abi::test_event_topic(), passed],
                      "data": encode_string_data("first") },
                    { "topics": ["0xdeadbeef"], "data": "0x" },
                    { "topics": [abi::test_event_topic(), failed],
                      "data": encode_string_data("second") }
                ]
            })),
        ]);
        let backend = JsonRpcBackend::with_transport(transport.clone(), &config(5_000));
        let events = backend.call(&deployed(), "testBalance").await.unwrap();

        assert_eq!(events.len(), 2);
        assert!(events[0].passed);
        assert_eq!(events[0].message, "first");
        assert!(!events[1].passed);
        assert_eq!(events[1].message, "second");

        // selector went out on the wire
        let requests = transport.requests.lock().unwrap();
        let data = requests[1]["params"][0]["data"].as_str().unwrap();
        assert_eq!(data, format!("0x{}", abi::selector_hex("testBalance()")));
    }

    #[tokio::test]
    async fn test_call_reverted_receipt_is_execution_reverted() {
        let transport = MockTransport::new(vec![
            Ok(json!(["0xf0"])),
            Ok(json!("0xtxhash")),
            Ok(json!({ "status": "0x0", "logs": [] })),
        ]);
        let backend = JsonRpcBackend::with_transport(transport, &config(5_000));
        let error = backend.call(&deployed(), "testBoom").await.unwrap_err();
        assert!(matches!(error, VerifyError::ExecutionReverted(_)));
        assert!(!error.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let transport = MockTransport::slow(Duration::from_millis(300));
        let backend = JsonRpcBackend::with_transport(transport, &config(50));
        let error = backend.deploy(&artifact("6060"), &[]).await.unwrap_err();
        assert!(matches!(error, VerifyError::BackendTimeout(_)));
    }
}
