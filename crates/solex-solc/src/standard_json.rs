//! solc standard-JSON input assembly and output parsing.
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use solex_core::{CompiledArtifact, VerifyError};

/// Source file name a unit compiles under. The `Assert` unit becomes
/// `Assert.sol`, which is also the path the injected import references.
pub fn unit_file(unit: &str) -> String {
    format!("{unit}.sol")
}

fn file_unit(file: &str) -> String {
    file.strip_suffix(".sol").unwrap_or(file).to_string()
}

/// Build the standard-JSON input document for one compile call.
pub fn build_input(units: &BTreeMap<String, String>) -> Value {
    let mut sources = Map::new();
    for (unit, content) in units {
        sources.insert(unit_file(unit), json!({ "content": content }));
    }
    json!({
        "language": "Solidity",
        "sources": Value::Object(sources),
        "settings": {
            "outputSelection": {
                "*": {
                    "*": ["abi", "evm.bytecode.object", "evm.bytecode.linkReferences"]
                }
            }
        }
    })
}

/// Parse a standard-JSON output document into per-unit artifacts.
///
/// Any diagnostic of severity `error` fails the whole call; warnings are
/// logged and dropped. Every requested unit gets an entry in the result,
/// even when it produced no contracts.
pub fn parse_output(
    units: &BTreeMap<String, String>,
    raw: &str,
) -> Result<BTreeMap<String, Vec<CompiledArtifact>>, VerifyError> {
    let output: Value = serde_json::from_str(raw)
        .map_err(|error| VerifyError::CompilerUnavailable(format!("unparsable solc output: {error}")))?;

    let mut failing_unit = None;
    let mut diagnostics = Vec::new();
    if let Some(errors) = output.get("errors").and_then(Value::as_array) {
        for diagnostic in errors {
            let severity = diagnostic.get("severity").and_then(Value::as_str);
            let message = diagnostic
                .get("formattedMessage")
                .or_else(|| diagnostic.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown diagnostic")
                .trim()
                .to_string();
            if severity == Some("error") {
                if failing_unit.is_none() {
                    let file = diagnostic
                        .get("sourceLocation")
                        .and_then(|loc| loc.get("file"))
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    failing_unit = Some(file_unit(file));
                }
                diagnostics.push(message);
            } else {
                tracing::debug!(diagnostic = %message, "solc warning");
            }
        }
    }
    if let Some(unit) = failing_unit {
        return Err(VerifyError::CompileError { unit, diagnostics });
    }

    let mut artifacts: BTreeMap<String, Vec<CompiledArtifact>> = units
        .keys()
        .map(|unit| (unit.clone(), Vec::new()))
        .collect();

    if let Some(contracts) = output.get("contracts").and_then(Value::as_object) {
        for (file, contracts_in_file) in contracts {
            let unit = file_unit(file);
            let Some(per_unit) = artifacts.get_mut(&unit) else {
                continue;
            };
            let Some(contracts_in_file) = contracts_in_file.as_object() else {
                continue;
            };
            for (contract, description) in contracts_in_file {
                let bytecode = description
                    .pointer("/evm/bytecode/object")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                let abi = description.get("abi").cloned().unwrap_or_else(|| json!([]));
                let link_references = description
                    .pointer("/evm/bytecode/linkReferences")
                    .cloned()
                    .unwrap_or_else(|| json!({}));
                per_unit.push(CompiledArtifact::new(
                    unit.clone(),
                    contract.clone(),
                    bytecode,
                    abi,
                    link_references,
                ));
            }
        }
    }

    Ok(artifacts)
}
