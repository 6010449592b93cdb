use evm_disassembler::{disassemble_bytes, format_operations};
use similar::TextDiff;
use thiserror::Error;

const CODECOPY: u8 = 0x39;
const PREFIX_LENGTH: usize = 100;
const MAX_REPORTED_CODECOPIES: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticsError {
    #[error("could not disassemble {kind} bytecode: {message}")]
    Disassembly { kind: &'static str, message: String },
}

/// Opcodes with their operands, one instruction per line.
pub fn disassemble(kind: &'static str, code: &[u8]) -> Result<Vec<String>, DiagnosticsError> {
    let to_error = |err: &dyn std::fmt::Display| DiagnosticsError::Disassembly {
        kind,
        message: err.to_string(),
    };
    let operations = disassemble_bytes(code.to_vec()).map_err(|err| to_error(&err))?;

    // Decoding stops silently at a truncated push operand
    let decoded = operations
        .last()
        .map_or(0, |operation| operation.offset as usize + 1 + operation.input.len());
    if decoded < code.len() {
        return Err(to_error(&format!("truncated at offset {decoded}")));
    }

    let formatted = format_operations(operations).map_err(|err| to_error(&err))?;

    // Each line starts with the instruction offset, which always differs
    // between bytecodes of different length
    Ok(formatted
        .lines()
        .map(|line| {
            line.split_once(": ")
                .map(|(_offset, instruction)| instruction)
                .unwrap_or(line)
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect())
}

/// Unified diff of the disassembled bytecodes.
pub fn opcode_diff(compiled: &[u8], deployed: &[u8]) -> Result<String, DiagnosticsError> {
    let compiled = disassemble("compiled", compiled)?.join("\n");
    let deployed = disassemble("deployed", deployed)?.join("\n");

    Ok(TextDiff::from_lines(&compiled, &deployed)
        .unified_diff()
        .header("compiled_disassembly", "deployed_disassembly")
        .to_string())
}

/// Byte positions holding the `CODECOPY` value.
///
/// Operands are not skipped, so a position may belong to a push argument.
pub fn find_codecopy(code: &[u8]) -> Vec<usize> {
    code.iter()
        .enumerate()
        .filter(|(_, byte)| **byte == CODECOPY)
        .map(|(position, _)| position)
        .collect()
}

/// Hex of the ten bytes before `position` and fifteen bytes starting at it.
fn context(code: &[u8], position: usize) -> String {
    let start = position.saturating_sub(10);
    let end = (position + 15).min(code.len());
    hex::encode(&code[start..end])
}

/// Diagnostics produced when the compiled bytecode is not found in the deployed one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MismatchReport {
    pub compiled_length: usize,
    pub deployed_length: usize,
    pub compiled_prefix: String,
    pub deployed_prefix: String,
    pub opcode_diff: Result<String, DiagnosticsError>,
    pub codecopy_total: usize,
    /// First occurrences together with the surrounding bytes.
    pub codecopy: Vec<(usize, String)>,
}

impl MismatchReport {
    /// `deployed_raw` is the on-chain bytecode before metadata stripping.
    pub fn new(compiled: &[u8], deployed: &[u8], deployed_raw: &[u8]) -> Self {
        let prefix = |code: &[u8]| hex::encode(&code[..code.len().min(PREFIX_LENGTH)]);
        let positions = find_codecopy(deployed_raw);

        Self {
            compiled_length: compiled.len(),
            deployed_length: deployed.len(),
            compiled_prefix: prefix(compiled),
            deployed_prefix: prefix(deployed),
            opcode_diff: opcode_diff(compiled, deployed),
            codecopy_total: positions.len(),
            codecopy: positions
                .into_iter()
                .take(MAX_REPORTED_CODECOPIES)
                .map(|position| (position, context(deployed_raw, position)))
                .collect(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("compiled bytecode length: {}", self.compiled_length),
            format!("deployed bytecode length: {}", self.deployed_length),
        ];
        if self.compiled_length > 0 {
            lines.push(format!(
                "first {PREFIX_LENGTH} bytes of compiled: {}",
                self.compiled_prefix
            ));
        }
        lines.push(format!(
            "first {PREFIX_LENGTH} bytes of deployed: {}",
            self.deployed_prefix
        ));

        match &self.opcode_diff {
            Ok(diff) => lines.push(format!("opcode diff:\n{diff}")),
            Err(err) => lines.push(format!("opcode diff unavailable: {err}")),
        }

        if self.codecopy.is_empty() {
            lines.push("no CODECOPY opcodes found".to_string());
        } else {
            lines.push(format!(
                "found CODECOPY (0x39) at {} byte positions",
                self.codecopy_total
            ));
            for (position, context) in &self.codecopy {
                lines.push(format!("  position {position}: ...{context}..."));
            }
        }
        lines
    }
}
