use mismatch::Mismatch;
use std::fmt::{Display, Formatter};

const WORD_HEX_LENGTH: usize = 64;

/// Splits hex encoded constructor arguments into 32-byte words.
/// The last word may be shorter.
pub fn split_constructor_args(args: &str) -> Vec<String> {
    let args = normalize_hex(args);
    args.as_bytes()
        .chunks(WORD_HEX_LENGTH)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

fn normalize_hex(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix("0x")
        .unwrap_or(value)
        .to_ascii_lowercase()
}

/// Relation between the claimed constructor arguments and the bytes
/// trailing the compiled code inside the deployed one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstructorArgs {
    /// Claimed arguments are exactly the trailing bytes.
    Matched,
    /// Claimed arguments differ, but only zero bytes trail the code.
    Padding { claimed: String },
    /// Claimed arguments differ from the trailing bytes.
    Mismatch(Mismatch<String>),
    /// Nothing claimed and nothing but zeros trailing.
    NoneClaimed,
    /// Nothing claimed, yet non-zero bytes trail the code.
    Unexpected { remaining: String },
}

impl ConstructorArgs {
    /// `compiled` and `deployed` are expected to be stripped of metadata.
    pub fn reconcile(claimed: &str, compiled: &[u8], deployed: &[u8]) -> Self {
        let remaining = deployed.get(compiled.len()..).unwrap_or_default();
        let is_padding = remaining.iter().all(|byte| *byte == 0);
        let remaining = hex::encode(remaining);
        let claimed = normalize_hex(claimed);

        match (claimed.is_empty(), is_padding) {
            (false, _) if claimed == remaining => ConstructorArgs::Matched,
            (false, true) => ConstructorArgs::Padding { claimed },
            (false, false) => ConstructorArgs::Mismatch(Mismatch::new(claimed, remaining)),
            (true, true) => ConstructorArgs::NoneClaimed,
            (true, false) => ConstructorArgs::Unexpected { remaining },
        }
    }

    /// Whether the outcome deserves a warning. Never decides the verdict.
    pub fn is_suspicious(&self) -> bool {
        matches!(
            self,
            ConstructorArgs::Mismatch(_) | ConstructorArgs::Unexpected { .. }
        )
    }
}

impl Display for ConstructorArgs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstructorArgs::Matched => f.write_str("constructor arguments match"),
            ConstructorArgs::Padding { .. } => f.write_str(
                "constructor arguments differ, but the remaining bytecode is zero padding",
            ),
            ConstructorArgs::Mismatch(mismatch) => {
                write!(f, "constructor arguments mismatch: {mismatch}")
            }
            ConstructorArgs::NoneClaimed => f.write_str("no constructor arguments expected"),
            ConstructorArgs::Unexpected { remaining } => write!(
                f,
                "no constructor arguments claimed, but deployed bytecode has trailing data: 0x{remaining}"
            ),
        }
    }
}
