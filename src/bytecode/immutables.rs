use crate::compiler::{ImmutableReferences, Offsets};
use std::fmt::{Display, Formatter};

/// An immutable reference range that could not be patched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchWarning {
    ExceedsDeployed { id: String, offsets: Offsets },
    ExceedsCompiled { id: String, offsets: Offsets },
}

impl Display for PatchWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchWarning::ExceedsDeployed { id, offsets } => write!(
                f,
                "immutable reference {id} at position {} (length {}) exceeds deployed bytecode length",
                offsets.start, offsets.length
            ),
            PatchWarning::ExceedsCompiled { id, offsets } => write!(
                f,
                "immutable reference {id} at position {} (length {}) exceeds compiled bytecode length",
                offsets.start, offsets.length
            ),
        }
    }
}

/// Overwrites zero-filled immutable placeholders of the compiled runtime bytecode
/// with the values found at the same offsets of the deployed bytecode.
///
/// Both bytecodes must still carry their metadata, as the offsets are relative
/// to the unstripped runtime code.
pub fn patch_immutables(
    compiled: &mut [u8],
    deployed: &[u8],
    immutable_references: &ImmutableReferences,
) -> Vec<PatchWarning> {
    let mut warnings = Vec::new();
    if immutable_references.is_empty() {
        return warnings;
    }

    tracing::info!(
        count = immutable_references.len(),
        "processing immutable references"
    );
    for (id, positions) in immutable_references {
        tracing::debug!(id = %id, positions = positions.len(), "patching immutable variable");
        for offsets in positions {
            let range = offsets.start..offsets.start.saturating_add(offsets.length);
            let warning = if range.end > deployed.len() {
                PatchWarning::ExceedsDeployed {
                    id: id.clone(),
                    offsets: *offsets,
                }
            } else if range.end > compiled.len() {
                PatchWarning::ExceedsCompiled {
                    id: id.clone(),
                    offsets: *offsets,
                }
            } else {
                compiled[range.clone()].copy_from_slice(&deployed[range]);
                continue;
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn references(items: &[(&str, &[(usize, usize)])]) -> ImmutableReferences {
        items
            .iter()
            .map(|(id, offsets)| {
                let offsets = offsets
                    .iter()
                    .map(|(start, length)| Offsets {
                        start: *start,
                        length: *length,
                    })
                    .collect();
                (id.to_string(), offsets)
            })
            .collect()
    }

    #[test]
    fn patches_placeholders() {
        let deployed = hex::decode("7f1111111122222222aa7f33333333").unwrap();
        let mut compiled = hex::decode("7f0000000000000000aa7f00000000").unwrap();
        let refs = references(&[("12", &[(1, 4), (5, 4)]), ("30", &[(11, 4)])]);

        let warnings = patch_immutables(&mut compiled, &deployed, &refs);

        assert_eq!(Vec::<PatchWarning>::new(), warnings);
        assert_eq!(deployed, compiled);
    }

    #[test]
    fn patching_correct_bytes_is_noop() {
        let deployed = hex::decode("7f1111111122222222aa").unwrap();
        let mut compiled = deployed.clone();
        let refs = references(&[("12", &[(1, 8)])]);

        patch_immutables(&mut compiled, &deployed, &refs);
        patch_immutables(&mut compiled, &deployed, &refs);

        assert_eq!(deployed, compiled);
    }

    #[test]
    fn overflowing_range_is_skipped() {
        let deployed = hex::decode("7f11112222").unwrap();
        let mut compiled = hex::decode("7f0000000000000000").unwrap();
        let refs = references(&[("7", &[(1, 2), (3, 4)])]);

        let warnings = patch_immutables(&mut compiled, &deployed, &refs);

        assert_eq!(
            vec![PatchWarning::ExceedsDeployed {
                id: "7".into(),
                offsets: Offsets {
                    start: 3,
                    length: 4
                }
            }],
            warnings
        );
        assert_eq!(hex::decode("7f1111000000000000").unwrap(), compiled);
        assert_eq!(
            "immutable reference 7 at position 3 (length 4) exceeds deployed bytecode length",
            warnings[0].to_string()
        );
    }

    #[test]
    fn range_beyond_compiled_code_is_skipped() {
        let deployed = hex::decode("7f1111222233").unwrap();
        let mut compiled = hex::decode("7f0000").unwrap();
        let refs = references(&[("3", &[(1, 4)])]);

        let warnings = patch_immutables(&mut compiled, &deployed, &refs);

        assert!(
            matches!(warnings.as_slice(), [PatchWarning::ExceedsCompiled { .. }]),
            "{warnings:?}"
        );
        assert_eq!(hex::decode("7f0000").unwrap(), compiled);
    }

    #[test]
    fn no_references() {
        let mut compiled = vec![0x60, 0x80];
        let warnings = patch_immutables(&mut compiled, &[0x60, 0x81], &BTreeMap::new());
        assert!(warnings.is_empty());
        assert_eq!(vec![0x60, 0x80], compiled);
    }
}
