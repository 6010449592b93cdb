use bytes::Bytes;
use minicbor::{data::Type, Decode, Decoder};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Swarm and ipfs digests are prefixed with the hash scheme in the metadata map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashScheme {
    Ipfs,
    Bzzr0,
    Bzzr1,
}

impl HashScheme {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "ipfs" => Some(HashScheme::Ipfs),
            "bzzr0" => Some(HashScheme::Bzzr0),
            "bzzr1" => Some(HashScheme::Bzzr1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashScheme::Ipfs => "ipfs",
            HashScheme::Bzzr0 => "bzzr0",
            HashScheme::Bzzr1 => "bzzr1",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentHash {
    pub scheme: HashScheme,
    pub digest: Bytes,
}

/// Compiler version recorded by solc. Releases are encoded as three bytes,
/// prereleases as the full version string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SolcTag {
    Release(semver::Version),
    Prerelease(String),
}

impl Display for SolcTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SolcTag::Release(version) => write!(f, "{version}"),
            SolcTag::Prerelease(version) => f.write_str(version),
        }
    }
}

/// Decoded CBOR map solc appends to the runtime bytecode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MetadataHash {
    pub solc: Option<SolcTag>,
    pub content_hash: Option<ContentHash>,
    pub experimental: bool,
}

impl MetadataHash {
    pub fn from_cbor(encoded: &[u8]) -> Result<Self, minicbor::decode::Error> {
        minicbor::decode(encoded)
    }
}

impl Display for MetadataHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(solc) = &self.solc {
            parts.push(format!("solc={solc}"));
        }
        if let Some(hash) = &self.content_hash {
            parts.push(format!(
                "{}=0x{}",
                hash.scheme.as_str(),
                hex::encode(&hash.digest)
            ));
        }
        if self.experimental {
            parts.push("experimental=true".to_string());
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Hash)]
enum ParseError {
    #[error("invalid metadata type; expected \"map\", found \"{0}\"")]
    InvalidMetadataType(Type),
    #[error("metadata map has indefinite length")]
    IndefiniteLength,
    #[error("invalid {key} type; found=\"{actual}\"")]
    InvalidValueType { key: &'static str, actual: Type },
    #[error("invalid solc version length; expected=3, found={0}")]
    InvalidSolcVersionLength(usize),
}

impl From<ParseError> for minicbor::decode::Error {
    fn from(error: ParseError) -> minicbor::decode::Error {
        minicbor::decode::Error::custom(error)
    }
}

impl<'b, C> Decode<'b, C> for MetadataHash {
    fn decode(d: &mut Decoder<'b>, _ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        match d.datatype()? {
            Type::Map => {}
            ty => Err(ParseError::InvalidMetadataType(ty))?,
        }
        let size = d.map()?.ok_or(ParseError::IndefiniteLength)?;

        let mut metadata = MetadataHash::default();
        for _ in 0..size {
            let key = d.str()?;
            if let Some(scheme) = HashScheme::from_key(key) {
                let digest = match d.datatype()? {
                    Type::Bytes => d.bytes()?,
                    actual => Err(ParseError::InvalidValueType { key: "hash", actual })?,
                };
                metadata.content_hash = Some(ContentHash {
                    scheme,
                    digest: Bytes::copy_from_slice(digest),
                });
                continue;
            }

            match key {
                "solc" => metadata.solc = Some(decode_solc(d)?),
                "experimental" => metadata.experimental = d.bool()?,
                // Newer compilers may add keys we know nothing about
                _ => d.skip()?,
            }
        }

        Ok(metadata)
    }
}

fn decode_solc(d: &mut Decoder) -> Result<SolcTag, minicbor::decode::Error> {
    let tag = match d.datatype()? {
        Type::Bytes => {
            let version = d.bytes()?;
            match version {
                [major, minor, patch] => SolcTag::Release(semver::Version::new(
                    *major as u64,
                    *minor as u64,
                    *patch as u64,
                )),
                _ => Err(ParseError::InvalidSolcVersionLength(version.len()))?,
            }
        }
        Type::String => SolcTag::Prerelease(d.str()?.to_string()),
        actual => Err(ParseError::InvalidValueType { key: "solc", actual })?,
    };
    Ok(tag)
}

/// Runtime bytecode split into the executable part and its metadata trailer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stripped<'a> {
    pub code: &'a [u8],
    /// CBOR encoded metadata, without the two length bytes.
    pub metadata: Option<&'a [u8]>,
}

impl<'a> Stripped<'a> {
    pub fn decode_metadata(&self) -> Option<Result<MetadataHash, minicbor::decode::Error>> {
        self.metadata.map(MetadataHash::from_cbor)
    }
}

/// Removes the metadata trailer: the last two bytes encode the length `L`
/// of the CBOR map preceding them, so `L + 2` bytes are dropped.
///
/// Bytecode too short to hold the declared trailer is returned unchanged.
pub fn strip_metadata(code: &[u8]) -> Stripped<'_> {
    let unchanged = Stripped {
        code,
        metadata: None,
    };
    if code.len() <= 2 {
        return unchanged;
    }

    let length_bytes = [code[code.len() - 2], code[code.len() - 1]];
    let metadata_length = u16::from_be_bytes(length_bytes) as usize;
    if metadata_length + 2 > code.len() {
        return unchanged;
    }

    let end = code.len() - 2;
    let start = end - metadata_length;
    Stripped {
        code: &code[..start],
        metadata: Some(&code[start..end]),
    }
}
