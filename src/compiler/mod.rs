mod compilers;
mod fetcher;
mod input;
mod output;
mod version;

pub use compilers::{Compilers, Error, EvmCompiler};
pub use fetcher::{FetchError, Fetcher};
pub use input::{Optimizer, SettingsBuilder, StandardJsonInput};
pub use output::{CompiledArtifact, CompilerOutput, ImmutableReferences, Offsets};
pub use version::{CompilerVersion, EvmFork, EvmVersion, VersionError};

#[cfg(test)]
pub use compilers::MockEvmCompiler;
#[cfg(test)]
pub use fetcher::MockFetcher;
