mod solc_compiler;
mod source;
mod svm_fetcher;

pub use solc_compiler::SolcCompiler;
pub use source::{Source, SourceError, SourceSet, Sources};
pub use svm_fetcher::SvmFetcher;
