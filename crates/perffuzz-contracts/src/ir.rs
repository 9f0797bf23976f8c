#[derive(Debug, thiserror::Error)]
pub enum IrError {
    #[error("failed to translate source into a program unit: {0}")]
    Translate(String),
}

/// A compiled unit ready to hand to a [`crate::RuntimeExecutor`].
#[derive(Debug, Clone)]
pub struct ProgramUnit {
    pub bytes: Vec<u8>,
    pub description: String,
}

/// Lowers a higher-level program representation (source text, an AST, a
/// bytecode assembly) into the byte-addressable [`ProgramUnit`] the fuzzer
/// loop mutates and executes.
pub trait IrTranslator: Send + Sync {
    fn translate(&self, source: &str) -> Result<ProgramUnit, IrError>;
}
