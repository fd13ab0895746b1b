use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("entry value must not be zero")]
    ZeroValue,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// User-facing messages, in pt-BR like the rest of the register UI.
/// Storage internals never reach the caller.
pub mod messages {
    pub const DAY_CLOSED: &str = "Caixa fechado!";
    pub const DAY_NOT_FOUND: &str = "Caixa não encontrado!";
    pub const ZERO_VALUE: &str = "O valor não pode ser zero!";
    pub const OPEN_DAY_FAILED: &str = "Erro ao abrir caixa! Por favor, tente novamente.";
    pub const SAVE_ENTRY_FAILED: &str = "Erro ao salvar entrada! Por favor, tente novamente.";
    pub const DELETE_ENTRY_FAILED: &str =
        "Erro ao deletar movimentação! Por favor, tente novamente.";
}
