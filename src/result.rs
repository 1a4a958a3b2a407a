use super::errors::SpawnError;

/// `Ok(value)`, либо `Panic`/`Cancelled` (и `Timeout` при ожидании с таймаутом).
pub type SpawnResult<T> = Result<T, SpawnError>;
